//! `bulletin import`: seed the directory from a JSON document.
//!
//! ```json
//! {
//!   "tenant_id": "…",
//!   "branches":    [{ "id": "…", "name": "Mumbai" }],
//!   "departments": [{ "id": "…", "branch_id": "…", "name": "Sales" }],
//!   "employees":   [{ "id": "…", "name": "Asha", "email": "asha@example.com",
//!                     "status": "active", "department_id": "…", "branch_id": "…" }]
//! }
//! ```
//!
//! Records are inserted in dependency order. Ids already present in the
//! store make the import fail.

use std::path::Path;

use anyhow::Context as _;
use bulletin_core::{
  directory::{Branch, Department, Employee, EmployeeStatus},
  store::DirectoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DirectoryFile {
  pub tenant_id:   Uuid,
  #[serde(default)]
  pub branches:    Vec<BranchRecord>,
  #[serde(default)]
  pub departments: Vec<DepartmentRecord>,
  #[serde(default)]
  pub employees:   Vec<EmployeeRecord>,
}

#[derive(Debug, Deserialize)]
pub struct BranchRecord {
  pub id:   Uuid,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentRecord {
  pub id:        Uuid,
  #[serde(default)]
  pub branch_id: Option<Uuid>,
  pub name:      String,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeRecord {
  pub id:            Uuid,
  pub name:          String,
  #[serde(default)]
  pub email:         String,
  #[serde(default)]
  pub status:        EmployeeStatus,
  #[serde(default)]
  pub department_id: Option<Uuid>,
  #[serde(default)]
  pub branch_id:     Option<Uuid>,
}

/// Counts of inserted records.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub branches:    usize,
  pub departments: usize,
  pub employees:   usize,
}

impl DirectoryFile {
  pub fn read(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
      .with_context(|| format!("failed to parse {}", path.display()))
  }
}

/// Insert every record of `file` into `store`.
pub async fn import<S: DirectoryStore>(
  store: &S,
  file: DirectoryFile,
) -> anyhow::Result<ImportSummary> {
  let tenant_id = file.tenant_id;
  let mut summary = ImportSummary::default();

  for b in file.branches {
    store
      .add_branch(Branch { branch_id: b.id, tenant_id, name: b.name })
      .await
      .with_context(|| format!("failed to import branch {}", b.id))?;
    summary.branches += 1;
  }

  for d in file.departments {
    store
      .add_department(Department {
        department_id: d.id,
        tenant_id,
        branch_id: d.branch_id,
        name: d.name,
      })
      .await
      .with_context(|| format!("failed to import department {}", d.id))?;
    summary.departments += 1;
  }

  for e in file.employees {
    if !bulletin_core::directory::is_valid_email(&e.email) {
      tracing::warn!(
        employee_id = %e.id,
        email = %e.email,
        "importing employee without a deliverable email"
      );
    }
    store
      .add_employee(Employee {
        employee_id: e.id,
        tenant_id,
        name: e.name,
        email: e.email,
        status: e.status,
        department_id: e.department_id,
        branch_id: e.branch_id,
      })
      .await
      .with_context(|| format!("failed to import employee {}", e.id))?;
    summary.employees += 1;
  }

  tracing::info!(
    tenant_id = %tenant_id,
    branches = summary.branches,
    departments = summary.departments,
    employees = summary.employees,
    "directory imported"
  );

  Ok(summary)
}

#[cfg(test)]
mod tests {
  use bulletin_store_sqlite::SqliteStore;
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn imports_in_dependency_order() {
    let tenant = Uuid::new_v4();
    let (branch, dept, asha, ravi) =
      (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let doc = json!({
      "tenant_id": tenant,
      "branches": [{ "id": branch, "name": "Mumbai" }],
      "departments": [{ "id": dept, "branch_id": branch, "name": "Sales" }],
      "employees": [
        { "id": asha, "name": "Asha", "email": "asha@example.com",
          "department_id": dept, "branch_id": branch },
        { "id": ravi, "name": "Ravi", "status": "inactive" }
      ]
    });
    let file: DirectoryFile = serde_json::from_value(doc).unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let summary = import(&store, file).await.unwrap();
    assert_eq!(summary, ImportSummary { branches: 1, departments: 1, employees: 2 });

    let sales = store.get_department(dept).await.unwrap().unwrap();
    assert_eq!(sales.branch_id, Some(branch));
    assert_eq!(sales.tenant_id, tenant);

    let employees = store.list_employees(tenant).await.unwrap();
    assert_eq!(employees.len(), 2);
    let ravi = employees.iter().find(|e| e.employee_id == ravi).unwrap();
    assert_eq!(ravi.status, EmployeeStatus::Inactive);
    assert!(ravi.email.is_empty());
    assert!(!ravi.is_eligible());
  }

  #[tokio::test]
  async fn reads_from_disk_and_rejects_duplicates() {
    let tenant = Uuid::new_v4();
    let doc = json!({
      "tenant_id": tenant,
      "branches": [{ "id": Uuid::new_v4(), "name": "Pune" }]
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("directory.json");
    std::fs::write(&path, doc.to_string()).unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    import(&store, DirectoryFile::read(&path).unwrap()).await.unwrap();
    assert!(import(&store, DirectoryFile::read(&path).unwrap()).await.is_err());

    assert!(DirectoryFile::read(&dir.path().join("missing.json")).is_err());
  }
}
