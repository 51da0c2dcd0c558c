//! [`SqliteStore`]: the SQLite implementation of the Bulletin store traits.

use std::{collections::BTreeSet, path::Path, time::Duration};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use bulletin_core::{
  announcement::{Announcement, AnnouncementInput, AnnouncementStatus, AnnouncementView},
  directory::{Branch, Department, Employee},
  reconcile::{Reconciliation, reconcile},
  store::{
    AnnouncementQuery, AnnouncementStore, AnnouncementUpdate, DirectoryStore,
    ListOrder, Store, ViewInsert, ViewStore,
  },
};

use crate::{
  Error, Result,
  encode::{
    AnnouncementRow, RawBranch, RawDepartment, RawEmployee, RawView, encode_date,
    encode_dt, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a connection waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ANNOUNCEMENT_COLUMNS: &str = "announcement_id, tenant_id, title, category, \
  description, content, start_date, end_date, attachments, is_featured, \
  is_high_priority, is_company_wide, created_at, updated_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Bulletin store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Several
/// stores (or processes) may open the same file; view idempotence holds
/// across all of them.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn sync_targets(
    &self,
    id: Uuid,
    desired: BTreeSet<Uuid>,
    target: Target,
  ) -> Result<Reconciliation> {
    let id_str = encode_uuid(id);

    let plan = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let plan = apply_targets(&tx, &id_str, &desired, target)?;
        tx.commit()?;
        Ok(plan)
      })
      .await?;

    tracing::debug!(
      announcement_id = %id,
      target = target.name(),
      added = plan.to_add.len(),
      removed = plan.to_remove.len(),
      "synchronised announcement targets"
    );
    Ok(plan)
  }
}

// ─── SQL helpers ─────────────────────────────────────────────────────────────

/// One of the two association tables.
#[derive(Debug, Clone, Copy)]
enum Target {
  Departments,
  Branches,
}

impl Target {
  fn name(self) -> &'static str {
    match self {
      Self::Departments => "departments",
      Self::Branches => "branches",
    }
  }

  fn select_sql(self) -> &'static str {
    match self {
      Self::Departments => {
        "SELECT department_id FROM announcement_departments
         WHERE announcement_id = ?1 ORDER BY department_id"
      }
      Self::Branches => {
        "SELECT branch_id FROM announcement_branches
         WHERE announcement_id = ?1 ORDER BY branch_id"
      }
    }
  }

  fn insert_sql(self) -> &'static str {
    match self {
      Self::Departments => {
        "INSERT INTO announcement_departments (announcement_id, department_id)
         VALUES (?1, ?2)"
      }
      Self::Branches => {
        "INSERT INTO announcement_branches (announcement_id, branch_id)
         VALUES (?1, ?2)"
      }
    }
  }

  fn delete_sql(self) -> &'static str {
    match self {
      Self::Departments => {
        "DELETE FROM announcement_departments
         WHERE announcement_id = ?1 AND department_id = ?2"
      }
      Self::Branches => {
        "DELETE FROM announcement_branches
         WHERE announcement_id = ?1 AND branch_id = ?2"
      }
    }
  }
}

fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
  let s: String = row.get(idx)?;
  Uuid::parse_str(&s).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
  })
}

/// Bring the `target` associations of `announcement_id` in line with
/// `desired` inside the caller's transaction.
fn apply_targets(
  tx: &rusqlite::Transaction<'_>,
  announcement_id: &str,
  desired: &BTreeSet<Uuid>,
  target: Target,
) -> rusqlite::Result<Reconciliation> {
  let current = {
    let mut stmt = tx.prepare(target.select_sql())?;
    let ids = stmt
      .query_map([announcement_id], |row| uuid_column(row, 0))?
      .collect::<rusqlite::Result<BTreeSet<Uuid>>>()?;
    ids
  };

  let plan = reconcile(&current, desired);
  for added in &plan.to_add {
    tx.execute(target.insert_sql(), [announcement_id, encode_uuid(*added).as_str()])?;
  }
  for removed in &plan.to_remove {
    tx.execute(target.delete_sql(), [announcement_id, encode_uuid(*removed).as_str()])?;
  }
  Ok(plan)
}

fn read_announcement(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnnouncementRow> {
  Ok(AnnouncementRow {
    announcement_id:  row.get(0)?,
    tenant_id:        row.get(1)?,
    title:            row.get(2)?,
    category:         row.get(3)?,
    description:      row.get(4)?,
    content:          row.get(5)?,
    start_date:       row.get(6)?,
    end_date:         row.get(7)?,
    attachments:      row.get(8)?,
    is_featured:      row.get(9)?,
    is_high_priority: row.get(10)?,
    is_company_wide:  row.get(11)?,
    created_at:       row.get(12)?,
    updated_at:       row.get(13)?,
    department_ids:   Vec::new(),
    branch_ids:       Vec::new(),
  })
}

fn target_ids(
  conn: &rusqlite::Connection,
  target: Target,
  announcement_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(target.select_sql())?;
  let ids = stmt
    .query_map([announcement_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(ids)
}

fn load_targets(
  conn: &rusqlite::Connection,
  row: &mut AnnouncementRow,
) -> rusqlite::Result<()> {
  row.department_ids = target_ids(conn, Target::Departments, &row.announcement_id)?;
  row.branch_ids = target_ids(conn, Target::Branches, &row.announcement_id)?;
  Ok(())
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

fn sql_int(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

/// Build the filtered listing query and its positional parameters.
fn list_sql(tenant_id: Uuid, query: AnnouncementQuery) -> (String, Vec<Value>) {
  let mut sql =
    format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE tenant_id = ?");
  let mut params = vec![Value::Text(encode_uuid(tenant_id))];

  if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let pattern = format!("%{}%", escape_like(text));
    sql.push_str(
      " AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' \
       OR content LIKE ? ESCAPE '\\')",
    );
    params.extend(std::iter::repeat_n(Value::Text(pattern), 3));
  }

  if let Some(category) = query.category {
    sql.push_str(" AND category = ?");
    params.push(Value::Text(category));
  }

  if let Some(department_id) = query.department_id {
    sql.push_str(
      " AND (is_company_wide = 1 OR EXISTS (SELECT 1 FROM announcement_departments d \
       WHERE d.announcement_id = announcements.announcement_id AND d.department_id = ?))",
    );
    params.push(Value::Text(encode_uuid(department_id)));
  }

  if let Some(branch_id) = query.branch_id {
    sql.push_str(
      " AND (is_company_wide = 1 OR EXISTS (SELECT 1 FROM announcement_branches b \
       WHERE b.announcement_id = announcements.announcement_id AND b.branch_id = ?))",
    );
    params.push(Value::Text(encode_uuid(branch_id)));
  }

  if let Some(status) = query.status {
    let today = encode_date(query.today.unwrap_or_else(|| Utc::now().date_naive()));
    match status {
      AnnouncementStatus::Upcoming => {
        sql.push_str(" AND start_date > ?");
        params.push(Value::Text(today));
      }
      AnnouncementStatus::Active => {
        sql.push_str(" AND start_date <= ? AND (end_date IS NULL OR end_date >= ?)");
        params.push(Value::Text(today.clone()));
        params.push(Value::Text(today));
      }
      AnnouncementStatus::Expired => {
        sql.push_str(" AND end_date IS NOT NULL AND end_date < ?");
        params.push(Value::Text(today));
      }
    }
  }

  if query.featured_only {
    sql.push_str(" AND is_featured = 1");
  }

  if let Some(high_priority) = query.high_priority {
    sql.push_str(" AND is_high_priority = ?");
    params.push(Value::Integer(i64::from(high_priority)));
  }

  // A NULL end date never satisfies the end-date half of a range bound.
  if let Some(from) = query.date_from {
    let from = encode_date(from);
    sql.push_str(" AND (start_date >= ? OR end_date >= ?)");
    params.push(Value::Text(from.clone()));
    params.push(Value::Text(from));
  }

  if let Some(to) = query.date_to {
    let to = encode_date(to);
    sql.push_str(" AND (start_date <= ? OR end_date <= ?)");
    params.push(Value::Text(to.clone()));
    params.push(Value::Text(to));
  }

  sql.push_str(match query.order {
    ListOrder::Newest => " ORDER BY created_at DESC, announcement_id",
    ListOrder::Priority => {
      " ORDER BY is_high_priority DESC, is_featured DESC, created_at DESC, announcement_id"
    }
    ListOrder::StartDate => " ORDER BY start_date, created_at, announcement_id",
  });

  if query.limit.is_some() || query.offset.is_some() {
    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(Value::Integer(query.limit.map_or(-1, sql_int)));
    params.push(Value::Integer(query.offset.map_or(0, sql_int)));
  }

  (sql, params)
}

// ─── Store impls ─────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;
}

impl AnnouncementStore for SqliteStore {
  async fn create_announcement(
    &self,
    tenant_id: Uuid,
    input: AnnouncementInput,
  ) -> Result<Announcement> {
    // Stored timestamps carry microseconds; keep the returned value identical
    // to what a later read produces.
    let now = Utc::now().trunc_subsecs(6);
    let announcement = Announcement {
      announcement_id:  Uuid::new_v4(),
      tenant_id,
      title:            input.title,
      category:         input.category,
      description:      input.description,
      content:          input.content,
      start_date:       input.start_date,
      end_date:         input.end_date,
      attachments:      input.attachments,
      is_featured:      input.is_featured,
      is_high_priority: input.is_high_priority,
      is_company_wide:  input.is_company_wide,
      department_ids:   input.department_ids,
      branch_ids:       input.branch_ids,
      created_at:       now,
      updated_at:       now,
    };
    let row = AnnouncementRow::encode(&announcement);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO announcements ({ANNOUNCEMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
          ),
          rusqlite::params![
            row.announcement_id,
            row.tenant_id,
            row.title,
            row.category,
            row.description,
            row.content,
            row.start_date,
            row.end_date,
            row.attachments,
            row.is_featured,
            row.is_high_priority,
            row.is_company_wide,
            row.created_at,
            row.updated_at,
          ],
        )?;
        for department_id in &row.department_ids {
          tx.execute(
            Target::Departments.insert_sql(),
            [&row.announcement_id, department_id],
          )?;
        }
        for branch_id in &row.branch_ids {
          tx.execute(Target::Branches.insert_sql(), [&row.announcement_id, branch_id])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(announcement)
  }

  async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>> {
    let id_str = encode_uuid(id);

    let row: Option<AnnouncementRow> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            &format!(
              "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE announcement_id = ?1"
            ),
            [&id_str],
            read_announcement,
          )
          .optional()?;
        match row {
          Some(mut row) => {
            load_targets(conn, &mut row)?;
            Ok(Some(row))
          }
          None => Ok(None),
        }
      })
      .await?;

    row.map(AnnouncementRow::into_announcement).transpose()
  }

  async fn list_announcements(
    &self,
    tenant_id: Uuid,
    query: AnnouncementQuery,
  ) -> Result<Vec<Announcement>> {
    let (sql, params) = list_sql(tenant_id, query);

    let rows: Vec<AnnouncementRow> = self
      .conn
      .call(move |conn| {
        let mut rows = {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(params), read_announcement)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };
        for row in &mut rows {
          load_targets(conn, row)?;
        }
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(AnnouncementRow::into_announcement).collect()
  }

  async fn update_announcement(
    &self,
    id: Uuid,
    input: AnnouncementInput,
  ) -> Result<Option<AnnouncementUpdate>> {
    let id_str = encode_uuid(id);
    let start_date = encode_date(input.start_date);
    let end_date = input.end_date.map(encode_date);
    let updated_at = encode_dt(Utc::now());

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE announcements SET
             title = ?2, category = ?3, description = ?4, content = ?5,
             start_date = ?6, end_date = ?7, attachments = ?8,
             is_featured = ?9, is_high_priority = ?10, is_company_wide = ?11,
             updated_at = ?12
           WHERE announcement_id = ?1",
          rusqlite::params![
            id_str,
            input.title,
            input.category,
            input.description,
            input.content,
            start_date,
            end_date,
            input.attachments,
            input.is_featured,
            input.is_high_priority,
            input.is_company_wide,
            updated_at,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let departments =
          apply_targets(&tx, &id_str, &input.department_ids, Target::Departments)?;
        let branches = apply_targets(&tx, &id_str, &input.branch_ids, Target::Branches)?;

        let mut row = tx.query_row(
          &format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE announcement_id = ?1"
          ),
          [&id_str],
          read_announcement,
        )?;
        load_targets(&tx, &mut row)?;
        tx.commit()?;
        Ok(Some((row, departments, branches)))
      })
      .await?;

    let Some((row, departments, branches)) = applied else {
      return Ok(None);
    };
    Ok(Some(AnnouncementUpdate {
      announcement: row.into_announcement()?,
      departments,
      branches,
    }))
  }

  async fn delete_announcement(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM announcement_views WHERE announcement_id = ?1", [&id_str])?;
        tx.execute(
          "DELETE FROM announcement_departments WHERE announcement_id = ?1",
          [&id_str],
        )?;
        tx.execute(
          "DELETE FROM announcement_branches WHERE announcement_id = ?1",
          [&id_str],
        )?;
        let deleted =
          tx.execute("DELETE FROM announcements WHERE announcement_id = ?1", [&id_str])?;
        tx.commit()?;
        Ok(deleted > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn sync_departments(
    &self,
    id: Uuid,
    desired: BTreeSet<Uuid>,
  ) -> Result<Reconciliation> {
    self.sync_targets(id, desired, Target::Departments).await
  }

  async fn sync_branches(
    &self,
    id: Uuid,
    desired: BTreeSet<Uuid>,
  ) -> Result<Reconciliation> {
    self.sync_targets(id, desired, Target::Branches).await
  }
}

impl DirectoryStore for SqliteStore {
  async fn add_branch(&self, branch: Branch) -> Result<Branch> {
    let id_str = encode_uuid(branch.branch_id);
    let tenant_str = encode_uuid(branch.tenant_id);
    let name = branch.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO branches (branch_id, tenant_id, name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, tenant_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(branch)
  }

  async fn add_department(&self, department: Department) -> Result<Department> {
    let id_str = encode_uuid(department.department_id);
    let tenant_str = encode_uuid(department.tenant_id);
    let branch_str = department.branch_id.map(encode_uuid);
    let name = department.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO departments (department_id, tenant_id, branch_id, name)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, tenant_str, branch_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(department)
  }

  async fn add_employee(&self, employee: Employee) -> Result<Employee> {
    let id_str = encode_uuid(employee.employee_id);
    let tenant_str = encode_uuid(employee.tenant_id);
    let name = employee.name.clone();
    let email = employee.email.clone();
    let status = encode_status(employee.status);
    let department_str = employee.department_id.map(encode_uuid);
    let branch_str = employee.branch_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees
             (employee_id, tenant_id, name, email, status, department_id, branch_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            tenant_str,
            name,
            email,
            status,
            department_str,
            branch_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(employee)
  }

  async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBranch> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT branch_id, tenant_id, name FROM branches WHERE branch_id = ?1",
            [&id_str],
            |row| {
              Ok(RawBranch {
                branch_id: row.get(0)?,
                tenant_id: row.get(1)?,
                name:      row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBranch::into_branch).transpose()
  }

  async fn get_department(&self, id: Uuid) -> Result<Option<Department>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDepartment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT department_id, tenant_id, branch_id, name
             FROM departments WHERE department_id = ?1",
            [&id_str],
            |row| {
              Ok(RawDepartment {
                department_id: row.get(0)?,
                tenant_id:     row.get(1)?,
                branch_id:     row.get(2)?,
                name:          row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDepartment::into_department).transpose()
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT employee_id, tenant_id, name, email, status, department_id, branch_id
             FROM employees WHERE employee_id = ?1",
            [&id_str],
            read_employee,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_departments(&self, tenant_id: Uuid) -> Result<Vec<Department>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawDepartment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT department_id, tenant_id, branch_id, name
           FROM departments WHERE tenant_id = ?1 ORDER BY name, department_id",
        )?;
        let rows = stmt
          .query_map([&tenant_str], |row| {
            Ok(RawDepartment {
              department_id: row.get(0)?,
              tenant_id:     row.get(1)?,
              branch_id:     row.get(2)?,
              name:          row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDepartment::into_department).collect()
  }

  async fn list_employees(&self, tenant_id: Uuid) -> Result<Vec<Employee>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawEmployee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT employee_id, tenant_id, name, email, status, department_id, branch_id
           FROM employees WHERE tenant_id = ?1 ORDER BY name, employee_id",
        )?;
        let rows = stmt
          .query_map([&tenant_str], read_employee)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_employee).collect()
  }
}

fn read_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEmployee> {
  Ok(RawEmployee {
    employee_id:   row.get(0)?,
    tenant_id:     row.get(1)?,
    name:          row.get(2)?,
    email:         row.get(3)?,
    status:        row.get(4)?,
    department_id: row.get(5)?,
    branch_id:     row.get(6)?,
  })
}

impl ViewStore for SqliteStore {
  async fn insert_view(
    &self,
    announcement_id: Uuid,
    employee_id: Uuid,
    viewed_at: DateTime<Utc>,
  ) -> Result<ViewInsert> {
    let announcement_str = encode_uuid(announcement_id);
    let employee_str = encode_uuid(employee_id);
    let at_str = encode_dt(viewed_at);

    // The primary key arbitrates between concurrent writers; a conflicting
    // row means another request recorded the view first.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO announcement_views (announcement_id, employee_id, viewed_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (announcement_id, employee_id) DO NOTHING",
          rusqlite::params![announcement_str, employee_str, at_str],
        )?)
      })
      .await?;

    Ok(if inserted > 0 {
      ViewInsert::Inserted
    } else {
      ViewInsert::AlreadyRecorded
    })
  }

  async fn count_views(&self, announcement_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(announcement_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM announcement_views WHERE announcement_id = ?1",
          [&id_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(u64::try_from(count).unwrap_or(0))
  }

  async fn list_viewers(&self, announcement_id: Uuid) -> Result<Vec<AnnouncementView>> {
    let id_str = encode_uuid(announcement_id);

    let raws: Vec<RawView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT announcement_id, employee_id, viewed_at
           FROM announcement_views WHERE announcement_id = ?1
           ORDER BY viewed_at, employee_id",
        )?;
        let rows = stmt
          .query_map([&id_str], |row| {
            Ok(RawView {
              announcement_id: row.get(0)?,
              employee_id:     row.get(1)?,
              viewed_at:       row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawView::into_view).collect()
  }
}
