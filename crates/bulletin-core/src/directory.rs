//! Directory entities: branches, departments and the employee view of users.
//!
//! The directory is maintained elsewhere; Bulletin only reads it to resolve
//! audiences and to validate announcement targets.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use uuid::Uuid;
use validator::ValidateEmail;

// ─── Organisation units ──────────────────────────────────────────────────────

/// A physical or administrative location of the organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
  pub branch_id: Uuid,
  pub tenant_id: Uuid,
  pub name:      String,
}

impl Branch {
  pub fn new(tenant_id: Uuid, name: impl Into<String>) -> Self {
    Self { branch_id: Uuid::new_v4(), tenant_id, name: name.into() }
  }
}

/// A functional unit, optionally attached to a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub department_id: Uuid,
  pub tenant_id:     Uuid,
  pub branch_id:     Option<Uuid>,
  pub name:          String,
}

impl Department {
  pub fn new(
    tenant_id: Uuid,
    branch_id: Option<Uuid>,
    name: impl Into<String>,
  ) -> Self {
    Self {
      department_id: Uuid::new_v4(),
      tenant_id,
      branch_id,
      name: name.into(),
    }
  }
}

// ─── Employees ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeStatus {
  #[default]
  Active,
  Inactive,
}

/// The slice of a user record that announcement distribution cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id:   Uuid,
  pub tenant_id:     Uuid,
  pub name:          String,
  /// May be empty or malformed; see [`Employee::is_eligible`].
  pub email:         String,
  #[serde(default)]
  pub status:        EmployeeStatus,
  pub department_id: Option<Uuid>,
  pub branch_id:     Option<Uuid>,
}

impl Employee {
  /// Active with a deliverable email address.
  pub fn is_eligible(&self) -> bool {
    self.status == EmployeeStatus::Active && is_valid_email(&self.email)
  }
}

/// Non-empty and syntactically well-formed.
pub fn is_valid_email(address: &str) -> bool {
  let address = address.trim();
  !address.is_empty() && address.validate_email()
}
