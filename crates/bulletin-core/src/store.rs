//! Store traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `bulletin-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.

use std::{collections::BTreeSet, future::Future};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  announcement::{
    Announcement, AnnouncementInput, AnnouncementStatus, AnnouncementView,
  },
  directory::{Branch, Department, Employee},
  reconcile::Reconciliation,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Result ordering for [`AnnouncementStore::list_announcements`].
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ListOrder {
  /// `created_at` descending.
  #[default]
  Newest,
  /// High priority first, then featured, then newest.
  Priority,
  /// `start_date` ascending.
  StartDate,
}

/// Parameters for [`AnnouncementStore::list_announcements`].
#[derive(Debug, Clone, Default)]
pub struct AnnouncementQuery {
  /// Free-text filter over title, description and content.
  pub text:          Option<String>,
  pub category:      Option<String>,
  /// Company-wide announcements, or those targeting this department.
  pub department_id: Option<Uuid>,
  /// Company-wide announcements, or those targeting this branch.
  pub branch_id:     Option<Uuid>,
  /// Evaluated against `today`.
  pub status:        Option<AnnouncementStatus>,
  /// Reference date for `status`; defaults to the current UTC date.
  pub today:         Option<NaiveDate>,
  pub featured_only: bool,
  pub high_priority: Option<bool>,
  /// Starts or ends on or after this date.
  pub date_from:     Option<NaiveDate>,
  /// Starts or ends on or before this date.
  pub date_to:       Option<NaiveDate>,
  pub order:         ListOrder,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of a conflict-tolerant view insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewInsert {
  Inserted,
  /// A row for the pair already existed; nothing was written.
  AlreadyRecorded,
}

/// An applied update: the stored announcement and the association changes
/// that were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementUpdate {
  pub announcement: Announcement,
  pub departments:  Reconciliation,
  pub branches:     Reconciliation,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type for every store trait a backend implements.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Persistence of announcements and their department/branch associations.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AnnouncementStore: Store {
  /// Persist a new announcement together with the associations named in
  /// `input`, atomically.
  fn create_announcement(
    &self,
    tenant_id: Uuid,
    input: AnnouncementInput,
  ) -> impl Future<Output = Result<Announcement, Self::Error>> + Send + '_;

  /// Retrieve an announcement with its association sets loaded.
  fn get_announcement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Announcement>, Self::Error>> + Send + '_;

  /// Tenant-scoped listing in `query.order`.
  fn list_announcements(
    &self,
    tenant_id: Uuid,
    query: AnnouncementQuery,
  ) -> impl Future<Output = Result<Vec<Announcement>, Self::Error>> + Send + '_;

  /// Overwrite the fields of an announcement and reconcile both association
  /// sets with those named in `input`, atomically: on error nothing is
  /// changed. Returns `None` if the announcement does not exist.
  fn update_announcement(
    &self,
    id: Uuid,
    input: AnnouncementInput,
  ) -> impl Future<Output = Result<Option<AnnouncementUpdate>, Self::Error>> + Send + '_;

  /// Delete an announcement, its associations and all of its view records.
  /// Returns `false` if nothing was deleted.
  fn delete_announcement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Reconcile the stored department set with `desired` and return the
  /// changes that were applied.
  fn sync_departments(
    &self,
    id: Uuid,
    desired: BTreeSet<Uuid>,
  ) -> impl Future<Output = Result<Reconciliation, Self::Error>> + Send + '_;

  /// Reconcile the stored branch set with `desired`.
  fn sync_branches(
    &self,
    id: Uuid,
    desired: BTreeSet<Uuid>,
  ) -> impl Future<Output = Result<Reconciliation, Self::Error>> + Send + '_;
}

/// Read access to the organisation directory, plus the inserts needed to seed
/// it.
pub trait DirectoryStore: Store {
  fn add_branch(
    &self,
    branch: Branch,
  ) -> impl Future<Output = Result<Branch, Self::Error>> + Send + '_;

  fn add_department(
    &self,
    department: Department,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_;

  fn add_employee(
    &self,
    employee: Employee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_branch(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Branch>, Self::Error>> + Send + '_;

  fn get_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  /// Departments of the tenant, by name.
  fn list_departments(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_;

  /// Every employee of the tenant, whatever their status or email.
  fn list_employees(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;
}

/// View records. Implementations must guarantee at most one row per
/// `(announcement_id, employee_id)` with an atomic guard (a uniqueness
/// constraint or compare-and-swap), never check-then-insert.
pub trait ViewStore: Store {
  fn insert_view(
    &self,
    announcement_id: Uuid,
    employee_id: Uuid,
    viewed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<ViewInsert, Self::Error>> + Send + '_;

  fn count_views(
    &self,
    announcement_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn list_viewers(
    &self,
    announcement_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AnnouncementView>, Self::Error>> + Send + '_;
}
