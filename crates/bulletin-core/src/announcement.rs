//! Announcement entity, its write model and view records.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;
use validator::Validate;

// ─── Announcement ────────────────────────────────────────────────────────────

/// A notice published by tenant administrators.
///
/// When `is_company_wide` is set the department and branch sets are empty;
/// otherwise at least one of them is non-empty. The store does not enforce
/// this on its own: writes go through [`crate::validate`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
  pub announcement_id:  Uuid,
  /// Owning tenant.
  pub tenant_id:        Uuid,
  pub title:            String,
  pub category:         String,
  pub description:      Option<String>,
  pub content:          String,
  pub start_date:       NaiveDate,
  pub end_date:         Option<NaiveDate>,
  /// Reference into the media library; the file itself lives elsewhere.
  pub attachments:      Option<String>,
  pub is_featured:      bool,
  pub is_high_priority: bool,
  pub is_company_wide:  bool,
  pub department_ids:   BTreeSet<Uuid>,
  pub branch_ids:       BTreeSet<Uuid>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Announcement {
  pub fn status_on(&self, today: NaiveDate) -> AnnouncementStatus {
    AnnouncementStatus::at(self.start_date, self.end_date, today)
  }
}

/// Where an announcement sits relative to a reference date.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnnouncementStatus {
  Upcoming,
  Active,
  Expired,
}

impl AnnouncementStatus {
  pub fn at(
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    today: NaiveDate,
  ) -> Self {
    if start_date > today {
      Self::Upcoming
    } else if end_date.is_some_and(|end| end < today) {
      Self::Expired
    } else {
      Self::Active
    }
  }
}

// ─── Write model ─────────────────────────────────────────────────────────────

fn default_company_wide() -> bool { true }

/// Input to create and update. Field-level rules are declared here; the
/// cross-field rules live in [`crate::validate::validate_input`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnouncementInput {
  #[validate(length(min = 1, max = 255, message = "title is required (max 255 characters)"))]
  pub title:            String,
  #[validate(length(min = 1, max = 255, message = "category is required (max 255 characters)"))]
  pub category:         String,
  pub description:      Option<String>,
  #[validate(length(min = 1, message = "content is required"))]
  pub content:          String,
  pub start_date:       NaiveDate,
  pub end_date:         Option<NaiveDate>,
  pub attachments:      Option<String>,
  #[serde(default)]
  pub is_featured:      bool,
  #[serde(default)]
  pub is_high_priority: bool,
  #[serde(default = "default_company_wide")]
  pub is_company_wide:  bool,
  #[serde(default)]
  pub department_ids:   BTreeSet<Uuid>,
  #[serde(default)]
  pub branch_ids:       BTreeSet<Uuid>,
}

impl AnnouncementInput {
  /// A company-wide input with the required fields filled in.
  pub fn new(
    title: impl Into<String>,
    category: impl Into<String>,
    content: impl Into<String>,
    start_date: NaiveDate,
  ) -> Self {
    Self {
      title: title.into(),
      category: category.into(),
      description: None,
      content: content.into(),
      start_date,
      end_date: None,
      attachments: None,
      is_featured: false,
      is_high_priority: false,
      is_company_wide: true,
      department_ids: BTreeSet::new(),
      branch_ids: BTreeSet::new(),
    }
  }

  /// Restrict the input to the given departments and branches.
  pub fn scoped(
    mut self,
    departments: impl IntoIterator<Item = Uuid>,
    branches: impl IntoIterator<Item = Uuid>,
  ) -> Self {
    self.is_company_wide = false;
    self.department_ids = departments.into_iter().collect();
    self.branch_ids = branches.into_iter().collect();
    self
  }
}

// ─── View records ────────────────────────────────────────────────────────────

/// The fact that an employee has seen an announcement. At most one exists per
/// `(announcement_id, employee_id)` pair; rows are never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementView {
  pub announcement_id: Uuid,
  pub employee_id:     Uuid,
  pub viewed_at:       DateTime<Utc>,
}
