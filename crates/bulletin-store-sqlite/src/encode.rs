//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD` (so they
//! compare correctly as text) and UUIDs are hyphenated lowercase strings.

use std::{collections::BTreeSet, str::FromStr as _};

use bulletin_core::{
  announcement::{Announcement, AnnouncementView},
  directory::{Branch, Department, Employee, EmployeeStatus},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

pub fn decode_uuid_set(ids: &[String]) -> Result<BTreeSet<Uuid>> {
  ids.iter().map(|s| decode_uuid(s)).collect()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Fixed precision so that stored timestamps order correctly as text.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── EmployeeStatus ───────────────────────────────────────────────────────────

pub fn encode_status(status: EmployeeStatus) -> &'static str { status.into() }

pub fn decode_status(s: &str) -> Result<EmployeeStatus> {
  EmployeeStatus::from_str(s).map_err(|_| Error::Decode {
    column: "employees.status",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column values of an `announcements` row in insert/update order, plus the
/// association ids.
pub struct AnnouncementRow {
  pub announcement_id:  String,
  pub tenant_id:        String,
  pub title:            String,
  pub category:         String,
  pub description:      Option<String>,
  pub content:          String,
  pub start_date:       String,
  pub end_date:         Option<String>,
  pub attachments:      Option<String>,
  pub is_featured:      bool,
  pub is_high_priority: bool,
  pub is_company_wide:  bool,
  pub created_at:       String,
  pub updated_at:       String,
  pub department_ids:   Vec<String>,
  pub branch_ids:       Vec<String>,
}

impl AnnouncementRow {
  pub fn encode(a: &Announcement) -> Self {
    Self {
      announcement_id:  encode_uuid(a.announcement_id),
      tenant_id:        encode_uuid(a.tenant_id),
      title:            a.title.clone(),
      category:         a.category.clone(),
      description:      a.description.clone(),
      content:          a.content.clone(),
      start_date:       encode_date(a.start_date),
      end_date:         a.end_date.map(encode_date),
      attachments:      a.attachments.clone(),
      is_featured:      a.is_featured,
      is_high_priority: a.is_high_priority,
      is_company_wide:  a.is_company_wide,
      created_at:       encode_dt(a.created_at),
      updated_at:       encode_dt(a.updated_at),
      department_ids:   a.department_ids.iter().copied().map(encode_uuid).collect(),
      branch_ids:       a.branch_ids.iter().copied().map(encode_uuid).collect(),
    }
  }

  pub fn into_announcement(self) -> Result<Announcement> {
    Ok(Announcement {
      announcement_id:  decode_uuid(&self.announcement_id)?,
      tenant_id:        decode_uuid(&self.tenant_id)?,
      title:            self.title,
      category:         self.category,
      description:      self.description,
      content:          self.content,
      start_date:       decode_date(&self.start_date)?,
      end_date:         self.end_date.as_deref().map(decode_date).transpose()?,
      attachments:      self.attachments,
      is_featured:      self.is_featured,
      is_high_priority: self.is_high_priority,
      is_company_wide:  self.is_company_wide,
      department_ids:   decode_uuid_set(&self.department_ids)?,
      branch_ids:       decode_uuid_set(&self.branch_ids)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawBranch {
  pub branch_id: String,
  pub tenant_id: String,
  pub name:      String,
}

impl RawBranch {
  pub fn into_branch(self) -> Result<Branch> {
    Ok(Branch {
      branch_id: decode_uuid(&self.branch_id)?,
      tenant_id: decode_uuid(&self.tenant_id)?,
      name:      self.name,
    })
  }
}

pub struct RawDepartment {
  pub department_id: String,
  pub tenant_id:     String,
  pub branch_id:     Option<String>,
  pub name:          String,
}

impl RawDepartment {
  pub fn into_department(self) -> Result<Department> {
    Ok(Department {
      department_id: decode_uuid(&self.department_id)?,
      tenant_id:     decode_uuid(&self.tenant_id)?,
      branch_id:     decode_opt_uuid(self.branch_id.as_deref())?,
      name:          self.name,
    })
  }
}

pub struct RawEmployee {
  pub employee_id:   String,
  pub tenant_id:     String,
  pub name:          String,
  pub email:         String,
  pub status:        String,
  pub department_id: Option<String>,
  pub branch_id:     Option<String>,
}

impl RawEmployee {
  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id:   decode_uuid(&self.employee_id)?,
      tenant_id:     decode_uuid(&self.tenant_id)?,
      name:          self.name,
      email:         self.email,
      status:        decode_status(&self.status)?,
      department_id: decode_opt_uuid(self.department_id.as_deref())?,
      branch_id:     decode_opt_uuid(self.branch_id.as_deref())?,
    })
  }
}

pub struct RawView {
  pub announcement_id: String,
  pub employee_id:     String,
  pub viewed_at:       String,
}

impl RawView {
  pub fn into_view(self) -> Result<AnnouncementView> {
    Ok(AnnouncementView {
      announcement_id: decode_uuid(&self.announcement_id)?,
      employee_id:     decode_uuid(&self.employee_id)?,
      viewed_at:       decode_dt(&self.viewed_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_as_text() {
    let earlier = encode_date(NaiveDate::from_ymd_opt(2025, 2, 9).unwrap());
    let later = encode_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    assert_eq!(earlier, "2025-02-09");
    assert!(earlier < later);
    assert_eq!(
      decode_date(&later).unwrap(),
      NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    );
  }

  #[test]
  fn status_text_round_trips() {
    for status in [EmployeeStatus::Active, EmployeeStatus::Inactive] {
      assert_eq!(decode_status(encode_status(status)).unwrap(), status);
    }
    assert_eq!(encode_status(EmployeeStatus::Inactive), "inactive");
  }

  #[test]
  fn unknown_status_is_a_decode_error() {
    assert_eq!(decode_status("inactive").unwrap(), EmployeeStatus::Inactive);
    assert!(matches!(
      decode_status("retired"),
      Err(Error::Decode { column: "employees.status", .. })
    ));
  }
}
