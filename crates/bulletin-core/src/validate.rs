//! Write-time validation for announcement input.
//!
//! Everything here runs before persistence; a rejected input leaves no state
//! behind. Tenant ownership of the referenced departments and branches needs
//! the directory and is checked by [`crate::service::AnnouncementService`].

use validator::Validate as _;

use crate::{Error, Result, announcement::AnnouncementInput};

/// Field-level rules plus the cross-field ones the derive cannot express.
pub fn validate_input(input: &AnnouncementInput) -> Result<()> {
  input
    .validate()
    .map_err(|e| Error::Validation(e.to_string()))?;

  if let Some(end) = input.end_date
    && end < input.start_date
  {
    return Err(Error::Validation(
      "end date must be on or after the start date".into(),
    ));
  }

  if !input.is_company_wide
    && input.department_ids.is_empty()
    && input.branch_ids.is_empty()
  {
    return Err(Error::Validation(
      "you must select at least one department or branch if the \
       announcement is not company-wide"
        .into(),
    ));
  }

  Ok(())
}

/// Drop targets from a company-wide input so the stored associations end up
/// empty.
pub fn normalize_scope(mut input: AnnouncementInput) -> AnnouncementInput {
  if input.is_company_wide {
    input.department_ids.clear();
    input.branch_ids.clear();
  }
  input
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;

  fn input() -> AnnouncementInput {
    AnnouncementInput::new(
      "Quarterly town hall",
      "events",
      "Join us in the main hall.",
      NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
    )
  }

  #[test]
  fn company_wide_input_passes() {
    assert!(validate_input(&input()).is_ok());
  }

  #[test]
  fn scoped_input_without_targets_is_rejected() {
    let scoped = input().scoped([], []);
    let err = validate_input(&scoped).unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m.contains("at least one")));
  }

  #[test]
  fn scoped_input_with_a_branch_passes() {
    let scoped = input().scoped([], [Uuid::new_v4()]);
    assert!(validate_input(&scoped).is_ok());
  }

  #[test]
  fn end_before_start_is_rejected() {
    let mut reversed = input();
    reversed.end_date = NaiveDate::from_ymd_opt(2025, 3, 31);
    assert!(matches!(validate_input(&reversed), Err(Error::Validation(_))));
  }

  #[test]
  fn blank_and_oversized_fields_are_rejected() {
    let mut blank = input();
    blank.title = String::new();
    assert!(matches!(validate_input(&blank), Err(Error::Validation(_))));

    let mut long = input();
    long.category = "x".repeat(256);
    assert!(matches!(validate_input(&long), Err(Error::Validation(_))));

    let mut empty_body = input();
    empty_body.content = String::new();
    assert!(matches!(validate_input(&empty_body), Err(Error::Validation(_))));
  }

  #[test]
  fn normalize_clears_targets_of_company_wide_input() {
    let mut wide = input();
    wide.department_ids.insert(Uuid::new_v4());
    wide.branch_ids.insert(Uuid::new_v4());
    let wide = normalize_scope(wide);
    assert!(wide.department_ids.is_empty());
    assert!(wide.branch_ids.is_empty());

    let scoped = normalize_scope(input().scoped([Uuid::new_v4()], []));
    assert_eq!(scoped.department_ids.len(), 1);
  }
}
