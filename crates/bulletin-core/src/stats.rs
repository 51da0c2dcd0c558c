//! View statistics scoped to an announcement's audience.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  announcement::Announcement,
  audience::Audience,
  directory::{Branch, Department, Employee},
};

/// Figures for one target branch or department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStats {
  pub name:       String,
  pub total:      u64,
  pub viewed:     u64,
  pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatistics {
  pub view_count:       u64,
  pub total_employees:  u64,
  pub view_percentage:  u32,
  pub department_stats: Vec<TargetStats>,
  pub branch_stats:     Vec<TargetStats>,
}

/// The single branch and department that breakdowns are reported against.
///
/// Associations are many-to-many, but breakdowns only cover one
/// representative of each; see [`representative`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Targets<'a> {
  pub branch:     Option<&'a Branch>,
  pub department: Option<&'a Department>,
}

/// The representative of an association set: its lowest id.
pub fn representative(ids: &BTreeSet<Uuid>) -> Option<Uuid> {
  ids.first().copied()
}

/// `round(part / whole * 100)` with halves rounded up; `0` when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u32 {
  if whole == 0 {
    return 0;
  }
  // (2 * 100 * part + whole) / (2 * whole) == floor(100 * part / whole + 1/2)
  let scaled = (200 * u128::from(part) + u128::from(whole)) / (2 * u128::from(whole));
  u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Aggregate view figures for `announcement` over its resolved `audience`.
///
/// `viewers` holds the ids of every employee with a view record; only
/// audience members count towards the figures. Breakdowns are produced for
/// scoped announcements only.
pub fn aggregate(
  announcement: &Announcement,
  audience: &Audience,
  viewers: &BTreeSet<Uuid>,
  targets: Targets<'_>,
) -> ViewStatistics {
  let (total, viewed) = tally(audience.iter(), viewers);

  let mut branch_stats = Vec::new();
  let mut department_stats = Vec::new();

  if !announcement.is_company_wide {
    if let Some(branch) = targets.branch {
      let members = audience
        .iter()
        .filter(|e| e.branch_id == Some(branch.branch_id));
      branch_stats.push(target_stats(&branch.name, members, viewers));
    }
    if let Some(department) = targets.department {
      let members = audience
        .iter()
        .filter(|e| e.department_id == Some(department.department_id));
      department_stats.push(target_stats(&department.name, members, viewers));
    }
  }

  ViewStatistics {
    view_count: viewed,
    total_employees: total,
    view_percentage: percentage(viewed, total),
    department_stats,
    branch_stats,
  }
}

fn tally<'a>(
  members: impl Iterator<Item = &'a Employee>,
  viewers: &BTreeSet<Uuid>,
) -> (u64, u64) {
  members.fold((0, 0), |(total, viewed), e| {
    (total + 1, viewed + u64::from(viewers.contains(&e.employee_id)))
  })
}

fn target_stats<'a>(
  name: &str,
  members: impl Iterator<Item = &'a Employee>,
  viewers: &BTreeSet<Uuid>,
) -> TargetStats {
  let (total, viewed) = tally(members, viewers);
  TargetStats {
    name: name.to_owned(),
    total,
    viewed,
    percentage: percentage(viewed, total),
  }
}
