//! Audience resolution: who is an announcement addressed to?

use std::collections::{BTreeMap, btree_map};

use serde::Serialize;
use uuid::Uuid;

use crate::{announcement::Announcement, directory::Employee, tenant::TenantScope};

/// A set of employees keyed by identity. Iteration order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Audience {
  members: BTreeMap<Uuid, Employee>,
}

impl Audience {
  pub fn len(&self) -> usize { self.members.len() }

  pub fn is_empty(&self) -> bool { self.members.is_empty() }

  pub fn contains(&self, employee_id: Uuid) -> bool {
    self.members.contains_key(&employee_id)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Employee> {
    self.members.values()
  }

  pub fn into_vec(self) -> Vec<Employee> { self.members.into_values().collect() }
}

impl FromIterator<Employee> for Audience {
  fn from_iter<I: IntoIterator<Item = Employee>>(iter: I) -> Self {
    Self {
      members: iter.into_iter().map(|e| (e.employee_id, e)).collect(),
    }
  }
}

impl IntoIterator for Audience {
  type IntoIter = btree_map::IntoValues<Uuid, Employee>;
  type Item = Employee;

  fn into_iter(self) -> Self::IntoIter { self.members.into_values() }
}

/// Compute the audience of `announcement` among `employees`.
///
/// Only eligible employees inside `scope` are considered. Company-wide
/// announcements reach all of them; scoped ones reach employees in any of
/// the target departments *or* any of the target branches. A scoped
/// announcement with no targets resolves to nobody.
pub fn resolve(
  announcement: &Announcement,
  scope: &TenantScope,
  employees: impl IntoIterator<Item = Employee>,
) -> Audience {
  let scoped_without_targets = !announcement.is_company_wide
    && announcement.department_ids.is_empty()
    && announcement.branch_ids.is_empty();

  if scoped_without_targets {
    tracing::warn!(
      announcement_id = %announcement.announcement_id,
      "scoped announcement has no target departments or branches"
    );
    return Audience::default();
  }

  let audience: Audience = employees
    .into_iter()
    .filter(|e| scope.contains(e.tenant_id) && e.is_eligible())
    .filter(|e| announcement.is_company_wide || is_targeted(announcement, e))
    .collect();

  tracing::debug!(
    announcement_id = %announcement.announcement_id,
    is_company_wide = announcement.is_company_wide,
    audience = audience.len(),
    "resolved announcement audience"
  );

  audience
}

fn is_targeted(announcement: &Announcement, employee: &Employee) -> bool {
  let in_department = employee
    .department_id
    .is_some_and(|d| announcement.department_ids.contains(&d));
  let in_branch = employee
    .branch_id
    .is_some_and(|b| announcement.branch_ids.contains(&b));
  in_department || in_branch
}
