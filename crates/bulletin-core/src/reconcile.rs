//! Set reconciliation for many-to-many associations.
//!
//! Instead of detaching everything and re-attaching the desired set, callers
//! compute the difference once and apply only the rows that change.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The writes needed to turn the current association set into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
  pub to_add:    BTreeSet<Uuid>,
  pub to_remove: BTreeSet<Uuid>,
}

impl Reconciliation {
  pub fn is_noop(&self) -> bool {
    self.to_add.is_empty() && self.to_remove.is_empty()
  }
}

/// `to_add = desired - current`, `to_remove = current - desired`.
pub fn reconcile(
  current: &BTreeSet<Uuid>,
  desired: &BTreeSet<Uuid>,
) -> Reconciliation {
  Reconciliation {
    to_add:    desired.difference(current).copied().collect(),
    to_remove: current.difference(desired).copied().collect(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(n: usize) -> Vec<Uuid> { (0..n).map(|_| Uuid::new_v4()).collect() }

  #[test]
  fn identical_sets_need_no_writes() {
    let v = ids(3);
    let set: BTreeSet<_> = v.into_iter().collect();
    assert!(reconcile(&set, &set).is_noop());
  }

  #[test]
  fn computes_both_halves() {
    let v = ids(4);
    let current: BTreeSet<_> = [v[0], v[1], v[2]].into();
    let desired: BTreeSet<_> = [v[1], v[2], v[3]].into();

    let r = reconcile(&current, &desired);
    assert_eq!(r.to_add, BTreeSet::from([v[3]]));
    assert_eq!(r.to_remove, BTreeSet::from([v[0]]));
  }

  #[test]
  fn clearing_removes_everything() {
    let current: BTreeSet<_> = ids(2).into_iter().collect();
    let r = reconcile(&current, &BTreeSet::new());
    assert!(r.to_add.is_empty());
    assert_eq!(r.to_remove, current);
  }
}
