//! Idempotent view tracking.

use chrono::Utc;
use uuid::Uuid;

use crate::store::{ViewInsert, ViewStore};

/// Records that employees have seen announcements.
///
/// The tracker holds no locks of its own. Correctness under concurrent
/// requests, including requests served by different processes, comes from the
/// store's uniqueness guarantee on `(announcement_id, employee_id)`.
pub struct ViewTracker<'s, S> {
  store: &'s S,
}

impl<'s, S: ViewStore> ViewTracker<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  /// Record a view. Returns `true` if this call wrote the record and `false`
  /// if one already existed; neither case is an error.
  pub async fn mark_viewed(
    &self,
    announcement_id: Uuid,
    employee_id: Uuid,
  ) -> Result<bool, S::Error> {
    let outcome = self
      .store
      .insert_view(announcement_id, employee_id, Utc::now())
      .await?;

    let recorded = outcome == ViewInsert::Inserted;
    tracing::debug!(
      %announcement_id,
      %employee_id,
      recorded,
      "announcement view"
    );
    Ok(recorded)
  }

  /// Number of employees who have viewed the announcement.
  pub async fn view_count(&self, announcement_id: Uuid) -> Result<u64, S::Error> {
    self.store.count_views(announcement_id).await
  }
}
