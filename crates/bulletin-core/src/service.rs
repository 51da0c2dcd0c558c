//! [`AnnouncementService`]: the store, audience resolution, view tracking,
//! statistics and dispatch behind one tenant-scoped API.
//!
//! Announcement writes succeed or fail on validation and persistence alone.
//! Dispatch runs afterwards and its outcome is reported, never raised.

use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  announcement::{Announcement, AnnouncementInput, AnnouncementStatus},
  audience::{self, Audience},
  directory::Department,
  dispatch::{DispatchReport, NotificationDispatcher, Transport},
  stats::{self, Targets, ViewStatistics},
  store::{
    AnnouncementQuery, AnnouncementStore, AnnouncementUpdate, DirectoryStore,
    ListOrder, ViewStore,
  },
  tenant::TenantScope,
  validate::{normalize_scope, validate_input},
  views::ViewTracker,
};

/// An announcement after a successful write, with the dispatch it triggered.
///
/// `dispatch` is `None` when the audience could not be loaded; the write
/// itself still stands.
#[derive(Debug, Clone, Serialize)]
pub struct Published {
  pub announcement: Announcement,
  pub dispatch:     Option<DispatchReport>,
}

/// Number of entries in [`Dashboard::upcoming`].
pub const UPCOMING_LIMIT: usize = 5;

/// Announcement board groupings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  /// High priority first, then featured, then newest.
  pub all:           Vec<Announcement>,
  pub featured:      Vec<Announcement>,
  pub high_priority: Vec<Announcement>,
  /// The next few to start, soonest first.
  pub upcoming:      Vec<Announcement>,
}

/// An announcement together with its current view statistics.
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementDetail {
  pub announcement: Announcement,
  pub statistics:   ViewStatistics,
}

pub struct AnnouncementService<S, T> {
  store:      Arc<S>,
  dispatcher: NotificationDispatcher<T>,
}

impl<S, T> AnnouncementService<S, T>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  pub fn new(store: Arc<S>, dispatcher: NotificationDispatcher<T>) -> Self {
    Self { store, dispatcher }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn dispatcher(&self) -> &NotificationDispatcher<T> { &self.dispatcher }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Validate and persist a new announcement, then notify its audience.
  pub async fn create(
    &self,
    scope: TenantScope,
    input: AnnouncementInput,
  ) -> Result<Published> {
    let input = self.prepare(scope, input).await?;
    let announcement = self
      .store
      .create_announcement(scope.tenant_id, input)
      .await
      .map_err(Error::store)?;

    tracing::info!(
      announcement_id = %announcement.announcement_id,
      tenant_id = %scope.tenant_id,
      "announcement created"
    );

    let dispatch = self.notify(scope, &announcement).await;
    Ok(Published { announcement, dispatch })
  }

  /// Validate and apply an update together with its target sets, then
  /// notify the resulting audience.
  pub async fn update(
    &self,
    scope: TenantScope,
    id: Uuid,
    input: AnnouncementInput,
  ) -> Result<Published> {
    self.owned(scope, id).await?;
    let input = self.prepare(scope, input).await?;

    let AnnouncementUpdate { announcement, departments, branches } = self
      .store
      .update_announcement(id, input)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AnnouncementNotFound(id))?;

    tracing::info!(
      announcement_id = %id,
      departments_added = departments.to_add.len(),
      departments_removed = departments.to_remove.len(),
      branches_added = branches.to_add.len(),
      branches_removed = branches.to_remove.len(),
      "announcement updated"
    );

    let dispatch = self.notify(scope, &announcement).await;
    Ok(Published { announcement, dispatch })
  }

  /// Delete an announcement with its associations and view records.
  pub async fn delete(&self, scope: TenantScope, id: Uuid) -> Result<()> {
    self.owned(scope, id).await?;
    let deleted = self
      .store
      .delete_announcement(id)
      .await
      .map_err(Error::store)?;
    if !deleted {
      return Err(Error::AnnouncementNotFound(id));
    }
    tracing::info!(announcement_id = %id, "announcement deleted");
    Ok(())
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub async fn get(&self, scope: TenantScope, id: Uuid) -> Result<Announcement> {
    self.owned(scope, id).await
  }

  pub async fn list(
    &self,
    scope: TenantScope,
    query: AnnouncementQuery,
  ) -> Result<Vec<Announcement>> {
    self
      .store
      .list_announcements(scope.tenant_id, query)
      .await
      .map_err(Error::store)
  }

  /// Load an announcement with its statistics. When `viewer` names an
  /// employee of the tenant, their view is recorded after the statistics
  /// are taken; other viewers (administrators without an employee record)
  /// are not tracked.
  pub async fn show(
    &self,
    scope: TenantScope,
    id: Uuid,
    viewer: Option<Uuid>,
  ) -> Result<AnnouncementDetail> {
    let announcement = self.owned(scope, id).await?;
    let statistics = self.statistics_for(scope, &announcement).await?;

    if let Some(employee_id) = viewer {
      match self.record_view(scope, id, employee_id).await {
        Ok(_) | Err(Error::EmployeeNotFound(_)) => {}
        Err(e) => return Err(e),
      }
    }

    Ok(AnnouncementDetail { announcement, statistics })
  }

  /// The grouped listings shown on the announcement board, as of `today`
  /// (the current UTC date when `None`).
  pub async fn dashboard(
    &self,
    scope: TenantScope,
    today: Option<NaiveDate>,
  ) -> Result<Dashboard> {
    let all = self
      .list(scope, AnnouncementQuery { order: ListOrder::Priority, ..Default::default() })
      .await?;
    let featured = self
      .list(scope, AnnouncementQuery { featured_only: true, ..Default::default() })
      .await?;
    let high_priority = self
      .list(scope, AnnouncementQuery { high_priority: Some(true), ..Default::default() })
      .await?;
    let upcoming = self
      .list(scope, AnnouncementQuery {
        status: Some(AnnouncementStatus::Upcoming),
        today,
        order: ListOrder::StartDate,
        limit: Some(UPCOMING_LIMIT),
        ..Default::default()
      })
      .await?;

    Ok(Dashboard { all, featured, high_priority, upcoming })
  }

  /// Departments of the tenant that belong to any of `branch_ids`, or every
  /// department when the set is empty.
  pub async fn departments(
    &self,
    scope: TenantScope,
    branch_ids: &BTreeSet<Uuid>,
  ) -> Result<Vec<Department>> {
    let departments = self
      .store
      .list_departments(scope.tenant_id)
      .await
      .map_err(Error::store)?;
    Ok(
      departments
        .into_iter()
        .filter(|d| {
          branch_ids.is_empty() || d.branch_id.is_some_and(|b| branch_ids.contains(&b))
        })
        .collect(),
    )
  }

  /// Idempotently record that `employee_id` has seen announcement `id`.
  /// Returns whether this call wrote the record.
  pub async fn mark_viewed(
    &self,
    scope: TenantScope,
    id: Uuid,
    employee_id: Uuid,
  ) -> Result<bool> {
    self.owned(scope, id).await?;
    self.record_view(scope, id, employee_id).await
  }

  pub async fn view_count(&self, scope: TenantScope, id: Uuid) -> Result<u64> {
    self.owned(scope, id).await?;
    ViewTracker::new(self.store.as_ref())
      .view_count(id)
      .await
      .map_err(Error::store)
  }

  pub async fn statistics(
    &self,
    scope: TenantScope,
    id: Uuid,
  ) -> Result<ViewStatistics> {
    let announcement = self.owned(scope, id).await?;
    self.statistics_for(scope, &announcement).await
  }

  /// The current audience of announcement `id`.
  pub async fn audience(&self, scope: TenantScope, id: Uuid) -> Result<Audience> {
    let announcement = self.owned(scope, id).await?;
    self.audience_of(scope, &announcement).await
  }

  // ── Dispatch ────────────────────────────────────────────────────────────

  /// Re-send announcement `id` to its current audience.
  pub async fn dispatch(
    &self,
    scope: TenantScope,
    id: Uuid,
  ) -> Result<DispatchReport> {
    let announcement = self.owned(scope, id).await?;
    let audience = self.audience_of(scope, &announcement).await?;
    Ok(self.dispatcher.dispatch(&announcement, audience.iter()).await)
  }

  // ── Internals ───────────────────────────────────────────────────────────

  async fn owned(&self, scope: TenantScope, id: Uuid) -> Result<Announcement> {
    let announcement = self
      .store
      .get_announcement(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AnnouncementNotFound(id))?;

    if !scope.contains(announcement.tenant_id) {
      tracing::warn!(
        announcement_id = %id,
        tenant_id = %scope.tenant_id,
        "announcement requested from another tenant"
      );
      return Err(Error::Forbidden(id));
    }
    Ok(announcement)
  }

  /// Validation, scope normalisation and target ownership checks. Nothing
  /// is written here.
  async fn prepare(
    &self,
    scope: TenantScope,
    input: AnnouncementInput,
  ) -> Result<AnnouncementInput> {
    validate_input(&input)?;
    let input = normalize_scope(input);

    for &id in &input.department_ids {
      let department = self.store.get_department(id).await.map_err(Error::store)?;
      if !department.is_some_and(|d| scope.contains(d.tenant_id)) {
        return Err(Error::Validation(format!("invalid department selection: {id}")));
      }
    }
    for &id in &input.branch_ids {
      let branch = self.store.get_branch(id).await.map_err(Error::store)?;
      if !branch.is_some_and(|b| scope.contains(b.tenant_id)) {
        return Err(Error::Validation(format!("invalid branch selection: {id}")));
      }
    }

    Ok(input)
  }

  async fn record_view(
    &self,
    scope: TenantScope,
    id: Uuid,
    employee_id: Uuid,
  ) -> Result<bool> {
    let employee = self
      .store
      .get_employee(employee_id)
      .await
      .map_err(Error::store)?;
    if !employee.is_some_and(|e| scope.contains(e.tenant_id)) {
      return Err(Error::EmployeeNotFound(employee_id));
    }

    ViewTracker::new(self.store.as_ref())
      .mark_viewed(id, employee_id)
      .await
      .map_err(Error::store)
  }

  async fn audience_of(
    &self,
    scope: TenantScope,
    announcement: &Announcement,
  ) -> Result<Audience> {
    let employees = self
      .store
      .list_employees(scope.tenant_id)
      .await
      .map_err(Error::store)?;
    Ok(audience::resolve(announcement, &scope, employees))
  }

  async fn statistics_for(
    &self,
    scope: TenantScope,
    announcement: &Announcement,
  ) -> Result<ViewStatistics> {
    let audience = self.audience_of(scope, announcement).await?;
    let viewers: BTreeSet<Uuid> = self
      .store
      .list_viewers(announcement.announcement_id)
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|v| v.employee_id)
      .collect();

    let branch = match stats::representative(&announcement.branch_ids) {
      Some(id) => self.store.get_branch(id).await.map_err(Error::store)?,
      None => None,
    };
    let department = match stats::representative(&announcement.department_ids) {
      Some(id) => self.store.get_department(id).await.map_err(Error::store)?,
      None => None,
    };

    Ok(stats::aggregate(
      announcement,
      &audience,
      &viewers,
      Targets {
        branch:     branch.as_ref(),
        department: department.as_ref(),
      },
    ))
  }

  /// Resolve the audience once and dispatch to that snapshot. Failures to
  /// load the audience are logged and reported as `None`.
  async fn notify(
    &self,
    scope: TenantScope,
    announcement: &Announcement,
  ) -> Option<DispatchReport> {
    match self.audience_of(scope, announcement).await {
      Ok(audience) => {
        Some(self.dispatcher.dispatch(announcement, audience.iter()).await)
      }
      Err(e) => {
        tracing::error!(
          announcement_id = %announcement.announcement_id,
          error = %e,
          "failed to resolve announcement audience; notifications not sent"
        );
        None
      }
    }
  }
}
