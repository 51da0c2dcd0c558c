//! Handlers for `/announcements` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/announcements` | `?search=&category=&department_id=&branch_id=&status=&featured=&high_priority=&date_from=&date_to=&order=&limit=&offset=` |
//! | `GET`    | `/announcements/dashboard` | Board groupings; `?today=` overrides the reference date |
//! | `POST`   | `/announcements` | Body: `AnnouncementInput`; 201 with the dispatch report |
//! | `GET`    | `/announcements/{id}` | Records the caller's view when they are an employee |
//! | `PUT`    | `/announcements/{id}` | Body: `AnnouncementInput` |
//! | `DELETE` | `/announcements/{id}` | 204 |
//! | `POST`   | `/announcements/{id}/read` | Requires `x-employee-id` |
//! | `GET`    | `/announcements/{id}/statistics` | |
//! | `POST`   | `/announcements/{id}/dispatch` | Re-send to the current audience |
//! | `GET`    | `/departments` | `?branch_ids=a,b` narrows to those branches |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bulletin_core::{
  announcement::{Announcement, AnnouncementInput, AnnouncementStatus},
  dispatch::{DispatchReport, Transport},
  directory::Department,
  service::{AnnouncementDetail, AnnouncementService, Dashboard, Published},
  stats::ViewStatistics,
  store::{AnnouncementQuery, AnnouncementStore, DirectoryStore, ListOrder, ViewStore},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{error::ApiError, session::Session};

type Service<S, T> = State<Arc<AnnouncementService<S, T>>>;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub search:        Option<String>,
  pub category:      Option<String>,
  pub department_id: Option<Uuid>,
  pub branch_id:     Option<Uuid>,
  pub status:        Option<AnnouncementStatus>,
  #[serde(default)]
  pub featured:      bool,
  pub high_priority: Option<bool>,
  pub date_from:     Option<NaiveDate>,
  pub date_to:       Option<NaiveDate>,
  #[serde(default)]
  pub order:         ListOrder,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

impl From<ListParams> for AnnouncementQuery {
  fn from(params: ListParams) -> Self {
    AnnouncementQuery {
      text:          params.search,
      category:      params.category.filter(|c| !c.trim().is_empty()),
      department_id: params.department_id,
      branch_id:     params.branch_id,
      status:        params.status,
      today:         None,
      featured_only: params.featured,
      high_priority: params.high_priority,
      date_from:     params.date_from,
      date_to:       params.date_to,
      order:         params.order,
      limit:         params.limit,
      offset:        params.offset,
    }
  }
}

/// `GET /announcements`
pub async fn list<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Announcement>>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  let announcements = service.list(session.scope, params.into()).await?;
  Ok(Json(announcements))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
  pub today: Option<NaiveDate>,
}

/// `GET /announcements/dashboard`
pub async fn dashboard<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  Ok(Json(service.dashboard(session.scope, params.today).await?))
}

// ─── Create / update / delete ─────────────────────────────────────────────────

/// `POST /announcements`
pub async fn create<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Json(input): Json<AnnouncementInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  let published: Published = service.create(session.scope, input).await?;
  Ok((StatusCode::CREATED, Json(published)))
}

/// `PUT /announcements/{id}`
pub async fn update<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Path(id): Path<Uuid>,
  Json(input): Json<AnnouncementInput>,
) -> Result<Json<Published>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  Ok(Json(service.update(session.scope, id, input).await?))
}

/// `DELETE /announcements/{id}`
pub async fn delete<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  service.delete(session.scope, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /announcements/{id}`
pub async fn get_one<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Path(id): Path<Uuid>,
) -> Result<Json<AnnouncementDetail>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  let detail = service.show(session.scope, id, session.employee_id).await?;
  Ok(Json(detail))
}

/// `POST /announcements/{id}/read`
pub async fn mark_read<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  let employee_id = session.employee()?;
  service.mark_viewed(session.scope, id, employee_id).await?;
  Ok(Json(json!({ "success": true })))
}

/// `GET /announcements/{id}/statistics`
pub async fn statistics<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Path(id): Path<Uuid>,
) -> Result<Json<ViewStatistics>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  Ok(Json(service.statistics(session.scope, id).await?))
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// `POST /announcements/{id}/dispatch`
pub async fn dispatch<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Path(id): Path<Uuid>,
) -> Result<Json<DispatchReport>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  Ok(Json(service.dispatch(session.scope, id).await?))
}

// ─── Directory ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentParams {
  /// Comma-separated branch ids.
  pub branch_ids: Option<String>,
}

fn parse_ids(raw: &str) -> Result<BTreeSet<Uuid>, ApiError> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| {
      Uuid::parse_str(s).map_err(|_| ApiError::BadRequest(format!("invalid branch id: {s}")))
    })
    .collect()
}

/// `GET /departments`
pub async fn departments<S, T>(
  State(service): Service<S, T>,
  session: Session,
  Query(params): Query<DepartmentParams>,
) -> Result<Json<Vec<Department>>, ApiError>
where
  S: AnnouncementStore + DirectoryStore + ViewStore,
  T: Transport,
{
  let branch_ids = params.branch_ids.as_deref().map(parse_ids).transpose()?;
  let departments = service
    .departments(session.scope, &branch_ids.unwrap_or_default())
    .await?;
  Ok(Json(departments))
}
