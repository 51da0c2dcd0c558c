//! JSON REST API for Bulletin.
//!
//! Exposes an axum [`Router`] backed by an
//! [`AnnouncementService`](bulletin_core::service::AnnouncementService) over
//! any store and transport. Authentication is the caller's responsibility;
//! tenant and employee identity arrive as trusted headers (see [`Session`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bulletin_api::api_router(service.clone()))
//! ```

pub mod announcements;
pub mod error;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use bulletin_core::{
  dispatch::Transport,
  service::AnnouncementService,
  store::{AnnouncementStore, DirectoryStore, ViewStore},
};

pub use error::ApiError;
pub use session::Session;

/// Build a fully-materialised API router for `service`.
pub fn api_router<S, T>(service: Arc<AnnouncementService<S, T>>) -> Router<()>
where
  S: AnnouncementStore + DirectoryStore + ViewStore + 'static,
  T: Transport + 'static,
{
  use announcements as a;

  Router::new()
    .route("/announcements", get(a::list::<S, T>).post(a::create::<S, T>))
    .route("/announcements/dashboard", get(a::dashboard::<S, T>))
    .route(
      "/announcements/{id}",
      get(a::get_one::<S, T>)
        .put(a::update::<S, T>)
        .delete(a::delete::<S, T>),
    )
    .route("/announcements/{id}/read", post(a::mark_read::<S, T>))
    .route("/announcements/{id}/statistics", get(a::statistics::<S, T>))
    .route("/announcements/{id}/dispatch", post(a::dispatch::<S, T>))
    .route("/departments", get(a::departments::<S, T>))
    .with_state(service)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use bulletin_core::{
    announcement::Announcement,
    directory::{Branch, Department, Employee, EmployeeStatus},
    dispatch::{
      DispatchSettings, NotificationDispatcher, RenderContext, RenderedNotification,
      Renderer,
    },
  };
  use bulletin_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;
  use crate::session::{EMPLOYEE_HEADER, TENANT_HEADER};

  // ── Fixtures ────────────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("mailbox unavailable")]
  struct Bounce;

  /// Records deliveries; addresses in `bouncing` fail.
  #[derive(Default)]
  struct Outbox {
    sent:     Mutex<Vec<String>>,
    bouncing: Vec<String>,
  }

  impl Transport for Outbox {
    type Error = Bounce;

    async fn send(
      &self,
      to_email: &str,
      _to_name: &str,
      _subject: &str,
      _html_body: &str,
    ) -> Result<(), Bounce> {
      if self.bouncing.iter().any(|b| b == to_email) {
        return Err(Bounce);
      }
      self.sent.lock().unwrap().push(to_email.to_owned());
      Ok(())
    }
  }

  struct Plain;

  impl Renderer for Plain {
    fn render(
      &self,
      announcement: &Announcement,
      _recipient: &Employee,
      _context: &RenderContext,
    ) -> RenderedNotification {
      RenderedNotification {
        subject:   announcement.title.clone(),
        html_body: announcement.content.clone(),
      }
    }
  }

  struct Fixture {
    service: Arc<AnnouncementService<SqliteStore, Outbox>>,
    tenant:  Uuid,
    branch:  Branch,
    sales:   Department,
    staff:   Vec<Employee>,
  }

  async fn fixture(bouncing: &[&str]) -> Fixture {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let tenant = Uuid::new_v4();
    let branch = store.add_branch(Branch::new(tenant, "Mumbai")).await.unwrap();
    let sales = store
      .add_department(Department::new(tenant, Some(branch.branch_id), "Sales"))
      .await
      .unwrap();

    let mut staff = Vec::new();
    for (i, email) in ["asha@example.com", "ravi@example.com", "meera@example.com"]
      .into_iter()
      .enumerate()
    {
      let employee = Employee {
        employee_id:   Uuid::new_v4(),
        tenant_id:     tenant,
        name:          email.split('@').next().unwrap_or_default().to_owned(),
        email:         email.to_owned(),
        status:        EmployeeStatus::Active,
        department_id: (i == 0).then_some(sales.department_id),
        branch_id:     Some(branch.branch_id),
      };
      staff.push(store.add_employee(employee).await.unwrap());
    }

    let outbox = Outbox {
      sent:     Mutex::default(),
      bouncing: bouncing.iter().map(|s| (*s).to_owned()).collect(),
    };
    let dispatcher =
      NotificationDispatcher::new(Arc::new(Plain), outbox, DispatchSettings::default());
    let service = Arc::new(AnnouncementService::new(Arc::new(store), dispatcher));

    Fixture { service, tenant, branch, sales, staff }
  }

  async fn call(
    f: &Fixture,
    method: &str,
    uri: &str,
    employee: Option<Uuid>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    call_as(f, f.tenant, method, uri, employee, body).await
  }

  async fn call_as(
    f: &Fixture,
    tenant: Uuid,
    method: &str,
    uri: &str,
    employee: Option<Uuid>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(TENANT_HEADER, tenant.to_string());
    if let Some(employee) = employee {
      builder = builder.header(EMPLOYEE_HEADER, employee.to_string());
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(f.service.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    decode(resp).await
  }

  async fn decode(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
  }

  fn input(title: &str) -> Value {
    json!({
      "title": title,
      "category": "general",
      "content": "Please read.",
      "start_date": "2025-03-01"
    })
  }

  async fn create(f: &Fixture, body: Value) -> Uuid {
    let (status, created) = call(f, "POST", "/announcements", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["announcement"]["announcement_id"]
      .as_str()
      .and_then(|s| s.parse().ok())
      .unwrap()
  }

  // ── Tests ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_dispatches_and_reports() {
    let f = fixture(&["ravi@example.com"]).await;
    let (status, body) =
      call(&f, "POST", "/announcements", None, Some(input("Town hall"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["announcement"]["is_company_wide"], true);
    assert_eq!(body["dispatch"]["attempted"], 3);
    assert_eq!(body["dispatch"]["sent"], 2);
    assert_eq!(body["dispatch"]["failed"], 1);
    assert_eq!(f.service.dispatcher().transport().sent.lock().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn validation_errors_are_400() {
    let f = fixture(&[]).await;

    let mut scoped = input("Scoped");
    scoped["is_company_wide"] = json!(false);
    let (status, body) = call(&f, "POST", "/announcements", None, Some(scoped)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least one department or branch"));

    let mut backwards = input("Backwards");
    backwards["end_date"] = json!("2025-02-01");
    let (status, _) = call(&f, "POST", "/announcements", None, Some(backwards)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&f, "POST", "/announcements", None, Some(input(""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = call(&f, "GET", "/announcements", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn missing_tenant_header_is_400() {
    let f = fixture(&[]).await;
    let req = Request::builder()
      .uri("/announcements")
      .body(Body::empty())
      .unwrap();
    let (status, body) = decode(api_router(f.service.clone()).oneshot(req).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains(TENANT_HEADER));
  }

  #[tokio::test]
  async fn show_records_view_and_reports_statistics() {
    let f = fixture(&[]).await;
    let mut scoped = input("Sales kickoff");
    scoped["is_company_wide"] = json!(false);
    scoped["branch_ids"] = json!([f.branch.branch_id]);
    scoped["department_ids"] = json!([f.sales.department_id]);
    let id = create(&f, scoped).await;
    let uri = format!("/announcements/{id}");

    let viewer = f.staff[1].employee_id;
    let (status, body) = call(&f, "GET", &uri, Some(viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    // Figures are taken before the caller's own view is recorded.
    assert_eq!(body["statistics"]["viewCount"], 0);
    assert_eq!(body["statistics"]["totalEmployees"], 3);
    assert_eq!(body["statistics"]["branchStats"][0]["name"], "Mumbai");
    assert_eq!(body["statistics"]["departmentStats"][0]["total"], 1);

    let (_, again) = call(&f, "GET", &uri, Some(viewer), None).await;
    assert_eq!(again["statistics"]["viewCount"], 1);
    assert_eq!(again["statistics"]["viewPercentage"], 33);

    // Repeat views do not count twice.
    let (_, stats) = call(&f, "GET", &format!("{uri}/statistics"), None, None).await;
    assert_eq!(stats["viewCount"], 1);
  }

  #[tokio::test]
  async fn mark_read_is_idempotent_and_needs_an_employee() {
    let f = fixture(&[]).await;
    let id = create(&f, input("Policy")).await;
    let uri = format!("/announcements/{id}/read");
    let employee = f.staff[0].employee_id;

    for _ in 0..2 {
      let (status, body) = call(&f, "POST", &uri, Some(employee), None).await;
      assert_eq!(status, StatusCode::OK);
      assert_eq!(body, json!({ "success": true }));
    }

    let (status, _) = call(&f, "POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&f, "POST", &uri, Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
      &f,
      "POST",
      &format!("/announcements/{}/read", Uuid::new_v4()),
      Some(employee),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, stats) = call(&f, "GET", &format!("/announcements/{id}/statistics"), None, None).await;
    assert_eq!(stats["viewCount"], 1);
  }

  #[tokio::test]
  async fn other_tenant_gets_403() {
    let f = fixture(&[]).await;
    let id = create(&f, input("Private")).await;
    let stranger = Uuid::new_v4();

    for (method, uri) in [
      ("GET", format!("/announcements/{id}")),
      ("DELETE", format!("/announcements/{id}")),
      ("GET", format!("/announcements/{id}/statistics")),
      ("POST", format!("/announcements/{id}/dispatch")),
    ] {
      let (status, body) = call_as(&f, stranger, method, &uri, None, None).await;
      assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
      assert!(body["error"].is_string());
    }

    let (_, list) = call_as(&f, stranger, "GET", "/announcements", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn update_list_dispatch_and_delete() {
    let f = fixture(&[]).await;
    let id = create(&f, input("Draft")).await;
    let uri = format!("/announcements/{id}");

    let mut revised = input("Final");
    revised["is_company_wide"] = json!(false);
    revised["department_ids"] = json!([f.sales.department_id]);
    revised["is_featured"] = json!(true);
    let (status, body) = call(&f, "PUT", &uri, None, Some(revised)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["announcement"]["title"], "Final");
    assert_eq!(body["dispatch"]["attempted"], 1);

    let (_, featured) =
      call(&f, "GET", "/announcements?featured=true&category=general", None, None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);
    let (_, searched) = call(&f, "GET", "/announcements?search=nothing-like-this", None, None).await;
    assert_eq!(searched.as_array().unwrap().len(), 0);

    let (status, report) = call(&f, "POST", &format!("{uri}/dispatch"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["sent"], 1);
    assert_eq!(report["outcomes"][0]["result"]["status"], "sent");

    let (status, _) = call(&f, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&f, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn targeting_filters_and_dashboard() {
    let f = fixture(&[]).await;
    let everyone = create(&f, input("Everyone")).await;

    let mut sales_only = input("Sales only");
    sales_only["is_company_wide"] = json!(false);
    sales_only["department_ids"] = json!([f.sales.department_id]);
    sales_only["is_featured"] = json!(true);
    let sales = create(&f, sales_only).await;

    let mut later = input("Later");
    later["start_date"] = json!("2999-01-01");
    later["is_high_priority"] = json!(true);
    let later = create(&f, later).await;

    let ids = |v: &Value| -> Vec<String> {
      v.as_array()
        .unwrap()
        .iter()
        .map(|a| a["announcement_id"].as_str().unwrap().to_owned())
        .collect()
    };

    let (_, for_sales) = call(
      &f,
      "GET",
      &format!("/announcements?department_id={}", f.sales.department_id),
      None,
      None,
    )
    .await;
    assert_eq!(ids(&for_sales).len(), 3);

    let (_, elsewhere) = call(
      &f,
      "GET",
      &format!("/announcements?department_id={}", Uuid::new_v4()),
      None,
      None,
    )
    .await;
    let elsewhere = ids(&elsewhere);
    assert_eq!(elsewhere.len(), 2);
    assert!(!elsewhere.contains(&sales.to_string()));

    let (_, ranged) =
      call(&f, "GET", "/announcements?date_from=2100-01-01", None, None).await;
    assert_eq!(ids(&ranged), vec![later.to_string()]);

    let (_, by_priority) = call(&f, "GET", "/announcements?order=priority", None, None).await;
    assert_eq!(
      ids(&by_priority),
      vec![later.to_string(), sales.to_string(), everyone.to_string()]
    );

    let (status, board) = call(
      &f,
      "GET",
      "/announcements/dashboard?today=2025-06-01",
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&board["all"])[0], later.to_string());
    assert_eq!(ids(&board["featured"]), vec![sales.to_string()]);
    assert_eq!(ids(&board["highPriority"]), vec![later.to_string()]);
    assert_eq!(ids(&board["upcoming"]), vec![later.to_string()]);
  }

  #[tokio::test]
  async fn departments_narrow_by_branch() {
    let f = fixture(&[]).await;

    let (status, all) = call(&f, "GET", "/departments", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let uri = format!("/departments?branch_ids={},{}", Uuid::new_v4(), f.branch.branch_id);
    let (_, matched) = call(&f, "GET", &uri, None, None).await;
    assert_eq!(matched[0]["name"], "Sales");

    let uri = format!("/departments?branch_ids={}", Uuid::new_v4());
    let (_, none) = call(&f, "GET", &uri, None, None).await;
    assert!(none.as_array().unwrap().is_empty());

    let (status, _) = call(&f, "GET", "/departments?branch_ids=nope", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
