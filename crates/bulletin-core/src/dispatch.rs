//! Notification dispatch with per-recipient failure isolation.
//!
//! Every recipient produces a [`RecipientOutcome`]; nothing a single recipient
//! does (a malformed address, a rejected delivery) can stop the others. There
//! is no retry and no queue: a send is attempted once per run and operators
//! re-trigger dispatch by hand if needed.

use std::{collections::HashSet, future::Future, sync::Arc};

use futures::{StreamExt as _, stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  announcement::Announcement,
  directory::{Employee, is_valid_email},
};

// ─── Collaborators ───────────────────────────────────────────────────────────

/// Per-run values a renderer may embed in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
  pub app_name:         String,
  /// Absolute link to the announcement in the web application.
  pub announcement_url: String,
}

/// A rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
  pub subject:   String,
  pub html_body: String,
}

/// Turns an announcement into a message for a recipient.
pub trait Renderer: Send + Sync {
  fn render(
    &self,
    announcement: &Announcement,
    recipient: &Employee,
    context: &RenderContext,
  ) -> RenderedNotification;
}

/// Delivers one message. Implementations report failure through the returned
/// `Result`; they are never expected to retry.
pub trait Transport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    to_email: &'a str,
    to_name: &'a str,
    subject: &'a str,
    html_body: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// What happened to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryResult {
  Sent,
  Failed { error: String },
  SkippedInvalidEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOutcome {
  pub employee_id: Uuid,
  pub email:       String,
  pub result:      DeliveryResult,
}

/// Aggregated outcome of one dispatch run.
///
/// `attempted` counts every distinct recipient handed to the dispatcher,
/// including the ones skipped for an invalid address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
  pub attempted:             u64,
  pub sent:                  u64,
  pub failed:                u64,
  pub skipped_invalid_email: u64,
  pub outcomes:              Vec<RecipientOutcome>,
}

impl DispatchReport {
  fn from_outcomes(outcomes: Vec<RecipientOutcome>) -> Self {
    let mut report = Self {
      attempted: outcomes.len() as u64,
      ..Self::default()
    };
    for outcome in &outcomes {
      match outcome.result {
        DeliveryResult::Sent => report.sent += 1,
        DeliveryResult::Failed { .. } => report.failed += 1,
        DeliveryResult::SkippedInvalidEmail => report.skipped_invalid_email += 1,
      }
    }
    report.outcomes = outcomes;
    report
  }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Static settings for a [`NotificationDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchSettings {
  pub app_name:    String,
  /// Base URL of the web application, without a trailing slash.
  pub app_url:     String,
  /// Maximum number of sends in flight. `1` sends strictly in sequence.
  pub concurrency: usize,
}

impl Default for DispatchSettings {
  fn default() -> Self {
    Self {
      app_name:    "Bulletin".into(),
      app_url:     "http://localhost:8080".into(),
      concurrency: 4,
    }
  }
}

pub struct NotificationDispatcher<T> {
  renderer:  Arc<dyn Renderer>,
  transport: T,
  settings:  DispatchSettings,
}

impl<T: Transport> NotificationDispatcher<T> {
  pub fn new(
    renderer: Arc<dyn Renderer>,
    transport: T,
    settings: DispatchSettings,
  ) -> Self {
    Self { renderer, transport, settings }
  }

  pub fn transport(&self) -> &T { &self.transport }

  /// Link embedded in notifications for `announcement_id`.
  pub fn announcement_url(&self, announcement_id: Uuid) -> String {
    format!(
      "{}/announcements/{announcement_id}",
      self.settings.app_url.trim_end_matches('/')
    )
  }

  /// Send `announcement` to every member of `recipients`.
  ///
  /// The recipient list is a snapshot taken by the caller; it is not
  /// re-resolved while the run is in progress. Duplicate employee ids are
  /// delivered once.
  pub async fn dispatch<'a>(
    &self,
    announcement: &Announcement,
    recipients: impl IntoIterator<Item = &'a Employee>,
  ) -> DispatchReport {
    let context = RenderContext {
      app_name:         self.settings.app_name.clone(),
      announcement_url: self.announcement_url(announcement.announcement_id),
    };

    let mut seen = HashSet::new();
    let pending: Vec<_> = recipients
      .into_iter()
      .filter(|e| seen.insert(e.employee_id))
      .map(|e| self.deliver(announcement, e, &context))
      .collect();

    if pending.is_empty() {
      tracing::info!(
        announcement_id = %announcement.announcement_id,
        "no recipients for announcement"
      );
      return DispatchReport::default();
    }

    tracing::info!(
      announcement_id = %announcement.announcement_id,
      recipients = pending.len(),
      is_company_wide = announcement.is_company_wide,
      "sending announcement notifications"
    );

    let outcomes: Vec<RecipientOutcome> = stream::iter(pending)
      .buffer_unordered(self.settings.concurrency.max(1))
      .collect()
      .await;
    let report = DispatchReport::from_outcomes(outcomes);

    tracing::info!(
      announcement_id = %announcement.announcement_id,
      attempted = report.attempted,
      sent = report.sent,
      failed = report.failed,
      skipped_invalid_email = report.skipped_invalid_email,
      "announcement notifications completed"
    );

    report
  }

  async fn deliver(
    &self,
    announcement: &Announcement,
    recipient: &Employee,
    context: &RenderContext,
  ) -> RecipientOutcome {
    let outcome = |result| RecipientOutcome {
      employee_id: recipient.employee_id,
      email: recipient.email.clone(),
      result,
    };

    if !is_valid_email(&recipient.email) {
      tracing::warn!(
        announcement_id = %announcement.announcement_id,
        employee_id = %recipient.employee_id,
        email = %recipient.email,
        "skipping recipient with invalid email"
      );
      return outcome(DeliveryResult::SkippedInvalidEmail);
    }

    let message = self.renderer.render(announcement, recipient, context);
    let sent = self
      .transport
      .send(
        recipient.email.trim(),
        &recipient.name,
        &message.subject,
        &message.html_body,
      )
      .await;

    match sent {
      Ok(()) => {
        tracing::debug!(
          announcement_id = %announcement.announcement_id,
          employee_id = %recipient.employee_id,
          email = %recipient.email,
          "announcement notification sent"
        );
        outcome(DeliveryResult::Sent)
      }
      Err(e) => {
        tracing::error!(
          announcement_id = %announcement.announcement_id,
          employee_id = %recipient.employee_id,
          email = %recipient.email,
          name = %recipient.name,
          error = %e,
          "failed to send announcement notification"
        );
        outcome(DeliveryResult::Failed { error: e.to_string() })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::{BTreeSet, HashMap},
    sync::Mutex,
  };

  use chrono::{NaiveDate, Utc};

  use super::*;
  use crate::directory::EmployeeStatus;

  #[derive(Debug, thiserror::Error)]
  #[error("mailbox unavailable: {0}")]
  struct Bounce(String);

  /// Records every send; rejects the addresses in `reject`.
  #[derive(Default)]
  struct RecordingTransport {
    reject: BTreeSet<String>,
    sends:  Mutex<HashMap<String, (String, usize)>>,
  }

  impl RecordingTransport {
    fn rejecting(addresses: &[&str]) -> Self {
      Self {
        reject: addresses.iter().map(|a| (*a).to_owned()).collect(),
        ..Self::default()
      }
    }

    fn sends_to(&self, address: &str) -> usize {
      self
        .sends
        .lock()
        .unwrap()
        .get(address)
        .map_or(0, |(_, n)| *n)
    }

    fn subject_for(&self, address: &str) -> Option<String> {
      self.sends.lock().unwrap().get(address).map(|(s, _)| s.clone())
    }
  }

  impl Transport for RecordingTransport {
    type Error = Bounce;

    async fn send(
      &self,
      to_email: &str,
      _to_name: &str,
      subject: &str,
      _html_body: &str,
    ) -> Result<(), Bounce> {
      tokio::task::yield_now().await;
      let mut sends = self.sends.lock().unwrap();
      let entry = sends
        .entry(to_email.to_owned())
        .or_insert_with(|| (subject.to_owned(), 0));
      entry.1 += 1;
      if self.reject.contains(to_email) {
        return Err(Bounce(to_email.to_owned()));
      }
      Ok(())
    }
  }

  struct PlainRenderer;

  impl Renderer for PlainRenderer {
    fn render(
      &self,
      announcement: &Announcement,
      recipient: &Employee,
      context: &RenderContext,
    ) -> RenderedNotification {
      RenderedNotification {
        subject:   announcement.title.clone(),
        html_body: format!(
          "Hi {}, see {}",
          recipient.name, context.announcement_url
        ),
      }
    }
  }

  fn announcement() -> Announcement {
    Announcement {
      announcement_id:  Uuid::new_v4(),
      tenant_id:        Uuid::new_v4(),
      title:            "Payroll date moved".into(),
      category:         "hr".into(),
      description:      None,
      content:          "Salaries arrive on the 28th.".into(),
      start_date:       NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
      end_date:         None,
      attachments:      None,
      is_featured:      false,
      is_high_priority: true,
      is_company_wide:  true,
      department_ids:   BTreeSet::new(),
      branch_ids:       BTreeSet::new(),
      created_at:       Utc::now(),
      updated_at:       Utc::now(),
    }
  }

  fn recipient(email: &str) -> Employee {
    Employee {
      employee_id: Uuid::new_v4(),
      tenant_id: Uuid::new_v4(),
      name: email.split('@').next().unwrap_or_default().to_owned(),
      email: email.to_owned(),
      status: EmployeeStatus::Active,
      department_id: None,
      branch_id: None,
    }
  }

  fn dispatcher(
    transport: RecordingTransport,
    concurrency: usize,
  ) -> NotificationDispatcher<RecordingTransport> {
    NotificationDispatcher::new(
      Arc::new(PlainRenderer),
      transport,
      DispatchSettings {
        app_name: "Bulletin".into(),
        app_url: "https://hr.example.com/".into(),
        concurrency,
      },
    )
  }

  fn mixed_audience() -> Vec<Employee> {
    let mut audience: Vec<Employee> = (0..7)
      .map(|i| recipient(&format!("worker{i}@example.com")))
      .collect();
    audience.push(recipient(""));
    audience.push(recipient("no-at-sign"));
    audience.push(recipient("broken@"));
    audience
  }

  async fn run_resilience(concurrency: usize) {
    let audience = mixed_audience();
    let d = dispatcher(
      RecordingTransport::rejecting(&["worker3@example.com"]),
      concurrency,
    );

    let report = d.dispatch(&announcement(), &audience).await;

    assert_eq!(report.attempted, 10);
    assert_eq!(report.skipped_invalid_email, 3);
    assert_eq!(report.sent, 6);
    assert_eq!(report.failed, 1);
    assert_eq!(report.outcomes.len(), 10);

    for e in audience.iter().filter(|e| is_valid_email(&e.email)) {
      assert_eq!(d.transport().sends_to(&e.email), 1, "{}", e.email);
    }
    assert_eq!(d.transport().sends_to(""), 0);
    assert_eq!(d.transport().sends_to("no-at-sign"), 0);

    let failed = report
      .outcomes
      .iter()
      .find(|o| o.email == "worker3@example.com")
      .unwrap();
    assert!(
      matches!(&failed.result, DeliveryResult::Failed { error } if error.contains("worker3"))
    );
  }

  #[tokio::test]
  async fn one_failure_does_not_stop_the_rest_sequential() {
    run_resilience(1).await;
  }

  #[tokio::test]
  async fn one_failure_does_not_stop_the_rest_concurrent() {
    run_resilience(4).await;
  }

  #[tokio::test]
  async fn empty_audience_attempts_nothing() {
    let d = dispatcher(RecordingTransport::default(), 4);
    let report = d.dispatch(&announcement(), &[]).await;
    assert_eq!(report, DispatchReport::default());
  }

  #[tokio::test]
  async fn duplicate_recipients_receive_one_send() {
    let once = recipient("once@example.com");
    let d = dispatcher(RecordingTransport::default(), 2);
    let report = d
      .dispatch(&announcement(), [&once, &once, &once])
      .await;
    assert_eq!(report.attempted, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(d.transport().sends_to("once@example.com"), 1);
  }

  #[tokio::test]
  async fn renderer_output_reaches_transport() {
    let r = recipient("reader@example.com");
    let d = dispatcher(RecordingTransport::default(), 1);
    d.dispatch(&announcement(), [&r]).await;
    assert_eq!(
      d.transport().subject_for("reader@example.com").as_deref(),
      Some("Payroll date moved")
    );
  }

  #[test]
  fn announcement_url_strips_trailing_slash() {
    let d = dispatcher(RecordingTransport::default(), 1);
    let id = Uuid::new_v4();
    assert_eq!(
      d.announcement_url(id),
      format!("https://hr.example.com/announcements/{id}")
    );
  }

  #[test]
  fn report_serialises_camel_case() {
    let report = DispatchReport {
      attempted: 2,
      sent: 1,
      failed: 0,
      skipped_invalid_email: 1,
      outcomes: vec![],
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["skippedInvalidEmail"], 1);
  }
}
