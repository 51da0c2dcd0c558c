//! The configured [`Mailer`] and the settings it is built from.

use bulletin_core::dispatch::Transport;
use lettre::message::Mailbox;
use serde::Deserialize;

use crate::{LogTransport, Result, SmtpSettings, SmtpTransport, smtp::mailbox};

fn default_from_address() -> String { "no-reply@localhost".into() }

/// The identity notifications are sent from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sender {
  #[serde(rename = "from_address", default = "default_from_address")]
  pub address: String,
  #[serde(rename = "from_name", default)]
  pub name:    Option<String>,
}

impl Default for Sender {
  fn default() -> Self { Self { address: default_from_address(), name: None } }
}

impl Sender {
  pub fn mailbox(&self) -> Result<Mailbox> {
    mailbox(self.name.as_deref(), &self.address)
  }
}

/// `[mail]` configuration: a sender identity and an optional relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MailSettings {
  #[serde(flatten)]
  pub sender: Sender,
  #[serde(default)]
  pub smtp:   Option<SmtpSettings>,
}

/// Either a real SMTP relay or the log-only fallback.
pub enum Mailer {
  Smtp(SmtpTransport),
  Log(LogTransport),
}

impl Mailer {
  /// Build the mailer described by `settings`. Without an `smtp` section,
  /// notifications are logged instead of sent.
  pub fn from_settings(settings: &MailSettings) -> Result<Self> {
    match &settings.smtp {
      Some(smtp) => {
        tracing::info!(host = %smtp.host, port = smtp.port, "using SMTP relay");
        Ok(Self::Smtp(SmtpTransport::new(smtp, &settings.sender)?))
      }
      None => {
        tracing::warn!("no SMTP relay configured; notifications will only be logged");
        settings.sender.mailbox()?;
        Ok(Self::Log(LogTransport::new(settings.sender.clone())))
      }
    }
  }
}

impl Transport for Mailer {
  type Error = crate::Error;

  async fn send(
    &self,
    to_email: &str,
    to_name: &str,
    subject: &str,
    html_body: &str,
  ) -> Result<()> {
    match self {
      Self::Smtp(smtp) => smtp.send(to_email, to_name, subject, html_body).await,
      Self::Log(log) => log.send(to_email, to_name, subject, html_body).await,
    }
  }
}
