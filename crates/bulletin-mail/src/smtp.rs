//! SMTP delivery through `lettre`.

use bulletin_core::dispatch::Transport;
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, SinglePart},
  transport::smtp::{
    authentication::Credentials,
    client::{Tls, TlsParameters},
  },
};
use serde::Deserialize;

use crate::{Error, Result, mailer::Sender};

fn default_smtp_port() -> u16 { 587 }

fn default_use_tls() -> bool { true }

/// Connection settings for an SMTP relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpSettings {
  pub host:     String,
  #[serde(default = "default_smtp_port")]
  pub port:     u16,
  #[serde(default)]
  pub username: Option<String>,
  #[serde(default)]
  pub password: Option<String>,
  /// Port 465 uses implicit TLS; any other port uses STARTTLS.
  #[serde(default = "default_use_tls")]
  pub use_tls:  bool,
}

/// Sends notifications through an SMTP relay from a fixed sender identity.
pub struct SmtpTransport {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpTransport {
  pub fn new(settings: &SmtpSettings, sender: &Sender) -> Result<Self> {
    let host = settings.host.as_str();
    let mut builder = if settings.use_tls {
      let tls = TlsParameters::new(host.to_owned())
        .map_err(|e| Error::InvalidConfig(format!("TLS configuration error: {e}")))?;

      if settings.port == 465 {
        AsyncSmtpTransport::<Tokio1Executor>::relay(host)
          .map_err(|e| Error::InvalidConfig(format!("SMTP relay error: {e}")))?
          .port(settings.port)
          .tls(Tls::Wrapper(tls))
      } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
          .map_err(|e| Error::InvalidConfig(format!("SMTP relay error: {e}")))?
          .port(settings.port)
          .tls(Tls::Required(tls))
      }
    } else {
      AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(settings.port)
    };

    if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
      builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    Ok(Self {
      transport: builder.build(),
      from:      sender.mailbox()?,
    })
  }
}

pub(crate) fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox> {
  let email = address.trim().parse().map_err(|source| Error::Address {
    address: address.to_owned(),
    source,
  })?;
  let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_owned);
  Ok(Mailbox::new(name, email))
}

impl Transport for SmtpTransport {
  type Error = Error;

  async fn send(
    &self,
    to_email: &str,
    to_name: &str,
    subject: &str,
    html_body: &str,
  ) -> Result<()> {
    let message = Message::builder()
      .from(self.from.clone())
      .to(mailbox(Some(to_name), to_email)?)
      .subject(subject)
      .singlepart(SinglePart::html(html_body.to_owned()))?;

    self.transport.send(message).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sender() -> Sender {
    Sender {
      address: "hr@example.com".into(),
      name:    Some("HR Team".into()),
    }
  }

  fn settings(port: u16, use_tls: bool) -> SmtpSettings {
    SmtpSettings {
      host: "localhost".into(),
      port,
      username: None,
      password: None,
      use_tls,
    }
  }

  #[test]
  fn builds_plain_transport() {
    assert!(SmtpTransport::new(&settings(25, false), &sender()).is_ok());
  }

  #[test]
  fn builds_tls_transports_with_credentials() {
    let mut starttls = settings(587, true);
    starttls.username = Some("user".into());
    starttls.password = Some("pass".into());
    assert!(SmtpTransport::new(&starttls, &sender()).is_ok());
    assert!(SmtpTransport::new(&settings(465, true), &sender()).is_ok());
  }

  #[test]
  fn rejects_malformed_sender() {
    let bad = Sender { address: "not an address".into(), name: None };
    assert!(matches!(
      SmtpTransport::new(&settings(25, false), &bad),
      Err(Error::Address { .. })
    ));
  }

  #[test]
  fn mailbox_keeps_display_name() {
    let mb = mailbox(Some(" Asha Rao "), "asha@example.com").unwrap();
    assert_eq!(mb.name.as_deref(), Some("Asha Rao"));
    assert_eq!(mb.email.to_string(), "asha@example.com");
    assert!(mailbox(Some(""), "asha@example.com").unwrap().name.is_none());
  }

  #[test]
  fn settings_defaults() {
    let parsed: SmtpSettings =
      serde_json::from_str(r#"{"host":"smtp.example.com"}"#).unwrap();
    assert_eq!(parsed.port, 587);
    assert!(parsed.use_tls);
    assert!(parsed.username.is_none());
  }
}
