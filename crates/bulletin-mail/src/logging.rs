//! A transport that only logs, for development and for deployments without
//! an SMTP relay.

use bulletin_core::dispatch::Transport;

use crate::{Result, mailer::Sender, smtp::mailbox};

#[derive(Debug, Clone)]
pub struct LogTransport {
  sender: Sender,
}

impl LogTransport {
  pub fn new(sender: Sender) -> Self { Self { sender } }
}

impl Transport for LogTransport {
  type Error = crate::Error;

  /// Always succeeds once the recipient address parses.
  async fn send(
    &self,
    to_email: &str,
    to_name: &str,
    subject: &str,
    html_body: &str,
  ) -> Result<()> {
    let to = mailbox(Some(to_name), to_email)?;
    tracing::info!(
      from = %self.sender.address,
      %to,
      subject,
      body_bytes = html_body.len(),
      "notification delivered to log"
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn accepts_valid_and_rejects_malformed_recipients() {
    let transport = LogTransport::new(Sender::default());
    assert!(
      transport
        .send("asha@example.com", "Asha", "Hello", "<p>hi</p>")
        .await
        .is_ok()
    );
    assert!(
      transport
        .send("no-at-sign", "Asha", "Hello", "<p>hi</p>")
        .await
        .is_err()
    );
  }
}
