//! Outbound notification mail for Bulletin.
//!
//! [`HtmlRenderer`] turns an announcement into an HTML message; [`Mailer`]
//! delivers it, either through an SMTP relay ([`SmtpTransport`]) or, when no
//! relay is configured, by logging it ([`LogTransport`]).

mod logging;
mod mailer;
mod render;
mod smtp;

pub mod error;

pub use error::{Error, Result};
pub use logging::LogTransport;
pub use mailer::{MailSettings, Mailer, Sender};
pub use render::{HtmlRenderer, clean_content, subject_line};
pub use smtp::{SmtpSettings, SmtpTransport};
