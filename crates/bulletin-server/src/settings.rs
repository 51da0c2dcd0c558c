//! Server configuration.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bulletin_core::dispatch::DispatchSettings;
use bulletin_mail::MailSettings;
use serde::Deserialize;

/// Top-level configuration, read from `config.toml` and `BULLETIN_*`
/// environment variables (`BULLETIN_MAIL__SMTP__HOST` for nested keys).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub app_name:             String,
  /// Public base URL used for links in notifications.
  pub app_url:              String,
  pub dispatch_concurrency: usize,
  pub mail:                 MailSettings,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let dispatch = DispatchSettings::default();
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      store_path:           PathBuf::from("bulletin.db"),
      app_name:             dispatch.app_name,
      app_url:              dispatch.app_url,
      dispatch_concurrency: dispatch.concurrency,
      mail:                 MailSettings::default(),
    }
  }
}

impl ServerConfig {
  /// Layer the optional file at `path` under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("BULLETIN")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn dispatch_settings(&self) -> DispatchSettings {
    DispatchSettings {
      app_name:    self.app_name.clone(),
      app_url:     self.app_url.clone(),
      concurrency: self.dispatch_concurrency,
    }
  }

  /// `store_path` with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
