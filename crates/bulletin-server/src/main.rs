//! bulletin server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `BULLETIN_*` environment variables, opens the SQLite store and serves the
//! announcement API over HTTP.
//!
//! # Seeding the directory
//!
//! ```
//! cargo run -p bulletin-server -- import directory.json
//! ```

mod import;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use bulletin_core::{dispatch::NotificationDispatcher, service::AnnouncementService};
use bulletin_mail::{HtmlRenderer, Mailer};
use bulletin_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{import::DirectoryFile, settings::ServerConfig};

#[derive(Parser)]
#[command(author, version, about = "Bulletin announcement server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Load branches, departments and employees from a JSON file.
  Import {
    /// Path to the directory JSON document.
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = server_cfg.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::Import { file } => {
      let directory = DirectoryFile::read(&file)?;
      import::import(&store, directory).await?;
      Ok(())
    }
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let mailer = Mailer::from_settings(&server_cfg.mail)
    .context("invalid mail configuration")?;
  let dispatcher = NotificationDispatcher::new(
    Arc::new(HtmlRenderer),
    mailer,
    server_cfg.dispatch_settings(),
  );
  let service = Arc::new(AnnouncementService::new(Arc::new(store), dispatcher));

  let app = bulletin_api::api_router(service).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
