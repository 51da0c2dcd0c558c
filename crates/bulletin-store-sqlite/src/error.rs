//! Error type for `bulletin-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside the set the schema allows.
  #[error("unexpected value in column {column}: {value:?}")]
  Decode { column: &'static str, value: String },

  /// A freshly written announcement could not be read back.
  #[error("announcement not found: {0}")]
  AnnouncementNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
