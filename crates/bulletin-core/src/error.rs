//! Error types for `bulletin-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The write was rejected before anything was persisted.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The target belongs to another tenant.
  #[error("announcement {0} belongs to another tenant")]
  Forbidden(Uuid),

  #[error("announcement not found: {0}")]
  AnnouncementNotFound(Uuid),

  #[error("employee not found: {0}")]
  EmployeeNotFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
