//! Error type for `bulletin-mail`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid mail configuration: {0}")]
  InvalidConfig(String),

  #[error("invalid address {address:?}: {source}")]
  Address {
    address: String,
    #[source]
    source:  lettre::address::AddressError,
  },

  #[error("failed to build message: {0}")]
  Message(#[from] lettre::error::Error),

  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
