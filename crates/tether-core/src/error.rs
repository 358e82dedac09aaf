//! Error types for `tether-core`.

use thiserror::Error;

use crate::contact::ContactId;

#[derive(Debug, Error)]
pub enum Error {
  /// Neither an email nor a phone number was supplied.
  #[error("at least one of email or phoneNumber must be provided")]
  MissingContactPoint,

  /// The surviving primary disappeared from its own group between the merge
  /// and the final read, e.g. it was soft-deleted concurrently.
  #[error("primary contact {0} is missing from its identity group")]
  PrimaryMissing(ContactId),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a store error.
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }

  /// Whether the caller, rather than the server, is at fault.
  pub fn is_client_fault(&self) -> bool {
    matches!(self, Self::MissingContactPoint)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
