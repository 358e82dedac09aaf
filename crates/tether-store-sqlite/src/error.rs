//! Error type for `tether-store-sqlite`.

use tether_core::contact::{ContactId, UnknownPrecedence};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error(transparent)]
  Precedence(#[from] UnknownPrecedence),

  /// An update batch expected these contacts to be live primaries, but at
  /// least one was demoted or deleted by a concurrent writer. Nothing was
  /// written.
  #[error("stale merge: contacts {0:?} are no longer all primaries")]
  StaleMerge(Vec<ContactId>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
