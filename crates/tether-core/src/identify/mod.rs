//! Identity resolution.
//!
//! A request naming an email and/or phone number flows strictly forward
//! through four stages:
//!
//! 1. [`matcher`] finds contacts sharing either contact point, or creates a
//!    fresh primary when nothing matches.
//! 2. [`group`] expands the matches into every member of every touched group.
//! 3. [`merge`] elects the oldest candidate (every primary, plus any record
//!    whose link chain ends at a missing record) and folds the other groups
//!    into it.
//! 4. [`enrich`] attaches a secondary when the request carries an email or
//!    phone the group has not seen, and [`consolidate`] shapes the result.

pub mod consolidate;
pub mod enrich;
pub mod group;
pub mod matcher;
pub mod merge;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, store::ContactStore};

pub use consolidate::ConsolidatedContact;

// ─── Request ─────────────────────────────────────────────────────────────────

/// The contact points supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
  pub email:        Option<String>,
  pub phone_number: Option<String>,
}

impl IdentifyRequest {
  pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
    Self { email, phone_number }
  }

  /// Drop empty values and require at least one contact point.
  pub fn validate(self) -> Result<Self> {
    let email = self.email.filter(|e| !e.is_empty());
    let phone_number = self.phone_number.filter(|p| !p.is_empty());
    if email.is_none() && phone_number.is_none() {
      return Err(Error::MissingContactPoint);
    }
    Ok(Self { email, phone_number })
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Resolve `request` to its canonical identity, creating, linking, or merging
/// contacts in `store` as needed.
///
/// Repeating a request whose contact points are already known performs no
/// writes and returns the same result.
pub async fn identify<S>(store: &S, request: IdentifyRequest) -> Result<ConsolidatedContact>
where
  S: ContactStore,
{
  let request = request.validate()?;

  let matches = matcher::find_matches(store, &request).await?;
  if matches.is_empty() {
    let contact = matcher::create_primary(store, &request).await?;
    return consolidate::consolidate(contact.id, std::slice::from_ref(&contact))
      .ok_or(Error::PrimaryMissing(contact.id));
  }

  let resolved = group::resolve_groups(store, &matches).await?;
  let election = merge::elect(&resolved)
    .ok_or_else(|| Error::PrimaryMissing(matches[0].group_root()))?;
  let survivor = election.survivor;

  let mut members = match election.plan {
    Some(plan) => merge::apply(store, &plan).await?,
    None => resolved,
  };

  if enrich::has_new_information(&members, &request) {
    enrich::attach_secondary(store, survivor, &request).await?;
    members = group::fetch_group(store, survivor).await?;
  } else {
    debug!(survivor, "request carries no new contact points");
  }

  consolidate::consolidate(survivor, &members).ok_or(Error::PrimaryMissing(survivor))
}

// ─── Test fixtures ───────────────────────────────────────────────────────────
