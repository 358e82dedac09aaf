//! Contact — the sole stored entity.
//!
//! Contacts never hold references to each other; relationships are expressed
//! through [`ContactId`]s and resolved by querying the store.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned, monotonically increasing identifier.
pub type ContactId = i64;

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical record of its identity group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

impl LinkPrecedence {
  /// The string stored in the `link_precedence` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Primary => "primary",
      Self::Secondary => "secondary",
    }
  }
}

impl fmt::Display for LinkPrecedence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when a string is neither `"primary"` nor `"secondary"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPrecedence(pub String);

impl fmt::Display for UnknownPrecedence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown link precedence: {:?}", self.0)
  }
}

impl std::error::Error for UnknownPrecedence {}

impl FromStr for LinkPrecedence {
  type Err = UnknownPrecedence;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "primary" => Ok(Self::Primary),
      "secondary" => Ok(Self::Secondary),
      other => Err(UnknownPrecedence(other.to_owned())),
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  /// `None` for primaries. For secondaries, the id of the group's primary.
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  /// Set by the store at insertion; never changes.
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// The id of the primary this contact defers to.
  ///
  /// A secondary with no `linked_id` is inconsistent; it is treated as the
  /// root of its own group rather than rejected.
  pub fn group_root(&self) -> ContactId {
    match (self.link_precedence, self.linked_id) {
      (LinkPrecedence::Secondary, Some(primary)) => primary,
      _ => self.id,
    }
  }

  /// Oldest-first ordering key: creation time, then id.
  pub fn recency_key(&self) -> (DateTime<Utc>, ContactId) {
    (self.created_at, self.id)
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::create_contact`].
/// `id` and the timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A fresh primary that starts its own identity group.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A secondary attached to the group rooted at `primary`.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    primary: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(primary),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn contact(id: ContactId, precedence: LinkPrecedence, linked_id: Option<ContactId>) -> Contact {
    let at = Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap();
    Contact {
      id,
      email: None,
      phone_number: None,
      linked_id,
      link_precedence: precedence,
      created_at: at,
      updated_at: at,
      deleted_at: None,
    }
  }

  #[test]
  fn group_root_follows_one_hop() {
    assert_eq!(contact(1, LinkPrecedence::Primary, None).group_root(), 1);
    assert_eq!(contact(2, LinkPrecedence::Secondary, Some(1)).group_root(), 1);
  }

  #[test]
  fn unlinked_secondary_is_its_own_root() {
    assert_eq!(contact(7, LinkPrecedence::Secondary, None).group_root(), 7);
  }

  #[test]
  fn precedence_parses_column_values() {
    assert_eq!("primary".parse::<LinkPrecedence>(), Ok(LinkPrecedence::Primary));
    assert_eq!("secondary".parse::<LinkPrecedence>(), Ok(LinkPrecedence::Secondary));
    assert!("tertiary".parse::<LinkPrecedence>().is_err());
  }

  #[test]
  fn contact_serialises_in_camel_case() {
    let json = serde_json::to_value(contact(2, LinkPrecedence::Secondary, Some(1))).unwrap();
    assert_eq!(json["linkPrecedence"], "secondary");
    assert_eq!(json["linkedId"], 1);
    assert!(json["phoneNumber"].is_null());
  }
}
