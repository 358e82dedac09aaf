//! Expansion of matched contacts into their full identity groups.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{
  Error, Result,
  contact::{Contact, ContactId},
  store::{ContactFilter, ContactStore},
};

/// The distinct primaries the given contacts defer to.
pub fn referenced_roots<'a>(
  contacts: impl IntoIterator<Item = &'a Contact>,
) -> BTreeSet<ContactId> {
  contacts.into_iter().map(Contact::group_root).collect()
}

/// Sort oldest first by creation time, then id.
pub fn sort_oldest_first(contacts: &mut [Contact]) {
  contacts.sort_by_key(Contact::recency_key);
}

/// Fetch every member of every group touched by `matches`, oldest first.
///
/// Links are followed until no new root appears, so a member pointing at a
/// demoted record pulls in the group that record now belongs to. The result
/// always contains every matched contact, even when a concurrent write moved
/// it out of the groups that were queried.
pub async fn resolve_groups<S: ContactStore>(
  store: &S,
  matches: &[Contact],
) -> Result<Vec<Contact>> {
  let mut members: BTreeMap<ContactId, Contact> =
    matches.iter().map(|c| (c.id, c.clone())).collect();
  let mut queried = BTreeSet::new();

  loop {
    let pending: BTreeSet<ContactId> = referenced_roots(members.values())
      .difference(&queried)
      .copied()
      .collect();
    if pending.is_empty() {
      break;
    }
    debug!(roots = ?pending, "resolving identity groups");

    let found = store
      .find_contacts(&ContactFilter::groups(pending.iter().copied()))
      .await
      .map_err(Error::persistence)?;
    queried.extend(pending);
    for contact in found {
      members.insert(contact.id, contact);
    }
  }

  let mut members: Vec<Contact> = members.into_values().collect();
  sort_oldest_first(&mut members);
  Ok(members)
}

/// Fetch the members of the single group rooted at `primary`, oldest first.
pub async fn fetch_group<S: ContactStore>(
  store: &S,
  primary: ContactId,
) -> Result<Vec<Contact>> {
  let mut members = store
    .find_contacts(&ContactFilter::group_of(primary))
    .await
    .map_err(Error::persistence)?;
  sort_oldest_first(&mut members);
  Ok(members)
}
