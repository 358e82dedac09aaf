//! Election of the canonical primary and folding of competing groups.
//!
//! The oldest candidate (by creation time, then id) always survives, so two
//! requests that see the same contacts make the same choice. Writes for one
//! merge go to the store as a single [`UpdateBatch`].

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{info, warn};

use super::group;
use crate::{
  Error, Result,
  contact::{Contact, ContactId},
  store::{ContactPatch, ContactStore, ContactUpdate, UpdateBatch, UpdateTarget},
};

/// The outcome of comparing every candidate primary in a resolved set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Election {
  /// The true primary.
  pub survivor: ContactId,
  /// Writes needed to make `survivor` the only primary, if any.
  pub plan:     Option<MergePlan>,
}

/// The writes that collapse several groups into the survivor's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
  pub survivor:         ContactId,
  /// The survivor is a detached secondary and must become a primary again.
  pub promote_survivor: bool,
  /// Candidates demoted (or re-linked) under the survivor, oldest first.
  pub absorbed:         Vec<ContactId>,
  /// Link targets of secondaries that are not live primaries (deleted,
  /// demoted, or absent); anything still pointing at them is re-pointed to
  /// the survivor.
  pub stale_roots:      Vec<ContactId>,
  /// Live primaries the plan was computed against.
  pub expect_primary:   Vec<ContactId>,
}

impl MergePlan {
  /// Translate the plan into one atomic store batch.
  ///
  /// Promotion runs first so the survivor's own stale link is cleared before
  /// the re-pointing step can match it.
  pub fn to_batch(&self) -> UpdateBatch {
    let mut updates = Vec::with_capacity(3);
    if self.promote_survivor {
      updates.push(ContactUpdate {
        target: UpdateTarget::Ids(vec![self.survivor]),
        patch:  ContactPatch::promote(),
      });
    }
    if !self.absorbed.is_empty() {
      updates.push(ContactUpdate {
        target: UpdateTarget::Ids(self.absorbed.clone()),
        patch:  ContactPatch::link_to(self.survivor),
      });
    }

    let stale_links: BTreeSet<ContactId> = self
      .absorbed
      .iter()
      .chain(&self.stale_roots)
      .copied()
      .filter(|id| *id != self.survivor)
      .collect();
    if !stale_links.is_empty() {
      updates.push(ContactUpdate {
        target: UpdateTarget::LinkedTo(stale_links.into_iter().collect()),
        patch:  ContactPatch::link_to(self.survivor),
      });
    }

    UpdateBatch { expect_primary: self.expect_primary.clone(), updates }
  }
}

/// Pick the true primary among `members` and plan any merge it requires.
///
/// Candidates are every primary plus every detached member: a secondary whose
/// link chain never reaches a live primary in `members` (unlinked, or ending
/// at a deleted record). A secondary chained through a demoted record to a
/// live primary belongs to that primary's group and is only re-pointed.
/// Returns `None` only when `members` is empty.
pub fn elect(members: &[Contact]) -> Option<Election> {
  let by_id: HashMap<ContactId, &Contact> = members.iter().map(|c| (c.id, c)).collect();

  let mut candidates: Vec<&Contact> = members
    .iter()
    .filter(|c| c.is_primary() || chain_end(*c, &by_id).is_none())
    .collect();
  candidates.sort_by_key(|c| c.recency_key());

  let stale_roots: Vec<ContactId> = members
    .iter()
    .filter(|c| !c.is_primary())
    .filter_map(|c| c.linked_id)
    .filter(|root| !by_id.get(root).is_some_and(|c| c.is_primary()))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();

  let (survivor, rest) = candidates.split_first()?;
  let promote_survivor = !survivor.is_primary();

  if rest.is_empty() && !promote_survivor && stale_roots.is_empty() {
    return Some(Election { survivor: survivor.id, plan: None });
  }

  let plan = MergePlan {
    survivor: survivor.id,
    promote_survivor,
    absorbed: rest.iter().map(|c| c.id).collect(),
    stale_roots,
    expect_primary: candidates
      .iter()
      .filter(|c| c.is_primary())
      .map(|c| c.id)
      .collect(),
  };

  Some(Election { survivor: survivor.id, plan: Some(plan) })
}

/// The live primary at the end of `member`'s link chain, or `None` when the
/// chain breaks (null link, record not in `by_id`, or a cycle).
fn chain_end<'a>(
  member: &'a Contact,
  by_id: &HashMap<ContactId, &'a Contact>,
) -> Option<ContactId> {
  let mut seen = HashSet::new();
  let mut current = member;
  while !current.is_primary() {
    if !seen.insert(current.id) {
      return None;
    }
    current = by_id.get(&current.linked_id?).copied()?;
  }
  Some(current.id)
}

/// Apply `plan` atomically and return the survivor's group, oldest first.
pub async fn apply<S: ContactStore>(store: &S, plan: &MergePlan) -> Result<Vec<Contact>> {
  if plan.promote_survivor || !plan.stale_roots.is_empty() {
    warn!(
      survivor = plan.survivor,
      stale_roots = ?plan.stale_roots,
      "healing detached contacts"
    );
  }

  let touched = store
    .update_contacts(plan.to_batch())
    .await
    .map_err(Error::persistence)?;
  info!(
    survivor = plan.survivor,
    absorbed = ?plan.absorbed,
    touched,
    "merged identity groups"
  );

  group::fetch_group(store, plan.survivor).await
}
