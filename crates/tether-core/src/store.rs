//! The `ContactStore` trait and supporting predicate and patch types.
//!
//! The trait is implemented by storage backends (e.g. `tether-store-sqlite`).
//! The identify algorithm and the HTTP layer depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::contact::{Contact, ContactId, LinkPrecedence, NewContact};

// ─── Predicate ───────────────────────────────────────────────────────────────

/// A disjunction of contact predicates for [`ContactStore::find_contacts`].
///
/// A contact matches when *any* populated clause matches. A filter with no
/// populated clause matches nothing. Soft-deleted contacts never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
  pub email:        Option<String>,
  pub phone_number: Option<String>,
  pub ids:          Vec<ContactId>,
  pub linked_ids:   Vec<ContactId>,
}

impl ContactFilter {
  /// Contacts sharing the given email or phone number.
  pub fn matching(email: Option<&str>, phone_number: Option<&str>) -> Self {
    Self {
      email: email.map(str::to_owned),
      phone_number: phone_number.map(str::to_owned),
      ..Self::default()
    }
  }

  /// Every member of the groups rooted at `roots`.
  pub fn groups(roots: impl IntoIterator<Item = ContactId>) -> Self {
    let roots: Vec<ContactId> = roots.into_iter().collect();
    Self {
      ids: roots.clone(),
      linked_ids: roots,
      ..Self::default()
    }
  }

  /// Every member of the single group rooted at `primary`.
  pub fn group_of(primary: ContactId) -> Self { Self::groups([primary]) }

  pub fn is_empty(&self) -> bool {
    self.email.is_none()
      && self.phone_number.is_none()
      && self.ids.is_empty()
      && self.linked_ids.is_empty()
  }
}

// ─── Bulk updates ────────────────────────────────────────────────────────────

/// Link assignment applied by a [`ContactUpdate`]. The store stamps
/// `updated_at` on every row it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPatch {
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl ContactPatch {
  /// Make the target a secondary of `primary`.
  pub fn link_to(primary: ContactId) -> Self {
    Self { link_precedence: LinkPrecedence::Secondary, linked_id: Some(primary) }
  }

  /// Make the target a primary with no link.
  pub fn promote() -> Self {
    Self { link_precedence: LinkPrecedence::Primary, linked_id: None }
  }
}

/// Which non-deleted rows a [`ContactUpdate`] applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
  /// Rows whose `id` is in the set.
  Ids(Vec<ContactId>),
  /// Rows whose `linked_id` is in the set.
  LinkedTo(Vec<ContactId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpdate {
  pub target: UpdateTarget,
  pub patch:  ContactPatch,
}

/// A unit of work for [`ContactStore::update_contacts`]: all updates commit
/// together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
  /// Ids that must still be non-deleted primaries when the batch starts. If
  /// any is not, nothing is written and the store reports a stale merge.
  pub expect_primary: Vec<ContactId>,
  /// Applied in order.
  pub updates:        Vec<ContactUpdate>,
}

impl UpdateBatch {
  pub fn is_empty(&self) -> bool { self.updates.is_empty() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tether contact store backend.
///
/// Contacts are never physically deleted; [`soft_delete_contact`] hides a
/// row from every read and every bulk update.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
///
/// [`soft_delete_contact`]: ContactStore::soft_delete_contact
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return every non-deleted contact matching `filter`, oldest first
  /// (`created_at`, then `id`).
  fn find_contacts<'a>(
    &'a self,
    filter: &'a ContactFilter,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  /// Persist a new contact. The store assigns `id`, `created_at` and
  /// `updated_at`.
  fn create_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Persist a new contact only while `input.linked_id` is a non-deleted
  /// primary. The check and the insert are atomic with respect to
  /// [`update_contacts`](ContactStore::update_contacts); if the link target
  /// has been demoted or deleted nothing is written and the store reports a
  /// stale merge. An unlinked input is inserted unconditionally.
  fn attach_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Apply `batch` atomically and return the number of rows touched.
  ///
  /// Concurrent batches are serialised: a batch observes either none or all
  /// of another batch's writes.
  fn update_contacts(
    &self,
    batch: UpdateBatch,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Retrieve a non-deleted contact by id.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Mark a contact as deleted. Returns `false` if no non-deleted contact
  /// with that id exists.
  fn soft_delete_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
