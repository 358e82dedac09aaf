//! The consolidated identity view returned to callers.

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId};

/// Everything known about one person.
///
/// `emails` and `phone_numbers` list the primary's own value first (when it
/// has one), then every other distinct value from oldest to newest contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
  pub primary_contact_id:    ContactId,
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  /// Every other group member, oldest first.
  pub secondary_contact_ids: Vec<ContactId>,
}

/// Build the view of the group rooted at `primary`. Returns `None` if
/// `primary` is not among `members`.
pub fn consolidate(primary: ContactId, members: &[Contact]) -> Option<ConsolidatedContact> {
  let mut ordered: Vec<&Contact> = members.iter().collect();
  ordered.sort_by_key(|c| c.recency_key());

  let root = ordered.iter().find(|c| c.id == primary)?;

  let mut emails = Vec::new();
  let mut phone_numbers = Vec::new();
  push_distinct(&mut emails, root.email.as_deref());
  push_distinct(&mut phone_numbers, root.phone_number.as_deref());
  for c in &ordered {
    push_distinct(&mut emails, c.email.as_deref());
    push_distinct(&mut phone_numbers, c.phone_number.as_deref());
  }

  Some(ConsolidatedContact {
    primary_contact_id: primary,
    emails,
    phone_numbers,
    secondary_contact_ids: ordered
      .iter()
      .filter(|c| c.id != primary)
      .map(|c| c.id)
      .collect(),
  })
}

fn push_distinct(values: &mut Vec<String>, value: Option<&str>) {
  if let Some(v) = value
    && !values.iter().any(|existing| existing == v)
  {
    values.push(v.to_owned());
  }
}
