//! Detection and recording of contact points a group has not seen yet.

use tracing::info;

use super::IdentifyRequest;
use crate::{
  Error, Result,
  contact::{Contact, ContactId, NewContact},
  store::ContactStore,
};

/// Whether `request` names an email or phone number absent from `members`.
pub fn has_new_information(members: &[Contact], request: &IdentifyRequest) -> bool {
  let new_email = request
    .email
    .as_deref()
    .is_some_and(|email| !members.iter().any(|m| m.email.as_deref() == Some(email)));
  let new_phone = request.phone_number.as_deref().is_some_and(|phone| {
    !members.iter().any(|m| m.phone_number.as_deref() == Some(phone))
  });
  new_email || new_phone
}

/// Record the request verbatim as a secondary of `primary`.
///
/// Fails without writing if a concurrent merge demoted `primary` after the
/// group was read; the caller retries `identify` from the top.
pub async fn attach_secondary<S: ContactStore>(
  store: &S,
  primary: ContactId,
  request: &IdentifyRequest,
) -> Result<Contact> {
  let contact = store
    .attach_contact(NewContact::secondary(
      request.email.clone(),
      request.phone_number.clone(),
      primary,
    ))
    .await
    .map_err(Error::persistence)?;
  info!(id = contact.id, primary, "attached secondary contact");
  Ok(contact)
}
