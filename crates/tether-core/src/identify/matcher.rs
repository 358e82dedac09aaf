//! Direct matches on the request's email or phone number.

use tracing::{debug, info};

use super::IdentifyRequest;
use crate::{
  Error, Result,
  contact::{Contact, NewContact},
  store::{ContactFilter, ContactStore},
};

/// Every non-deleted contact whose email or phone number equals the one in
/// `request`. Absent fields contribute no clause.
pub async fn find_matches<S: ContactStore>(
  store: &S,
  request: &IdentifyRequest,
) -> Result<Vec<Contact>> {
  let filter = ContactFilter::matching(
    request.email.as_deref(),
    request.phone_number.as_deref(),
  );
  let matches = store.find_contacts(&filter).await.map_err(Error::persistence)?;
  debug!(count = matches.len(), "matched contacts");
  Ok(matches)
}

/// Start a new identity group for a request nothing matched.
pub async fn create_primary<S: ContactStore>(
  store: &S,
  request: &IdentifyRequest,
) -> Result<Contact> {
  let contact = store
    .create_contact(NewContact::primary(
      request.email.clone(),
      request.phone_number.clone(),
    ))
    .await
    .map_err(Error::persistence)?;
  info!(id = contact.id, "created primary contact");
  Ok(contact)
}
