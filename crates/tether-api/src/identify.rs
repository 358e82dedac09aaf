//! Handler for `POST /identify`.
//!
//! Body: `{"email"?: string|null, "phoneNumber"?: string|number|null}`.
//! Responds with `{"contact": ConsolidatedContact}`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tether_core::{ConsolidatedContact, IdentifyRequest, store::ContactStore};

use crate::error::ApiError;

/// A phone number as clients send it: some send strings, some numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PhoneInput {
  Text(String),
  Number(serde_json::Number),
}

impl From<PhoneInput> for String {
  fn from(p: PhoneInput) -> Self {
    match p {
      PhoneInput::Text(s) => s,
      PhoneInput::Number(n) => n.to_string(),
    }
  }
}

/// JSON body accepted by `POST /identify`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  pub email:        Option<String>,
  pub phone_number: Option<PhoneInput>,
}

impl From<IdentifyBody> for IdentifyRequest {
  fn from(b: IdentifyBody) -> Self {
    IdentifyRequest::new(b.email, b.phone_number.map(String::from))
  }
}

#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedContact,
}

/// `POST /identify`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<IdentifyBody>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore,
{
  let contact = tether_core::identify(store.as_ref(), body.into()).await?;
  Ok(Json(IdentifyResponse { contact }))
}
