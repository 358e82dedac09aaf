//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! and a `Z` suffix, so lexical column order is chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use rusqlite::types::Value;
use tether_core::{
  contact::{Contact, ContactId},
  store::ContactFilter,
};

use crate::{Error, Result};

/// Columns selected for every contact read, in [`RawContact`] order.
pub const CONTACT_COLUMNS: &str =
  "id, email, phone_number, linked_id, link_precedence, created_at, updated_at, deleted_at";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Id lists ────────────────────────────────────────────────────────────────

/// Append `ids` to `params` and return the matching `?N, ?M, ...` list.
pub fn push_id_list(params: &mut Vec<Value>, ids: &[ContactId]) -> String {
  ids
    .iter()
    .map(|id| {
      params.push(Value::Integer(*id));
      format!("?{}", params.len())
    })
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── ContactFilter ───────────────────────────────────────────────────────────

/// Render `filter` as a parenthesised disjunction plus its bound parameters.
/// Callers must not pass an empty filter.
pub fn encode_filter(filter: &ContactFilter) -> (String, Vec<Value>) {
  let mut params: Vec<Value> = Vec::new();
  let mut clauses: Vec<String> = Vec::new();

  if let Some(email) = &filter.email {
    params.push(Value::Text(email.clone()));
    clauses.push(format!("email = ?{}", params.len()));
  }
  if let Some(phone) = &filter.phone_number {
    params.push(Value::Text(phone.clone()));
    clauses.push(format!("phone_number = ?{}", params.len()));
  }
  if !filter.ids.is_empty() {
    clauses.push(format!("id IN ({})", push_id_list(&mut params, &filter.ids)));
  }
  if !filter.linked_ids.is_empty() {
    clauses.push(format!(
      "linked_id IN ({})",
      push_id_list(&mut params, &filter.linked_ids)
    ));
  }

  (format!("({})", clauses.join(" OR ")), params)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub id:              i64,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub linked_id:       Option<i64>,
  pub link_precedence: String,
  pub created_at:      String,
  pub updated_at:      String,
  pub deleted_at:      Option<String>,
}

impl RawContact {
  /// Read a row selected with [`CONTACT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      email:           row.get(1)?,
      phone_number:    row.get(2)?,
      linked_id:       row.get(3)?,
      link_precedence: row.get(4)?,
      created_at:      row.get(5)?,
      updated_at:      row.get(6)?,
      deleted_at:      row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:              self.id,
      email:           self.email,
      phone_number:    self.phone_number,
      linked_id:       self.linked_id,
      link_precedence: self.link_precedence.parse()?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      deleted_at:      self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
