//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use tether_core::{
  contact::{Contact, ContactId, NewContact},
  store::{ContactFilter, ContactStore, UpdateBatch, UpdateTarget},
};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_filter, now, push_id_list},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tether contact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn find_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>> {
    if filter.is_empty() {
      return Ok(Vec::new());
    }
    let (clause, params) = encode_filter(filter);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CONTACT_COLUMNS}
           FROM contacts
           WHERE deleted_at IS NULL AND {clause}
           ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn create_contact(&self, input: NewContact) -> Result<Contact> {
    let at = now();
    let row = input.clone();
    let at_str = encode_dt(at);

    let id = self
      .conn
      .call(move |conn| Ok(insert_contact(conn, &row, &at_str)?))
      .await?;

    Ok(stored_contact(id, input, at))
  }

  async fn attach_contact(&self, input: NewContact) -> Result<Contact> {
    let at = now();
    let row = input.clone();
    let at_str = encode_dt(at);

    // `None` means the link target is no longer a live primary.
    let id: Option<ContactId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(primary) = row.linked_id {
          if count_live_primaries(&tx, &[primary])? != 1 {
            return Ok(None);
          }
        }
        let id = insert_contact(&tx, &row, &at_str)?;
        tx.commit()?;
        Ok(Some(id))
      })
      .await?;

    match id {
      Some(id) => Ok(stored_contact(id, input, at)),
      None => {
        let target: Vec<ContactId> = input.linked_id.into_iter().collect();
        warn!(target = ?target, "attach target is no longer a primary");
        Err(Error::StaleMerge(target))
      }
    }
  }

  async fn update_contacts(&self, batch: UpdateBatch) -> Result<usize> {
    if batch.is_empty() {
      return Ok(0);
    }
    let at_str = encode_dt(now());
    let expected: Vec<ContactId> = batch
      .expect_primary
      .iter()
      .copied()
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let expected_for_check = expected.clone();

    // `None` means the precondition failed and the transaction was rolled
    // back on drop.
    let touched: Option<usize> = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the precondition read, so no
        // other writer can slip in between the check and the updates.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !expected_for_check.is_empty()
          && count_live_primaries(&tx, &expected_for_check)? != expected_for_check.len()
        {
          return Ok(None);
        }

        let mut touched = 0;
        for update in &batch.updates {
          let (column, ids) = match &update.target {
            UpdateTarget::Ids(ids) => ("id", ids),
            UpdateTarget::LinkedTo(ids) => ("linked_id", ids),
          };
          if ids.is_empty() {
            continue;
          }
          let mut params = vec![
            Value::Text(update.patch.link_precedence.as_str().to_owned()),
            update.patch.linked_id.map_or(Value::Null, Value::Integer),
            Value::Text(at_str.clone()),
          ];
          let in_list = push_id_list(&mut params, ids);
          touched += tx.execute(
            &format!(
              "UPDATE contacts
               SET link_precedence = ?1, linked_id = ?2, updated_at = ?3
               WHERE deleted_at IS NULL AND {column} IN ({in_list})"
            ),
            rusqlite::params_from_iter(params.iter()),
          )?;
        }

        tx.commit()?;
        Ok(Some(touched))
      })
      .await?;

    match touched {
      Some(n) => {
        debug!(touched = n, "applied update batch");
        Ok(n)
      }
      None => {
        warn!(expected = ?expected, "update batch precondition failed");
        Err(Error::StaleMerge(expected))
      }
    }
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts
                 WHERE id = ?1 AND deleted_at IS NULL"
              ),
              rusqlite::params![id],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn soft_delete_contact(&self, id: ContactId) -> Result<bool> {
    let at_str = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE contacts SET deleted_at = ?1, updated_at = ?1
           WHERE id = ?2 AND deleted_at IS NULL",
          rusqlite::params![at_str, id],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────

fn insert_contact(
  conn: &rusqlite::Connection,
  input: &NewContact,
  at_str: &str,
) -> rusqlite::Result<ContactId> {
  conn.execute(
    "INSERT INTO contacts (
       email, phone_number, linked_id, link_precedence, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    rusqlite::params![
      input.email,
      input.phone_number,
      input.linked_id,
      input.link_precedence.as_str(),
      at_str,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// How many of `ids` are non-deleted primaries. `ids` must be distinct.
fn count_live_primaries(
  conn: &rusqlite::Connection,
  ids: &[ContactId],
) -> rusqlite::Result<usize> {
  let mut params = Vec::new();
  let in_list = push_id_list(&mut params, ids);
  let live: i64 = conn.query_row(
    &format!(
      "SELECT COUNT(*) FROM contacts
       WHERE deleted_at IS NULL
         AND link_precedence = 'primary'
         AND id IN ({in_list})"
    ),
    rusqlite::params_from_iter(params.iter()),
    |row| row.get(0),
  )?;
  Ok(live as usize)
}

fn stored_contact(id: ContactId, input: NewContact, at: DateTime<Utc>) -> Contact {
  Contact {
    id,
    email:           input.email,
    phone_number:    input.phone_number,
    linked_id:       input.linked_id,
    link_precedence: input.link_precedence,
    created_at:      at,
    updated_at:      at,
    deleted_at:      None,
  }
}
