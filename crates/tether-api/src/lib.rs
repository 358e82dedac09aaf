//! JSON REST API for Tether.
//!
//! Exposes an axum [`Router`] backed by any [`tether_core::store::ContactStore`].
//! TLS, tracing layers, and process setup are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new().merge(tether_api::api_router(store.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod health;
pub mod identify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tether_core::store::ContactStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ContactStore + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(health::handler))
    .route("/identify", post(identify::handler::<S>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>).delete(contacts::delete_one::<S>),
    )
    .with_state(store)
}
