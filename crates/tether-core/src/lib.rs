//! Core types, the storage trait, and the identity-resolution algorithm for
//! Tether.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! algorithm in [`identify`] talks to persistence only through
//! [`store::ContactStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod identify;
pub mod store;

pub use error::{Error, Result};
pub use identify::{ConsolidatedContact, IdentifyRequest, identify};
