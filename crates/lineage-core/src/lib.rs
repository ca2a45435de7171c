//! Core types and trait definitions for the lineage registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::RegistryStore`]; the API layer depends
//! only on that abstraction and on the decision logic in [`permission`] and
//! [`mutation`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod mutation;
pub mod permission;
pub mod person;
pub mod photo;
pub mod relation;
pub mod store;

pub use error::{Error, Result};
