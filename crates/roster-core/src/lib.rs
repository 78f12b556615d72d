//! Core types and trait definitions for the Roster person registry.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the person model, the validation rules, filter normalisation, and the store
//! and cache abstractions every other crate builds on.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cache;
pub mod error;
pub mod filter;
pub mod person;
pub mod store;
pub mod validate;

pub use error::{Category, Error, Result};
