//! Core types and trait definitions for Bulletin announcement distribution.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the four pieces with real correctness content: audience resolution, view
//! tracking, statistics aggregation and notification dispatch, plus the
//! service that wires them to a store.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod announcement;
pub mod audience;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod reconcile;
pub mod service;
pub mod stats;
pub mod store;
pub mod tenant;
pub mod validate;
pub mod views;

pub use error::{Error, Result};
