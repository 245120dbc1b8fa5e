//! Core types for the Curio artifact catalogue.
//!
//! Holds the artifact view-models, the response-shape validator, the
//! [`client::RemoteTableClient`] seam and the [`gateway::ArtifactGateway`]
//! that translates between the two. This crate has no HTTP or database
//! dependencies of its own.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod artifact;
pub mod client;
pub mod context;
pub mod error;
pub mod gateway;
pub mod row;
pub mod shape;

pub use error::{Error, Result};
pub use gateway::ArtifactGateway;
