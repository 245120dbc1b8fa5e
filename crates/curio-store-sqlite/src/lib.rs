//! SQLite emulation of the hosted catalogue store.
//!
//! Implements [`curio_core::client::RemoteTableClient`] over a local database
//! so the gateway and API can run without the hosted service. Wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
