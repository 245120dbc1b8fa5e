//! HTTP backend for the hosted catalogue store.
//!
//! [`RestClient`] implements [`curio_core::client::RemoteTableClient`] by
//! speaking the store's PostgREST-style dialect: tables under `/rest/v1/`,
//! embedded resources in `select=`, `eq.` filters, and procedures under
//! `/rest/v1/rpc/`.

mod client;
mod query;

pub mod error;

pub use client::{RestClient, RestConfig};
pub use error::{RestError, Result};
