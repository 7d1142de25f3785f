//! Object storage client for the Supabase storage REST API.
//!
//! A clean wrapper around the two calls this project needs: downloading a
//! public object and upserting one. Carries no dependency on the rest of
//! the codebase.

mod client;
mod error;

pub use client::{StorageClient, StorageClientConfig};
pub use error::{Error, Result};
