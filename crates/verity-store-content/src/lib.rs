//! Verity content store
//!
//! Write-once, content-addressed document files for payloads too large or
//! too opaque for the key-value engine (DID documents, claim bundles).
//!
//! # Architecture
//!
//! - Identifier: `hex_digest(name || hex_digest(data))`, also the file name
//! - File: `name:<name>\n` header followed by the raw bytes
//! - Read: re-derive the identifier and return the bytes only on a match
//! - Blobs: raw bytes with no header under `cid_` + `hex_digest(data)`
//!
//! Identifiers are typically registered against a DID through
//! `verity_store_core::DidRegistry`.

pub mod error;
pub mod format;
pub mod store;

pub use error::{ContentError, ContentResult};
pub use format::{blob_identifier, content_identifier};
pub use store::{ContentStore, Verification};
