//! Verity Store Core: content-addressed key-value storage engine
//!
//! A key-value engine that hashes logical keys into fixed-size digests,
//! keeps values in a digest-keyed main table, and maintains a secondary
//! index from logical key to digest for ordered prefix scans.
//!
//! # Architecture
//!
//! - **Digest**: SHA-256 of the key bytes keys the main table
//! - **Cache**: bounded, insertion-ordered, in front of every read
//! - **Environments**: redb databases holding the `main` and `index` tables,
//!   either in two files or one shared file
//! - **Registry**: DID -> CID facade over the engine
//!
//! Large opaque documents live in the sibling `verity-store-content` crate,
//! which reuses the digest function from here.

pub mod cache;
pub mod config;
mod cursor;
pub mod digest;
pub mod engine;
pub mod env;
pub mod error;
pub mod platform_durability;
pub mod registry;
mod tables;

// Re-export key types for convenience
pub use cache::BoundedCache;
pub use config::{Config, OrphanPolicy};
pub use digest::{digest, hex_digest, Digest, DIGEST_LEN};
pub use engine::StorageEngine;
pub use env::Layout;
pub use error::{StoreError, StoreResult};
pub use registry::DidRegistry;
