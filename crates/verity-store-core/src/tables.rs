//! Named tables inside each environment.
//!
//! Keys and values are raw bytes. `main` is keyed by digest, `index` by the
//! caller's logical key, so only `index` has a meaningful sort order.

use redb::TableDefinition;

/// Digest -> value
pub(crate) const MAIN_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("main");

/// Logical key -> digest
pub(crate) const INDEX_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("index");
