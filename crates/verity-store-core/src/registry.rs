//! DID registry over the storage engine.
//!
//! Maps decentralized identifiers to the content identifiers of their
//! documents. Register is a `put`, resolve is a `get`, and listing a
//! namespace is a prefix `iterate`.

use std::sync::Arc;

use crate::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};

/// String-typed DID -> CID registry.
#[derive(Debug, Clone)]
pub struct DidRegistry {
    engine: Arc<StorageEngine>,
}

impl DidRegistry {
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self { engine }
    }

    /// Point `did` at `doc_cid`, replacing any earlier registration.
    pub fn register(&self, did: &str, doc_cid: &str) -> StoreResult<()> {
        self.engine.put(did, doc_cid)
    }

    /// Content identifier currently registered for `did`.
    pub fn resolve(&self, did: &str) -> StoreResult<String> {
        let raw = self.engine.get(did)?;
        decode(did.as_bytes(), raw)
    }

    /// Every registration whose DID starts with `prefix`, in DID order.
    pub fn list(&self, prefix: &str) -> StoreResult<Vec<(String, String)>> {
        self.engine
            .iterate(prefix)?
            .into_iter()
            .map(|(did, cid)| {
                let cid = decode(&did, cid)?;
                let did = decode(&did, did.clone())?;
                Ok((did, cid))
            })
            .collect()
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }
}

fn decode(key: &[u8], bytes: Vec<u8>) -> StoreResult<String> {
    String::from_utf8(bytes).map_err(|_| StoreError::Decode {
        key: String::from_utf8_lossy(key).into_owned(),
    })
}
