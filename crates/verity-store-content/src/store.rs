//! File-backed, write-once content store.
//!
//! Every document is written once under its identifier and never replaced.
//! Reads re-derive the identifier from the file contents and hand back the
//! bytes only if it matches, so a modified file reads as absent. Named
//! documents and unnamed blobs share the directory; their identifiers never
//! collide because blob identifiers carry the `cid_` prefix.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use verity_store_core::hex_digest;
use verity_store_core::platform_durability::{durable_sync, sync_dir};

use crate::error::{ContentError, ContentResult};
use crate::format::{
    blob_identifier, content_identifier, decode, encode, is_blob_identifier, is_identifier,
    is_valid_name,
};

/// Outcome of checking a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// File exists and its contents reproduce the identifier
    Valid(Vec<u8>),
    /// No file for this identifier, or the identifier is malformed
    Missing,
    /// File exists but its contents no longer match the identifier
    Corrupted,
    /// File exists but could not be read
    Unreadable(ErrorKind),
}

/// Directory of content-addressed documents.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> ContentResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| ContentError::io(&root, e))?;
        info!(root = %root.display(), "content store opened");
        Ok(Self { root })
    }

    /// Write `data` under `hex_digest(name || checksum)` and return that
    /// identifier.
    ///
    /// `checksum` is trusted to be `hex_digest(data)`; use
    /// [`ContentStore::store_verified`] when it comes from an untrusted caller.
    pub fn store(&self, name: &str, data: &[u8], checksum: &str) -> ContentResult<String> {
        if !is_valid_name(name) {
            return Err(ContentError::InvalidName {
                name: name.to_string(),
            });
        }
        let identifier = content_identifier(name, checksum);
        self.write_once(&identifier, &encode(name, data))?;

        info!(identifier = %identifier, name = %name, bytes = data.len(), "document stored");
        Ok(identifier)
    }

    /// Write `data` as an unnamed blob under `cid_` + `hex_digest(data)` and
    /// return that identifier.
    ///
    /// The file holds the raw bytes with no header, so the identifier depends
    /// on the bytes alone.
    pub fn store_blob(&self, data: &[u8]) -> ContentResult<String> {
        let identifier = blob_identifier(data);
        self.write_once(&identifier, data)?;

        info!(identifier = %identifier, bytes = data.len(), "blob stored");
        Ok(identifier)
    }

    /// Like [`ContentStore::store`], but first checks that `checksum`
    /// matches `data`.
    pub fn store_verified(&self, name: &str, data: &[u8], checksum: &str) -> ContentResult<String> {
        let actual = hex_digest(data);
        if actual != checksum {
            return Err(ContentError::ChecksumMismatch {
                expected: checksum.to_string(),
                actual,
            });
        }
        self.store(name, data, checksum)
    }

    /// Store `data`, computing its checksum here.
    pub fn store_document(&self, name: &str, data: &[u8]) -> ContentResult<String> {
        self.store(name, data, &hex_digest(data))
    }

    /// Document bytes for `identifier`, or `None` if the file is missing,
    /// unreadable, or fails the integrity check.
    pub fn retrieve(&self, identifier: &str) -> Option<Vec<u8>> {
        match self.verify(identifier) {
            Verification::Valid(data) => Some(data),
            _ => None,
        }
    }

    /// Check the document for `identifier`, distinguishing the cases that
    /// [`ContentStore::retrieve`] reports uniformly as absent.
    pub fn verify(&self, identifier: &str) -> Verification {
        if !is_identifier(identifier) {
            debug!(identifier = %identifier, "malformed content identifier");
            return Verification::Missing;
        }
        let path = self.path_for(identifier);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Verification::Missing,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "content unreadable");
                return Verification::Unreadable(e.kind());
            }
        };

        let (expected, data) = if is_blob_identifier(identifier) {
            (blob_identifier(&bytes), &bytes[..])
        } else {
            let Some((name, data)) = decode(&bytes) else {
                warn!(identifier = %identifier, "content header malformed");
                return Verification::Corrupted;
            };
            (content_identifier(name, &hex_digest(data)), data)
        };
        if expected != identifier {
            warn!(
                identifier = %identifier,
                recomputed = %expected,
                "content failed integrity check"
            );
            return Verification::Corrupted;
        }
        Verification::Valid(data.to_vec())
    }

    /// Whether a file exists for `identifier`, without checking its contents.
    pub fn contains(&self, identifier: &str) -> bool {
        is_identifier(identifier) && self.path_for(identifier).is_file()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the file for `identifier` and make it durable. Fails with
    /// `AlreadyExists` if the identifier is taken.
    fn write_once(&self, identifier: &str, contents: &[u8]) -> ContentResult<()> {
        let path = self.path_for(identifier);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ContentError::AlreadyExists {
                    identifier: identifier.to_string(),
                });
            }
            Err(e) => return Err(ContentError::io(&path, e)),
        };

        let written = file
            .write_all(contents)
            .and_then(|()| durable_sync(&file))
            .and_then(|()| sync_dir(&self.root));
        if let Err(e) = written {
            drop(file);
            discard_partial(&path, identifier);
            return Err(ContentError::io(&path, e));
        }
        Ok(())
    }

    /// File path for `identifier`. Callers must validate the identifier.
    fn path_for(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }
}

/// Remove a file whose write failed. A half-written file would block its
/// identifier forever, so a failed removal is logged for the operator.
fn discard_partial(path: &Path, identifier: &str) {
    if let Err(e) = fs::remove_file(path) {
        warn!(
            identifier = %identifier,
            path = %path.display(),
            error = %e,
            "failed to remove partial content file"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (ContentStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::open(dir.path().join("store")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_store_retrieve() {
        let (store, _dir) = test_store();
        let data = br#"{"id":"did:verity:alice"}"#;
        let checksum = hex_digest(data);

        let id = store.store("diddoc", data, &checksum).unwrap();
        assert_eq!(id, content_identifier("diddoc", &checksum));
        assert!(store.contains(&id));
        assert_eq!(store.retrieve(&id), Some(data.to_vec()));
        assert_eq!(store.verify(&id), Verification::Valid(data.to_vec()));
    }

    #[test]
    fn test_file_layout() {
        let (store, _dir) = test_store();
        let id = store.store_document("doc", b"body").unwrap();
        let raw = fs::read(store.root().join(&id)).unwrap();
        assert_eq!(raw, b"name:doc\nbody".to_vec());
    }

    #[test]
    fn test_write_once() {
        let (store, _dir) = test_store();
        let id = store.store_document("doc", b"v1").unwrap();
        match store.store_document("doc", b"v1") {
            Err(ContentError::AlreadyExists { identifier }) => assert_eq!(identifier, id),
            other => panic!("Expected AlreadyExists, got {:?}", other),
        }
        assert_eq!(store.retrieve(&id), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_tampered_file_reads_as_absent() {
        let (store, _dir) = test_store();
        let id = store.store_document("doc", b"original").unwrap();
        fs::write(store.root().join(&id), b"name:doc\ntampered").unwrap();

        assert_eq!(store.retrieve(&id), None);
        assert_eq!(store.verify(&id), Verification::Corrupted);
        assert!(store.contains(&id));
    }

    #[test]
    fn test_renamed_header_reads_as_absent() {
        let (store, _dir) = test_store();
        let id = store.store_document("doc", b"original").unwrap();
        fs::write(store.root().join(&id), b"name:other\noriginal").unwrap();
        assert_eq!(store.verify(&id), Verification::Corrupted);
    }

    #[test]
    fn test_missing_header_reads_as_absent() {
        let (store, _dir) = test_store();
        let id = store.store_document("doc", b"original").unwrap();
        fs::write(store.root().join(&id), b"original").unwrap();
        assert_eq!(store.verify(&id), Verification::Corrupted);
    }

    #[test]
    fn test_missing_and_malformed_identifiers() {
        let (store, _dir) = test_store();
        assert_eq!(store.retrieve(&hex_digest(b"never stored")), None);
        assert_eq!(store.verify(&hex_digest(b"never stored")), Verification::Missing);
        assert_eq!(store.verify("../../etc/passwd"), Verification::Missing);
        assert!(!store.contains("../../etc/passwd"));
    }

    #[test]
    fn test_store_trusts_checksum() {
        let (store, _dir) = test_store();
        // Wrong checksum is accepted by store, but the read-side check fails
        let id = store.store("doc", b"data", "not-the-checksum").unwrap();
        assert_eq!(store.verify(&id), Verification::Corrupted);
    }

    #[test]
    fn test_store_verified_rejects_mismatch() {
        let (store, _dir) = test_store();
        let err = store.store_verified("doc", b"data", &hex_digest(b"other")).unwrap_err();
        assert!(matches!(err, ContentError::ChecksumMismatch { .. }));
        let id = store.store_verified("doc", b"data", &hex_digest(b"data")).unwrap();
        assert_eq!(store.retrieve(&id), Some(b"data".to_vec()));
    }

    #[test]
    fn test_invalid_name() {
        let (store, _dir) = test_store();
        let err = store.store_document("two\nlines", b"x").unwrap_err();
        assert!(matches!(err, ContentError::InvalidName { .. }));
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_same_bytes_different_names() {
        let (store, _dir) = test_store();
        let a = store.store_document("a", b"shared").unwrap();
        let b = store.store_document("b", b"shared").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.retrieve(&a), store.retrieve(&b));
    }

    #[test]
    fn test_store_blob_retrieve() {
        let (store, _dir) = test_store();
        let data = br#"{"id":"did:verity:alice"}"#;

        let id = store.store_blob(data).unwrap();
        assert_eq!(id, format!("cid_{}", hex_digest(data)));
        assert!(store.contains(&id));
        assert_eq!(store.retrieve(&id), Some(data.to_vec()));
        // Raw bytes, no header
        assert_eq!(fs::read(store.root().join(&id)).unwrap(), data.to_vec());
    }

    #[test]
    fn test_blob_write_once() {
        let (store, _dir) = test_store();
        let id = store.store_blob(b"v1").unwrap();
        match store.store_blob(b"v1") {
            Err(ContentError::AlreadyExists { identifier }) => assert_eq!(identifier, id),
            other => panic!("Expected AlreadyExists, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_blob_reads_as_absent() {
        let (store, _dir) = test_store();
        let id = store.store_blob(b"original").unwrap();
        fs::write(store.root().join(&id), b"tampered").unwrap();

        assert_eq!(store.retrieve(&id), None);
        assert_eq!(store.verify(&id), Verification::Corrupted);
    }

    #[test]
    fn test_blob_and_document_identifiers_are_distinct() {
        let (store, _dir) = test_store();
        let blob = store.store_blob(b"shared").unwrap();
        let doc = store.store_document("doc", b"shared").unwrap();
        assert_ne!(blob, doc);
        assert_eq!(store.retrieve(&blob), store.retrieve(&doc));

        // A blob digest without its prefix names nothing
        assert_eq!(store.verify(&hex_digest(b"shared")), Verification::Missing);
        assert_eq!(store.verify(&format!("cid_{}", hex_digest(b"never"))), Verification::Missing);
    }

    #[test]
    fn test_discard_partial_removes_file() {
        let (store, _dir) = test_store();
        let id = blob_identifier(b"body");
        let path = store.root().join(&id);
        fs::write(&path, b"bo").unwrap();

        discard_partial(&path, &id);
        assert!(!path.exists());
        // Nothing left to remove: logged, not raised
        discard_partial(&path, &id);
        assert!(store.store_blob(b"body").is_ok());
    }

    #[test]
    fn test_binary_body() {
        let (store, _dir) = test_store();
        let data = [0u8, b'\n', 0xFF, b'\n', 7];
        let id = store.store_document("blob", &data).unwrap();
        assert_eq!(store.retrieve(&id), Some(data.to_vec()));
    }
}
