//! Digest function shared by the engine and the content store.
//!
//! SHA-256 over arbitrary bytes. The raw 32-byte form keys the main table;
//! the lowercase hex form names content-addressed files.

use std::fmt;

use sha2::{Digest as _, Sha256};

/// Size of a digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Length of the hex encoding of a digest
pub const HEX_DIGEST_LEN: usize = DIGEST_LEN * 2;

/// Fixed-size SHA-256 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Hash `data` into a digest.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(data.as_ref()).into())
    }

    /// Wrap raw digest bytes read back from storage.
    ///
    /// Returns `None` unless `bytes` is exactly [`DIGEST_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash `data` and return the raw digest bytes.
pub fn digest(data: impl AsRef<[u8]>) -> [u8; DIGEST_LEN] {
    *Digest::of(data).as_bytes()
}

/// Hash `data` and return the lowercase hex digest.
pub fn hex_digest(data: impl AsRef<[u8]>) -> String {
    Digest::of(data).to_hex()
}

/// True if `s` has the shape of a [`hex_digest`] output.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == HEX_DIGEST_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
