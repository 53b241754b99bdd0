//! On-disk document format and identifier derivation
//!
//! One file per document:
//!
//! ```text
//! name:<name>\n
//! <raw document bytes>
//! ```
//!
//! The identifier is `hex_digest(name || hex_digest(data))`, so any change
//! to the name or the bytes changes the identifier recomputed on read.
//!
//! Unnamed blobs are stored as raw bytes with no header, under
//! `cid_` followed by `hex_digest(data)`.

use verity_store_core::digest::is_hex_digest;
use verity_store_core::hex_digest;

/// Prefix of the header line
pub const NAME_PREFIX: &[u8] = b"name:";

/// Prefix of identifiers derived from the bytes alone
pub const BLOB_PREFIX: &str = "cid_";

/// Derive the identifier for a document named `name` whose bytes hash to
/// `checksum`.
pub fn content_identifier(name: &str, checksum: &str) -> String {
    let mut input = String::with_capacity(name.len() + checksum.len());
    input.push_str(name);
    input.push_str(checksum);
    hex_digest(input)
}

/// Identifier for an unnamed blob: `cid_` followed by the hex digest of
/// `data`.
pub fn blob_identifier(data: &[u8]) -> String {
    format!("{}{}", BLOB_PREFIX, hex_digest(data))
}

/// Whether `identifier` has the shape of a blob identifier.
pub fn is_blob_identifier(identifier: &str) -> bool {
    identifier.strip_prefix(BLOB_PREFIX).is_some_and(is_hex_digest)
}

/// Whether `identifier` is a well-formed document or blob identifier.
///
/// Anything else, including path separators, never maps to a file.
pub fn is_identifier(identifier: &str) -> bool {
    is_hex_digest(identifier) || is_blob_identifier(identifier)
}

/// Whether `name` fits in the single-line header.
pub fn is_valid_name(name: &str) -> bool {
    !name.contains('\n')
}

/// Serialize header and body into file contents.
pub fn encode(name: &str, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(NAME_PREFIX.len() + name.len() + 1 + data.len());
    buf.extend_from_slice(NAME_PREFIX);
    buf.extend_from_slice(name.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(data);
    buf
}

/// Split file contents into `(name, data)`.
///
/// Returns `None` if the header line is missing, lacks the `name:` prefix,
/// or the name is not UTF-8.
pub fn decode(bytes: &[u8]) -> Option<(&str, &[u8])> {
    let newline = bytes.iter().position(|&b| b == b'\n')?;
    let (header, rest) = bytes.split_at(newline);
    let name = header.strip_prefix(NAME_PREFIX)?;
    let name = std::str::from_utf8(name).ok()?;
    Some((name, &rest[1..]))
}
