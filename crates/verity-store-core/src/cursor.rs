//! Prefix-bounded cursor over the index table.
//!
//! redb keeps `&[u8]` keys in lexicographic order, so a scan can seek to
//! the first key >= prefix and stop at the first key that no longer starts
//! with it. An empty prefix walks the whole table.

use redb::ReadableTable;

use crate::error::{StoreError, StoreResult};

/// Walk every `(key, value)` in `table` whose key starts with `prefix`,
/// in key order. Stops early if `visit` returns an error.
///
/// Returns the number of entries visited.
pub(crate) fn scan_prefix<T, F>(table: &T, prefix: &[u8], mut visit: F) -> StoreResult<usize>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
    F: FnMut(&[u8], &[u8]) -> StoreResult<()>,
{
    let mut visited = 0;
    for entry in table.range(prefix..).map_err(StoreError::read)? {
        let (key, value) = entry.map_err(StoreError::read)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        visit(key, value.value())?;
        visited += 1;
    }
    Ok(visited)
}
