//! `MetaData`: the opaque key/value bag attached to objects and properties.
//!
//! The base format treats `MetaData` as fully opaque — the decoder only
//! consumes a `deserialize(string) -> MetaData` contract. The serialized
//! form is always a flat string (semicolon-separated `k=v` pairs, per the
//! `"k=v;;"` example in the archive-level tests), so this wraps that
//! string directly rather than inventing an internal representation the
//! base contract never asked for.

use std::fmt;

/// A deserialized metadata bag. Read-only: this crate never constructs or
/// mutates archive metadata, only parses it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct MetaData(String);

impl MetaData {
    /// The canonical empty entry — index 0 of the indexed metadata table
    /// (C7) and the default for properties/objects with no metadata.
    pub fn empty() -> Self {
        MetaData(String::new())
    }

    /// Parses a metadata string into a `MetaData`. The format places no
    /// constraints on the string's contents beyond what `pairs()` can
    /// recover from it; deserialization here is infallible, matching the
    /// base contract (`deserialize(string) -> MetaData`).
    pub fn deserialize(s: &str) -> Self {
        MetaData(s.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the raw string on `;` then `=` for callers that want
    /// structured key/value access, mirroring the convenience accessor the
    /// original metadata class provides. Empty segments (e.g. a trailing
    /// `;;`) are skipped; a segment with no `=` yields an empty value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.split(';').filter(|s| !s.is_empty()).map(|kv| {
            match kv.split_once('=') {
                Some((k, v)) => (k, v),
                None => (kv, ""),
            }
        })
    }
}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
