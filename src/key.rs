//! Composite record keys.
//!
//! Per-owner entities are addressed by `(owner, name)`. The encoded form joins
//! the two with `_`; any `\` or `_` inside the owner is escaped with a leading
//! `\`, so the first unescaped `_` always ends the owner. Platform-issued owner
//! ids are numeric, which makes the encoding identical to the plain
//! `"{owner}_{name}"` layout used by existing data files.

use std::fmt;

const SEPARATOR: char = '_';
const ESCAPE: char = '\\';

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub owner: String,
    pub name: String,
}

impl RecordKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.owner.len() + self.name.len() + 1);
        for ch in self.owner.chars() {
            if ch == SEPARATOR || ch == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(ch);
        }
        out.push(SEPARATOR);
        out.push_str(&self.name);
        out
    }

    /// Inverse of [`RecordKey::encode`]. Returns `None` when no unescaped
    /// separator is present or an escape is dangling.
    pub fn decode(encoded: &str) -> Option<Self> {
        let mut owner = String::new();
        let mut chars = encoded.char_indices();
        while let Some((idx, ch)) = chars.next() {
            match ch {
                ESCAPE => {
                    let (_, escaped) = chars.next()?;
                    owner.push(escaped);
                }
                SEPARATOR => {
                    let name = &encoded[idx + SEPARATOR.len_utf8()..];
                    return Some(Self::new(owner, name));
                }
                other => owner.push(other),
            }
        }
        None
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Store key for the record `name` owned by `owner`.
pub fn derive_key(owner: &str, name: &str) -> String {
    RecordKey::new(owner, name).encode()
}
