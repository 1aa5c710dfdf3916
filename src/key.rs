//! Key composition
//!
//! Maps a logical key plus an optional namespace onto the physical byte key
//! held by the backend:
//!
//! ```text
//! with prefix:     <prefix> ':' <logical_key>
//! without prefix:  <logical_key>
//! ```
//!
//! Exactly one `prefix:` header is ever added or removed. A prefix that
//! itself contains `:` can collide with another namespace (`a:b` + `k` and
//! `a` + `b:k` compose to the same bytes); no escaping is applied.

/// Separator between namespace prefix and logical key
pub const SEPARATOR: u8 = b':';

/// Builds and strips physical keys for one database handle
#[derive(Debug, Clone, Default)]
pub struct KeyComposer {
    /// Prefix used when a call does not supply one
    default_prefix: Option<String>,
}

impl KeyComposer {
    pub fn new(default_prefix: Option<String>) -> Self {
        Self { default_prefix }
    }

    /// Resolve the prefix that applies to a call
    ///
    /// Call-site prefix wins over the default; an empty prefix means none.
    pub fn effective_prefix<'a>(&'a self, prefix: Option<&'a str>) -> Option<&'a str> {
        prefix
            .or(self.default_prefix.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Build the physical key for a logical key
    pub fn compose(&self, logical_key: &str, prefix: Option<&str>) -> Vec<u8> {
        match self.effective_prefix(prefix) {
            Some(p) => {
                let mut key = Vec::with_capacity(p.len() + 1 + logical_key.len());
                key.extend_from_slice(p.as_bytes());
                key.push(SEPARATOR);
                key.extend_from_slice(logical_key.as_bytes());
                key
            }
            None => logical_key.as_bytes().to_vec(),
        }
    }

    /// Physical header that every key in the namespace starts with
    ///
    /// Empty when no prefix applies, which matches every key.
    pub fn namespace_header(&self, prefix: Option<&str>) -> Vec<u8> {
        match self.effective_prefix(prefix) {
            Some(p) => {
                let mut header = Vec::with_capacity(p.len() + 1);
                header.extend_from_slice(p.as_bytes());
                header.push(SEPARATOR);
                header
            }
            None => Vec::new(),
        }
    }

    /// Recover the logical part of a physical key
    ///
    /// Returns `None` when the key does not belong to the namespace.
    pub fn strip<'k>(&self, physical_key: &'k [u8], prefix: Option<&str>) -> Option<&'k [u8]> {
        match self.effective_prefix(prefix) {
            Some(p) => physical_key
                .strip_prefix(p.as_bytes())?
                .strip_prefix(&[SEPARATOR]),
            None => Some(physical_key),
        }
    }
}
