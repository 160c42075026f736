//! User-facing strings for placeholder rows

use std::collections::{BTreeMap, HashMap};

/// Translation keys used by the pipeline.
pub mod keys {
    pub const UNKNOWN_OWNER: &str = "unknownOwner";
    pub const NO_OWNERS_FOUND: &str = "noOwnersFound";
    pub const OWNER_QUERY_FAILED: &str = "ownerQueryFailed";
}

/// `(key) -> string` lookup supplied by the host application.
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// English defaults, optionally overridden per key.
///
/// Unknown keys translate to themselves.
#[derive(Debug, Clone)]
pub struct Messages {
    table: HashMap<String, String>,
}

impl Messages {
    pub fn with_override(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.table.insert(key.into(), text.into());
        self
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        self.table
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

impl Default for Messages {
    fn default() -> Self {
        let table = [
            (keys::UNKNOWN_OWNER, "Unknown owner"),
            (keys::NO_OWNERS_FOUND, "No owner information found"),
            (keys::OWNER_QUERY_FAILED, "Owner query failed"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { table }
    }
}

impl Translate for Messages {
    fn translate(&self, key: &str) -> String {
        self.table
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
