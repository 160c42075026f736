//! Owner identity and deduplication
//!
//! An owner's identity key comes from the first strategy that yields one:
//! the pre-joined owner list, the identifying attributes, the surrounding
//! ids, and finally the record's position. Every record gets a key.

use crate::model::{Fnr, OwnerRecord};
use std::collections::HashSet;

/// Where an owner record was found; supplies fallback identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityContext<'a> {
    pub property_id: Option<&'a str>,
    pub fnr: Option<&'a Fnr>,
}

impl<'a> IdentityContext<'a> {
    pub fn for_parcel(property_id: Option<&'a str>, fnr: &'a Fnr) -> Self {
        Self {
            property_id,
            fnr: Some(fnr),
        }
    }
}

/// Compute the identity key for `owner` at position `sequence_index`.
pub fn identity_key(owner: &OwnerRecord, context: &IdentityContext<'_>, sequence_index: usize) -> String {
    owner_list_key(owner)
        .or_else(|| attribute_key(owner))
        .or_else(|| fallback_id_key(owner, context))
        .unwrap_or_else(|| format!("index:{}", sequence_index))
}

/// Drop owners whose identity key was already seen, keeping first-seen order.
pub fn dedupe(owners: Vec<OwnerRecord>, context: &IdentityContext<'_>) -> Vec<OwnerRecord> {
    let mut seen = HashSet::new();
    owners
        .into_iter()
        .enumerate()
        .filter(|(i, owner)| seen.insert(identity_key(owner, context, *i)))
        .map(|(_, owner)| owner)
        .collect()
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn owner_list_key(owner: &OwnerRecord) -> Option<String> {
    let text = OwnerRecord::present(&owner.owner_list_text)?;
    let entries: Vec<String> = text
        .split(';')
        .map(normalize)
        .filter(|e| !e.is_empty())
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(format!("list:{}", entries.join(";")))
}

fn attribute_key(owner: &OwnerRecord) -> Option<String> {
    let fields = [
        &owner.name,
        &owner.address,
        &owner.postal_code,
        &owner.city,
        &owner.org_number,
        &owner.share,
    ];
    if fields.iter().all(|f| OwnerRecord::present(f).is_none()) {
        return None;
    }
    // Positional so that equal values in different fields never collide.
    let parts: Vec<String> = fields
        .iter()
        .map(|f| OwnerRecord::present(f).map(normalize).unwrap_or_default())
        .collect();
    Some(format!("attrs:{}", parts.join("|")))
}

fn fallback_id_key(owner: &OwnerRecord, context: &IdentityContext<'_>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(id) = context.property_id.map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(id.to_string());
    }
    if let Some(fnr) = context.fnr.filter(|f| !f.is_blank()) {
        parts.push(fnr.key());
    }
    if let Some(object_id) = owner.object_id {
        parts.push(object_id.to_string());
    }
    if let Some(uuid) = OwnerRecord::present(&owner.uuid) {
        parts.push(uuid.to_string());
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("ids:{}", parts.join("|")))
}
