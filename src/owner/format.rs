//! Owner text rendering with optional PII masking
//!
//! Masking is pure: the same input always gives the same output, so the
//! result can be memoized and reused by export and clipboard callers.

use crate::model::OwnerRecord;
use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Values shorter than this (in characters) are replaced by [`MASK_TOKEN`].
pub const MIN_MASK_LENGTH: usize = 3;

/// Constant replacement for values too short to mask partially.
pub const MASK_TOKEN: &str = "***";

/// Upper bound on asterisks per masked name word.
pub const MAX_ASTERISKS: usize = 8;

const ADDRESS_VISIBLE_CHARS: usize = 2;
const ADDRESS_MAX_ASTERISKS: usize = 5;

static ORG_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d[\d-]*\)$").expect("org suffix pattern is valid"));

/// Mask a personal name: each word keeps its first character.
pub fn mask_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_MASK_LENGTH {
        return MASK_TOKEN.to_string();
    }
    trimmed
        .split_whitespace()
        .map(mask_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn mask_word(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    match chars.count() {
        // a lone initial is still personal data
        0 => "*".to_string(),
        tail => format!("{}{}", first, "*".repeat(tail.min(MAX_ASTERISKS))),
    }
}

/// Mask a street address, keeping only its first two characters.
pub fn mask_address(address: &str) -> String {
    let trimmed = address.trim();
    let len = trimmed.chars().count();
    if len < MIN_MASK_LENGTH {
        return MASK_TOKEN.to_string();
    }
    let visible: String = trimmed.chars().take(ADDRESS_VISIBLE_CHARS).collect();
    let hidden = (len - ADDRESS_VISIBLE_CHARS).min(ADDRESS_MAX_ASTERISKS);
    format!("{}{}", visible, "*".repeat(hidden))
}

/// Split `"Name (556677-8899)"` into the name and its org-number suffix.
///
/// Only a parenthesized org number counts as a suffix; any other trailing
/// group stays part of the name.
fn split_org_suffix(entry: &str) -> (&str, Option<&str>) {
    if let Some(open) = entry.rfind('(') {
        let suffix = &entry[open..];
        let name = entry[..open].trim_end();
        if !name.is_empty() && ORG_SUFFIX.is_match(suffix) {
            return (name, Some(suffix));
        }
    }
    (entry, None)
}

fn format_list_entry(entry: &str, mask_pii: bool) -> String {
    if !mask_pii {
        return entry.to_string();
    }
    match split_org_suffix(entry) {
        (name, Some(suffix)) => format!("{} {}", mask_name(name), suffix),
        (name, None) => mask_name(name),
    }
}

fn format_owner_list(text: &str, mask_pii: bool) -> Option<String> {
    let mut seen = HashSet::new();
    let entries: Vec<String> = text
        .split(';')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .filter(|e| seen.insert(e.to_lowercase()))
        .map(|e| format_list_entry(e, mask_pii))
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join("; "))
    }
}

/// Render the human-readable owner string for one record.
///
/// A non-blank owner list wins over the individual fields. Otherwise the
/// text is `name, address, postal city (org-number)` with absent parts
/// left out; `unknown_text` stands in for a missing name.
pub fn format_owner_info(owner: &OwnerRecord, mask_pii: bool, unknown_text: &str) -> String {
    if let Some(list) = OwnerRecord::present(&owner.owner_list_text)
        .and_then(|text| format_owner_list(text, mask_pii))
    {
        return list;
    }

    let mut parts = Vec::with_capacity(3);

    parts.push(match OwnerRecord::present(&owner.name) {
        Some(name) if mask_pii => mask_name(name),
        Some(name) => name.to_string(),
        None => unknown_text.to_string(),
    });

    if let Some(address) = OwnerRecord::present(&owner.address) {
        parts.push(if mask_pii {
            mask_address(address)
        } else {
            address.to_string()
        });
    }

    match (
        OwnerRecord::present(&owner.postal_code),
        OwnerRecord::present(&owner.city),
    ) {
        (Some(code), Some(city)) => parts.push(format!("{} {}", code, city)),
        (Some(only), None) | (None, Some(only)) => parts.push(only.to_string()),
        (None, None) => {}
    }

    let mut text = parts.join(", ");
    if let Some(org) = OwnerRecord::present(&owner.org_number) {
        text.push_str(&format!(" ({})", org));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_each_name_word() {
        assert_eq!(mask_name("Anna Svensson"), "A*** S*******");
        assert_eq!(mask_name("Bo Berg"), "B* B***");
        assert_eq!(mask_name("Maximiliansson-Wikström"), "M********");
    }

    #[test]
    fn short_values_become_mask_token() {
        assert_eq!(mask_name("Bo"), MASK_TOKEN);
        assert_eq!(mask_address("7"), MASK_TOKEN);
    }

    #[test]
    fn address_keeps_two_characters() {
        assert_eq!(mask_address("Storgatan 12"), "St*****");
        assert_eq!(mask_address("Väg"), "Vä*");
    }

    #[test]
    fn composite_with_masking() {
        let owner = OwnerRecord::new(1)
            .with_name("Anna Svensson")
            .with_address("Storgatan 12")
            .with_postal("123 45", "Berga")
            .with_org_number("556677-8899");
        assert_eq!(
            format_owner_info(&owner, true, "Unknown"),
            "A*** S*******, St*****, 123 45 Berga (556677-8899)"
        );
        assert_eq!(
            format_owner_info(&owner, false, "Unknown"),
            "Anna Svensson, Storgatan 12, 123 45 Berga (556677-8899)"
        );
    }

    #[test]
    fn missing_name_uses_unknown_text() {
        let owner = OwnerRecord::new(1).with_postal("", "Berga");
        assert_eq!(format_owner_info(&owner, true, "Unknown owner"), "Unknown owner, Berga");
    }

    #[test]
    fn owner_list_masks_names_but_keeps_org_suffix() {
        let owner = OwnerRecord::new(1)
            .with_name("ignored")
            .with_owner_list("Anna Svensson (556677-8899); Bo Berg ; anna svensson (556677-8899);");
        assert_eq!(
            format_owner_info(&owner, true, "?"),
            "A*** S******* (556677-8899); B* B***"
        );
        assert_eq!(
            format_owner_info(&owner, false, "?"),
            "Anna Svensson (556677-8899); Bo Berg"
        );
    }

    #[test]
    fn owner_list_masks_parenthesized_names() {
        let owner = OwnerRecord::new(1).with_owner_list("Anna Svensson (Bo Berg); (Lars Nilsson); Eva Ek (c/o 12)");
        let text = format_owner_info(&owner, true, "?");
        assert_eq!(text, "A*** S******* (** B****; (**** N*******; E** E* (*** 1**");
        for raw in ["Bo Berg", "Lars", "Nilsson", "Svensson"] {
            assert!(!text.contains(raw), "{} leaked in {}", raw, text);
        }
    }

    #[test]
    fn blank_owner_list_falls_back_to_fields() {
        let owner = OwnerRecord::new(1).with_owner_list(" ; ").with_name("Bo Berg");
        assert_eq!(format_owner_info(&owner, false, "?"), "Bo Berg");
    }

    #[test]
    fn masked_output_never_echoes_raw_values() {
        for name in ["Anna Svensson", "A B", "Bo", "Eva", "Lars-Erik Ö Nilsson"] {
            if name.chars().count() >= MIN_MASK_LENGTH {
                let owner = OwnerRecord::new(1).with_name(name);
                let text = format_owner_info(&owner, true, "?");
                assert!(!text.contains(name), "{} leaked in {}", name, text);
            }
        }
        for address in ["Storgatan 12", "Väg", "Box 7"] {
            let owner = OwnerRecord::new(1).with_name("Anna").with_address(address);
            assert!(!format_owner_info(&owner, true, "?").contains(address));
        }
    }

    #[test]
    fn masking_is_deterministic() {
        let owner = OwnerRecord::new(1).with_name("Anna Svensson").with_address("Storgatan 12");
        assert_eq!(
            format_owner_info(&owner, true, "?"),
            format_owner_info(&owner.clone(), true, "?")
        );
    }
}
