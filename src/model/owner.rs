//! Owner records as returned by the owner layer

use super::fnr::Fnr;
use serde::{Deserialize, Serialize};

/// One owner of a parcel.
///
/// `owner_list_text`, when present, is a semicolon-delimited list of
/// co-owners and supersedes the individual name/address fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub object_id: Option<i64>,
    pub fnr: Option<Fnr>,
    pub uuid: Option<String>,
    pub label: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub share: Option<String>,
    pub org_number: Option<String>,
    pub owner_list_text: Option<String>,
}

impl OwnerRecord {
    pub fn new(object_id: i64) -> Self {
        Self {
            object_id: Some(object_id),
            ..Self::default()
        }
    }

    pub fn with_fnr(mut self, fnr: impl Into<Fnr>) -> Self {
        self.fnr = Some(fnr.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_postal(mut self, postal_code: impl Into<String>, city: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self.city = Some(city.into());
        self
    }

    pub fn with_share(mut self, share: impl Into<String>) -> Self {
        self.share = Some(share.into());
        self
    }

    pub fn with_org_number(mut self, org_number: impl Into<String>) -> Self {
        self.org_number = Some(org_number.into());
        self
    }

    pub fn with_owner_list(mut self, text: impl Into<String>) -> Self {
        self.owner_list_text = Some(text.into());
        self
    }

    /// A field value, treating blank strings as absent.
    pub(crate) fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
