//! Attribute names used to read parcel and owner layers

use serde::{Deserialize, Serialize};

/// Field names on the property (parcel) layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFields {
    pub fnr: String,
    pub uuid: String,
    pub label: String,
    pub object_id: String,
}

impl Default for PropertyFields {
    fn default() -> Self {
        Self {
            fnr: "FNR".to_string(),
            uuid: "UUID_FASTIGHET".to_string(),
            label: "FASTIGHET".to_string(),
            object_id: "OBJECTID".to_string(),
        }
    }
}

/// Field names on the owner layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerFields {
    pub fnr: String,
    pub uuid: String,
    pub label: String,
    pub object_id: String,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub share: String,
    pub org_number: String,
    pub owner_list: String,
}

impl Default for OwnerFields {
    fn default() -> Self {
        Self {
            fnr: "FNR".to_string(),
            uuid: "UUID_FASTIGHET".to_string(),
            label: "FASTIGHET".to_string(),
            object_id: "OBJECTID".to_string(),
            name: "NAMN".to_string(),
            address: "ADRESS".to_string(),
            postal_code: "POSTNR".to_string(),
            city: "POSTADR".to_string(),
            share: "ANDEL".to_string(),
            org_number: "ORGNR".to_string(),
            owner_list: "AGARLISTA".to_string(),
        }
    }
}

/// Both layers' field mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub property: PropertyFields,
    pub owner: OwnerFields,
}
