//! Administrative metadata parsed from the dictionary blob.

use serde::Serialize;

/// Seven pipe-separated fields: continent, ISO code, zip, country,
/// province, city, district. Empty fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(rename = "c", skip_serializing_if = "String::is_empty")]
    pub continent: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub zip: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,

    #[serde(rename = "prov", skip_serializing_if = "String::is_empty")]
    pub province: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub district: String,
}

impl Address {
    pub const FIELD_COUNT: usize = 7;

    /// Parse `a|b|c|d|e|f|g`. Any other field count yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let parts: Vec<&str> = text.split('|').collect();
        if parts.len() != Self::FIELD_COUNT {
            return None;
        }

        Some(Self {
            continent: parts[0].to_string(),
            code: parts[1].to_string(),
            zip: parts[2].to_string(),
            country: parts[3].to_string(),
            province: parts[4].to_string(),
            city: parts[5].to_string(),
            district: parts[6].to_string(),
        })
    }
}
