use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Device record in the `firewalls` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(rename = "collection_id")]
    pub owner_id: String, // user who created it; never reassigned
    pub name: String,
    pub hostname: String,
    pub version: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub location: String,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn active() -> bool {
    true
}
