use serde::{Deserialize, Serialize};

use crate::inventory::repo_types::Device;

/// Editable attributes of a device, in form order.
pub const FORM_FIELDS: [&str; 7] = [
    "name",
    "hostname",
    "version",
    "brand",
    "model",
    "serial_number",
    "location",
];

/// The create/edit form. Holds exactly the seven user-supplied attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceForm {
    pub name: String,
    pub hostname: String,
    pub version: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub location: String,
}

impl DeviceForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "name" => &self.name,
            "hostname" => &self.hostname,
            "version" => &self.version,
            "brand" => &self.brand,
            "model" => &self.model,
            "serial_number" => &self.serial_number,
            "location" => &self.location,
            _ => return None,
        };
        Some(value)
    }

    /// Returns false for names outside [`FORM_FIELDS`].
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "hostname" => &mut self.hostname,
            "version" => &mut self.version,
            "brand" => &mut self.brand,
            "model" => &mut self.model,
            "serial_number" => &mut self.serial_number,
            "location" => &mut self.location,
            _ => return false,
        };
        *slot = value.into();
        true
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FORM_FIELDS
            .into_iter()
            .map(move |f| (f, self.field(f).unwrap_or_default()))
    }
}

impl From<&Device> for DeviceForm {
    fn from(d: &Device) -> Self {
        Self {
            name: d.name.clone(),
            hostname: d.hostname.clone(),
            version: d.version.clone(),
            brand: d.brand.clone(),
            model: d.model.clone(),
            serial_number: d.serial_number.clone(),
            location: d.location.clone(),
        }
    }
}
