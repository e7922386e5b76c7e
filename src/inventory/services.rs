use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::inventory::{dto::DeviceForm, repo_types::Device};
use crate::store::StoreError;

pub const MAX_FIELD_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("The field {0} is required.")]
    MissingField(&'static str),
    #[error("The field {0} must be at most 100 characters.")]
    FieldTooLong(&'static str),
    #[error("Invalid date {0}, expected YYYY-MM-DD.")]
    InvalidDate(String),
    #[error("No device {0} in your inventory.")]
    NotFound(String),
    #[error("An error occurred while saving the device. Please try again.")]
    SaveFailed(#[source] StoreError),
    #[error("Could not connect to the server.")]
    Connection(#[source] StoreError),
}

/// Reports the first offending field in form order.
pub fn validate_form(form: &DeviceForm) -> Result<(), InventoryError> {
    for (field, value) in form.fields() {
        if value.trim().is_empty() {
            return Err(InventoryError::MissingField(field));
        }
        if value.chars().count() > MAX_FIELD_LEN {
            return Err(InventoryError::FieldTooLong(field));
        }
    }
    Ok(())
}

/// A brand new record owned by `owner_id`.
pub fn new_device(form: DeviceForm, owner_id: &str, now: OffsetDateTime) -> Device {
    Device {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: form.name,
        hostname: form.hostname,
        version: form.version,
        brand: form.brand,
        model: form.model,
        serial_number: form.serial_number,
        location: form.location,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Applies the form to an existing record. Identity, owner, creation time
/// and active flag are kept.
pub fn apply_edit(original: &Device, form: DeviceForm, now: OffsetDateTime) -> Device {
    Device {
        name: form.name,
        hostname: form.hostname,
        version: form.version,
        brand: form.brand,
        model: form.model,
        serial_number: form.serial_number,
        location: form.location,
        updated_at: next_update(original, now),
        ..original.clone()
    }
}

/// `updated_at` must strictly advance even if the clock has not.
fn next_update(original: &Device, now: OffsetDateTime) -> OffsetDateTime {
    let floor = original.updated_at.max(original.created_at);
    if now > floor {
        now
    } else {
        floor + Duration::milliseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn fw1() -> DeviceForm {
        DeviceForm {
            name: "FW1".into(),
            hostname: "fw1.local".into(),
            version: "1.0".into(),
            brand: "Cisco".into(),
            model: "ASA5506".into(),
            serial_number: "SN1".into(),
            location: "Lima".into(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(validate_form(&fw1()).is_ok());
    }

    #[test]
    fn reports_first_missing_field_by_name() {
        let mut form = fw1();
        form.model = "   ".into();
        form.location = String::new();
        let err = validate_form(&form).unwrap_err();
        assert!(matches!(err, InventoryError::MissingField("model")));
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn rejects_fields_over_limit_counting_chars() {
        let mut form = fw1();
        form.hostname = "ñ".repeat(MAX_FIELD_LEN);
        assert!(validate_form(&form).is_ok());
        form.hostname.push('x');
        assert!(matches!(
            validate_form(&form),
            Err(InventoryError::FieldTooLong("hostname"))
        ));
    }

    #[test]
    fn new_device_is_owned_active_and_unmodified() {
        let now = datetime!(2025-03-01 10:00 UTC);
        let d = new_device(fw1(), "u1", now);
        assert_eq!(d.owner_id, "u1");
        assert!(d.is_active);
        assert_eq!(d.created_at, d.updated_at);
        assert!(!d.id.is_empty());
    }

    #[test]
    fn edit_keeps_identity_and_advances_updated_at() {
        let created = datetime!(2025-03-01 10:00 UTC);
        let original = new_device(fw1(), "u1", created);

        let mut form = DeviceForm::from(&original);
        form.location = "Quito".into();

        // A clock that has not moved still yields a later stamp.
        let edited = apply_edit(&original, form.clone(), created);
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.owner_id, "u1");
        assert_eq!(edited.created_at, created);
        assert_eq!(edited.location, "Quito");
        assert!(edited.updated_at > original.created_at);

        let later = datetime!(2025-03-02 08:00 UTC);
        assert_eq!(apply_edit(&original, form, later).updated_at, later);
    }
}
