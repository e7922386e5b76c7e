use serde_json::Value;
use tracing::warn;

use crate::inventory::repo_types::Device;
use crate::store::{Collection, RemoteStore, StoreError};

fn decode(record: Value) -> Result<Device, StoreError> {
    serde_json::from_value(record).map_err(|e| StoreError::Decode(format!("device record: {e}")))
}

fn encode(device: &Device) -> Result<Value, StoreError> {
    serde_json::to_value(device).map_err(|e| StoreError::Decode(format!("device body: {e}")))
}

/// Decodes what it can; the store enforces no schema, so one bad record
/// must not hide the rest.
fn decode_valid(records: Vec<Value>) -> Vec<Device> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id").cloned();
            decode(record)
                .map_err(|e| warn!(id = ?id, error = %e, "skipping unreadable device record"))
                .ok()
        })
        .collect()
}

impl Device {
    /// Devices belonging to `owner_id`. The store is not trusted to filter,
    /// and other owners' records are never decoded.
    pub async fn list_by_owner(
        store: &dyn RemoteStore,
        owner_id: &str,
    ) -> Result<Vec<Device>, StoreError> {
        let mut records = store.list(Collection::Firewalls, None).await?;
        records.retain(|r| r.get("collection_id").and_then(Value::as_str) == Some(owner_id));
        Ok(decode_valid(records))
    }

    pub async fn create(store: &dyn RemoteStore, device: &Device) -> Result<Device, StoreError> {
        decode(store.create(Collection::Firewalls, encode(device)?).await?)
    }

    pub async fn update(store: &dyn RemoteStore, device: &Device) -> Result<Device, StoreError> {
        decode(
            store
                .update(Collection::Firewalls, &device.id, encode(device)?)
                .await?,
        )
    }

    pub async fn delete(store: &dyn RemoteStore, id: &str) -> Result<(), StoreError> {
        store.delete(Collection::Firewalls, id).await
    }
}
