use serde_json::Value;
use tracing::warn;

use crate::auth::repo_types::User;
use crate::store::{Collection, Filter, RemoteStore, StoreError};

fn decode(record: Value) -> Result<User, StoreError> {
    serde_json::from_value(record).map_err(|e| StoreError::Decode(format!("user record: {e}")))
}

impl User {
    /// First readable user registered with this exact email. Malformed
    /// records are skipped, not treated as a store failure.
    pub async fn find_by_email(
        store: &dyn RemoteStore,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let found = store
            .list(Collection::Users, Some(Filter::eq("email", email)))
            .await?;
        Ok(found.into_iter().find_map(|record| {
            decode(record)
                .map_err(|e| warn!(error = %e, "skipping unreadable user record"))
                .ok()
        }))
    }

    pub async fn create(store: &dyn RemoteStore, user: &User) -> Result<User, StoreError> {
        let body =
            serde_json::to_value(user).map_err(|e| StoreError::Decode(format!("user body: {e}")))?;
        decode(store.create(Collection::Users, body).await?)
    }
}
