use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// REST resource groupings exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Firewalls,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Users, Collection::Firewalls];

    pub fn path(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Firewalls => "firewalls",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.path() == s)
            .ok_or_else(|| StoreError::UnknownCollection(s.to_string()))
    }
}

/// Single equality filter, sent as one query-string pair.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'a> {
    pub field: &'a str,
    pub value: &'a str,
}

impl<'a> Filter<'a> {
    pub fn eq(field: &'a str, value: &'a str) -> Self {
        Self { field, value }
    }

    fn matches(&self, record: &Value) -> bool {
        record
            .get(self.field)
            .map(|v| scalar_text(v) == self.value)
            .unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not reach the store: {0}")]
    Connectivity(String),
    #[error("store answered {status} for {collection}")]
    Rejected { collection: Collection, status: u16 },
    #[error("unreadable store response: {0}")]
    Decode(String),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list(
        &self,
        collection: Collection,
        filter: Option<Filter<'_>>,
    ) -> Result<Vec<Value>, StoreError>;
    async fn create(&self, collection: Collection, record: Value) -> Result<Value, StoreError>;
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        record: Value,
    ) -> Result<Value, StoreError>;
    /// Removing an absent record is not an error.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// HTTP client for a json-server style store.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
}

impl RestStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parse store url {base_url}"))?;
        anyhow::ensure!(!base.cannot_be_a_base(), "store url {base_url} cannot be a base");
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn url(&self, collection: Collection, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(collection.path());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }
}

async fn read_json(collection: Collection, res: Response) -> Result<Value, StoreError> {
    let status = res.status();
    if !status.is_success() {
        warn!(%collection, %status, "store rejected request");
        return Err(StoreError::Rejected {
            collection,
            status: status.as_u16(),
        });
    }
    res.json::<Value>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

fn connectivity(e: reqwest::Error) -> StoreError {
    StoreError::Connectivity(e.to_string())
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn list(
        &self,
        collection: Collection,
        filter: Option<Filter<'_>>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut req = self.client.get(self.url(collection, None));
        if let Some(f) = filter {
            req = req.query(&[(f.field, f.value)]);
        }
        let res = req.send().await.map_err(connectivity)?;
        match read_json(collection, res).await? {
            Value::Array(items) => {
                debug!(%collection, count = items.len(), "listed records");
                Ok(items)
            }
            other => Err(StoreError::Decode(format!(
                "expected an array from {collection}, got {other}"
            ))),
        }
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let res = self
            .client
            .post(self.url(collection, None))
            .json(&record)
            .send()
            .await
            .map_err(connectivity)?;
        read_json(collection, res).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        record: Value,
    ) -> Result<Value, StoreError> {
        let res = self
            .client
            .put(self.url(collection, Some(id)))
            .json(&record)
            .send()
            .await
            .map_err(connectivity)?;
        read_json(collection, res).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let res = self
            .client
            .delete(self.url(collection, Some(id)))
            .send()
            .await
            .map_err(connectivity)?;
        let status = res.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        warn!(%collection, %status, id, "store rejected delete");
        Err(StoreError::Rejected {
            collection,
            status: status.as_u16(),
        })
    }
}

/// String form used by equality filters and id lookups.
fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn id_of(record: &Value) -> Option<String> {
    record.get("id").map(scalar_text)
}

/// In-process collections with json-server semantics. Backs the mock
/// server and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `{ "users": [...], "firewalls": [...] }` document. A missing
    /// file yields an empty store.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read store file {}", path.display()))?;
        let doc: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parse store file {}", path.display()))?;
        let collections = collections_from(&doc)
            .with_context(|| format!("load store file {}", path.display()))?;
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    /// Writes the current contents. Callers serialize concurrent saves.
    pub async fn save_file(&self, path: &Path) -> anyhow::Result<()> {
        let doc = self.snapshot().await;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create store dir {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(&doc)?;
        tokio::fs::write(path, raw)
            .await
            .with_context(|| format!("write store file {}", path.display()))
    }

    /// Replaces every collection with the contents of a `snapshot` document.
    pub async fn restore(&self, doc: &Value) -> anyhow::Result<()> {
        let collections = collections_from(doc)?;
        *self.collections.write().await = collections;
        Ok(())
    }

    pub async fn snapshot(&self) -> Value {
        let guard = self.collections.read().await;
        let mut doc = Map::new();
        for c in Collection::ALL {
            let items = guard.get(&c).cloned().unwrap_or_default();
            doc.insert(c.path().to_string(), Value::Array(items));
        }
        Value::Object(doc)
    }

    /// Records matching every `(field, value)` pair.
    pub async fn records(&self, collection: Collection, filters: &[Filter<'_>]) -> Vec<Value> {
        let guard = self.collections.read().await;
        guard
            .get(&collection)
            .map(|items| {
                items
                    .iter()
                    .filter(|r| filters.iter().all(|f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        let guard = self.collections.read().await;
        guard
            .get(&collection)?
            .iter()
            .find(|r| id_of(r).as_deref() == Some(id))
            .cloned()
    }

    pub async fn insert(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let Value::Object(mut fields) = record else {
            return Err(StoreError::Rejected {
                collection,
                status: 400,
            });
        };
        let id = match fields.get("id") {
            Some(v) => scalar_text(v),
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("id".into(), Value::String(id.clone()));
                id
            }
        };
        let mut guard = self.collections.write().await;
        let items = guard.entry(collection).or_default();
        if items.iter().any(|r| id_of(r).as_deref() == Some(id.as_str())) {
            return Err(StoreError::Rejected {
                collection,
                status: 409,
            });
        }
        let stored = Value::Object(fields);
        items.push(stored.clone());
        Ok(stored)
    }

    /// Full replacement; the path id wins over any id in the body.
    pub async fn replace(&self, collection: Collection, id: &str, record: Value) -> Option<Value> {
        let Value::Object(mut fields) = record else {
            return None;
        };
        let mut guard = self.collections.write().await;
        let slot = guard
            .get_mut(&collection)?
            .iter_mut()
            .find(|r| id_of(r).as_deref() == Some(id))?;
        let keep_id = slot.get("id").cloned().unwrap_or(Value::String(id.into()));
        fields.insert("id".into(), keep_id);
        *slot = Value::Object(fields);
        Some(slot.clone())
    }

    pub async fn remove(&self, collection: Collection, id: &str) -> Option<Value> {
        let mut guard = self.collections.write().await;
        let items = guard.get_mut(&collection)?;
        let pos = items.iter().position(|r| id_of(r).as_deref() == Some(id))?;
        Some(items.remove(pos))
    }
}

fn collections_from(doc: &Value) -> anyhow::Result<HashMap<Collection, Vec<Value>>> {
    let mut collections = HashMap::new();
    for c in Collection::ALL {
        let items = match doc.get(c.path()) {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => anyhow::bail!("{} is not an array", c),
            None => Vec::new(),
        };
        collections.insert(c, items);
    }
    Ok(collections)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(
        &self,
        collection: Collection,
        filter: Option<Filter<'_>>,
    ) -> Result<Vec<Value>, StoreError> {
        let filters: Vec<Filter<'_>> = filter.into_iter().collect();
        Ok(self.records(collection, &filters).await)
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        self.insert(collection, record).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        record: Value,
    ) -> Result<Value, StoreError> {
        self.replace(collection, id, record)
            .await
            .ok_or(StoreError::Rejected {
                collection,
                status: 404,
            })
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.remove(collection, id).await;
        Ok(())
    }
}
