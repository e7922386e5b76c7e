use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::mock::MockState;
use crate::store::{Collection, Filter};

pub fn collection_routes() -> Router<MockState> {
    Router::new()
        .route("/:collection", get(list_records).post(create_record))
        .route(
            "/:collection/:id",
            get(get_record).put(replace_record).delete(delete_record),
        )
}

type HandlerError = (StatusCode, String);

fn collection(name: &str) -> Result<Collection, HandlerError> {
    name.parse::<Collection>().map_err(|e| {
        warn!(collection = name, "unknown collection");
        (StatusCode::NOT_FOUND, e.to_string())
    })
}

fn internal<E: std::fmt::Display>(e: E) -> HandlerError {
    error!(error = %e, "mock store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// GET /:collection, every query pair is an equality filter.
#[instrument(skip(state))]
pub async fn list_records(
    State(state): State<MockState>,
    Path(name): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Value>>, HandlerError> {
    let collection = collection(&name)?;
    let filters: Vec<Filter<'_>> = params.iter().map(|(k, v)| Filter::eq(k, v)).collect();
    Ok(Json(state.store.records(collection, &filters).await))
}

#[instrument(skip(state))]
pub async fn get_record(
    State(state): State<MockState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Value>, HandlerError> {
    let collection = collection(&name)?;
    state
        .store
        .get(collection, &id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("{collection}/{id} not found")))
}

#[instrument(skip(state, body))]
pub async fn create_record(
    State(state): State<MockState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let collection = collection(&name)?;
    let write = state.begin_write().await;
    let stored = state.store.insert(collection, body).await.map_err(|e| {
        warn!(error = %e, "insert refused");
        let status = e
            .status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        (status, e.to_string())
    })?;
    write.commit().await.map_err(internal)?;
    info!(%collection, id = %stored["id"], "record created");
    Ok((StatusCode::CREATED, Json(stored)))
}

#[instrument(skip(state, body))]
pub async fn replace_record(
    State(state): State<MockState>,
    Path((name, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, HandlerError> {
    let collection = collection(&name)?;
    let write = state.begin_write().await;
    let stored = state
        .store
        .replace(collection, &id, body)
        .await
        .ok_or((StatusCode::NOT_FOUND, format!("{collection}/{id} not found")))?;
    write.commit().await.map_err(internal)?;
    info!(%collection, %id, "record replaced");
    Ok(Json(stored))
}

#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<MockState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Value>, HandlerError> {
    let collection = collection(&name)?;
    let write = state.begin_write().await;
    if state.store.remove(collection, &id).await.is_none() {
        return Err((StatusCode::NOT_FOUND, format!("{collection}/{id} not found")));
    }
    write.commit().await.map_err(internal)?;
    info!(%collection, %id, "record deleted");
    Ok(Json(json!({})))
}
