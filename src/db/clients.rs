use serde_json::{Map, Value};

use super::{CLIENTS, CREATED_AT, UPDATED_AT};
use crate::backend::{Direction, DocumentStore, DocumentWrite, Query};
use crate::error::AppError;
use crate::models::Client;

/// Clients of `realtor_id`, newest first.
pub async fn list_by_realtor(
    store: &dyn DocumentStore,
    realtor_id: &str,
) -> Result<Vec<Client>, AppError> {
    let query = Query::collection(CLIENTS)
        .where_eq("realtorId", realtor_id)
        .order_by(CREATED_AT, Direction::Descending);

    store
        .query(&query)
        .await?
        .into_iter()
        .map(|doc| doc.decode())
        .collect()
}

pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> Result<Option<Client>, AppError> {
    match store.get(CLIENTS, id).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

pub async fn create(
    store: &dyn DocumentStore,
    fields: Map<String, Value>,
) -> Result<String, AppError> {
    let write = DocumentWrite::new(fields)
        .with_server_timestamp(CREATED_AT)
        .with_server_timestamp(UPDATED_AT);
    store.add(CLIENTS, write).await
}

pub async fn update(
    store: &dyn DocumentStore,
    id: &str,
    fields: Map<String, Value>,
) -> Result<(), AppError> {
    let write = DocumentWrite::new(fields).with_server_timestamp(UPDATED_AT);
    store.update(CLIENTS, id, write).await
}

pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
    store.delete(CLIENTS, id).await
}
