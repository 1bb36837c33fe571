use serde_json::{Map, Value};

use super::{CREATED_AT, PROPERTIES, UPDATED_AT};
use crate::backend::{Direction, DocumentStore, DocumentWrite, Query};
use crate::error::AppError;
use crate::models::Property;

/// Listings owned by `user_id`, newest first.
pub async fn list_by_owner(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<Property>, AppError> {
    let query = Query::collection(PROPERTIES)
        .where_eq("userId", user_id)
        .order_by(CREATED_AT, Direction::Descending);

    store
        .query(&query)
        .await?
        .into_iter()
        .map(|doc| doc.decode())
        .collect()
}

pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> Result<Option<Property>, AppError> {
    match store.get(PROPERTIES, id).await? {
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
    store.add(PROPERTIES, write).await
}

pub async fn update(
    store: &dyn DocumentStore,
    id: &str,
    fields: Map<String, Value>,
) -> Result<(), AppError> {
    let write = DocumentWrite::new(fields).with_server_timestamp(UPDATED_AT);
    store.update(PROPERTIES, id, write).await
}

pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
    store.delete(PROPERTIES, id).await
}
