use serde_json::{Map, Value};

use super::{CREATED_AT, UPDATED_AT, USERS};
use crate::backend::{DocumentStore, DocumentWrite};
use crate::error::AppError;
use crate::models::User;

pub const LAST_LOGIN: &str = "lastLogin";

pub async fn find_by_id(store: &dyn DocumentStore, uid: &str) -> Result<Option<User>, AppError> {
    match store.get(USERS, uid).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Write the profile created at registration. `createdAt` and `lastLogin` are server-stamped.
pub async fn create(
    store: &dyn DocumentStore,
    uid: &str,
    fields: Map<String, Value>,
) -> Result<(), AppError> {
    let write = DocumentWrite::new(fields)
        .with_server_timestamp(CREATED_AT)
        .with_server_timestamp(LAST_LOGIN);
    store.set(USERS, uid, write).await
}

pub async fn touch_last_login(store: &dyn DocumentStore, uid: &str) -> Result<(), AppError> {
    let write = DocumentWrite::new(Map::new()).with_server_timestamp(LAST_LOGIN);
    store.update(USERS, uid, write).await
}

pub async fn update(
    store: &dyn DocumentStore,
    uid: &str,
    fields: Map<String, Value>,
) -> Result<(), AppError> {
    let write = DocumentWrite::new(fields).with_server_timestamp(UPDATED_AT);
    store.update(USERS, uid, write).await
}
