use axum::Json;
use axum::extract::Path;
use serde_json::{Map, Value, json};

use super::properties::CreatedResponse;
use crate::auth::extractor::SignedIn;
use crate::error::AppError;
use crate::models::{Client, ClientData, ClientInteraction, ClientPatch, NewInteraction};

pub async fn list(auth: SignedIn) -> Result<Json<Vec<Client>>, AppError> {
    let clients = auth.workspace.clients.fetch_user_clients(&auth.uid).await?;
    Ok(Json(clients.as_ref().clone()))
}

pub async fn get(auth: SignedIn, Path(id): Path<String>) -> Result<Json<Client>, AppError> {
    let client = auth.workspace.clients.fetch_client(&id).await?;
    Ok(Json(client))
}

/// Create a client of the signed-in realtor.
pub async fn create(
    auth: SignedIn,
    Json(mut body): Json<Map<String, Value>>,
) -> Result<Json<CreatedResponse>, AppError> {
    body.insert("realtorId".to_string(), Value::String(auth.uid.clone()));
    let data: ClientData = serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Invalid client: {e}")))?;

    let id = auth.workspace.clients.add_client(data).await?;
    Ok(Json(CreatedResponse { id }))
}

pub async fn update(
    auth: SignedIn,
    Path(id): Path<String>,
    Json(patch): Json<ClientPatch>,
) -> Result<Json<Client>, AppError> {
    let store = &auth.workspace.clients;
    store.update_client(&id, patch).await?;
    let client = store.fetch_client(&id).await?;
    Ok(Json(client))
}

pub async fn delete(auth: SignedIn, Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    auth.workspace.clients.delete_client(&id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}

pub async fn add_interaction(
    auth: SignedIn,
    Path(id): Path<String>,
    Json(req): Json<NewInteraction>,
) -> Result<Json<ClientInteraction>, AppError> {
    let interaction = auth.workspace.clients.add_interaction(&id, req).await?;
    Ok(Json(interaction))
}
