use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::upload;
use crate::auth::extractor::SignedIn;
use crate::error::AppError;
use crate::models::{Property, PropertyData, PropertyFilter, PropertyPatch};

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// The signed-in user's listings, optionally narrowed by `filter`.
pub async fn list(
    auth: SignedIn,
    Query(filter): Query<PropertyFilter>,
) -> Result<Json<Vec<Property>>, AppError> {
    let store = &auth.workspace.properties;
    let properties = store.fetch_user_properties(&auth.uid).await?;

    Ok(Json(
        properties
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect(),
    ))
}

pub async fn get(auth: SignedIn, Path(id): Path<String>) -> Result<Json<Property>, AppError> {
    let property = auth.workspace.properties.fetch_property(&id).await?;
    Ok(Json(property))
}

/// Create a listing owned by the signed-in user.
pub async fn create(
    auth: SignedIn,
    Json(mut body): Json<Map<String, Value>>,
) -> Result<Json<CreatedResponse>, AppError> {
    body.insert("userId".to_string(), Value::String(auth.uid.clone()));
    let data: PropertyData = serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Invalid property: {e}")))?;

    let id = auth.workspace.properties.add_property(data).await?;
    Ok(Json(CreatedResponse { id }))
}

pub async fn update(
    auth: SignedIn,
    Path(id): Path<String>,
    Json(patch): Json<PropertyPatch>,
) -> Result<Json<Property>, AppError> {
    let store = &auth.workspace.properties;
    store.update_property(&id, patch).await?;
    let property = store.fetch_property(&id).await?;
    Ok(Json(property))
}

pub async fn delete(auth: SignedIn, Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    auth.workspace.properties.delete_property(&id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}

pub async fn upload_image(
    auth: SignedIn,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageUrl>, AppError> {
    let file = upload::parse_image(&headers, body).await?;
    let url = auth.workspace.properties.upload_property_image(&id, file).await?;
    Ok(Json(ImageUrl { url }))
}

pub async fn delete_image(
    auth: SignedIn,
    Json(req): Json<ImageUrl>,
) -> Result<Json<Value>, AppError> {
    auth.workspace.properties.delete_property_image(&req.url).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}
