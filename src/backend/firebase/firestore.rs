use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::value::{decode_fields, document_id, encode, encode_fields, field_path};
use super::{TokenSource, error_from_response};
use crate::backend::{Direction, Document, DocumentStore, DocumentWrite, Query, auto_id};
use crate::config::FirebaseConfig;
use crate::error::AppError;

/// Cloud Firestore REST client bound to one session's credentials.
pub struct Firestore {
    config: Arc<FirebaseConfig>,
    http: reqwest::Client,
    tokens: TokenSource,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RawDocument {
    fn into_document(self) -> Result<Document, AppError> {
        Ok(Document {
            id: document_id(&self.name).to_string(),
            fields: decode_fields(&self.fields)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// Precondition placed on a commit write.
enum Precondition {
    Any,
    Exists(bool),
}

/// `NOT_FOUND` -> `firestore/not-found`.
pub fn firestore_error(http: reqwest::StatusCode, message: &str, status: Option<&str>) -> AppError {
    let reason = match status {
        Some(status) => status.to_ascii_lowercase().replace('_', "-"),
        None => match http.as_u16() {
            400 => "invalid-argument".to_string(),
            401 => "unauthenticated".to_string(),
            403 => "permission-denied".to_string(),
            404 => "not-found".to_string(),
            409 => "already-exists".to_string(),
            429 => "resource-exhausted".to_string(),
            503 => "unavailable".to_string(),
            _ => "unknown".to_string(),
        },
    };
    AppError::provider(format!("firestore/{reason}"), message)
}

impl Firestore {
    pub fn new(config: Arc<FirebaseConfig>, http: reqwest::Client, tokens: TokenSource) -> Self {
        Self {
            config,
            http,
            tokens,
        }
    }

    fn database(&self) -> String {
        format!("projects/{}/databases/(default)", self.config.project_id)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database())
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.config.firestore_url,
            self.document_name(collection, id)
        )
    }

    async fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        Ok(match self.tokens.id_token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn commit(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
        mask: bool,
        precondition: Precondition,
    ) -> Result<(), AppError> {
        let mut op = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": encode_fields(&write.fields),
            }
        });

        if mask {
            let paths: Vec<String> = write.fields.keys().map(|k| field_path(k)).collect();
            op["updateMask"] = json!({ "fieldPaths": paths });
        }

        if let Precondition::Exists(exists) = precondition {
            op["currentDocument"] = json!({ "exists": exists });
        }

        if !write.server_timestamps.is_empty() {
            let transforms: Vec<Value> = write
                .server_timestamps
                .iter()
                .map(|f| json!({ "fieldPath": field_path(f), "setToServerValue": "REQUEST_TIME" }))
                .collect();
            op["updateTransforms"] = Value::Array(transforms);
        }

        let url = format!(
            "{}/{}/documents:commit",
            self.config.firestore_url,
            self.database()
        );
        let resp = self
            .authorized(self.http.post(url))
            .await?
            .json(&json!({ "writes": [op] }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, firestore_error).await);
        }
        Ok(())
    }

    /// Body of a `runQuery` request.
    pub fn structured_query(query: &Query) -> Value {
        let mut structured = json!({
            "from": [{ "collectionId": query.collection }],
        });

        if let Some((field, value)) = &query.filter {
            structured["where"] = json!({
                "fieldFilter": {
                    "field": { "fieldPath": field_path(field) },
                    "op": "EQUAL",
                    "value": encode(value),
                }
            });
        }

        if let Some((field, direction)) = &query.order_by {
            let direction = match direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] = json!([{
                "field": { "fieldPath": field_path(field) },
                "direction": direction,
            }]);
        }

        json!({ "structuredQuery": structured })
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let resp = self
            .authorized(self.http.get(self.document_url(collection, id)))
            .await?
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(error_from_response(resp, firestore_error).await);
        }

        let raw: RawDocument = resp.json().await?;
        raw.into_document().map(Some)
    }

    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, AppError> {
        let id = auto_id();
        self.commit(collection, &id, write, false, Precondition::Exists(false))
            .await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), AppError> {
        self.commit(collection, id, write, false, Precondition::Any)
            .await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), AppError> {
        self.commit(collection, id, write, true, Precondition::Exists(true))
            .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let resp = self
            .authorized(self.http.delete(self.document_url(collection, id)))
            .await?
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, firestore_error).await);
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        let url = format!(
            "{}/{}/documents:runQuery",
            self.config.firestore_url,
            self.database()
        );
        let resp = self
            .authorized(self.http.post(url))
            .await?
            .json(&Self::structured_query(query))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, firestore_error).await);
        }

        let items: Vec<RunQueryItem> = resp.json().await?;
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RawDocument::into_document)
            .collect()
    }
}
