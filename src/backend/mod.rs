//! Seams to the managed services: identity provider, document store and blob store.

pub mod firebase;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::session::{AuthSession, SessionState};

/// 20 alphanumeric characters, the shape of the document store's generated ids.
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

/// A stored document: its id plus its field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decode into a model, exposing the document id as the `id` field.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, AppError> {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Field values to write, plus fields the server stamps with its own clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    pub fields: Map<String, Value>,
    pub server_timestamps: Vec<String>,
}

impl DocumentWrite {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    pub fn with_server_timestamp(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self.server_timestamps.push(field.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter on one field, ordered by another.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filter: None,
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;
    /// Set the display name; returns the session with the new name applied.
    async fn update_display_name(
        &self,
        session: &AuthSession,
        name: &str,
    ) -> Result<AuthSession, AppError>;
    async fn send_password_reset(&self, email: &str) -> Result<(), AppError>;
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AppError>;
    /// Exchange the refresh token for a new id token.
    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, AppError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;
    /// Create a document with a store-assigned id.
    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, AppError>;
    /// Create or overwrite the document at `id`.
    async fn set(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), AppError>;
    /// Merge top-level fields into an existing document.
    async fn update(&self, collection: &str, id: &str, write: DocumentWrite)
    -> Result<(), AppError>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;
    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, data: Bytes, content_type: Option<&str>)
    -> Result<(), AppError>;
    async fn download_url(&self, path: &str) -> Result<String, AppError>;
    /// Delete by object path or by a URL previously returned from `download_url`.
    async fn delete(&self, reference: &str) -> Result<(), AppError>;
}

/// The three services as seen by one client session.
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
}

/// Produces service handles bound to a session, so remote calls carry that
/// session's credentials.
pub trait BackendFactory: Send + Sync {
    fn connect(&self, session: &SessionState) -> Backend;
}
