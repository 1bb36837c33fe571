//! Process-local implementation of the three service contracts, for local
//! development and tests. Mirrors the observable behaviour of the managed
//! services: server timestamps, owner queries, provider error codes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use regex::Regex;
use serde_json::{Map, Value};

use super::{
    Backend, BackendFactory, BlobStore, Direction, Document, DocumentStore, DocumentWrite,
    IdentityProvider, Query, auto_id,
};
use crate::auth::password;
use crate::error::AppError;
use crate::rate_limit::LoginRateLimiter;
use crate::session::{AuthSession, SessionState};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// All three services backed by process memory. Every session shares the same data.
#[derive(Clone)]
pub struct MemoryBackend {
    identity: Arc<MemoryIdentity>,
    documents: Arc<MemoryDocuments>,
    blobs: Arc<MemoryBlobs>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            identity: Arc::new(MemoryIdentity::new()),
            documents: Arc::new(MemoryDocuments::new()),
            blobs: Arc::new(MemoryBlobs::new("memory-bucket")),
        }
    }

    pub fn identity(&self) -> &Arc<MemoryIdentity> {
        &self.identity
    }

    pub fn documents(&self) -> &Arc<MemoryDocuments> {
        &self.documents
    }

    pub fn blobs(&self) -> &Arc<MemoryBlobs> {
        &self.blobs
    }

    pub fn backend(&self) -> Backend {
        Backend {
            identity: self.identity.clone(),
            documents: self.documents.clone(),
            blobs: self.blobs.clone(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendFactory for MemoryBackend {
    fn connect(&self, _session: &SessionState) -> Backend {
        self.backend()
    }
}

fn random_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

// ── Identity ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
    display_name: Option<String>,
}

pub struct MemoryIdentity {
    /// lowercase email -> account
    accounts: DashMap<String, Account>,
    limiter: LoginRateLimiter,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            limiter: LoginRateLimiter::new(),
        }
    }

    fn validate_email(email: &str) -> Result<String, AppError> {
        if !EMAIL_PATTERN.is_match(email) {
            return Err(AppError::provider(
                "auth/invalid-email",
                "The email address is badly formatted.",
            ));
        }
        Ok(email.to_lowercase())
    }

    fn issue(account: &Account) -> AuthSession {
        AuthSession {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            id_token: random_token(),
            refresh_token: random_token(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let key = Self::validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::provider("auth/missing-password", "A password is required."));
        }

        if self.limiter.check(&key).is_err() {
            return Err(AppError::provider(
                "auth/too-many-requests",
                "Access to this account has been temporarily disabled due to many failed login attempts.",
            ));
        }

        let account = self
            .accounts
            .get(&key)
            .map(|a| a.value().clone())
            .ok_or_else(|| {
                AppError::provider(
                    "auth/user-not-found",
                    "There is no user record corresponding to this identifier.",
                )
            })?;

        if !password::verify(password, &account.password_hash)? {
            self.limiter.record_failure(&key);
            return Err(AppError::provider(
                "auth/wrong-password",
                "The password is invalid or the user does not have a password.",
            ));
        }

        self.limiter.reset(&key);
        Ok(Self::issue(&account))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let key = Self::validate_email(email)?;
        password::check_strength(password)?;
        let hash = password::hash(password)?;

        let account = match self.accounts.entry(key) {
            Entry::Occupied(_) => {
                return Err(AppError::provider(
                    "auth/email-already-in-use",
                    "The email address is already in use by another account.",
                ));
            }
            Entry::Vacant(slot) => {
                let account = Account {
                    uid: auto_id(),
                    email: email.to_string(),
                    password_hash: hash,
                    display_name: None,
                };
                slot.insert(account.clone());
                account
            }
        };

        tracing::info!(uid = %account.uid, "Account created");
        Ok(Self::issue(&account))
    }

    async fn update_display_name(
        &self,
        session: &AuthSession,
        name: &str,
    ) -> Result<AuthSession, AppError> {
        let key = session.email.to_lowercase();
        let mut account = self.accounts.get_mut(&key).ok_or_else(|| {
            AppError::provider("auth/user-token-expired", "The user's credential is no longer valid.")
        })?;
        account.display_name = Some(name.to_string());

        Ok(AuthSession {
            display_name: Some(name.to_string()),
            ..session.clone()
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        let key = Self::validate_email(email)?;
        if !self.accounts.contains_key(&key) {
            return Err(AppError::provider(
                "auth/user-not-found",
                "There is no user record corresponding to this identifier.",
            ));
        }

        tracing::warn!(email = %key, "No mail transport in memory backend; password reset not delivered");
        Ok(())
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), AppError> {
        Ok(())
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, AppError> {
        Ok(AuthSession {
            id_token: random_token(),
            expires_at: Utc::now() + Duration::hours(1),
            ..session.clone()
        })
    }
}

// ── Documents ───────────────────────────────────────────────────

pub struct MemoryDocuments {
    /// collection -> id -> fields
    collections: DashMap<String, BTreeMap<String, Map<String, Value>>>,
    clock: Mutex<DateTime<Utc>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Server clock. Strictly increasing so creation order is total.
    fn server_time(&self) -> Value {
        let mut last = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now().max(*last + Duration::microseconds(1));
        *last = now;
        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn stamp(&self, write: DocumentWrite) -> Map<String, Value> {
        let mut fields = write.fields;
        if !write.server_timestamps.is_empty() {
            let now = self.server_time();
            for field in write.server_timestamps {
                fields.insert(field, now.clone());
            }
        }
        fields
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for MemoryDocuments {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordering between two field values of the same kind; mixed kinds order by kind.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (
            DateTime::parse_from_rfc3339(x),
            DateTime::parse_from_rfc3339(y),
        ) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
            .map(|fields| Document {
                id: id.to_string(),
                fields,
            }))
    }

    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, AppError> {
        let id = auto_id();
        let fields = self.stamp(write);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), AppError> {
        let fields = self.stamp(write);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), AppError> {
        let fields = self.stamp(write);
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let existing = docs.get_mut(id).ok_or_else(|| {
            AppError::provider(
                "firestore/not-found",
                format!("No document to update: {collection}/{id}"),
            )
        })?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        let Some(docs) = self.collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Document> = docs
            .iter()
            .filter(|(_, fields)| match &query.filter {
                Some((field, value)) => fields.get(field) == Some(value),
                None => true,
            })
            // Ordering on a field excludes documents that lack it.
            .filter(|(_, fields)| match &query.order_by {
                Some((field, _)) => fields.contains_key(field),
                None => true,
            })
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();
        drop(docs);

        if let Some((field, direction)) = &query.order_by {
            matches.sort_by(|a, b| {
                let ord = compare_values(&a.fields[field], &b.fields[field]);
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        Ok(matches)
    }
}

// ── Blobs ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: Option<String>,
    token: String,
}

pub struct MemoryBlobs {
    bucket: String,
    objects: DashMap<String, StoredBlob>,
}

impl MemoryBlobs {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: DashMap::new(),
        }
    }

    fn url_prefix(&self) -> String {
        format!("memory://{}/", self.bucket)
    }

    /// Object path for a path or a download URL.
    pub fn resolve(&self, reference: &str) -> Result<String, AppError> {
        let prefix = self.url_prefix();
        let Some(rest) = reference.strip_prefix(&prefix) else {
            if reference.contains("://") {
                return Err(AppError::provider(
                    "storage/invalid-url",
                    format!("Invalid URL '{reference}' for this bucket"),
                ));
            }
            return Ok(reference.to_string());
        };

        let encoded = rest.split('?').next().unwrap_or_default();
        urlencoding::decode(encoded)
            .map(|p| p.into_owned())
            .map_err(|e| AppError::provider("storage/invalid-url", e.to_string()))
    }

    /// Fetch the stored bytes behind a path or download URL.
    pub fn read(&self, reference: &str) -> Option<Bytes> {
        let path = self.resolve(reference).ok()?;
        self.objects.get(&path).map(|b| b.data.clone())
    }

    pub fn content_type(&self, reference: &str) -> Option<String> {
        let path = self.resolve(reference).ok()?;
        self.objects.get(&path).and_then(|b| b.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn object_not_found(path: &str) -> AppError {
        AppError::provider("storage/object-not-found", format!("Object '{path}' does not exist."))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        self.objects.insert(
            path.to_string(),
            StoredBlob {
                data,
                content_type: content_type.map(str::to_string),
                token: uuid::Uuid::now_v7().to_string(),
            },
        );
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, AppError> {
        let blob = self.objects.get(path).ok_or_else(|| Self::object_not_found(path))?;
        Ok(format!(
            "{}{}?token={}",
            self.url_prefix(),
            urlencoding::encode(path),
            blob.token
        ))
    }

    async fn delete(&self, reference: &str) -> Result<(), AppError> {
        let path = self.resolve(reference)?;
        self.objects
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| Self::object_not_found(&path))
    }
}
