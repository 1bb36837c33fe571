//! REST clients for Firebase Authentication, Cloud Firestore and Cloud Storage.

pub mod auth;
pub mod firestore;
pub mod storage;
pub mod value;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::{Backend, BackendFactory, IdentityProvider};
use crate::config::FirebaseConfig;
use crate::error::AppError;
use crate::session::SessionState;

pub use auth::FirebaseIdentity;
pub use firestore::Firestore;
pub use storage::FirebaseStorage;

/// Builds per-session Firebase clients that share one connection pool.
pub struct FirebaseBackend {
    config: Arc<FirebaseConfig>,
    http: reqwest::Client,
    identity: Arc<FirebaseIdentity>,
}

impl FirebaseBackend {
    pub fn new(config: FirebaseConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let config = Arc::new(config);
        let identity = Arc::new(FirebaseIdentity::new(config.clone(), http.clone()));

        tracing::info!(
            project = %config.project_id,
            bucket = %config.storage_bucket,
            emulated = config.emulated,
            "Firebase backend configured"
        );

        Ok(Self {
            config,
            http,
            identity,
        })
    }
}

impl BackendFactory for FirebaseBackend {
    fn connect(&self, session: &SessionState) -> Backend {
        let tokens = TokenSource {
            session: session.clone(),
            identity: self.identity.clone(),
            emulated: self.config.emulated,
        };

        Backend {
            identity: self.identity.clone(),
            documents: Arc::new(Firestore::new(
                self.config.clone(),
                self.http.clone(),
                tokens.clone(),
            )),
            blobs: Arc::new(FirebaseStorage::new(
                self.config.clone(),
                self.http.clone(),
                tokens,
            )),
        }
    }
}

/// Supplies the signed-in user's id token, refreshing it once it has expired.
#[derive(Clone)]
pub struct TokenSource {
    session: SessionState,
    identity: Arc<FirebaseIdentity>,
    emulated: bool,
}

impl TokenSource {
    pub async fn id_token(&self) -> Result<Option<String>, AppError> {
        let Some(current) = self.session.current() else {
            // The emulators treat `owner` as an admin credential.
            return Ok(self.emulated.then(|| "owner".to_string()));
        };

        if !current.is_expired() {
            return Ok(Some(current.id_token));
        }

        tracing::debug!(uid = %current.uid, "Refreshing expired id token");
        let refreshed = self.identity.refresh(&current).await?;
        let token = refreshed.id_token.clone();
        self.session.set(refreshed);
        Ok(Some(token))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Turn a non-success response into a provider error using `classify`.
async fn error_from_response(
    resp: reqwest::Response,
    classify: impl FnOnce(reqwest::StatusCode, &str, Option<&str>) -> AppError,
) -> AppError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => classify(
            status,
            &envelope.error.message,
            envelope.error.status.as_deref(),
        ),
        Err(_) => classify(status, text.trim(), None),
    }
}
