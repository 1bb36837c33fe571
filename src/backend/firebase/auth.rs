use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::error_from_response;
use crate::backend::IdentityProvider;
use crate::config::FirebaseConfig;
use crate::error::AppError;
use crate::session::AuthSession;

/// Identity Toolkit REST client (email/password accounts).
pub struct FirebaseIdentity {
    config: Arc<FirebaseConfig>,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

impl AccountResponse {
    fn into_session(self) -> AuthSession {
        AuthSession {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name.filter(|n| !n.is_empty()),
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            expires_at: expiry(self.expires_in.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Expiry from the `expiresIn` seconds string, one minute early so a token
/// never goes stale in flight.
fn expiry(expires_in: Option<&str>) -> chrono::DateTime<Utc> {
    let secs = expires_in.and_then(|s| s.parse::<i64>().ok()).unwrap_or(3600);
    Utc::now() + Duration::seconds(secs - 60)
}

/// Map an Identity Toolkit error message (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`)
/// to the `auth/*` code used by the client SDKs.
pub fn auth_error(message: &str) -> AppError {
    let (reason, detail) = match message.split_once(" : ") {
        Some((reason, detail)) => (reason.trim(), Some(detail.trim())),
        None => (message.trim(), None),
    };

    let code = match reason {
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "EMAIL_NOT_FOUND" => "auth/user-not-found",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        "INVALID_EMAIL" => "auth/invalid-email",
        "MISSING_PASSWORD" => "auth/missing-password",
        "WEAK_PASSWORD" => "auth/weak-password",
        "USER_DISABLED" => "auth/user-disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => "auth/user-token-expired",
        "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "auth/invalid-user-token"
        }
        "OPERATION_NOT_ALLOWED" => "auth/operation-not-allowed",
        "INVALID_API_KEY" | "API_KEY_INVALID" => "auth/invalid-api-key",
        _ => "auth/internal-error",
    };

    let message = match detail {
        Some(detail) => detail.to_string(),
        None => format!("Firebase: Error ({code})."),
    };
    AppError::provider(code, message)
}

impl FirebaseIdentity {
    pub fn new(config: Arc<FirebaseConfig>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn accounts_url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{method}?key={}",
            self.config.identity_url,
            urlencoding::encode(&self.config.api_key)
        )
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, AppError> {
        let resp = self
            .http
            .post(self.accounts_url(method))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, |_, message, _| auth_error(message)).await);
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let account: AccountResponse = self
            .post(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        Ok(account.into_session())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let account: AccountResponse = self
            .post(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        Ok(account.into_session())
    }

    async fn update_display_name(
        &self,
        session: &AuthSession,
        name: &str,
    ) -> Result<AuthSession, AppError> {
        let _: serde_json::Value = self
            .post(
                "update",
                json!({ "idToken": session.id_token, "displayName": name, "returnSecureToken": false }),
            )
            .await?;

        Ok(AuthSession {
            display_name: Some(name.to_string()),
            ..session.clone()
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        let _: serde_json::Value = self
            .post(
                "sendOobCode",
                json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AppError> {
        // Sign-out is local; id tokens expire on their own.
        tracing::debug!(uid = %session.uid, "Signed out");
        Ok(())
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, AppError> {
        let url = format!(
            "{}/token?key={}",
            self.config.token_url,
            urlencoding::encode(&self.config.api_key)
        );

        let resp = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, |_, message, _| auth_error(message)).await);
        }

        let tokens: TokenResponse = resp.json().await?;
        Ok(AuthSession {
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            expires_at: expiry(tokens.expires_in.as_deref()),
            ..session.clone()
        })
    }
}
