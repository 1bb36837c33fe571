use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use super::{TokenSource, error_from_response};
use crate::backend::BlobStore;
use crate::config::FirebaseConfig;
use crate::error::AppError;

/// Cloud Storage for Firebase REST client bound to one session's credentials.
pub struct FirebaseStorage {
    config: Arc<FirebaseConfig>,
    http: reqwest::Client,
    tokens: TokenSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    #[serde(default)]
    download_tokens: Option<String>,
}

pub fn storage_error(http: reqwest::StatusCode, message: &str, _status: Option<&str>) -> AppError {
    let code = match http.as_u16() {
        401 => "storage/unauthenticated",
        403 => "storage/unauthorized",
        404 => "storage/object-not-found",
        412 => "storage/invalid-checksum",
        429 => "storage/quota-exceeded",
        _ => "storage/unknown",
    };
    AppError::provider(code, message)
}

/// Object path for a `gs://` URL, an HTTP download URL of `bucket`, or a bare path.
pub fn object_path(bucket: &str, reference: &str) -> Result<String, AppError> {
    if let Some(rest) = reference.strip_prefix("gs://") {
        let (ref_bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
        if ref_bucket != bucket {
            return Err(invalid_url(reference));
        }
        return Ok(path.to_string());
    }

    if reference.starts_with("http://") || reference.starts_with("https://") {
        let marker = format!("/b/{bucket}/o/");
        let (_, encoded) = reference
            .split_once(&marker)
            .ok_or_else(|| invalid_url(reference))?;
        let encoded = encoded.split('?').next().unwrap_or_default();
        return urlencoding::decode(encoded)
            .map(|p| p.into_owned())
            .map_err(|_| invalid_url(reference));
    }

    Ok(reference.to_string())
}

fn invalid_url(reference: &str) -> AppError {
    AppError::provider(
        "storage/invalid-url",
        format!("Invalid URL '{reference}' for this bucket"),
    )
}

impl FirebaseStorage {
    pub fn new(config: Arc<FirebaseConfig>, http: reqwest::Client, tokens: TokenSource) -> Self {
        Self {
            config,
            http,
            tokens,
        }
    }

    fn bucket_url(&self) -> String {
        format!("{}/b/{}/o", self.config.storage_url, self.config.storage_bucket)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.bucket_url(), urlencoding::encode(path))
    }

    async fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        Ok(match self.tokens.id_token().await? {
            Some(token) => builder.header("Authorization", format!("Firebase {token}")),
            None => builder,
        })
    }
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        let url = format!("{}?name={}", self.bucket_url(), urlencoding::encode(path));
        let resp = self
            .authorized(self.http.post(url))
            .await?
            .header(
                "Content-Type",
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(data)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, storage_error).await);
        }
        tracing::debug!(path, "Object uploaded");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, AppError> {
        let resp = self
            .authorized(self.http.get(self.object_url(path)))
            .await?
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, storage_error).await);
        }

        let metadata: ObjectMetadata = resp.json().await?;
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').find(|t| !t.is_empty()))
            .ok_or_else(|| {
                AppError::provider(
                    "storage/no-download-url",
                    format!("The given file at '{path}' does not have a download URL"),
                )
            })?;

        Ok(format!("{}?alt=media&token={token}", self.object_url(path)))
    }

    async fn delete(&self, reference: &str) -> Result<(), AppError> {
        let path = object_path(&self.config.storage_bucket, reference)?;
        let resp = self
            .authorized(self.http.delete(self.object_url(&path)))
            .await?
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp, storage_error).await);
        }
        Ok(())
    }
}
