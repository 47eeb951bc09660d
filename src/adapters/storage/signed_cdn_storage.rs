//! Signed CDN storage adapter.
//!
//! Delivery URLs carry an HMAC-SHA256 signature over the transformation
//! segment, the content reference and the expiry:
//!
//! ```text
//! {delivery_base}/s--{sig}--/{transformation}/{content_ref}?expires={unix}
//! ```
//!
//! A preview's page range (`pg_1-N`) lives inside the transformation, so
//! widening the range invalidates the signature. Asset metadata and deletion
//! go through the provider's admin API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::adapters::signing::{hmac_sha256_hex, verify_hex};
use crate::domain::catalog::ContentRef;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    DeliveryHints, SignedScope, SignedUrl, SignedUrlRequest, StorageError, StorageProvider,
};

/// Signed CDN configuration.
#[derive(Clone)]
pub struct SignedCdnConfig {
    /// Public delivery host, e.g. `https://cdn.example.com/books`.
    delivery_base_url: String,

    /// Admin API root used for metadata and deletion.
    admin_api_url: String,

    api_key: String,

    /// Signs delivery URLs and authenticates admin calls.
    api_secret: SecretString,

    timeout: Duration,
}

impl SignedCdnConfig {
    pub fn new(
        delivery_base_url: impl Into<String>,
        admin_api_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: SecretString,
    ) -> Self {
        Self {
            delivery_base_url: trim_slash(delivery_base_url.into()),
            admin_api_url: trim_slash(admin_api_url.into()),
            api_key: api_key.into(),
            api_secret,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Transformation segment for a request, e.g. `pg_1-5,f_jpg,fl_progressive`.
///
/// Empty for a full-asset request without hints.
pub(crate) fn transformation(scope: SignedScope, hints: &DeliveryHints) -> String {
    let mut parts = Vec::new();
    if let SignedScope::Preview { units } = scope {
        parts.push(format!("pg_1-{}", units));
    }
    if let Some(format) = &hints.format {
        parts.push(format!("f_{}", format));
    }
    parts.extend(hints.flags.iter().map(|flag| format!("fl_{}", flag)));
    parts.join(",")
}

/// The exact string covered by a delivery signature.
fn string_to_sign(transformation: &str, content: &ContentRef, expires: i64) -> String {
    format!("{}/{}:{}", transformation, content, expires)
}

/// Builds the delivery URL for an already computed signature.
pub(crate) fn delivery_url(
    base: &str,
    signature: Option<&str>,
    transformation: &str,
    content: &ContentRef,
    expires: i64,
) -> String {
    let mut url = base.to_string();
    if let Some(sig) = signature {
        url.push_str(&format!("/s--{}--", sig));
    }
    if !transformation.is_empty() {
        url.push('/');
        url.push_str(transformation);
    }
    format!("{}/{}?expires={}", url, content, expires)
}

/// Signs the request and returns the URL with its signature and expiry.
pub(crate) fn sign_request(
    secret: &SecretString,
    base: &str,
    request: &SignedUrlRequest,
    now: Timestamp,
) -> SignedUrl {
    let expires_at = now.plus(request.ttl);
    let expires = expires_at.as_unix_secs();
    let transformation = transformation(request.scope, &request.hints);
    let signature = hmac_sha256_hex(
        secret,
        string_to_sign(&transformation, &request.content, expires).as_bytes(),
    );

    SignedUrl {
        url: delivery_url(base, Some(&signature), &transformation, &request.content, expires),
        signature: Some(signature),
        expires_at,
    }
}

/// CDN-backed implementation of `StorageProvider`.
pub struct SignedCdnStorage {
    config: SignedCdnConfig,
    http_client: reqwest::Client,
}

impl SignedCdnStorage {
    pub fn new(config: SignedCdnConfig) -> Result<Self, StorageError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Checks a signature the way the CDN edge does.
    pub fn verify(
        &self,
        transformation: &str,
        content: &ContentRef,
        expires: i64,
        signature: &str,
    ) -> bool {
        verify_hex(
            &self.config.api_secret,
            string_to_sign(transformation, content, expires).as_bytes(),
            signature,
        )
    }

    fn resource_url(&self, content: &ContentRef) -> String {
        format!("{}/resources/{}", self.config.admin_api_url, content)
    }
}

#[derive(Debug, Deserialize)]
struct ResourceMetadata {
    pages: Option<u32>,
}

fn transport_error(e: reqwest::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

async fn status_error(content: &ContentRef, response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        StorageError::NotFound(content.to_string())
    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        StorageError::Unavailable(format!("{}: {}", status, body))
    } else {
        StorageError::Rejected(format!("{}: {}", status, body))
    }
}

#[async_trait]
impl StorageProvider for SignedCdnStorage {
    async fn asset_length(&self, content: &ContentRef) -> Result<u32, StorageError> {
        let response = self
            .http_client
            .get(self.resource_url(content))
            .basic_auth(&self.config.api_key, Some(self.config.api_secret.expose_secret()))
            .query(&[("pages", "true")])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(content, response).await);
        }

        let metadata: ResourceMetadata = response
            .json()
            .await
            .map_err(|e| StorageError::Rejected(format!("unreadable metadata: {}", e)))?;
        // Single-page assets omit the count.
        Ok(metadata.pages.unwrap_or(1))
    }

    async fn issue_signed_url(&self, request: &SignedUrlRequest) -> Result<SignedUrl, StorageError> {
        Ok(sign_request(
            &self.config.api_secret,
            &self.config.delivery_base_url,
            request,
            Timestamp::now(),
        ))
    }

    async fn delete(&self, content: &ContentRef) -> Result<(), StorageError> {
        let response = self
            .http_client
            .delete(self.resource_url(content))
            .basic_auth(&self.config.api_key, Some(self.config.api_secret.expose_secret()))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(content, response).await);
        }
        tracing::debug!(content_ref = %content, "Asset deleted at provider");
        Ok(())
    }
}
