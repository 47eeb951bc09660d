//! Storage provider port for asset metadata and signed delivery.
//!
//! Adapters own the signing scheme. The issuer only inspects whether a
//! returned URL carries a signature at all.

use crate::domain::catalog::ContentRef;
use crate::domain::foundation::Timestamp;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// What part of the asset a signed URL may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedScope {
    Full,
    /// Units `1..=units` only.
    Preview { units: u32 },
}

/// Optional rendering parameters. Narrowing them is the retry strategy when
/// a provider returns an unsigned URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryHints {
    /// Output format, e.g. "jpg" for rendered preview pages.
    pub format: Option<String>,
    /// Extra provider transformation flags.
    pub flags: Vec<String>,
}

impl DeliveryHints {
    /// The minimal parameter set: no format, no flags.
    pub fn narrowed() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlRequest {
    pub content: ContentRef,
    pub scope: SignedScope,
    pub ttl: Duration,
    pub hints: DeliveryHints,
}

/// URL returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    /// Signature component, when the provider embedded one.
    pub signature: Option<String>,
    pub expires_at: Timestamp,
}

impl SignedUrl {
    pub fn is_signed(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("storage provider unavailable: {0}")]
    Unavailable(String),

    #[error("storage provider rejected request: {0}")]
    Rejected(String),
}

impl StorageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Port for the asset store / CDN.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Page/unit count of the asset.
    async fn asset_length(&self, content: &ContentRef) -> Result<u32, StorageError>;

    /// Produce a time-boxed, scope-limited URL.
    async fn issue_signed_url(&self, request: &SignedUrlRequest) -> Result<SignedUrl, StorageError>;

    /// Remove the asset.
    async fn delete(&self, content: &ContentRef) -> Result<(), StorageError>;
}
