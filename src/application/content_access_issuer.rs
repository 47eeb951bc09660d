//! ContentAccessIssuer - turns an access tier into a short-lived artifact.
//!
//! FULL requests a signed URL for the whole asset. PREVIEW requests a
//! signed URL restricted to the leading `preview_units` units; the signed
//! string covers the range, so the full asset is never derivable from it.
//!
//! When a provider returns a URL without a signature, signing is retried
//! once with narrowed hints. If FULL signing still fails, the raw reference
//! is returned marked as degraded. PREVIEW never falls back, because the raw
//! reference would expose the full asset.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::access::{AccessArtifact, AccessTier};
use crate::domain::catalog::Item;
use crate::ports::{
    DeliveryHints, ItemRepository, SignedScope, SignedUrl, SignedUrlRequest, StorageError,
    StorageProvider,
};

use super::EngineError;

/// How artifacts are scoped and how long they live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub full_ttl: Duration,
    pub preview_ttl: Duration,
    /// Leading units exposed by a preview.
    pub preview_units: u32,
    /// Provider hints for preview rendering.
    pub preview_hints: DeliveryHints,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            full_ttl: Duration::from_secs(3600),
            preview_ttl: Duration::from_secs(3600),
            preview_units: 5,
            preview_hints: DeliveryHints {
                format: Some("jpg".to_string()),
                flags: vec!["progressive".to_string()],
            },
        }
    }
}

pub struct ContentAccessIssuer {
    storage: Arc<dyn StorageProvider>,
    items: Arc<dyn ItemRepository>,
    policy: DeliveryPolicy,
}

impl ContentAccessIssuer {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        items: Arc<dyn ItemRepository>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            storage,
            items,
            policy,
        }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    pub async fn issue(&self, item: &Item, tier: AccessTier) -> Result<AccessArtifact, EngineError> {
        let total_length = self.resolve_length(item).await;

        let request = match tier {
            AccessTier::Full => SignedUrlRequest {
                content: item.content_ref.clone(),
                scope: SignedScope::Full,
                ttl: self.policy.full_ttl,
                hints: DeliveryHints::default(),
            },
            AccessTier::Preview => SignedUrlRequest {
                content: item.content_ref.clone(),
                scope: SignedScope::Preview {
                    units: self.policy.preview_units,
                },
                ttl: self.policy.preview_ttl,
                hints: self.policy.preview_hints.clone(),
            },
        };
        let is_preview = tier == AccessTier::Preview;

        match self.sign(request).await {
            Ok(signed) => Ok(AccessArtifact::signed(
                signed.url,
                signed.expires_at,
                is_preview,
                total_length,
            )),
            Err(err) if tier == AccessTier::Full => {
                warn!(
                    item_id = %item.id,
                    error = %err,
                    degraded = true,
                    "Signing failed; returning unsigned content reference"
                );
                Ok(AccessArtifact::degraded(
                    item.content_ref.to_string(),
                    total_length,
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Removes the item's asset from storage.
    pub async fn purge(&self, item: &Item) -> Result<(), EngineError> {
        self.storage.delete(&item.content_ref).await?;
        info!(item_id = %item.id, content_ref = %item.content_ref, "Asset deleted");
        Ok(())
    }

    async fn sign(&self, mut request: SignedUrlRequest) -> Result<SignedUrl, StorageError> {
        let first = self.storage.issue_signed_url(&request).await?;
        if first.is_signed() {
            return Ok(first);
        }

        warn!(
            content_ref = %request.content,
            "Provider returned an unsigned URL; retrying with narrowed parameters"
        );
        request.hints = DeliveryHints::narrowed();
        let second = self.storage.issue_signed_url(&request).await?;
        if second.is_signed() {
            return Ok(second);
        }
        Err(StorageError::Rejected(
            "provider returned an unsigned URL after retry".to_string(),
        ))
    }

    /// Cached length, or a lazy fetch. Failures degrade to 0.
    async fn resolve_length(&self, item: &Item) -> u32 {
        if let Some(length) = item.cached_length {
            return length;
        }

        match self.storage.asset_length(&item.content_ref).await {
            Ok(length) => {
                if let Err(e) = self.items.record_length(&item.id, length).await {
                    warn!(item_id = %item.id, error = %e, "Failed to cache asset length");
                }
                length
            }
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Failed to fetch asset length");
                0
            }
        }
    }
}
