//! In-memory storage provider.
//!
//! Holds asset lengths in memory and signs URLs with the same scheme as
//! `SignedCdnStorage`. Faults can be injected to drive the issuer's retry
//! and degradation paths.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;

use crate::domain::catalog::ContentRef;
use crate::domain::foundation::Timestamp;
use crate::ports::{SignedUrl, SignedUrlRequest, StorageError, StorageProvider};

use super::signed_cdn_storage::{delivery_url, sign_request, transformation};

const SIGNING_SECRET: &str = "in-memory-signing-secret";

/// Injectable provider misbehaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFault {
    /// `asset_length` fails until cleared.
    LengthUnavailable,
    /// The next signing call returns a URL without a signature.
    UnsignedOnce,
    /// Every signing call returns a URL without a signature.
    UnsignedAlways,
    /// Every signing call fails outright.
    SigningUnavailable,
}

#[derive(Default)]
struct State {
    assets: HashMap<ContentRef, u32>,
    faults: Vec<StorageFault>,
    requests: Vec<SignedUrlRequest>,
}

/// In-memory storage for testing and development.
pub struct InMemoryStorageProvider {
    base_url: String,
    secret: SecretString,
    state: RwLock<State>,
}

impl InMemoryStorageProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: SecretString::new(SIGNING_SECRET.to_string()),
            state: RwLock::new(State::default()),
        }
    }

    /// Store an asset with the given page count.
    pub async fn put_asset(&self, content: &ContentRef, length: u32) {
        self.state.write().await.assets.insert(content.clone(), length);
    }

    pub async fn has_asset(&self, content: &ContentRef) -> bool {
        self.state.read().await.assets.contains_key(content)
    }

    pub async fn inject(&self, fault: StorageFault) {
        self.state.write().await.faults.push(fault);
    }

    pub async fn clear_faults(&self) {
        self.state.write().await.faults.clear();
    }

    /// Number of `issue_signed_url` calls so far.
    pub async fn sign_calls(&self) -> usize {
        self.state.read().await.requests.len()
    }

    pub async fn last_request(&self) -> Option<SignedUrlRequest> {
        self.state.read().await.requests.last().cloned()
    }
}

impl State {
    fn has(&self, fault: StorageFault) -> bool {
        self.faults.contains(&fault)
    }

    /// Removes one occurrence of `fault`, reporting whether it was present.
    fn take(&mut self, fault: StorageFault) -> bool {
        match self.faults.iter().position(|f| *f == fault) {
            Some(index) => {
                self.faults.remove(index);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl StorageProvider for InMemoryStorageProvider {
    async fn asset_length(&self, content: &ContentRef) -> Result<u32, StorageError> {
        let state = self.state.read().await;
        if state.has(StorageFault::LengthUnavailable) {
            return Err(StorageError::Unavailable("metadata lookup failed".to_string()));
        }
        state
            .assets
            .get(content)
            .copied()
            .ok_or_else(|| StorageError::NotFound(content.to_string()))
    }

    async fn issue_signed_url(&self, request: &SignedUrlRequest) -> Result<SignedUrl, StorageError> {
        let mut state = self.state.write().await;
        state.requests.push(request.clone());

        if state.has(StorageFault::SigningUnavailable) {
            return Err(StorageError::Unavailable("signing service down".to_string()));
        }

        let now = Timestamp::now();
        if state.take(StorageFault::UnsignedOnce) || state.has(StorageFault::UnsignedAlways) {
            let expires_at = now.plus(request.ttl);
            return Ok(SignedUrl {
                url: delivery_url(
                    &self.base_url,
                    None,
                    &transformation(request.scope, &request.hints),
                    &request.content,
                    expires_at.as_unix_secs(),
                ),
                signature: None,
                expires_at,
            });
        }

        Ok(sign_request(&self.secret, &self.base_url, request, now))
    }

    async fn delete(&self, content: &ContentRef) -> Result<(), StorageError> {
        match self.state.write().await.assets.remove(content) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(content.to_string())),
        }
    }
}
