//! Delivery artifacts handed back to readers.

use crate::domain::foundation::Timestamp;
use serde::{Deserialize, Serialize};

/// How trustworthy the artifact URL is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Freshly signed, time-boxed, scope-limited URL.
    Signed,

    /// Raw asset reference returned because signing failed entirely.
    /// Not a security guarantee.
    DegradedUnsigned,
}

/// A concrete, short-lived way to read an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessArtifact {
    pub url: String,
    /// `None` for degraded artifacts, which carry no expiry.
    pub expires_at: Option<Timestamp>,
    pub is_preview: bool,
    /// Total page/unit count of the asset; 0 when unknown.
    pub total_length: u32,
    pub delivery: Delivery,
}

impl AccessArtifact {
    pub fn signed(url: String, expires_at: Timestamp, is_preview: bool, total_length: u32) -> Self {
        Self {
            url,
            expires_at: Some(expires_at),
            is_preview,
            total_length,
            delivery: Delivery::Signed,
        }
    }

    pub fn degraded(raw_reference: String, total_length: u32) -> Self {
        Self {
            url: raw_reference,
            expires_at: None,
            is_preview: false,
            total_length,
            delivery: Delivery::DegradedUnsigned,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.delivery == Delivery::DegradedUnsigned
    }
}
