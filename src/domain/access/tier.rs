//! Access tiers and the reasons behind them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved entitlement outcome for one (actor, item) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessTier {
    /// The complete asset.
    Full,

    /// A fixed leading subrange of the asset.
    Preview,
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTier::Full => f.write_str("FULL"),
            AccessTier::Preview => f.write_str("PREVIEW"),
        }
    }
}

/// Which rule produced the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Admin,
    PublicItem,
    Owned,
    Subscribed,
    PreviewOnly,
}

/// Tier plus the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub tier: AccessTier,
    pub reason: AccessReason,
}

impl AccessDecision {
    pub fn full(reason: AccessReason) -> Self {
        Self {
            tier: AccessTier::Full,
            reason,
        }
    }

    pub fn preview() -> Self {
        Self {
            tier: AccessTier::Preview,
            reason: AccessReason::PreviewOnly,
        }
    }

    pub fn is_full(&self) -> bool {
        self.tier == AccessTier::Full
    }
}
