//! Subscription status state machine.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a time-boxed subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Reserved; activation always inserts straight into `Active`.
    Pending,

    /// Grants full access until `end_at`.
    Active,

    /// Lapsed or superseded by a newer activation.
    Expired,

    /// Inserted after capture but the grant could not complete.
    Failed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Failed => "failed",
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active],
            Active => vec![Expired, Failed],
            Expired | Failed => vec![],
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            "failed" => Ok(SubscriptionStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_only_activate() {
        assert_eq!(
            SubscriptionStatus::Pending.valid_transitions(),
            vec![SubscriptionStatus::Active]
        );
    }

    #[test]
    fn active_can_expire_or_fail() {
        let status = SubscriptionStatus::Active;
        assert!(status.can_transition_to(&SubscriptionStatus::Expired));
        assert!(status.can_transition_to(&SubscriptionStatus::Failed));
        assert!(!status.can_transition_to(&SubscriptionStatus::Pending));
    }

    #[test]
    fn expired_is_terminal() {
        assert!(SubscriptionStatus::Expired.is_terminal());
        assert!(SubscriptionStatus::Expired
            .transition_to(SubscriptionStatus::Expired)
            .is_err());
    }

    #[test]
    fn failed_is_terminal() {
        assert!(SubscriptionStatus::Failed.is_terminal());
    }

    #[test]
    fn parses_rendered_values() {
        assert_eq!(
            "expired".parse::<SubscriptionStatus>(),
            Ok(SubscriptionStatus::Expired)
        );
        assert!("cancelled".parse::<SubscriptionStatus>().is_err());
    }
}
