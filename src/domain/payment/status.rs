//! Payment and grant status state machines.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a single external payment attempt.
///
/// A payment is mutated exactly once after creation: either captured on a
/// verified callback or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Gateway order opened, no money received yet.
    Created,

    /// Signature verified, money received.
    Captured,

    /// Gateway reported failure or the attempt was abandoned.
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Captured => "captured",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl StateMachine for PaymentStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Created => vec![Captured, Failed],
            Captured | Failed => vec![],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(PaymentStatus::Created),
            "captured" => Ok(PaymentStatus::Captured),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Outcome of the entitlement grant that follows a capture.
///
/// `Failed` marks a captured payment that needs manual reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Pending,
    Granted,
    Failed,
}

impl GrantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantStatus::Pending => "pending",
            GrantStatus::Granted => "granted",
            GrantStatus::Failed => "failed",
        }
    }
}

impl FromStr for GrantStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GrantStatus::Pending),
            "granted" => Ok(GrantStatus::Granted),
            "failed" => Ok(GrantStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "grant_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
