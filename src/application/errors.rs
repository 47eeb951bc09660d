//! Engine error taxonomy.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | SignatureInvalid | 401 |
//! | StateConflict | 409 |
//! | Provider | 502 |
//! | GrantFailedAfterCapture | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, ValidationError};
use crate::ports::{GatewayError, StorageError};
use thiserror::Error;

/// Errors surfaced by engine components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Missing or invalid plan, item, amount or other input. User-correctable.
    #[error("validation failed on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Callback signature did not verify. Nothing was mutated.
    #[error("signature verification failed for order {external_order_id}")]
    SignatureInvalid { external_order_id: String },

    /// The target is not in a state that permits the operation.
    #[error("cannot {attempted}: {resource} is {current}")]
    StateConflict {
        resource: &'static str,
        current: String,
        attempted: String,
    },

    /// Payment gateway or storage provider failed or was unreachable.
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
        retryable: bool,
    },

    /// Money was captured but the entitlement could not be granted.
    /// Requires manual reconciliation; never retried automatically.
    #[error("payment {payment_id} captured but grant failed: {reason}")]
    GrantFailedAfterCapture { payment_id: PaymentId, reason: String },

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn state_conflict(
        resource: &'static str,
        current: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        EngineError::StateConflict {
            resource,
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EngineError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation { .. } => ErrorCode::ValidationFailed,
            EngineError::NotFound { resource, .. } => match *resource {
                "payment" => ErrorCode::PaymentNotFound,
                "subscription" => ErrorCode::SubscriptionNotFound,
                "order" => ErrorCode::OrderNotFound,
                _ => ErrorCode::ItemNotFound,
            },
            EngineError::SignatureInvalid { .. } => ErrorCode::InvalidSignature,
            EngineError::StateConflict { .. } => ErrorCode::InvalidStateTransition,
            EngineError::Provider { .. } => ErrorCode::ProviderUnavailable,
            EngineError::GrantFailedAfterCapture { .. } => ErrorCode::ReconciliationRequired,
            EngineError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::Validation { .. } => 400,
            EngineError::NotFound { .. } => 404,
            EngineError::SignatureInvalid { .. } => 401,
            EngineError::StateConflict { .. } => 409,
            EngineError::Provider { .. } => 502,
            EngineError::GrantFailedAfterCapture { .. } | EngineError::Infrastructure(_) => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Provider { retryable, .. } => *retryable,
            EngineError::Infrastructure(_) => true,
            _ => false,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        let detail = |key: &str| err.details.get(key).cloned().unwrap_or_default();
        match err.code {
            ErrorCode::ValidationFailed => EngineError::validation(detail("field"), err.message),
            ErrorCode::PaymentNotFound => EngineError::not_found("payment", detail("id")),
            ErrorCode::SubscriptionNotFound => EngineError::not_found("subscription", detail("id")),
            ErrorCode::ItemNotFound => EngineError::not_found("item", detail("id")),
            ErrorCode::OrderNotFound => EngineError::not_found("order", detail("id")),
            ErrorCode::InvalidStateTransition => EngineError::StateConflict {
                resource: resource_name(&detail("resource")),
                current: detail("current"),
                attempted: err.message,
            },
            ErrorCode::DuplicateExternalOrder => {
                EngineError::state_conflict("payment", "already recorded", err.message)
            }
            ErrorCode::InvalidSignature => EngineError::SignatureInvalid {
                external_order_id: detail("external_order_id"),
            },
            _ => EngineError::Infrastructure(err.to_string()),
        }
    }
}

fn resource_name(resource: &str) -> &'static str {
    match resource {
        "payment" => "payment",
        "subscription" => "subscription",
        "order" => "order",
        "item" => "item",
        _ => "record",
    }
}

impl From<GatewayError> for EngineError {
    fn from(err: GatewayError) -> Self {
        EngineError::Provider {
            provider: "payment gateway",
            retryable: err.retryable,
            message: err.message,
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        EngineError::Provider {
            provider: "storage provider",
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_failure_is_distinct_and_not_retryable() {
        let err = EngineError::GrantFailedAfterCapture {
            payment_id: PaymentId::new(),
            reason: "db down".into(),
        };
        assert_eq!(err.code(), ErrorCode::ReconciliationRequired);
        assert!(!err.is_retryable());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn gateway_network_error_is_retryable_provider_error() {
        let err: EngineError = GatewayError::network("timeout").into();
        assert!(matches!(err, EngineError::Provider { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn storage_rejection_is_not_retryable() {
        let err: EngineError = StorageError::Rejected("bad transform".into()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn domain_not_found_maps_to_not_found() {
        let err: EngineError = DomainError::new(ErrorCode::OrderNotFound, "missing")
            .with_detail("id", "abc")
            .into();
        assert_eq!(err, EngineError::not_found("order", "abc"));
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.code(), ErrorCode::OrderNotFound);
    }

    #[test]
    fn domain_state_transition_keeps_current_state() {
        let err: EngineError = DomainError::new(ErrorCode::InvalidStateTransition, "capture")
            .with_detail("resource", "payment")
            .with_detail("current", "failed")
            .into();
        match err {
            EngineError::StateConflict {
                resource, current, ..
            } => {
                assert_eq!(resource, "payment");
                assert_eq!(current, "failed");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn validation_error_keeps_field() {
        let err: EngineError = ValidationError::empty_field("plan").into();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "plan"));
    }

    #[test]
    fn state_conflict_message_names_current_state() {
        let err = EngineError::state_conflict("escrow", "released", "release");
        assert_eq!(err.to_string(), "cannot release: escrow is released");
    }
}
