//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across payment, subscription and escrow statuses.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define the transition table; validated transitions
/// and terminal detection come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for PaymentStatus {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Created => vec![Captured, Failed],
///             Captured | Failed => vec![],
///         }
///     }
/// }
///
/// let next = PaymentStatus::Created.transition_to(PaymentStatus::Captured)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
