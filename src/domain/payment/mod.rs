//! Payment domain - external payment attempts and their outcome.

mod aggregate;
mod purpose;
mod status;

pub use aggregate::Payment;
pub use purpose::PaymentPurpose;
pub use status::{GrantStatus, PaymentStatus};
