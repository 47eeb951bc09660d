//! Escrow domain - marketplace order settlement.

mod order;
mod status;

pub use order::{EscrowRejection, Order, Settlement};
pub use status::{DeliveryStatus, EscrowStatus, OrderPaymentStatus, OrderType};
