//! Order status enums and the escrow state machine.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a snake_case string mapping for a persisted status enum.
macro_rules! string_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ValidationError::invalid_format(
                        $field,
                        format!("unknown value '{}'", other),
                    )),
                }
            }
        }
    };
}

/// Settlement state of marketplace funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Funds held pending delivery.
    Held,

    /// Paid out to the seller net of commission. Terminal.
    Released,

    /// Buyer raised a dispute; only a refund may follow.
    Disputed,

    /// Returned to the buyer. Terminal.
    Refunded,
}

impl StateMachine for EscrowStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use EscrowStatus::*;
        match self {
            Held => vec![Released, Disputed, Refunded],
            Disputed => vec![Refunded],
            Released | Refunded => vec![],
        }
    }
}

string_enum!(EscrowStatus, "escrow_status", {
    Held => "held",
    Released => "released",
    Disputed => "disputed",
    Refunded => "refunded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Direct,
    Marketplace,
}

string_enum!(OrderType, "order_type", {
    Direct => "direct",
    Marketplace => "marketplace",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

string_enum!(OrderPaymentStatus, "payment_status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

string_enum!(DeliveryStatus, "delivery_status", {
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Returned => "returned",
});
