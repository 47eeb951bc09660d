//! Escrow settlement configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::CommissionRate;

#[derive(Debug, Clone, Deserialize)]
pub struct EscrowConfig {
    /// Platform commission in basis points (500 = 5%)
    #[serde(default = "default_commission_bps")]
    pub commission_bps: u32,
}

impl EscrowConfig {
    pub fn commission_rate(&self) -> Result<CommissionRate, ValidationError> {
        CommissionRate::from_bps(self.commission_bps)
            .map_err(|_| ValidationError::InvalidCommissionRate)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.commission_rate().map(|_| ())
    }
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            commission_bps: default_commission_bps(),
        }
    }
}

fn default_commission_bps() -> u32 {
    500
}
