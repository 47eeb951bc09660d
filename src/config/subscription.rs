//! Subscription plan pricing and sweeper configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::foundation::Money;
use crate::domain::subscription::PlanCatalog;

/// Plan prices are in minor currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default = "default_monthly_price")]
    pub monthly_price: i64,

    #[serde(default = "default_quarterly_price")]
    pub quarterly_price: i64,

    #[serde(default = "default_half_yearly_price")]
    pub half_yearly_price: i64,

    #[serde(default = "default_yearly_price")]
    pub yearly_price: i64,

    /// Seconds between expiry sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl SubscriptionConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// The standard four-plan catalog at the configured prices.
    pub fn plan_catalog(&self) -> Result<PlanCatalog, ValidationError> {
        Ok(PlanCatalog::standard(
            price("monthly", self.monthly_price)?,
            price("quarterly", self.quarterly_price)?,
            price("half_yearly", self.half_yearly_price)?,
            price("yearly", self.yearly_price)?,
        ))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.plan_catalog()?;
        if !(60..=7 * 86_400).contains(&self.sweep_interval_secs) {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

fn price(plan: &'static str, minor: i64) -> Result<Money, ValidationError> {
    match Money::from_minor(minor) {
        Ok(money) if !money.is_zero() => Ok(money),
        _ => Err(ValidationError::InvalidPlanPrice(plan)),
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            monthly_price: default_monthly_price(),
            quarterly_price: default_quarterly_price(),
            half_yearly_price: default_half_yearly_price(),
            yearly_price: default_yearly_price(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_monthly_price() -> i64 {
    19_900
}

fn default_quarterly_price() -> i64 {
    49_900
}

fn default_half_yearly_price() -> i64 {
    89_900
}

fn default_yearly_price() -> i64 {
    159_900
}

fn default_sweep_interval() -> u64 {
    86_400
}
