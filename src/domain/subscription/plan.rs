//! Subscription plans and the catalog that prices them.

use crate::domain::foundation::{Money, ValidationError};
use serde::{Deserialize, Serialize};

/// A purchasable subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Stable plan key (e.g. "monthly").
    pub name: String,

    /// Length of one purchase in calendar months.
    pub duration_months: u32,

    /// Price in minor units.
    pub price: Money,
}

impl Plan {
    pub fn new(
        name: impl Into<String>,
        duration_months: u32,
        price: Money,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("plan"));
        }
        if duration_months == 0 {
            return Err(ValidationError::out_of_range(
                "duration_months",
                1,
                i32::MAX,
                0,
            ));
        }
        Ok(Self {
            name,
            duration_months,
            price,
        })
    }
}

/// Known plans, looked up by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// The four standard plans with the given prices in minor units.
    pub fn standard(monthly: Money, quarterly: Money, half_yearly: Money, yearly: Money) -> Self {
        let plan = |name: &str, months: u32, price: Money| Plan {
            name: name.to_string(),
            duration_months: months,
            price,
        };
        Self::new(vec![
            plan("monthly", 1, monthly),
            plan("quarterly", 3, quarterly),
            plan("half_yearly", 6, half_yearly),
            plan("yearly", 12, yearly),
        ])
    }

    pub fn find(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// Looks up a plan, failing with a validation error for unknown names.
    pub fn require(&self, name: &str) -> Result<&Plan, ValidationError> {
        self.find(name).ok_or_else(|| {
            ValidationError::invalid_format("plan", format!("unknown plan '{}'", name))
        })
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }
}
