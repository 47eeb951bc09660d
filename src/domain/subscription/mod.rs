//! Subscription domain - time-boxed entitlements and the plan catalog.

mod aggregate;
mod plan;
mod status;

pub use aggregate::{CachedSubscription, Subscription};
pub use plan::{Plan, PlanCatalog};
pub use status::SubscriptionStatus;
