//! Access domain - who may read what, and in which form.

mod actor;
mod artifact;
mod events;
mod tier;

pub use actor::Actor;
pub use artifact::{AccessArtifact, Delivery};
pub use events::{EntitlementGranted, ITEM_PURCHASED, SUBSCRIPTION_ACTIVATED};
pub use tier::{AccessDecision, AccessReason, AccessTier};
