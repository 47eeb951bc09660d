//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `payment` - External payment attempts and capture outcome
//! - `subscription` - Time-boxed subscriptions and the plan catalog
//! - `ownership` - Perpetual per-item ownership records
//! - `catalog` - Content items as far as access decisions need them
//! - `access` - Access tiers, actors, delivery artifacts and grant events
//! - `escrow` - Marketplace order settlement state machine

pub mod access;
pub mod catalog;
pub mod escrow;
pub mod foundation;
pub mod ownership;
pub mod payment;
pub mod subscription;
