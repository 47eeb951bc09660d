//! Entitlement Engine - payments, entitlements and signed content delivery
//!
//! This crate reconciles gateway payments into subscription and ownership
//! grants, decides FULL or PREVIEW access per item, issues short-lived
//! signed delivery URLs, and settles marketplace escrow.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
