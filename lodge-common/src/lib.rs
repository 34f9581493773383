//! # Lodge Common Library
//!
//! Shared code for the Lodge membership backend including:
//! - Membership tier catalog (ranks, upgrade fees, ladder traversal)
//! - Shared enumerations (zones, statuses, payment kinds/modes)
//! - Database initialization, row models, and settings access
//! - Authentication primitives (password hashing, bearer tokens)
//! - Configuration loading

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod tiers;
pub mod types;

pub use error::{Error, Result};
pub use tiers::Tier;
