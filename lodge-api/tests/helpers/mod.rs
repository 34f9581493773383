//! Test helper utilities
//!
//! Shared utilities for testing lodge-api

pub mod db_utils;
pub mod seed;

// Re-export commonly used items
pub use db_utils::{create_test_db, create_test_state};
pub use seed::{admin_token, member_token, seed_event, seed_member, TEST_PASSWORD};
