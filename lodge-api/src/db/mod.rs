//! Database queries for lodge-api
//!
//! Pool-level, single-statement queries over the shared schema created by
//! `lodge_common::db::init`. The multi-statement reconciliation updates
//! (settle + tier bump) live in [`crate::workflow::reconcile`] because they
//! need a transaction.

pub mod attendees;
pub mod events;
pub mod members;
pub mod payments;
