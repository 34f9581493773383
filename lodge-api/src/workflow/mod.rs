//! Membership workflow: eligibility, payment submission, reconciliation,
//! and attendance.
//!
//! Every operation here checks all of its preconditions before writing, and
//! the writes themselves are guarded (partial unique indexes for submission,
//! status compare-and-set for reconciliation) so concurrent calls cannot
//! produce duplicate pending payments, double settlements, or double
//! attendance.

pub mod attendance;
pub mod eligibility;
pub mod payments;
pub mod reconcile;

pub use attendance::mark_attendance;
pub use eligibility::{check_eligibility, ensure_upcoming, is_eligible};
pub use payments::{submit_event_payment, submit_upgrade_payment};
pub use reconcile::{approve_event_fee, approve_payment, approve_upgrade, reject_payment};

use lodge_common::Tier;
use thiserror::Error;

/// Domain failures of the membership workflow.
///
/// Each variant is one named precondition failure; the HTTP layer maps them
/// onto status codes in `crate::error`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Member is already at the top of the ladder
    #[error("Member is already at the highest tier")]
    NoUpgradeAvailable,

    /// Submitted or recorded amount differs from the required fee
    #[error("Amount {actual} does not match the required fee {expected}")]
    AmountMismatch { expected: i64, actual: i64 },

    /// A pending upgrade payment already exists for this member
    #[error("A pending upgrade payment already exists for this member")]
    PendingPaymentExists,

    /// Event is not in the upcoming state
    #[error("Event is not open")]
    EventNotOpen,

    /// Member fails the zone/tier/status eligibility rule
    #[error("Member is not eligible for this event: {0}")]
    NotEligible(&'static str),

    /// Payment submitted against a zero-fee event
    #[error("Event is free, no payment is required")]
    EventIsFree,

    /// A live (pending or settled) payment already exists for this event
    #[error("A payment for this event already exists for this member")]
    PaymentAlreadyExists,

    /// Payment is settled or rejected, not pending
    #[error("Payment is not pending")]
    NotPending,

    /// Payment kind does not match the requested operation
    #[error("Payment kind does not match this operation")]
    WrongKind,

    /// Settled amount matches no tier's upgrade fee
    #[error("Amount {amount} does not match any tier upgrade fee")]
    NoMatchingTier { amount: i64 },

    /// Target tier does not outrank the member's current tier
    #[error("Tier {target} is not an upgrade from {current}")]
    NotAnUpgrade { current: Tier, target: Tier },

    /// Member is already on the event's attendance list
    #[error("Member is already marked as attending this event")]
    AlreadyAttended,

    /// Paid event with no settled event-fee payment for the member
    #[error("No settled payment found for this event")]
    NoSettledPayment,

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Common(#[from] lodge_common::Error),
}

/// True when the error is a SQLite unique-constraint violation.
///
/// Submission and attendance rely on this to turn an index-level race loss
/// into the same conflict error the pre-check would have produced.
pub(crate) fn is_unique_violation(err: &lodge_common::Error) -> bool {
    matches!(
        err,
        lodge_common::Error::Database(sqlx::Error::Database(db_err))
            if db_err.is_unique_violation()
    )
}
