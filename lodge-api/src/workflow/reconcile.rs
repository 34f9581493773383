//! Payment reconciliation: admin approval and rejection of pending ledger
//! entries.
//!
//! Settling an upgrade mutates two rows (payment status and member tier).
//! That pair runs inside one transaction whose settle step is a
//! compare-and-set on `status = 'pending'`; zero affected rows means another
//! reconciler got there first and the whole transaction is abandoned. A
//! payment therefore settles at most once and a member's tier moves at most
//! one step per settled payment.

use chrono::Utc;
use lodge_common::db::models::Payment;
use lodge_common::types::{PaymentKind, PaymentStatus};
use lodge_common::Tier;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::CoreError;
use crate::db;

/// Approve a pending payment of either kind.
///
/// The admin review queue does not distinguish kinds, so this dispatches to
/// the kind-specific operation.
pub async fn approve_payment(db: &SqlitePool, payment_id: Uuid) -> Result<Payment, CoreError> {
    let payment = db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))?;
    match payment.kind {
        PaymentKind::MembershipUpgrade => approve_upgrade(db, payment_id).await,
        PaymentKind::EventFee => approve_event_fee(db, payment_id).await,
    }
}

/// Approve a pending membership-upgrade payment.
///
/// The target tier is derived from the settled amount by reverse fee lookup,
/// then checked against the member's current tier: the target must outrank
/// it. Settlement and the tier bump commit together or not at all.
pub async fn approve_upgrade(db: &SqlitePool, payment_id: Uuid) -> Result<Payment, CoreError> {
    let payment = db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))?;
    if payment.status != PaymentStatus::Pending {
        return Err(CoreError::NotPending);
    }
    if payment.kind != PaymentKind::MembershipUpgrade {
        return Err(CoreError::WrongKind);
    }

    let target = Tier::from_upgrade_fee(payment.amount).ok_or(CoreError::NoMatchingTier {
        amount: payment.amount,
    })?;

    let mut tx = db.begin().await?;

    // The compare-and-set goes first so it is also the transaction's first
    // statement: a concurrent approval blocks here until the winner commits,
    // then sees the settled status and reports NotPending. Dropping the
    // transaction on any later failure rolls the settle back.
    let settled = sqlx::query(
        "UPDATE payments SET status = 'settled', updated_at = ? \
         WHERE guid = ? AND status = 'pending'",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(payment.guid.to_string())
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if settled == 0 {
        return Err(CoreError::NotPending);
    }

    // Re-read the tier inside the transaction; the pool-level snapshot above
    // may be stale by now.
    let tier_text: String = sqlx::query_scalar("SELECT tier FROM members WHERE guid = ?")
        .bind(payment.member_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::NotFound("Member"))?;
    let current: Tier = tier_text.parse()?;

    if target.rank() <= current.rank() {
        return Err(CoreError::NotAnUpgrade { current, target });
    }

    sqlx::query("UPDATE members SET tier = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
        .bind(target.as_str())
        .bind(payment.member_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        payment_id = %payment_id,
        member_id = %payment.member_id,
        from_tier = %current,
        to_tier = %target,
        "Upgrade payment settled"
    );

    db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))
}

/// Approve a pending event-fee payment. No member state changes.
pub async fn approve_event_fee(db: &SqlitePool, payment_id: Uuid) -> Result<Payment, CoreError> {
    let payment = db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))?;
    if payment.status != PaymentStatus::Pending {
        return Err(CoreError::NotPending);
    }
    if payment.kind != PaymentKind::EventFee {
        return Err(CoreError::WrongKind);
    }

    let settled = sqlx::query(
        "UPDATE payments SET status = 'settled', updated_at = ? \
         WHERE guid = ? AND status = 'pending'",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(payment.guid.to_string())
    .execute(db)
    .await?
    .rows_affected();
    if settled == 0 {
        return Err(CoreError::NotPending);
    }

    info!(
        payment_id = %payment_id,
        member_id = %payment.member_id,
        "Event-fee payment settled"
    );

    db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))
}

/// Reject a pending payment of either kind, recording the reason.
///
/// Rejection is terminal and never touches member state. Rejected rows stay
/// in the ledger as the audit trail; the partial unique indexes ignore them,
/// so the member may submit again.
pub async fn reject_payment(
    db: &SqlitePool,
    payment_id: Uuid,
    reason: &str,
) -> Result<Payment, CoreError> {
    let payment = db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))?;
    if payment.status != PaymentStatus::Pending {
        return Err(CoreError::NotPending);
    }

    let rejected = sqlx::query(
        "UPDATE payments SET status = 'rejected', rejection_reason = ?, updated_at = ? \
         WHERE guid = ? AND status = 'pending'",
    )
    .bind(reason)
    .bind(Utc::now().to_rfc3339())
    .bind(payment.guid.to_string())
    .execute(db)
    .await?
    .rows_affected();
    if rejected == 0 {
        return Err(CoreError::NotPending);
    }

    info!(payment_id = %payment_id, reason, "Payment rejected");

    db::payments::get_payment(db, payment_id)
        .await?
        .ok_or(CoreError::NotFound("Payment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::events::NewEvent;
    use crate::db::members::NewMember;
    use crate::db::payments::NewPayment;
    use crate::workflow::payments::{submit_event_payment, submit_upgrade_payment};
    use lodge_common::types::{EventStatus, MemberStatus, PaymentMode, Zone};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        lodge_common::db::init::create_schema(&pool).await.unwrap();
        pool
    }

    async fn seed_member(db: &SqlitePool, tier: Tier) -> Uuid {
        let new = NewMember {
            name: "Ravi Menon".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "hash".to_string(),
            password_salt: "salt".to_string(),
            zone: Zone::Central,
            tier,
        };
        crate::db::members::insert_member(db, &new).await.unwrap()
    }

    async fn seed_paid_event(db: &SqlitePool, fee: i64) -> Uuid {
        let new = NewEvent {
            title: format!("Event {}", Uuid::new_v4()),
            location: "Hall D".to_string(),
            zones: vec![Zone::Central],
            tiers_allowed: Tier::ALL.to_vec(),
            fee,
            status: EventStatus::Upcoming,
        };
        crate::db::events::insert_event(db, &new).await.unwrap()
    }

    async fn member_tier(db: &SqlitePool, member_id: Uuid) -> Tier {
        crate::db::members::get_member(db, member_id)
            .await
            .unwrap()
            .unwrap()
            .tier
    }

    async fn force_tier(db: &SqlitePool, member_id: Uuid, tier: Tier) {
        sqlx::query("UPDATE members SET tier = ? WHERE guid = ?")
            .bind(tier.as_str())
            .bind(member_id.to_string())
            .execute(db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_approve_upgrade_settles_and_bumps_tier() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let payment = submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
            .await
            .unwrap();

        let settled = approve_upgrade(&db, payment.guid).await.unwrap();

        assert_eq!(settled.status, PaymentStatus::Settled);
        assert_eq!(member_tier(&db, member_id).await, Tier::Silver);
    }

    #[tokio::test]
    async fn test_double_approval_is_not_pending_and_tier_moves_once() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Silver).await;
        let payment = submit_upgrade_payment(&db, member_id, 300, PaymentMode::Bank, None)
            .await
            .unwrap();

        approve_upgrade(&db, payment.guid).await.unwrap();
        let err = approve_upgrade(&db, payment.guid).await.unwrap_err();

        assert!(matches!(err, CoreError::NotPending));
        assert_eq!(member_tier(&db, member_id).await, Tier::Gold);
    }

    #[tokio::test]
    async fn test_approve_unknown_payment_is_not_found() {
        let db = setup_test_db().await;
        let err = approve_upgrade(&db, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Payment")));
    }

    #[tokio::test]
    async fn test_approve_upgrade_wrong_kind() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let event_id = seed_paid_event(&db, 150).await;
        let payment = submit_event_payment(&db, member_id, event_id, 150, PaymentMode::Upi, None)
            .await
            .unwrap();

        let err = approve_upgrade(&db, payment.guid).await.unwrap_err();
        assert!(matches!(err, CoreError::WrongKind));

        let err = approve_event_fee(
            &db,
            submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
                .await
                .unwrap()
                .guid,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::WrongKind));
    }

    #[tokio::test]
    async fn test_terminal_payment_reports_not_pending_before_kind() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let event_id = seed_paid_event(&db, 150).await;

        // A settled event fee handed to the upgrade path: the status check
        // decides before the kind check does.
        let event_fee = submit_event_payment(&db, member_id, event_id, 150, PaymentMode::Upi, None)
            .await
            .unwrap();
        approve_event_fee(&db, event_fee.guid).await.unwrap();
        let err = approve_upgrade(&db, event_fee.guid).await.unwrap_err();
        assert!(matches!(err, CoreError::NotPending));

        // Same for a rejected upgrade handed to the event-fee path.
        let upgrade = submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
            .await
            .unwrap();
        reject_payment(&db, upgrade.guid, "illegible receipt")
            .await
            .unwrap();
        let err = approve_event_fee(&db, upgrade.guid).await.unwrap_err();
        assert!(matches!(err, CoreError::NotPending));
    }

    #[tokio::test]
    async fn test_amount_matching_no_tier_fee_is_rejected_at_approval() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;

        // Submission would refuse 150, so write the ledger row directly to
        // model a fee-table change between submission and review.
        let new = NewPayment {
            member_id,
            kind: PaymentKind::MembershipUpgrade,
            event_id: None,
            amount: 150,
            mode: PaymentMode::Cash,
            receipt_url: None,
        };
        let guid = crate::db::payments::insert_payment(&db, &new).await.unwrap();

        let err = approve_upgrade(&db, guid).await.unwrap_err();
        assert!(matches!(err, CoreError::NoMatchingTier { amount: 150 }));
        assert_eq!(member_tier(&db, member_id).await, Tier::Bronze);

        let payment = crate::db::payments::get_payment(&db, guid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_stale_payment_for_current_tier_is_not_an_upgrade() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let payment = submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
            .await
            .unwrap();

        // The member reached Silver some other way while the payment sat in
        // the queue; settling it now would be a no-op move or a downgrade.
        force_tier(&db, member_id, Tier::Silver).await;
        let err = approve_upgrade(&db, payment.guid).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotAnUpgrade {
                current: Tier::Silver,
                target: Tier::Silver,
            }
        ));

        force_tier(&db, member_id, Tier::Platinum).await;
        let err = approve_upgrade(&db, payment.guid).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotAnUpgrade {
                current: Tier::Platinum,
                target: Tier::Silver,
            }
        ));

        // Both refusals left the payment pending and the tier untouched.
        let payment = crate::db::payments::get_payment(&db, payment.guid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(member_tier(&db, member_id).await, Tier::Platinum);
    }

    #[tokio::test]
    async fn test_approve_event_fee_settles_without_member_change() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let event_id = seed_paid_event(&db, 150).await;
        let payment = submit_event_payment(&db, member_id, event_id, 150, PaymentMode::Upi, None)
            .await
            .unwrap();

        let settled = approve_event_fee(&db, payment.guid).await.unwrap();

        assert_eq!(settled.status, PaymentStatus::Settled);
        assert_eq!(member_tier(&db, member_id).await, Tier::Bronze);

        let err = approve_event_fee(&db, payment.guid).await.unwrap_err();
        assert!(matches!(err, CoreError::NotPending));
    }

    #[tokio::test]
    async fn test_approve_payment_dispatches_by_kind() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let event_id = seed_paid_event(&db, 150).await;

        let upgrade = submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
            .await
            .unwrap();
        let event_fee = submit_event_payment(&db, member_id, event_id, 150, PaymentMode::Upi, None)
            .await
            .unwrap();

        approve_payment(&db, event_fee.guid).await.unwrap();
        assert_eq!(member_tier(&db, member_id).await, Tier::Bronze);

        approve_payment(&db, upgrade.guid).await.unwrap();
        assert_eq!(member_tier(&db, member_id).await, Tier::Silver);
    }

    #[tokio::test]
    async fn test_reject_records_reason_and_is_terminal() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let payment = submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
            .await
            .unwrap();

        let rejected = reject_payment(&db, payment.guid, "receipt does not match amount")
            .await
            .unwrap();
        assert_eq!(rejected.status, PaymentStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("receipt does not match amount")
        );
        assert_eq!(member_tier(&db, member_id).await, Tier::Bronze);

        // Terminal both ways: no second rejection, no late approval.
        let err = reject_payment(&db, payment.guid, "again").await.unwrap_err();
        assert!(matches!(err, CoreError::NotPending));
        let err = approve_upgrade(&db, payment.guid).await.unwrap_err();
        assert!(matches!(err, CoreError::NotPending));
    }

    #[tokio::test]
    async fn test_approve_after_member_disabled_still_settles() {
        // Approval reconciles money already collected; the status gate
        // applies to submission and attendance, not settlement.
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Tier::Bronze).await;
        let payment = submit_upgrade_payment(&db, member_id, 200, PaymentMode::Upi, None)
            .await
            .unwrap();

        crate::db::members::set_member_status(&db, member_id, MemberStatus::Disabled)
            .await
            .unwrap();

        let settled = approve_upgrade(&db, payment.guid).await.unwrap();
        assert_eq!(settled.status, PaymentStatus::Settled);
        assert_eq!(member_tier(&db, member_id).await, Tier::Silver);
    }
}
