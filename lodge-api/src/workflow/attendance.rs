//! Attendance recording.
//!
//! Free events admit any eligible member directly. Paid events additionally
//! require a settled event-fee payment, and the attendance row links back to
//! it. The attendees primary key keeps the record duplicate-free even when
//! two admins mark the same member at once.

use lodge_common::db::models::Attendee;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{eligibility, is_unique_violation, CoreError};
use crate::db;

/// Mark a member as attending an event.
pub async fn mark_attendance(
    db: &SqlitePool,
    event_id: Uuid,
    member_id: Uuid,
) -> Result<Attendee, CoreError> {
    let event = db::events::get_event(db, event_id)
        .await?
        .ok_or(CoreError::NotFound("Event"))?;
    eligibility::ensure_upcoming(&event)?;

    let member = db::members::get_member(db, member_id)
        .await?
        .ok_or(CoreError::NotFound("Member"))?;

    if db::attendees::has_attended(db, event_id, member_id).await? {
        return Err(CoreError::AlreadyAttended);
    }

    eligibility::check_eligibility(&member, &event)?;

    let payment_id = if event.is_free() {
        None
    } else {
        let payment = db::payments::find_settled_event_payment(db, member_id, event_id)
            .await?
            .ok_or(CoreError::NoSettledPayment)?;
        Some(payment.guid)
    };

    match db::attendees::insert_attendee(db, event_id, member_id, payment_id).await {
        Ok(()) => {}
        Err(err) if is_unique_violation(&err) => return Err(CoreError::AlreadyAttended),
        Err(err) => return Err(err.into()),
    }

    info!(
        event_id = %event_id,
        member_id = %member_id,
        paid = payment_id.is_some(),
        "Attendance recorded"
    );

    db::attendees::get_attendee(db, event_id, member_id)
        .await?
        .ok_or(CoreError::NotFound("Attendance record"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::events::NewEvent;
    use crate::db::members::NewMember;
    use crate::workflow::payments::submit_event_payment;
    use crate::workflow::reconcile::{approve_event_fee, reject_payment};
    use lodge_common::types::{EventStatus, PaymentMode, Zone};
    use lodge_common::Tier;
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

    async fn seed_member(db: &SqlitePool, zone: Zone) -> Uuid {
        let new = NewMember {
            name: "Meera Pillai".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "hash".to_string(),
            password_salt: "salt".to_string(),
            zone,
            tier: Tier::Bronze,
        };
        crate::db::members::insert_member(db, &new).await.unwrap()
    }

    async fn seed_event(db: &SqlitePool, fee: i64) -> Uuid {
        let new = NewEvent {
            title: format!("Event {}", Uuid::new_v4()),
            location: "Grounds".to_string(),
            zones: vec![Zone::West],
            tiers_allowed: vec![Tier::Bronze],
            fee,
            status: EventStatus::Upcoming,
        };
        crate::db::events::insert_event(db, &new).await.unwrap()
    }

    #[tokio::test]
    async fn test_free_event_attendance_has_no_payment_link() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 0).await;

        let attendee = mark_attendance(&db, event_id, member_id).await.unwrap();

        assert_eq!(attendee.event_id, event_id);
        assert_eq!(attendee.member_id, member_id);
        assert!(attendee.payment_id.is_none());
    }

    #[tokio::test]
    async fn test_paid_event_requires_settled_payment() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 120).await;

        // No payment at all.
        let err = mark_attendance(&db, event_id, member_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoSettledPayment));

        // Pending is not enough.
        let payment = submit_event_payment(&db, member_id, event_id, 120, PaymentMode::Upi, None)
            .await
            .unwrap();
        let err = mark_attendance(&db, event_id, member_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoSettledPayment));

        // Settled admits, and the record links the payment.
        approve_event_fee(&db, payment.guid).await.unwrap();
        let attendee = mark_attendance(&db, event_id, member_id).await.unwrap();
        assert_eq!(attendee.payment_id, Some(payment.guid));
    }

    #[tokio::test]
    async fn test_rejected_payment_does_not_admit() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 120).await;

        let payment = submit_event_payment(&db, member_id, event_id, 120, PaymentMode::Upi, None)
            .await
            .unwrap();
        reject_payment(&db, payment.guid, "amount unverifiable")
            .await
            .unwrap();

        let err = mark_attendance(&db, event_id, member_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoSettledPayment));
    }

    #[tokio::test]
    async fn test_duplicate_attendance_conflicts() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 0).await;

        mark_attendance(&db, event_id, member_id).await.unwrap();
        let err = mark_attendance(&db, event_id, member_id).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyAttended));
    }

    #[tokio::test]
    async fn test_ineligible_zone_blocks_even_with_settled_payment() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 120).await;

        let payment = submit_event_payment(&db, member_id, event_id, 120, PaymentMode::Upi, None)
            .await
            .unwrap();
        approve_event_fee(&db, payment.guid).await.unwrap();

        // The member moves out of the event's zone after paying.
        sqlx::query("UPDATE members SET zone = 'East' WHERE guid = ?")
            .bind(member_id.to_string())
            .execute(&db)
            .await
            .unwrap();

        let err = mark_attendance(&db, event_id, member_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotEligible(_)));
    }

    #[tokio::test]
    async fn test_closed_event_blocks_attendance() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 0).await;

        crate::db::events::set_event_status(&db, event_id, EventStatus::Completed)
            .await
            .unwrap();

        let err = mark_attendance(&db, event_id, member_id).await.unwrap_err();
        assert!(matches!(err, CoreError::EventNotOpen));
    }

    #[tokio::test]
    async fn test_unknown_event_or_member_is_not_found() {
        let db = setup_test_db().await;
        let member_id = seed_member(&db, Zone::West).await;
        let event_id = seed_event(&db, 0).await;

        let err = mark_attendance(&db, Uuid::new_v4(), member_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Event")));

        let err = mark_attendance(&db, event_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Member")));
    }
}
