//! Database row models and their typed domain counterparts
//!
//! Rows mirror table columns exactly (TEXT enums, RFC 3339 timestamps) and
//! convert into domain structs via `TryFrom`. A conversion failure means the
//! row was edited outside the application, so those errors map to
//! `Error::Internal` rather than `InvalidInput`.

use crate::tiers::Tier;
use crate::types::{EventStatus, MemberStatus, PaymentKind, PaymentMode, PaymentStatus, Zone};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Raw members row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberRow {
    pub guid: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub zone: String,
    pub tier: String,
    pub status: String,
}

/// A member with parsed fields; password material is deliberately absent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub guid: Uuid,
    pub name: String,
    pub email: String,
    pub zone: Zone,
    pub tier: Tier,
    pub status: MemberStatus,
}

impl TryFrom<MemberRow> for Member {
    type Error = Error;

    fn try_from(row: MemberRow) -> Result<Self> {
        Ok(Member {
            guid: parse_guid(&row.guid, "members.guid")?,
            name: row.name,
            email: row.email,
            zone: parse_column(&row.zone, "members.zone")?,
            tier: parse_column(&row.tier, "members.tier")?,
            status: parse_column(&row.status, "members.status")?,
        })
    }
}

/// Raw events row; `zones` and `tiers_allowed` are JSON array TEXT
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub guid: String,
    pub title: String,
    pub location: String,
    pub zones: String,
    pub tiers_allowed: String,
    pub fee: i64,
    pub status: String,
}

/// An event with parsed audience sets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub guid: Uuid,
    pub title: String,
    pub location: String,
    pub zones: Vec<Zone>,
    pub tiers_allowed: Vec<Tier>,
    pub fee: i64,
    pub status: EventStatus,
}

impl Event {
    /// Free events admit eligible members without any payment
    pub fn is_free(&self) -> bool {
        self.fee == 0
    }
}

impl TryFrom<EventRow> for Event {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self> {
        let zones: Vec<Zone> = serde_json::from_str(&row.zones)
            .map_err(|e| Error::Internal(format!("Corrupt events.zones: {}", e)))?;
        let tiers_allowed: Vec<Tier> = serde_json::from_str(&row.tiers_allowed)
            .map_err(|e| Error::Internal(format!("Corrupt events.tiers_allowed: {}", e)))?;

        Ok(Event {
            guid: parse_guid(&row.guid, "events.guid")?,
            title: row.title,
            location: row.location,
            zones,
            tiers_allowed,
            fee: row.fee,
            status: parse_column(&row.status, "events.status")?,
        })
    }
}

/// Raw payments row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub guid: String,
    pub member_id: String,
    pub kind: String,
    pub event_id: Option<String>,
    pub amount: i64,
    pub mode: String,
    pub receipt_url: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

/// A ledger entry with parsed fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub guid: Uuid,
    pub member_id: Uuid,
    pub kind: PaymentKind,
    pub event_id: Option<Uuid>,
    pub amount: i64,
    pub mode: PaymentMode,
    pub receipt_url: Option<String>,
    pub status: PaymentStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let event_id = row
            .event_id
            .as_deref()
            .map(|s| parse_guid(s, "payments.event_id"))
            .transpose()?;

        Ok(Payment {
            guid: parse_guid(&row.guid, "payments.guid")?,
            member_id: parse_guid(&row.member_id, "payments.member_id")?,
            kind: parse_column(&row.kind, "payments.kind")?,
            event_id,
            amount: row.amount,
            mode: parse_column(&row.mode, "payments.mode")?,
            receipt_url: row.receipt_url,
            status: parse_column(&row.status, "payments.status")?,
            rejection_reason: row.rejection_reason,
            created_at: parse_timestamp(&row.created_at, "payments.created_at")?,
        })
    }
}

/// Raw attendees row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendeeRow {
    pub event_id: String,
    pub member_id: String,
    pub payment_id: Option<String>,
    pub marked_at: String,
}

/// A recorded admission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendee {
    pub event_id: Uuid,
    pub member_id: Uuid,
    /// Settled fee payment backing this admission; None for free events
    pub payment_id: Option<Uuid>,
    pub marked_at: DateTime<Utc>,
}

impl TryFrom<AttendeeRow> for Attendee {
    type Error = Error;

    fn try_from(row: AttendeeRow) -> Result<Self> {
        let payment_id = row
            .payment_id
            .as_deref()
            .map(|s| parse_guid(s, "attendees.payment_id"))
            .transpose()?;

        Ok(Attendee {
            event_id: parse_guid(&row.event_id, "attendees.event_id")?,
            member_id: parse_guid(&row.member_id, "attendees.member_id")?,
            payment_id,
            marked_at: parse_timestamp(&row.marked_at, "attendees.marked_at")?,
        })
    }
}

fn parse_guid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Corrupt {}: {}", column, e)))
}

fn parse_column<T: std::str::FromStr<Err = Error>>(value: &str, column: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|e| Error::Internal(format!("Corrupt {}: {}", column, e)))
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Corrupt {}: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_row() -> MemberRow {
        MemberRow {
            guid: "8f0c2a23-9c39-4f48-b7ab-0a2a4c35cbc8".to_string(),
            name: "Priya".to_string(),
            email: "priya@example.com".to_string(),
            password_hash: "hash".to_string(),
            password_salt: "salt".to_string(),
            zone: "West".to_string(),
            tier: "Silver".to_string(),
            status: "active".to_string(),
        }
    }

    #[test]
    fn test_member_row_conversion() {
        let member: Member = member_row().try_into().unwrap();
        assert_eq!(member.zone, Zone::West);
        assert_eq!(member.tier, Tier::Silver);
        assert_eq!(member.status, MemberStatus::Active);
    }

    #[test]
    fn test_corrupt_enum_column_is_internal_error() {
        let mut row = member_row();
        row.tier = "Diamond".to_string();
        let err = Member::try_from(row).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_corrupt_guid_is_internal_error() {
        let mut row = member_row();
        row.guid = "not-a-uuid".to_string();
        assert!(matches!(Member::try_from(row), Err(Error::Internal(_))));
    }

    #[test]
    fn test_event_row_parses_json_audience() {
        let row = EventRow {
            guid: "73c3ccdd-1a9f-4aa7-913c-2a6f6e9f511a".to_string(),
            title: "Annual Gala".to_string(),
            location: "Main Hall".to_string(),
            zones: "[\"North\",\"Central\"]".to_string(),
            tiers_allowed: "[\"Silver\",\"Gold\",\"Platinum\"]".to_string(),
            fee: 0,
            status: "upcoming".to_string(),
        };
        let event: Event = row.try_into().unwrap();
        assert_eq!(event.zones, vec![Zone::North, Zone::Central]);
        assert_eq!(event.tiers_allowed, vec![Tier::Silver, Tier::Gold, Tier::Platinum]);
        assert!(event.is_free());
    }

    #[test]
    fn test_payment_row_conversion() {
        let row = PaymentRow {
            guid: "a7035fd8-54c5-4a40-9f3c-57937cb5b2a9".to_string(),
            member_id: "8f0c2a23-9c39-4f48-b7ab-0a2a4c35cbc8".to_string(),
            kind: "membership_upgrade".to_string(),
            event_id: None,
            amount: 200,
            mode: "upi".to_string(),
            receipt_url: Some("/receipts/r1.png".to_string()),
            status: "pending".to_string(),
            rejection_reason: None,
            created_at: "2026-03-01T10:00:00+00:00".to_string(),
        };
        let payment: Payment = row.try_into().unwrap();
        assert_eq!(payment.kind, PaymentKind::MembershipUpgrade);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.event_id, None);
        assert_eq!(payment.created_at.timestamp(), 1772359200);
    }

    #[test]
    fn test_bad_timestamp_is_internal_error() {
        let row = AttendeeRow {
            event_id: "73c3ccdd-1a9f-4aa7-913c-2a6f6e9f511a".to_string(),
            member_id: "8f0c2a23-9c39-4f48-b7ab-0a2a4c35cbc8".to_string(),
            payment_id: None,
            marked_at: "yesterday".to_string(),
        };
        assert!(matches!(Attendee::try_from(row), Err(Error::Internal(_))));
    }
}
