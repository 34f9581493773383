//! Shared enumerations used across tables and API payloads
//!
//! Every enum here is stored as TEXT (the serde representation) and guarded
//! by a CHECK constraint in the schema, so `FromStr` failures on read mean
//! the database was modified outside the application.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic zone a member belongs to and events are scoped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    North,
    South,
    East,
    West,
    Central,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::North, Zone::South, Zone::East, Zone::West, Zone::Central];

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::North => "North",
            Zone::South => "South",
            Zone::East => "East",
            Zone::West => "West",
            Zone::Central => "Central",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "North" => Ok(Zone::North),
            "South" => Ok(Zone::South),
            "East" => Ok(Zone::East),
            "West" => Ok(Zone::West),
            "Central" => Ok(Zone::Central),
            other => Err(Error::InvalidInput(format!("Unknown zone: {}", other))),
        }
    }
}

/// Member account status
///
/// Disabled members keep their history but fail eligibility and cannot log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Disabled,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(MemberStatus::Active),
            "disabled" => Ok(MemberStatus::Disabled),
            other => Err(Error::InvalidInput(format!("Unknown member status: {}", other))),
        }
    }
}

/// Event lifecycle status
///
/// Payments and attendance are only accepted while an event is `Upcoming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(Error::InvalidInput(format!("Unknown event status: {}", other))),
        }
    }
}

/// Payment lifecycle status
///
/// `pending` is the only non-terminal state: a payment settles or is
/// rejected exactly once and never leaves the terminal state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Settled,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Settled => "settled",
            PaymentStatus::Rejected => "rejected",
        }
    }

    /// Settled and rejected payments never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Settled | PaymentStatus::Rejected)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "settled" => Ok(PaymentStatus::Settled),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown payment status: {}", other))),
        }
    }
}

/// What a payment is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Settlement moves the member one tier up the ladder
    MembershipUpgrade,
    /// Settlement admits the member to one paid event
    EventFee,
}

impl PaymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentKind::MembershipUpgrade => "membership_upgrade",
            PaymentKind::EventFee => "event_fee",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "membership_upgrade" => Ok(PaymentKind::MembershipUpgrade),
            "event_fee" => Ok(PaymentKind::EventFee),
            other => Err(Error::InvalidInput(format!("Unknown payment kind: {}", other))),
        }
    }
}

/// How the member claims to have paid
///
/// Informational only; verification is the reviewing admin's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Online,
    Bank,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Online => "online",
            PaymentMode::Bank => "bank",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            "online" => Ok(PaymentMode::Online),
            "bank" => Ok(PaymentMode::Bank),
            other => Err(Error::InvalidInput(format!("Unknown payment mode: {}", other))),
        }
    }
}
