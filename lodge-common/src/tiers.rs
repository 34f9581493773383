//! Membership tier catalog
//!
//! Tiers form a fixed ladder: Bronze < Silver < Gold < Platinum. Each tier
//! carries the fee that settles an upgrade into it from the tier one rank
//! below. Ladder order is defined by [`Tier::ALL`]; nothing in this module
//! depends on hash or map iteration order.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Membership tier
///
/// Serialized (JSON and database TEXT) as the capitalized variant name,
/// e.g. `"Bronze"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// All tiers in ascending rank order
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];

    /// Position on the ladder, zero-based (Bronze = 0)
    pub fn rank(self) -> u8 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 1,
            Tier::Gold => 2,
            Tier::Platinum => 3,
        }
    }

    /// Fee that settles an upgrade into this tier from one rank below
    pub fn upgrade_fee(self) -> i64 {
        match self {
            Tier::Bronze => 100,
            Tier::Silver => 200,
            Tier::Gold => 300,
            Tier::Platinum => 500,
        }
    }

    /// Next tier up the ladder, `None` at Platinum
    pub fn next(self) -> Option<Tier> {
        Self::ALL.get(self.rank() as usize + 1).copied()
    }

    /// Tier whose upgrade fee equals `amount`, if any
    ///
    /// Fees are pairwise distinct, so the match is unique when it exists.
    pub fn from_upgrade_fee(amount: i64) -> Option<Tier> {
        Self::ALL.iter().copied().find(|t| t.upgrade_fee() == amount)
    }

    /// Database TEXT representation
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Bronze" => Ok(Tier::Bronze),
            "Silver" => Ok(Tier::Silver),
            "Gold" => Ok(Tier::Gold),
            "Platinum" => Ok(Tier::Platinum),
            other => Err(Error::InvalidInput(format!("Unknown tier: {}", other))),
        }
    }
}
