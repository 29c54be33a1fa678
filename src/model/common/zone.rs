use std::fmt::{self, Display};
use std::str::FromStr;

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The six fixed electoral zones. Voters may only vote for candidates
/// registered in their own zone.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "Zone 1")]
    One,
    #[serde(rename = "Zone 2")]
    Two,
    #[serde(rename = "Zone 3")]
    Three,
    #[serde(rename = "Zone 4")]
    Four,
    #[serde(rename = "Zone 5")]
    Five,
    #[serde(rename = "Zone 6")]
    Six,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::One,
        Zone::Two,
        Zone::Three,
        Zone::Four,
        Zone::Five,
        Zone::Six,
    ];

    /// The zone's number, 1 to 6.
    pub fn number(self) -> u8 {
        match self {
            Zone::One => 1,
            Zone::Two => 2,
            Zone::Three => 3,
            Zone::Four => 4,
            Zone::Five => 5,
            Zone::Six => 6,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone {}", self.number())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown electoral zone '{0}', expected 'Zone 1' to 'Zone 6'")]
pub struct ZoneParseError(String);

impl FromStr for Zone {
    type Err = ZoneParseError;

    /// Accepts the display form, case-insensitively, or the bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("zone ") => trimmed[5..].trim(),
            _ => trimmed,
        };
        digits
            .parse::<u8>()
            .ok()
            .and_then(Zone::from_number)
            .ok_or_else(|| ZoneParseError(s.to_string()))
    }
}

impl From<Zone> for Bson {
    fn from(zone: Zone) -> Self {
        to_bson(&zone).expect("Serialisation is infallible")
    }
}
