//! Pure scoring engine.
//!
//! Every surface that shows points, completion counts, tiers or ranks
//! derives them from this module over the same canonical inputs, so the
//! leaderboard, the dashboard, the admin roster and the CSV export can never
//! disagree about a participant's numbers.

pub mod level;
pub mod points;
pub mod ranking;

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Check-in category. Watching a class earns one point, sharing a post
/// about it earns three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Attendance,
    SocialPost,
}

impl Category {
    pub const fn weight(self) -> i64 {
        match self {
            Category::Attendance => 1,
            Category::SocialPost => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInStatus {
    Pending,
    Approved,
    Rejected,
}

/// Canonical scoring projection of one check-in row. Rows are decoded into
/// this shape once, at the database boundary; the engine never sees raw
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRecord {
    pub category: Category,
    pub status: CheckInStatus,
    pub invalidated: bool,
}

impl ScoringRecord {
    /// A record contributes iff it is approved and not voided by an admin.
    pub fn is_scoring(self) -> bool {
        self.status == CheckInStatus::Approved && !self.invalidated
    }
}

/// A stored category or status string that matches no known variant.
/// Unknown values are rejected outright rather than silently weighted as
/// attendance.
#[derive(Debug, Error)]
#[error("unknown {field} value '{value}'")]
pub struct DecodeError {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for Category {
    type Err = DecodeError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "ATTENDANCE" => Ok(Category::Attendance),
            "SOCIAL_POST" => Ok(Category::SocialPost),
            other => Err(DecodeError {
                field: "category",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Attendance => write!(f, "ATTENDANCE"),
            Category::SocialPost => write!(f, "SOCIAL_POST"),
        }
    }
}

impl FromStr for CheckInStatus {
    type Err = DecodeError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(CheckInStatus::Pending),
            "APPROVED" => Ok(CheckInStatus::Approved),
            "REJECTED" => Ok(CheckInStatus::Rejected),
            other => Err(DecodeError {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInStatus::Pending => write!(f, "PENDING"),
            CheckInStatus::Approved => write!(f, "APPROVED"),
            CheckInStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn category_round_trips_through_storage_form() {
        for category in [Category::Attendance, Category::SocialPost] {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            CheckInStatus::Pending,
            CheckInStatus::Approved,
            CheckInStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<CheckInStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!("WATCH_PARTY".parse::<Category>().is_err());
        assert!("attendance".parse::<Category>().is_err());
        assert!("VOIDED".parse::<CheckInStatus>().is_err());
    }
}
