use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::live::LiveId;
use super::participant::ParticipantId;
use crate::scoring::{Category, CheckInStatus, DecodeError, ScoringRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct CheckInId(pub String);

impl CheckInId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Check-in row exactly as stored; category and status are constrained TEXT
/// columns and stay strings until decoded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckInRow {
    pub id: CheckInId,
    pub participant_id: ParticipantId,
    pub live_id: LiveId,
    pub category: String,
    pub status: String,
    pub is_invalid: bool,
    pub insight: Option<String>,
    pub post_url: Option<String>,
    pub admin_note: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub reviewed_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Domain check-in with decoded enums; everything past the repository layer
/// works with this shape.
#[derive(Debug, Clone, Serialize)]
pub struct CheckIn {
    pub id: CheckInId,
    pub participant_id: ParticipantId,
    pub live_id: LiveId,
    pub category: Category,
    pub status: CheckInStatus,
    pub is_invalid: bool,
    pub insight: Option<String>,
    pub post_url: Option<String>,
    pub admin_note: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub reviewed_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<CheckInRow> for CheckIn {
    type Error = DecodeError;

    fn try_from(row: CheckInRow) -> core::result::Result<Self, Self::Error> {
        Ok(Self {
            category: row.category.parse()?,
            status: row.status.parse()?,
            id: row.id,
            participant_id: row.participant_id,
            live_id: row.live_id,
            is_invalid: row.is_invalid,
            insight: row.insight,
            post_url: row.post_url,
            admin_note: row.admin_note,
            reviewed_at: row.reviewed_at,
            reviewed_by: row.reviewed_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl CheckIn {
    pub fn scoring_record(&self) -> ScoringRecord {
        ScoringRecord {
            category: self.category,
            status: self.status,
            invalidated: self.is_invalid,
        }
    }
}

fn default_category() -> Category {
    Category::Attendance
}

/// A participant's check-in submission, validated by the handler before it
/// reaches the repository.
#[derive(Debug, Deserialize)]
pub struct CheckInSubmission {
    pub participant_id: ParticipantId,
    pub live_id: LiveId,
    #[serde(default = "default_category")]
    pub category: Category,
    pub insight: Option<String>,
    pub post_url: Option<String>,
}

/// Admin review payload: a status decision, a note, an invalidation toggle,
/// or any combination.
#[derive(Debug, Deserialize)]
pub struct ReviewUpdate {
    pub status: Option<CheckInStatus>,
    pub admin_note: Option<String>,
    pub invalidated: Option<bool>,
}

/// Check-in joined with the submitter and the class it claims, for the
/// review queue.
#[derive(Debug, sqlx::FromRow)]
pub struct AdminCheckInRow {
    #[sqlx(flatten)]
    pub check_in: CheckInRow,
    pub participant_name: String,
    pub participant_email: String,
    pub live_title: String,
    pub live_position: i32,
}

#[derive(Debug, Serialize)]
pub struct AdminCheckIn {
    #[serde(flatten)]
    pub check_in: CheckIn,
    pub participant_name: String,
    pub participant_email: String,
    pub live_title: String,
    pub live_position: i32,
}

impl TryFrom<AdminCheckInRow> for AdminCheckIn {
    type Error = DecodeError;

    fn try_from(row: AdminCheckInRow) -> core::result::Result<Self, Self::Error> {
        Ok(Self {
            check_in: row.check_in.try_into()?,
            participant_name: row.participant_name,
            participant_email: row.participant_email,
            live_title: row.live_title,
            live_position: row.live_position,
        })
    }
}

impl From<String> for CheckInId {
    fn from(value: String) -> Self {
        CheckInId(value)
    }
}

impl From<&str> for CheckInId {
    fn from(value: &str) -> Self {
        CheckInId(value.to_string())
    }
}

impl fmt::Display for CheckInId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn row(category: &str, status: &str) -> CheckInRow {
        CheckInRow {
            id: CheckInId::generate(),
            participant_id: ParticipantId::from("p1"),
            live_id: LiveId::from("l1"),
            category: category.to_string(),
            status: status.to_string(),
            is_invalid: false,
            insight: None,
            post_url: None,
            admin_note: None,
            reviewed_at: None,
            reviewed_by: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn decodes_known_category_and_status() {
        let check_in = CheckIn::try_from(row("SOCIAL_POST", "APPROVED")).unwrap();

        assert_eq!(check_in.category, Category::SocialPost);
        assert_eq!(check_in.status, CheckInStatus::Approved);
        assert!(check_in.scoring_record().is_scoring());
    }

    #[test]
    fn rejects_unknown_category_at_the_boundary() {
        assert!(CheckIn::try_from(row("LIVESTREAM", "APPROVED")).is_err());
        assert!(CheckIn::try_from(row("ATTENDANCE", "ARCHIVED")).is_err());
    }
}
