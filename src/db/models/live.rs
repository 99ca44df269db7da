use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct LiveId(pub String);

impl LiveId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// One scheduled class. `position` is the 1-based slot in the series; the
/// row count of this table is the completion denominator. `is_active` only
/// gates new submissions, never scoring.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Live {
    pub id: LiveId,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewLive {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub position: i32,
    #[serde(default)]
    pub is_active: bool,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct LiveUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
}

/// Schedule row with its check-in volume, for the admin panel.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LiveWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub live: Live,
    pub check_in_count: i64,
}

impl From<String> for LiveId {
    fn from(value: String) -> Self {
        LiveId(value)
    }
}

impl From<&str> for LiveId {
    fn from(value: &str) -> Self {
        LiveId(value.to_string())
    }
}

impl fmt::Display for LiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
