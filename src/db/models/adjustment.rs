use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::participant::ParticipantId;

/// Manual signed point delta entered by an admin. Insert-only; always
/// applied to the participant's total.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PointAdjustment {
    pub id: String,
    pub participant_id: ParticipantId,
    pub amount: i64,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewAdjustment {
    pub participant_id: ParticipantId,
    pub amount: i64,
    pub reason: Option<String>,
}
