use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;
use uuid::Uuid;

use crate::db::models::adjustment::PointAdjustment;
use crate::db::models::participant::ParticipantId;

/// Insert-only store of manual point deltas. There is no update or delete
/// path; a wrong adjustment is corrected by entering a compensating one.
pub struct AdjustmentRepository {
    pool: &'static Pool<Postgres>,
}

impl AdjustmentRepository {
    pub fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, participant_id, reason), fields(participant = %participant_id))]
    pub async fn create(
        &self,
        participant_id: &ParticipantId,
        amount: i64,
        reason: Option<&str>,
    ) -> SqlxResult<PointAdjustment> {
        sqlx::query_as::<_, PointAdjustment>(
            r#"
            INSERT INTO point_adjustment (id, participant_id, amount, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id, participant_id, amount, reason, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(participant_id)
        .bind(amount)
        .bind(reason)
        .fetch_one(self.pool)
        .await
    }

    #[instrument(skip(self, participant_id))]
    pub async fn list_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> SqlxResult<Vec<PointAdjustment>> {
        sqlx::query_as::<_, PointAdjustment>(
            r#"
            SELECT id, participant_id, amount, reason, created_at
            FROM point_adjustment
            WHERE participant_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(participant_id)
        .fetch_all(self.pool)
        .await
    }
}
