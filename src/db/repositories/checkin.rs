use sqlx::{Pool, Postgres};
use tracing::instrument;

use crate::db::models::checkin::{
    AdminCheckIn, AdminCheckInRow, CheckIn, CheckInId, CheckInRow, CheckInSubmission, ReviewUpdate,
};
use crate::db::models::live::LiveId;
use crate::db::models::participant::ParticipantId;
use crate::db::{PgError, PgResult};
use crate::scoring::{Category, CheckInStatus};

const CHECK_IN_FIELDS: &str = "id, participant_id, live_id, category, status, is_invalid, \
     insight, post_url, admin_note, reviewed_at, reviewed_by, created_at, updated_at";

/// Check-in persistence. Every row leaves this repository already decoded
/// into closed category/status enums; unknown stored values surface as
/// decode errors instead of leaking into scoring.
pub struct CheckInRepository {
    pool: &'static Pool<Postgres>,
}

impl CheckInRepository {
    pub fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn decode(rows: Vec<CheckInRow>) -> PgResult<Vec<CheckIn>> {
        rows.into_iter()
            .map(|row| CheckIn::try_from(row).map_err(PgError::from))
            .collect()
    }

    #[instrument(skip(self, id))]
    pub async fn get_by_id(&self, id: &CheckInId) -> PgResult<Option<CheckIn>> {
        let row = sqlx::query_as::<_, CheckInRow>(&format!(
            "SELECT {CHECK_IN_FIELDS} FROM check_in WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(CheckIn::try_from).transpose().map_err(PgError::from)
    }

    #[instrument(skip(self, participant_id, live_id))]
    pub async fn find_submission(
        &self,
        participant_id: &ParticipantId,
        live_id: &LiveId,
        category: Category,
    ) -> PgResult<Option<CheckIn>> {
        let row = sqlx::query_as::<_, CheckInRow>(&format!(
            "SELECT {CHECK_IN_FIELDS} FROM check_in \
             WHERE participant_id = $1 AND live_id = $2 AND category = $3"
        ))
        .bind(participant_id)
        .bind(live_id)
        .bind(category.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(CheckIn::try_from).transpose().map_err(PgError::from)
    }

    /// A participant's full history, in class order with attendance before
    /// the share for the same class.
    #[instrument(skip(self, participant_id))]
    pub async fn list_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> PgResult<Vec<CheckIn>> {
        let rows = sqlx::query_as::<_, CheckInRow>(
            r#"
            SELECT c.*
            FROM check_in c
            JOIN live l ON c.live_id = l.id
            WHERE c.participant_id = $1
            ORDER BY l.position ASC, c.category ASC
            "#,
        )
        .bind(participant_id)
        .fetch_all(self.pool)
        .await?;

        Self::decode(rows)
    }

    #[instrument(skip(self, status))]
    pub async fn list_all(&self, status: Option<CheckInStatus>) -> PgResult<Vec<CheckIn>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, CheckInRow>(&format!(
                    "SELECT {CHECK_IN_FIELDS} FROM check_in WHERE status = $1 ORDER BY created_at ASC"
                ))
                .bind(status.to_string())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CheckInRow>(&format!(
                    "SELECT {CHECK_IN_FIELDS} FROM check_in ORDER BY created_at ASC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        Self::decode(rows)
    }

    /// Review queue: check-ins joined with their submitter and class.
    #[instrument(skip(self, status))]
    pub async fn list_for_review(
        &self,
        status: Option<CheckInStatus>,
    ) -> PgResult<Vec<AdminCheckIn>> {
        let base = r#"
            SELECT
                c.id, c.participant_id, c.live_id, c.category, c.status, c.is_invalid,
                c.insight, c.post_url, c.admin_note, c.reviewed_at, c.reviewed_by,
                c.created_at, c.updated_at,
                p.name AS participant_name,
                p.email AS participant_email,
                l.title AS live_title,
                l.position AS live_position
            FROM check_in c
            JOIN participant p ON c.participant_id = p.id
            JOIN live l ON c.live_id = l.id
        "#;

        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, AdminCheckInRow>(&format!(
                    "{base} WHERE c.status = $1 ORDER BY c.created_at ASC"
                ))
                .bind(status.to_string())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AdminCheckInRow>(&format!(
                    "{base} ORDER BY c.created_at ASC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter()
            .map(|row| AdminCheckIn::try_from(row).map_err(PgError::from))
            .collect()
    }

    /// Submission upsert: lands approved and wipes any earlier review
    /// verdict. `is_invalid` is deliberately left alone so an admin void
    /// cannot be cleared by resubmitting.
    #[instrument(skip(self, submission), fields(participant = %submission.participant_id, live = %submission.live_id))]
    pub async fn upsert_submission(&self, submission: &CheckInSubmission) -> PgResult<CheckIn> {
        let row = sqlx::query_as::<_, CheckInRow>(&format!(
            r#"
            INSERT INTO check_in (id, participant_id, live_id, category, status, insight, post_url)
            VALUES ($1, $2, $3, $4, 'APPROVED', $5, $6)
            ON CONFLICT (participant_id, live_id, category)
            DO UPDATE SET
                insight = $5,
                post_url = $6,
                status = 'APPROVED',
                admin_note = NULL,
                reviewed_at = NULL,
                reviewed_by = NULL,
                updated_at = NOW()
            RETURNING {CHECK_IN_FIELDS}
            "#
        ))
        .bind(CheckInId::generate())
        .bind(&submission.participant_id)
        .bind(&submission.live_id)
        .bind(submission.category.to_string())
        .bind(&submission.insight)
        .bind(&submission.post_url)
        .fetch_one(self.pool)
        .await?;

        CheckIn::try_from(row).map_err(PgError::from)
    }

    /// Owner content edit; does not touch status or review fields.
    #[instrument(skip(self, id, insight, post_url))]
    pub async fn update_content(
        &self,
        id: &CheckInId,
        insight: Option<&str>,
        post_url: Option<&str>,
    ) -> PgResult<Option<CheckIn>> {
        let row = sqlx::query_as::<_, CheckInRow>(&format!(
            r#"
            UPDATE check_in
            SET insight = COALESCE($2, insight),
                post_url = COALESCE($3, post_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CHECK_IN_FIELDS}
            "#
        ))
        .bind(id)
        .bind(insight)
        .bind(post_url)
        .fetch_optional(self.pool)
        .await?;

        row.map(CheckIn::try_from).transpose().map_err(PgError::from)
    }

    /// Applies a review decision and/or an invalidation toggle, stamping the
    /// acting principal.
    #[instrument(skip(self, id, review), fields(reviewer = reviewer))]
    pub async fn apply_review(
        &self,
        id: &CheckInId,
        review: &ReviewUpdate,
        reviewer: &str,
    ) -> PgResult<Option<CheckIn>> {
        let row = sqlx::query_as::<_, CheckInRow>(&format!(
            r#"
            UPDATE check_in
            SET status = COALESCE($2, status),
                admin_note = COALESCE($3, admin_note),
                is_invalid = COALESCE($4, is_invalid),
                reviewed_at = NOW(),
                reviewed_by = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CHECK_IN_FIELDS}
            "#
        ))
        .bind(id)
        .bind(review.status.map(|s| s.to_string()))
        .bind(&review.admin_note)
        .bind(review.invalidated)
        .bind(reviewer)
        .fetch_optional(self.pool)
        .await?;

        row.map(CheckIn::try_from).transpose().map_err(PgError::from)
    }

    /// Returns whether a row was actually removed.
    #[instrument(skip(self, id))]
    pub async fn delete(&self, id: &CheckInId) -> PgResult<bool> {
        let result = sqlx::query("DELETE FROM check_in WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
