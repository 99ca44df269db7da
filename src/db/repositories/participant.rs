use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

use super::Repository;
use crate::db::models::participant::{Participant, ParticipantId};

pub struct ParticipantRepository {
    pool: &'static Pool<Postgres>,
}

impl Repository for ParticipantRepository {
    type Ident = ParticipantId;
    type Output = Participant;

    const BASE_FIELDS: &'static str = "id, name, email, role, is_banned, created_at, updated_at";
    const TABLE_NAME: &'static str = "participant";

    fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &'static Pool<Postgres> {
        self.pool
    }
}

impl ParticipantRepository {
    #[instrument(skip(self, name, email))]
    pub async fn create(&self, name: &str, email: &str) -> SqlxResult<Participant> {
        sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO participant (id, name, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, role, is_banned, created_at, updated_at
            "#,
        )
        .bind(ParticipantId::generate())
        .bind(name)
        .bind(email)
        .fetch_one(self.pool)
        .await
    }

    /// Everyone eligible for the ranking, in registration order. Admin
    /// accounts never compete.
    #[instrument(skip(self))]
    pub async fn list_contestants(&self) -> SqlxResult<Vec<Participant>> {
        sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, name, email, role, is_banned, created_at, updated_at
            FROM participant
            WHERE role = 'USER'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
    }

    #[instrument(skip(self, id))]
    pub async fn set_banned(
        &self,
        id: &ParticipantId,
        banned: bool,
    ) -> SqlxResult<Option<Participant>> {
        sqlx::query_as::<_, Participant>(
            r#"
            UPDATE participant
            SET is_banned = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, role, is_banned, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(banned)
        .fetch_optional(self.pool)
        .await
    }
}
