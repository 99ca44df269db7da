use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

use super::Repository;
use crate::db::models::live::{Live, LiveId, LiveUpdate, LiveWithCount, NewLive};

pub struct LiveRepository {
    pool: &'static Pool<Postgres>,
}

impl Repository for LiveRepository {
    type Ident = LiveId;
    type Output = Live;

    const BASE_FIELDS: &'static str =
        "id, title, description, scheduled_at, position, is_active, created_at, updated_at";
    const TABLE_NAME: &'static str = "live";

    fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &'static Pool<Postgres> {
        self.pool
    }
}

impl LiveRepository {
    #[instrument(skip(self))]
    pub async fn list_ordered(&self) -> SqlxResult<Vec<Live>> {
        sqlx::query_as::<_, Live>(
            r#"
            SELECT id, title, description, scheduled_at, position, is_active, created_at, updated_at
            FROM live
            ORDER BY position ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
    }

    /// Completion denominator: how many classes the series has in total.
    #[instrument(skip(self))]
    pub async fn count(&self) -> SqlxResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM live")
            .fetch_one(self.pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_with_counts(&self) -> SqlxResult<Vec<LiveWithCount>> {
        sqlx::query_as::<_, LiveWithCount>(
            r#"
            SELECT
                l.id,
                l.title,
                l.description,
                l.scheduled_at,
                l.position,
                l.is_active,
                l.created_at,
                l.updated_at,
                COUNT(c.id) AS check_in_count
            FROM live l
            LEFT JOIN check_in c ON c.live_id = l.id
            GROUP BY l.id, l.title, l.description, l.scheduled_at, l.position,
                     l.is_active, l.created_at, l.updated_at
            ORDER BY l.position ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
    }

    #[instrument(skip(self, new))]
    pub async fn create(&self, new: &NewLive) -> SqlxResult<Live> {
        sqlx::query_as::<_, Live>(
            r#"
            INSERT INTO live (id, title, description, scheduled_at, position, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, scheduled_at, position, is_active, created_at, updated_at
            "#,
        )
        .bind(LiveId::generate())
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.scheduled_at)
        .bind(new.position)
        .bind(new.is_active)
        .fetch_one(self.pool)
        .await
    }

    /// Partial update; `COALESCE` keeps every field the caller left out.
    #[instrument(skip(self, id, patch))]
    pub async fn update(&self, id: &LiveId, patch: &LiveUpdate) -> SqlxResult<Option<Live>> {
        sqlx::query_as::<_, Live>(
            r#"
            UPDATE live
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                scheduled_at = COALESCE($4, scheduled_at),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, scheduled_at, position, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.scheduled_at)
        .bind(patch.is_active)
        .fetch_optional(self.pool)
        .await
    }
}
