use std::sync::LazyLock;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::scoring::DecodeError;
use crate::util::env;
use crate::util::env::Var;
use crate::var;

pub mod models;
pub mod repositories;

pub mod prelude {
    pub use crate::db::PgError;
    pub use crate::db::db_pool;

    pub use crate::db::models::{PaginatedResponse, Pagination};

    pub use crate::db::models::adjustment::PointAdjustment;
    pub use crate::db::models::checkin::{CheckIn, CheckInId, CheckInSubmission, ReviewUpdate};
    pub use crate::db::models::live::{Live, LiveId, LiveUpdate, NewLive};
    pub use crate::db::models::participant::{Participant, ParticipantId};

    pub use crate::db::repositories::Repository;
    pub use crate::db::repositories::adjustment::AdjustmentRepository;
    pub use crate::db::repositories::checkin::CheckInRepository;
    pub use crate::db::repositories::leaderboard::LeaderboardRepository;
    pub use crate::db::repositories::live::LiveRepository;
    pub use crate::db::repositories::participant::ParticipantRepository;
}

static DB_POOL: LazyLock<OnceCell<Db>> = LazyLock::new(OnceCell::new);

pub async fn db_pool() -> PgResult<&'static PgPool> {
    Ok(&DB_POOL
        .get_or_try_init(|| async { Db::new_pool().await })
        .await?
        .pool)
}

/// Applies the embedded migrations; runs once at startup before the server
/// accepts traffic.
pub async fn run_migrations() -> PgResult<()> {
    let pool = db_pool().await?;
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}

struct Db {
    pool: PgPool,
}

impl Db {
    async fn new_pool() -> PgResult<Self> {
        let db_url = var!(Var::DatabaseUrl).await?;
        let pool = sqlx::PgPool::connect(db_url).await?;

        Ok(Self { pool })
    }
}

pub type PgResult<T> = core::result::Result<T, PgError>;

#[derive(Debug, Error)]
pub enum PgError {
    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    EnvError(#[from] env::EnvErr),

    #[error("{0}")]
    DecodeError(#[from] DecodeError),
}
