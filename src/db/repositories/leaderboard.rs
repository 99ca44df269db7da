use std::collections::HashMap;

use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::instrument;

use super::Repository;
use super::live::LiveRepository;
use super::participant::ParticipantRepository;
use crate::db::PgResult;
use crate::db::models::participant::{Participant, ParticipantId};
use crate::scoring::ScoringRecord;
use crate::scoring::level::{self, LevelInfo};
use crate::scoring::points::{self, ScoreBreakdown};
use crate::scoring::ranking::{self, Contender, RankSummary, RankedContender};

/// Fully ranked view of one participant. Every surface that shows points,
/// completion or rank consumes this shape, derived in exactly one place.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub id: ParticipantId,
    pub name: String,
    pub points: i64,
    pub completed: i64,
    pub social_posts: i64,
    pub rank: i64,
    pub level: LevelInfo,
}

/// Raw engine input for one contestant.
struct ScoringSource {
    participant: Participant,
    records: Vec<ScoringRecord>,
    adjustments: Vec<i64>,
}

/// The one place raw rows meet the scoring engine. Points and ranks are
/// recomputed from scratch on every call; nothing is cached, so there is
/// nothing to invalidate.
pub struct LeaderboardRepository {
    pool: &'static Pool<Postgres>,
}

impl LeaderboardRepository {
    pub fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    async fn scoring_sources(&self) -> PgResult<Vec<ScoringSource>> {
        let participants = ParticipantRepository::new(self.pool)
            .list_contestants()
            .await?;

        #[derive(sqlx::FromRow)]
        struct RecordRow {
            participant_id: ParticipantId,
            category: String,
            status: String,
            is_invalid: bool,
        }

        let record_rows = sqlx::query_as::<_, RecordRow>(
            "SELECT participant_id, category, status, is_invalid FROM check_in",
        )
        .fetch_all(self.pool)
        .await?;

        #[derive(sqlx::FromRow)]
        struct AdjustmentRow {
            participant_id: ParticipantId,
            amount: i64,
        }

        let adjustment_rows = sqlx::query_as::<_, AdjustmentRow>(
            "SELECT participant_id, amount FROM point_adjustment",
        )
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<ParticipantId, (Vec<ScoringRecord>, Vec<i64>)> = HashMap::new();
        for row in record_rows {
            let record = ScoringRecord {
                category: row.category.parse()?,
                status: row.status.parse()?,
                invalidated: row.is_invalid,
            };
            grouped.entry(row.participant_id).or_default().0.push(record);
        }
        for row in adjustment_rows {
            grouped.entry(row.participant_id).or_default().1.push(row.amount);
        }

        Ok(participants
            .into_iter()
            .map(|participant| {
                let (records, adjustments) = grouped.remove(&participant.id).unwrap_or_default();
                ScoringSource {
                    participant,
                    records,
                    adjustments,
                }
            })
            .collect())
    }

    async fn ranked(&self) -> PgResult<(Vec<RankedContender>, HashMap<String, ScoreBreakdown>)> {
        let sources = self.scoring_sources().await?;

        let mut breakdowns = HashMap::with_capacity(sources.len());
        let contenders = sources
            .iter()
            .map(|source| {
                let breakdown = points::score_participant(&source.records, &source.adjustments);
                breakdowns.insert(source.participant.id.0.clone(), breakdown);

                Contender {
                    id: source.participant.id.0.clone(),
                    name: source.participant.name.clone(),
                    points: breakdown.points,
                }
            })
            .collect();

        Ok((ranking::build_ranking(contenders), breakdowns))
    }

    #[instrument(skip(self))]
    pub async fn standings(&self) -> PgResult<Vec<Standing>> {
        let total_lives = LiveRepository::new(self.pool).count().await? as usize;
        let (ranked, breakdowns) = self.ranked().await?;

        Ok(ranked
            .into_iter()
            .map(|entry| {
                let breakdown = breakdowns.get(&entry.id).copied().unwrap_or_default();

                Standing {
                    level: level::classify(breakdown.completed, total_lives).info(),
                    id: ParticipantId(entry.id),
                    name: entry.name,
                    points: entry.points,
                    completed: breakdown.completed as i64,
                    social_posts: breakdown.social_posts as i64,
                    rank: entry.rank,
                }
            })
            .collect())
    }

    /// Rank lookup for one participant; `rank == 0` when the id is not in
    /// the ranking (unknown, or an admin account).
    #[instrument(skip(self, id), fields(participant = %id))]
    pub async fn rank_of(&self, id: &ParticipantId) -> PgResult<RankSummary> {
        let (ranked, _) = self.ranked().await?;

        Ok(ranking::locate(&ranked, &id.0))
    }
}
