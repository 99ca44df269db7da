use std::collections::HashSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::prelude::*;
use crate::db::repositories::leaderboard::Standing;
use crate::scoring::level::{self, Badge, BadgeInfo, Level, LevelInfo};
use crate::scoring::points;
use crate::scoring::ranking::RankSummary;
use crate::scoring::{Category, CheckInStatus, ScoringRecord};

const SOCIAL_POST_URL_PREFIX: &str = "https://www.linkedin.com/";
const MIN_INSIGHT_CHARS: usize = 10;

#[instrument(skip(state))]
pub async fn leaderboard(
    Query(param): Query<Pagination>,
    State(state): State<Arc<AppState>>,
) -> JsonResult<PaginatedResponse<Standing>> {
    let limit = param.limit.max(0);
    let page = param.page.max(0);

    // ranks are assigned over the full field before the page is cut
    let standings = LeaderboardRepository::new(state.db_pool).standings().await?;
    let total_items = standings.len() as i64;

    let items: Vec<Standing> = standings
        .into_iter()
        .skip((page * limit) as usize)
        .take(limit as usize)
        .collect();

    Ok(Json(PaginatedResponse::new(
        items,
        total_items,
        limit,
        page + 1,
    )))
}

#[derive(Debug, Serialize)]
pub struct RankingSummary {
    pub participants: i64,
    pub finishers: i64,
    pub total_lives: i64,
}

#[instrument(skip(state))]
pub async fn ranking_summary(State(state): State<Arc<AppState>>) -> JsonResult<RankingSummary> {
    let total_lives = LiveRepository::new(state.db_pool).count().await?;
    let standings = LeaderboardRepository::new(state.db_pool).standings().await?;

    let finishers = standings
        .iter()
        .filter(|s| s.level.tier == Level::Finisher)
        .count() as i64;

    Ok(Json(RankingSummary {
        participants: standings.len() as i64,
        finishers,
        total_lives,
    }))
}

#[instrument(skip(state))]
pub async fn lives(State(state): State<Arc<AppState>>) -> JsonResult<Vec<Live>> {
    Ok(Json(LiveRepository::new(state.db_pool).list_ordered().await?))
}

#[derive(Debug, Deserialize)]
pub struct RegisterParticipant {
    pub name: String,
    pub email: String,
}

#[instrument(skip(state, body))]
pub async fn register_participant(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterParticipant>,
) -> JsonResult<Participant> {
    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(RouteError::Validation(String::from("name is required")));
    }
    if !email.contains('@') {
        return Err(RouteError::Validation(String::from(
            "a valid email is required",
        )));
    }

    match ParticipantRepository::new(state.db_pool).create(name, &email).await {
        Ok(participant) => Ok(Json(participant)),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            RouteError::Conflict(format!("'{email}' is already registered")),
        ),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipantProgress {
    pub participant_id: ParticipantId,
    pub name: String,
    pub points: i64,
    pub completed: i64,
    pub pending: i64,
    pub total_lives: i64,
    pub summary: RankSummary,
    pub level: LevelInfo,
    pub badges: Vec<BadgeInfo>,
    pub next_live_id: Option<LiveId>,
    pub check_ins: Vec<CheckIn>,
}

#[instrument(skip(state))]
pub async fn participant_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> JsonResult<ParticipantProgress> {
    let id = ParticipantId::from(id);

    let participant = ParticipantRepository::new(state.db_pool)
        .get_by_id(&id)
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    let lives = LiveRepository::new(state.db_pool).list_ordered().await?;
    let check_ins = CheckInRepository::new(state.db_pool)
        .list_for_participant(&id)
        .await?;
    let adjustments = AdjustmentRepository::new(state.db_pool)
        .list_for_participant(&id)
        .await?;
    let summary = LeaderboardRepository::new(state.db_pool).rank_of(&id).await?;

    let records: Vec<ScoringRecord> = check_ins.iter().map(CheckIn::scoring_record).collect();
    let amounts: Vec<i64> = adjustments.iter().map(|a| a.amount).collect();
    let breakdown = points::score_participant(&records, &amounts);

    let pending = check_ins
        .iter()
        .filter(|c| c.status == CheckInStatus::Pending)
        .count() as i64;

    // first active class without an approved attendance check-in
    let attended: HashSet<&LiveId> = check_ins
        .iter()
        .filter(|c| c.category == Category::Attendance && c.scoring_record().is_scoring())
        .map(|c| &c.live_id)
        .collect();
    let next_live_id = lives
        .iter()
        .find(|l| l.is_active && !attended.contains(&l.id))
        .map(|l| l.id.clone());

    Ok(Json(ParticipantProgress {
        participant_id: participant.id,
        name: participant.name,
        points: breakdown.points,
        completed: breakdown.completed as i64,
        pending,
        total_lives: lives.len() as i64,
        summary,
        level: level::classify(breakdown.completed, lives.len()).info(),
        badges: level::supplementary_badges(breakdown.social_posts)
            .into_iter()
            .map(Badge::info)
            .collect(),
        next_live_id,
        check_ins,
    }))
}

#[instrument(skip(state, body))]
pub async fn submit_checkin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckInSubmission>,
) -> JsonResult<CheckIn> {
    let submission = validate_submission(body)?;

    let live = LiveRepository::new(state.db_pool)
        .get_by_id(&submission.live_id)
        .await?
        .ok_or_else(|| RouteError::NotFound(submission.live_id.to_string()))?;

    if !live.is_active {
        return Err(RouteError::Validation(String::from(
            "this class is not accepting check-ins yet",
        )));
    }

    let repo = CheckInRepository::new(state.db_pool);
    let existing = repo
        .find_submission(&submission.participant_id, &submission.live_id, submission.category)
        .await?;

    if existing.is_some_and(|c| c.status == CheckInStatus::Approved) {
        return Err(RouteError::Conflict(String::from(
            "this check-in is already registered",
        )));
    }

    Ok(Json(repo.upsert_submission(&submission).await?))
}

#[derive(Debug, Deserialize)]
pub struct CheckInEdit {
    pub participant_id: ParticipantId,
    pub insight: Option<String>,
    pub post_url: Option<String>,
}

#[instrument(skip(state, body))]
pub async fn edit_checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CheckInEdit>,
) -> JsonResult<CheckIn> {
    let id = CheckInId::from(id);
    let repo = CheckInRepository::new(state.db_pool);

    let existing = repo
        .get_by_id(&id)
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    if existing.participant_id != body.participant_id {
        return Err(RouteError::Forbidden(String::from(
            "only the owner can edit a check-in",
        )));
    }

    let (insight, post_url) = match existing.category {
        Category::Attendance => {
            let insight = validated_insight(body.insight.as_deref())?;
            (Some(insight), None)
        }
        Category::SocialPost => {
            let url = validated_post_url(body.post_url.as_deref())?;
            (None, Some(url))
        }
    };

    let updated = repo
        .update_content(&id, insight.as_deref(), post_url.as_deref())
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct OwnerParam {
    pub participant_id: ParticipantId,
}

#[instrument(skip(state))]
pub async fn remove_checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerParam>,
) -> JsonResult<serde_json::Value> {
    let id = CheckInId::from(id);
    let repo = CheckInRepository::new(state.db_pool);

    let existing = repo
        .get_by_id(&id)
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    if existing.participant_id != owner.participant_id {
        return Err(RouteError::Forbidden(String::from(
            "only the owner can delete a check-in",
        )));
    }

    if !repo.delete(&id).await? {
        return Err(RouteError::NotFound(id.to_string()));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

fn validate_submission(mut body: CheckInSubmission) -> Result<CheckInSubmission, RouteError> {
    match body.category {
        Category::Attendance => {
            body.insight = Some(validated_insight(body.insight.as_deref())?);
            body.post_url = None;
        }
        Category::SocialPost => {
            body.post_url = Some(validated_post_url(body.post_url.as_deref())?);
            body.insight = body
                .insight
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty());
        }
    }

    Ok(body)
}

fn validated_insight(insight: Option<&str>) -> Result<String, RouteError> {
    let insight = insight.map(str::trim).unwrap_or_default();
    if insight.chars().count() < MIN_INSIGHT_CHARS {
        return Err(RouteError::Validation(format!(
            "the insight must be at least {MIN_INSIGHT_CHARS} characters long"
        )));
    }

    Ok(insight.to_string())
}

fn validated_post_url(url: Option<&str>) -> Result<String, RouteError> {
    let url = url.map(str::trim).unwrap_or_default();
    if !url.starts_with(SOCIAL_POST_URL_PREFIX) || !url.contains("posts/") {
        return Err(RouteError::Validation(String::from(
            "paste the link of a LinkedIn post (it must contain linkedin.com/posts/)",
        )));
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insight_must_carry_some_substance() {
        assert!(validated_insight(None).is_err());
        assert!(validated_insight(Some("   short   ")).is_err());
        assert!(validated_insight(Some("long enough to count")).is_ok());
    }

    #[test]
    fn post_url_must_point_at_a_linkedin_post() {
        assert!(validated_post_url(None).is_err());
        assert!(validated_post_url(Some("https://example.com/posts/abc")).is_err());
        assert!(validated_post_url(Some("https://www.linkedin.com/in/someone")).is_err());
        assert!(
            validated_post_url(Some("https://www.linkedin.com/posts/someone_activity-123")).is_ok()
        );
    }
}
