use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Extension, Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::middleware::verify_admin::AdminPrincipal;
use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::models::adjustment::NewAdjustment;
use crate::db::models::checkin::AdminCheckIn;
use crate::db::models::live::LiveWithCount;
use crate::db::prelude::*;
use crate::db::repositories::leaderboard::Standing;
use crate::scoring::{Category, CheckInStatus};

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<CheckInStatus>,
}

#[instrument(skip(state))]
pub async fn list_checkins(
    Query(filter): Query<StatusFilter>,
    State(state): State<Arc<AppState>>,
) -> JsonResult<Vec<AdminCheckIn>> {
    let check_ins = CheckInRepository::new(state.db_pool)
        .list_for_review(filter.status)
        .await?;

    Ok(Json(check_ins))
}

#[instrument(skip(state, principal, body))]
pub async fn review_checkin(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    Json(body): Json<ReviewUpdate>,
) -> JsonResult<CheckIn> {
    if body.status.is_none() && body.admin_note.is_none() && body.invalidated.is_none() {
        return Err(RouteError::Validation(String::from(
            "nothing to review: provide a status, a note or an invalidation flag",
        )));
    }

    // a review verdict is a decision, never a return to the queue
    if body.status == Some(CheckInStatus::Pending) {
        return Err(RouteError::Validation(String::from(
            "a review can only approve or reject",
        )));
    }

    let id = CheckInId::from(id);
    let updated = CheckInRepository::new(state.db_pool)
        .apply_review(&id, &body, &principal.name)
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> JsonResult<serde_json::Value> {
    let id = CheckInId::from(id);

    if !CheckInRepository::new(state.db_pool).delete(&id).await? {
        return Err(RouteError::NotFound(id.to_string()));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[instrument(skip(state, body))]
pub async fn create_adjustment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewAdjustment>,
) -> JsonResult<PointAdjustment> {
    let participants = ParticipantRepository::new(state.db_pool);
    if !participants.exists(&body.participant_id).await? {
        return Err(RouteError::NotFound(body.participant_id.to_string()));
    }

    let adjustment = AdjustmentRepository::new(state.db_pool)
        .create(&body.participant_id, body.amount, body.reason.as_deref())
        .await?;

    Ok(Json(adjustment))
}

#[derive(Debug, Serialize)]
pub struct AdminParticipant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    pub is_banned: bool,
    pub created_at: NaiveDateTime,
    pub points: i64,
    pub completed: i64,
    pub rank: i64,
}

/// Roster with engine-derived numbers; totals here match every other
/// surface because they come from the same standings pass.
#[instrument(skip(state))]
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
) -> JsonResult<Vec<AdminParticipant>> {
    let participants = ParticipantRepository::new(state.db_pool)
        .list_contestants()
        .await?;
    let standings = LeaderboardRepository::new(state.db_pool).standings().await?;

    let by_id: HashMap<&ParticipantId, &Standing> =
        standings.iter().map(|s| (&s.id, s)).collect();

    let roster = participants
        .iter()
        .map(|p| {
            let standing = by_id.get(&p.id);
            AdminParticipant {
                id: p.id.clone(),
                name: p.name.clone(),
                email: p.email.clone(),
                is_banned: p.is_banned,
                created_at: p.created_at,
                points: standing.map(|s| s.points).unwrap_or_default(),
                completed: standing.map(|s| s.completed).unwrap_or_default(),
                rank: standing.map(|s| s.rank).unwrap_or_default(),
            }
        })
        .collect();

    Ok(Json(roster))
}

#[derive(Debug, Deserialize)]
pub struct ModerationAction {
    pub action: String,
}

#[instrument(skip(state, body))]
pub async fn moderate_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ModerationAction>,
) -> JsonResult<Participant> {
    let banned = match body.action.as_str() {
        "ban" => true,
        "unban" => false,
        other => {
            return Err(RouteError::Validation(format!(
                "unknown moderation action '{other}'"
            )));
        }
    };

    let id = ParticipantId::from(id);
    let participant = ParticipantRepository::new(state.db_pool)
        .set_banned(&id, banned)
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    Ok(Json(participant))
}

#[instrument(skip(state))]
pub async fn delete_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> JsonResult<serde_json::Value> {
    let id = ParticipantId::from(id);

    if !ParticipantRepository::new(state.db_pool).delete_by_id(&id).await? {
        return Err(RouteError::NotFound(id.to_string()));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[instrument(skip(state))]
pub async fn list_lives(State(state): State<Arc<AppState>>) -> JsonResult<Vec<LiveWithCount>> {
    Ok(Json(LiveRepository::new(state.db_pool).list_with_counts().await?))
}

#[instrument(skip(state, body))]
pub async fn create_live(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewLive>,
) -> JsonResult<Live> {
    if body.title.trim().is_empty() {
        return Err(RouteError::Validation(String::from("title is required")));
    }
    if body.position < 1 {
        return Err(RouteError::Validation(String::from(
            "position must be 1 or greater",
        )));
    }

    match LiveRepository::new(state.db_pool).create(&body).await {
        Ok(live) => Ok(Json(live)),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            RouteError::Conflict(format!("position {} is already taken", body.position)),
        ),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, body))]
pub async fn update_live(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<LiveUpdate>,
) -> JsonResult<Live> {
    let id = LiveId::from(id);
    let live = LiveRepository::new(state.db_pool)
        .update(&id, &body)
        .await?
        .ok_or_else(|| RouteError::NotFound(id.to_string()))?;

    Ok(Json(live))
}

/// Spreadsheet export: one row per contestant, engine total up front, then
/// per class the attendance flag, the insight and the shared post URL.
#[instrument(skip(state))]
pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, RouteError> {
    let lives = LiveRepository::new(state.db_pool).list_ordered().await?;
    let participants = ParticipantRepository::new(state.db_pool)
        .list_contestants()
        .await?;
    let standings = LeaderboardRepository::new(state.db_pool).standings().await?;
    let check_ins = CheckInRepository::new(state.db_pool).list_all(None).await?;

    let mut by_participant: HashMap<&ParticipantId, Vec<&CheckIn>> = HashMap::new();
    for check_in in &check_ins {
        by_participant
            .entry(&check_in.participant_id)
            .or_default()
            .push(check_in);
    }

    let details: HashMap<&ParticipantId, (&str, bool)> = participants
        .iter()
        .map(|p| (&p.id, (p.email.as_str(), p.is_banned)))
        .collect();

    // rows follow the ranking so the sheet reads like the leaderboard
    let csv = build_export(&lives, &standings, &by_participant, &details);

    let today = Utc::now().format("%Y-%m-%d");
    let response = Response::builder()
        .header("Content-Type", "text/csv; charset=utf-8")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"maratona-export-{today}.csv\""),
        )
        .body(Body::from(csv))
        .expect("static export headers are valid");

    Ok(response)
}

fn build_export(
    lives: &[Live],
    standings: &[Standing],
    by_participant: &HashMap<&ParticipantId, Vec<&CheckIn>>,
    details: &HashMap<&ParticipantId, (&str, bool)>,
) -> String {
    let mut header: Vec<String> = ["Name", "Email", "Total Points", "Status"]
        .into_iter()
        .map(String::from)
        .collect();
    for live in lives {
        header.push(format!("Class {} - Done", live.position));
        header.push(format!("Class {} - Insight", live.position));
        header.push(format!("Class {} - Post", live.position));
    }

    let mut rows: Vec<String> = vec![csv_line(&header)];
    for standing in standings {
        let (email, banned) = details
            .get(&standing.id)
            .copied()
            .unwrap_or(("", false));

        let mut row = vec![
            standing.name.clone(),
            email.to_string(),
            standing.points.to_string(),
            String::from(if banned { "Banned" } else { "Active" }),
        ];

        let own = by_participant.get(&standing.id);
        for live in lives {
            let find = |category: Category| {
                own.and_then(|cs| {
                    cs.iter()
                        .find(|c| c.live_id == live.id && c.category == category)
                })
            };

            let attendance = find(Category::Attendance);
            let social = find(Category::SocialPost);

            let done = attendance.is_some_and(|c| c.scoring_record().is_scoring());
            row.push(String::from(if done { "Yes" } else { "No" }));
            row.push(
                attendance
                    .and_then(|c| c.insight.clone())
                    .unwrap_or_default(),
            );
            row.push(social.and_then(|c| c.post_url.clone()).unwrap_or_default());
        }

        rows.push(csv_line(&row));
    }

    // BOM so spreadsheet tools detect UTF-8
    format!("\u{FEFF}{}", rows.join("\r\n"))
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| csv_escape(cell))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_escape(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(csv_escape("plain"), "\"plain\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn lines_quote_every_cell() {
        let line = csv_line(&[String::from("a"), String::from("b,c")]);
        assert_eq!(line, "\"a\",\"b,c\"");
    }
}
