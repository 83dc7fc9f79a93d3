use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::exams::helpers;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::BehaviorPattern;
use crate::repositories;
use crate::schemas::coach::{BehaviorSummaryResponse, CoachMetricsResponse, TapeEventResponse};
use crate::services::blueprint::ExamBlueprint;
use crate::services::coach::{engine, tape};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/:session_id/coach/metrics", get(get_metrics))
        .route("/sessions/:session_id/coach/summary", get(get_summary))
        .route("/sessions/:session_id/coach/game-tape", get(get_game_tape))
}

async fn get_metrics(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CoachMetricsResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;

    let profile = repositories::behavior_profiles::find_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch behavior profile"))?;

    let blueprint = ExamBlueprint::from_settings(state.settings().exam());
    let time_remaining = helpers::remaining_for(&session);
    let remaining_questions = session.questions_count - session.current_question_index;
    let pace = engine::pace_trajectory(
        time_remaining,
        remaining_questions,
        blueprint.target_seconds_per_question(),
    );

    // Before the first answer event there is no profile yet; report neutral
    // scores rather than 404 so clients can poll from question one.
    let response = match profile {
        Some(profile) => CoachMetricsResponse {
            pattern: profile.current_pattern,
            engagement_score: profile.engagement_score,
            focus_score: profile.focus_score,
            pace_trajectory: pace,
            time_remaining_seconds: time_remaining,
            questions_completed: session.current_question_index,
            avg_time_seconds: profile.avg_time_seconds,
        },
        None => CoachMetricsResponse {
            pattern: BehaviorPattern::Normal,
            engagement_score: 100.0,
            focus_score: 100.0,
            pace_trajectory: pace,
            time_remaining_seconds: time_remaining,
            questions_completed: session.current_question_index,
            avg_time_seconds: 0.0,
        },
    };

    Ok(Json(response))
}

async fn get_summary(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<BehaviorSummaryResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;

    let profile = repositories::behavior_profiles::find_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch behavior profile"))?
        .ok_or_else(|| {
            ApiError::NotFound("No behavior profile exists for this session yet".to_string())
        })?;

    Ok(Json(profile.into()))
}

async fn get_game_tape(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TapeEventResponse>>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;

    let answers = repositories::answers::list_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    let coaching_history = repositories::behavior_profiles::find_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch behavior profile"))?
        .map(|profile| profile.coaching_history.0)
        .unwrap_or_default();

    let events = tape::build_game_tape(&answers, &coaching_history)
        .into_iter()
        .map(TapeEventResponse::from)
        .collect();

    Ok(Json(events))
}
