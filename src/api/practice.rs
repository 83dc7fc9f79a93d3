use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::practice::{PracticeAnswerRequest, PracticeAnswerResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/answers", post(submit_practice_answer))
}

/// Grades one standalone practice question and records the attempt; these
/// attempts feed the per-domain accuracy used by adaptive exam allocation.
async fn submit_practice_answer(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<PracticeAnswerRequest>,
) -> Result<(StatusCode, Json<PracticeAnswerResponse>), ApiError> {
    payload.validate().map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let selected_answer = payload.selected_answer.to_ascii_uppercase();
    if !matches!(selected_answer.as_str(), "A" | "B" | "C" | "D") {
        return Err(ApiError::BadRequest(
            "selected_answer must be one of A, B, C, D".to_string(),
        ));
    }

    let question = repositories::catalog::find_question(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let is_correct = selected_answer == question.correct_answer.to_ascii_uppercase();

    repositories::attempts::create(
        state.db(),
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            question_id: &question.id,
            selected_answer: &selected_answer,
            is_correct,
            time_spent_seconds: payload.time_spent_seconds,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record attempt"))?;

    metrics::counter!("practice_answers_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(PracticeAnswerResponse {
            question_id: question.id,
            selected_answer,
            is_correct,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
        }),
    ))
}
