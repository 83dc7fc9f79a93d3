use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exams::helpers;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::schemas::exam::{AnswerResponse, SubmitAnswerRequest};
use crate::services::coach;
use crate::services::exam_timing;

pub(crate) async fn submit_answer(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    payload.validate().map_err(|err| ApiError::BadRequest(err.to_string()))?;
    if !crate::schemas::exam::is_valid_answer_choice(&payload.selected_answer) {
        return Err(ApiError::BadRequest(
            "selected_answer must be one of A, B, C, D or empty".to_string(),
        ));
    }

    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;

    if session.status == ExamStatus::InProgress {
        let now = helpers::now_primitive();
        if exam_timing::is_expired(session.started_at, session.duration_minutes, now) {
            // Auto-complete first so the candidate finds a finished exam with
            // a report, then reject this submission distinctly.
            helpers::reconcile_expiry(&state, session).await?;
            return Err(ApiError::Expired(
                "Exam time has expired; the session was completed automatically".to_string(),
            ));
        }
    }
    helpers::require_in_progress(&session)?;

    let selected_answer = payload.selected_answer.to_ascii_uppercase();

    let question = repositories::catalog::find_question(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let is_correct = !selected_answer.is_empty()
        && selected_answer == question.correct_answer.to_ascii_uppercase();

    let now = helpers::now_primitive();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::sessions::acquire_session_lock(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire session lock"))?;

    // Status may have flipped while waiting on the lock.
    let session = repositories::sessions::find_by_id(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    helpers::require_in_progress(&session)?;

    let existing = repositories::answers::find_by_session_and_question(
        &mut *tx,
        &session.id,
        &payload.question_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch answer"))?;

    // A revisit is a resubmission of a question that already carried an answer.
    let (answer_id, question_index, is_revisit) = match &existing {
        Some(answer) => (answer.id.clone(), answer.question_index, answer.is_answered()),
        None => {
            // Should not happen under correct allocation; keep the submission
            // rather than losing the candidate's work.
            tracing::warn!(
                session_id = %session.id,
                question_id = %payload.question_id,
                "answer row missing for allocated session; creating one"
            );
            let index = session.questions_count;
            let placeholder = repositories::answers::AnswerPlaceholder {
                id: Uuid::new_v4().to_string(),
                question_id: &payload.question_id,
                question_index: index,
            };
            repositories::answers::bulk_create_placeholders(
                &mut *tx,
                &session.id,
                std::slice::from_ref(&placeholder),
                now,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create answer row"))?;
            (placeholder.id, index, false)
        }
    };

    repositories::answers::update_submission(
        &mut *tx,
        repositories::answers::UpdateSubmission {
            id: &answer_id,
            selected_answer: &selected_answer,
            is_correct,
            time_spent_seconds: payload.time_spent_seconds,
            is_flagged: payload.is_flagged,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update answer"))?;

    let answered_count = repositories::answers::count_answered(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count answers"))? as i32;

    repositories::sessions::update_progress(&mut *tx, &session.id, answered_count, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update session progress"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    // Coaching is an enhancement; its failures never surface to the candidate.
    let event = coach::AnswerEvent {
        question_index,
        time_spent_seconds: payload.time_spent_seconds,
        is_flagged: payload.is_flagged,
        is_revisit,
        is_skip: selected_answer.is_empty(),
        answered_count,
        questions_count: session.questions_count,
        remaining_seconds: helpers::remaining_for(&session),
    };
    if let Err(err) = coach::record_answer_event(&state, &session, &event).await {
        tracing::warn!(
            session_id = %session.id,
            error = %err,
            "behavior coach failed to process answer event"
        );
    }

    Ok(Json(AnswerResponse {
        question_id: payload.question_id,
        question_index,
        selected_answer,
        is_correct,
        time_spent_seconds: payload.time_spent_seconds,
        is_flagged: payload.is_flagged,
        is_revisit,
        answered_count,
    }))
}
