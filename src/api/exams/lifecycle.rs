use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::exams::helpers;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::schemas::exam::{CompleteSessionQuery, CompletionResponse, ReportResponse};
use crate::services::finalize;

pub(crate) async fn complete_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<CompleteSessionQuery>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;

    // An expired session completes on access; the caller gets that result
    // rather than a second completion attempt.
    let session = helpers::reconcile_expiry(&state, session).await?;
    if session.status == ExamStatus::Completed && session.time_expired {
        let report = repositories::reports::find_by_session(state.db(), &session.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch report"))?
            .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;
        return Ok(Json(completion_response(&session, report)));
    }

    helpers::require_in_progress(&session)?;

    if !query.force {
        let answered = repositories::answers::count_answered(state.db(), &session.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count answers"))?;
        let outstanding = session.questions_count as i64 - answered;
        if outstanding > 0 {
            return Err(ApiError::BadRequest(format!(
                "{outstanding} questions are still unanswered; resubmit with force=true to \
                 complete anyway"
            )));
        }
    }

    let outcome = finalize::finalize_session(&state, &session.id).await.map_err(|err| match err
    {
        finalize::FinalizeError::NotInProgress => {
            ApiError::InvalidState("Session is no longer in progress".to_string())
        }
        other => ApiError::internal(other, "Failed to complete session"),
    })?;

    Ok(Json(completion_response(&outcome.session, outcome.report)))
}

pub(crate) async fn abandon_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;
    helpers::require_in_progress(&session)?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::sessions::acquire_session_lock(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire session lock"))?;

    let session = repositories::sessions::find_by_id(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    helpers::require_in_progress(&session)?;

    repositories::sessions::abandon(&mut *tx, &session.id, helpers::now_primitive())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to abandon session"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("exam_sessions_abandoned_total").increment(1);

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn get_report(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ReportResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;

    let report = repositories::reports::find_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch report"))?
        .ok_or_else(|| {
            ApiError::NotFound("No report exists for this session".to_string())
        })?;

    Ok(Json(report.into()))
}

fn completion_response(
    session: &crate::db::models::ExamSession,
    report: crate::db::models::ExamReport,
) -> CompletionResponse {
    CompletionResponse {
        session_id: session.id.clone(),
        score_percentage: report.score_percentage,
        passed: report.passed,
        domain_breakdown: report.domain_breakdown.0,
        task_breakdown: report.task_breakdown.0,
        time_spent_seconds: session.total_time_seconds.unwrap_or(0),
        time_expired: session.time_expired,
    }
}
