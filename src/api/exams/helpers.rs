use crate::api::errors::ApiError;
use crate::core::state::AppState;
pub(crate) use crate::core::time::primitive_now_utc as now_primitive;
use crate::db::models::{ExamSession, User};
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::services::{exam_timing, finalize};

/// Resolves a session and enforces ownership. A session that exists but
/// belongs to someone else is Forbidden, distinct from NotFound.
pub(crate) async fn fetch_owned_session(
    state: &AppState,
    session_id: &str,
    user: &User,
) -> Result<ExamSession, ApiError> {
    let session = repositories::sessions::find_by_id(state.db(), session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    if session.user_id != user.id {
        return Err(ApiError::Forbidden("Access denied"));
    }

    Ok(session)
}

/// Any access to an in-progress session whose clock has run out completes it
/// on the spot, report included, so sessions never linger in_progress forever.
/// Returns the (possibly replaced) session.
pub(crate) async fn reconcile_expiry(
    state: &AppState,
    session: ExamSession,
) -> Result<ExamSession, ApiError> {
    if session.status != ExamStatus::InProgress {
        return Ok(session);
    }

    let now = now_primitive();
    if !exam_timing::is_expired(session.started_at, session.duration_minutes, now) {
        return Ok(session);
    }

    tracing::info!(session_id = %session.id, "session deadline passed; auto-completing");
    match finalize::finalize_session(state, &session.id).await {
        Ok(outcome) => Ok(outcome.session),
        // A concurrent request may have completed it first; re-read.
        Err(finalize::FinalizeError::NotInProgress) => {
            repositories::sessions::fetch_one_by_id(state.db(), &session.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch session"))
        }
        Err(err) => Err(ApiError::internal(err, "Failed to auto-complete expired session")),
    }
}

pub(crate) fn remaining_for(session: &ExamSession) -> i64 {
    if session.status != ExamStatus::InProgress {
        return 0;
    }
    exam_timing::remaining_seconds(session.started_at, session.duration_minutes, now_primitive())
}

pub(crate) fn require_in_progress(session: &ExamSession) -> Result<(), ApiError> {
    if session.status != ExamStatus::InProgress {
        return Err(ApiError::InvalidState(format!(
            "Session is {}; only in-progress sessions can be modified",
            status_label(session.status)
        )));
    }
    Ok(())
}

pub(crate) fn status_label(status: ExamStatus) -> &'static str {
    match status {
        ExamStatus::InProgress => "in_progress",
        ExamStatus::Completed => "completed",
        ExamStatus::Abandoned => "abandoned",
    }
}
