use thiserror::Error;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{ExamReport, ExamSession};
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::services::blueprint::ExamBlueprint;
use crate::services::{exam_timing, reporting};

#[derive(Debug, Error)]
pub(crate) enum FinalizeError {
    #[error("session is not in progress")]
    NotInProgress,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("failed to serialize report content: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub(crate) struct CompletionOutcome {
    pub(crate) session: ExamSession,
    pub(crate) report: ExamReport,
}

/// Completes an in-progress session: scores it, generates and persists the
/// report, and flips the session terminal — all in one transaction, so the
/// counters can never disagree with the stored answers.
pub(crate) async fn finalize_session(
    state: &AppState,
    session_id: &str,
) -> Result<CompletionOutcome, FinalizeError> {
    let blueprint = ExamBlueprint::from_settings(state.settings().exam());
    let now = primitive_now_utc();

    let mut tx = state.db().begin().await?;

    repositories::sessions::acquire_session_lock(&mut *tx, session_id).await?;

    let session = repositories::sessions::find_by_id(&mut *tx, session_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    if session.status != ExamStatus::InProgress {
        return Err(FinalizeError::NotInProgress);
    }

    let rows = repositories::answers::list_session_questions(&mut *tx, session_id).await?;

    let correct_count = rows.iter().filter(|row| row.is_correct).count() as i32;
    let answered_count = rows.iter().filter(|row| !row.selected_answer.is_empty()).count() as i32;
    let time_expired =
        exam_timing::is_expired(session.started_at, session.duration_minutes, now);
    let total_time_seconds =
        exam_timing::elapsed_seconds(session.started_at, now).min(i32::MAX as i64) as i32;

    let content = reporting::build_report(
        &blueprint,
        reporting::ReportInput {
            rows: &rows,
            questions_count: session.questions_count,
            time_expired,
        },
    );

    repositories::sessions::finalize(
        &mut *tx,
        repositories::sessions::FinalizeSession {
            id: session_id,
            ended_at: now,
            total_time_seconds,
            correct_count,
            current_question_index: answered_count,
            time_expired,
        },
    )
    .await?;

    let report_id = Uuid::new_v4().to_string();
    repositories::reports::create(
        &mut *tx,
        repositories::reports::CreateReport {
            id: &report_id,
            session_id,
            score_percentage: content.score_percentage,
            passed: content.passed,
            domain_breakdown: serde_json::to_value(&content.domain_breakdown)?,
            task_breakdown: serde_json::to_value(&content.task_breakdown)?,
            recommendations: serde_json::to_value(&content.recommendations)?,
            strengths: serde_json::to_value(&content.strengths)?,
            weaknesses: serde_json::to_value(&content.weaknesses)?,
            created_at: now,
        },
    )
    .await?;

    tx.commit().await?;

    metrics::counter!("exam_sessions_completed_total").increment(1);
    if time_expired {
        metrics::counter!("exam_sessions_expired_total").increment(1);
    }

    let session = repositories::sessions::fetch_one_by_id(state.db(), session_id).await?;
    let report = repositories::reports::find_by_session(state.db(), session_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    Ok(CompletionOutcome { session, report })
}
