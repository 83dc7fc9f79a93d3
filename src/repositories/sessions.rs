use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::ExamSession;
use crate::db::types::ExamStatus;

pub(crate) const COLUMNS: &str = "\
    id, user_id, status, started_at, ended_at, total_time_seconds, \
    questions_count, correct_count, current_question_index, time_expired, \
    adaptive_difficulty, duration_minutes, allocation_seed, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) status: ExamStatus,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) questions_count: i32,
    pub(crate) adaptive_difficulty: bool,
    pub(crate) duration_minutes: i32,
    pub(crate) allocation_seed: i64,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// Serializes session creation per user inside the surrounding transaction.
pub(crate) async fn acquire_user_lock(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('exam_session_create'), hashtext($1))")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Serializes all mutations of a single session inside the surrounding transaction.
pub(crate) async fn acquire_session_lock(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('exam_session'), hashtext($1))")
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<ExamSession, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_in_progress_by_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE user_id = $1 AND status = $2"
    ))
    .bind(user_id)
    .bind(ExamStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
    status: Option<ExamStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE user_id = "
    ));
    builder.push_bind(user_id);

    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<ExamSession>().fetch_all(pool).await
}

pub(crate) async fn count_by_user(
    pool: &PgPool,
    user_id: &str,
    status: Option<ExamStatus>,
) -> Result<i64, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exam_sessions WHERE user_id = ");
    builder.push_bind(user_id);

    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_sessions (
            id, user_id, status, started_at, questions_count,
            adaptive_difficulty, duration_minutes, allocation_seed, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
    )
    .bind(session.id)
    .bind(session.user_id)
    .bind(session.status)
    .bind(session.started_at)
    .bind(session.questions_count)
    .bind(session.adaptive_difficulty)
    .bind(session.duration_minutes)
    .bind(session.allocation_seed)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn update_progress(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    current_question_index: i32,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions SET current_question_index = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(current_question_index)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct FinalizeSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) ended_at: time::PrimitiveDateTime,
    pub(crate) total_time_seconds: i32,
    pub(crate) correct_count: i32,
    pub(crate) current_question_index: i32,
    pub(crate) time_expired: bool,
}

pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    params: FinalizeSession<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions SET status = $1, ended_at = $2, total_time_seconds = $3, \
         correct_count = $4, current_question_index = $5, time_expired = $6, updated_at = $2 \
         WHERE id = $7",
    )
    .bind(ExamStatus::Completed)
    .bind(params.ended_at)
    .bind(params.total_time_seconds)
    .bind(params.correct_count)
    .bind(params.current_question_index)
    .bind(params.time_expired)
    .bind(params.id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn abandon(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    ended_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions SET status = $1, ended_at = $2, updated_at = $2 WHERE id = $3",
    )
    .bind(ExamStatus::Abandoned)
    .bind(ended_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
