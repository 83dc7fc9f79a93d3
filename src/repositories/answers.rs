use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::db::models::ExamAnswer;
use crate::db::types::{DifficultyLevel, ExamStatus};

pub(crate) const COLUMNS: &str = "\
    id, session_id, question_id, question_index, selected_answer, is_correct, \
    time_spent_seconds, is_flagged, created_at, updated_at";

pub(crate) struct AnswerPlaceholder<'a> {
    pub(crate) id: String,
    pub(crate) question_id: &'a str,
    pub(crate) question_index: i32,
}

/// Pre-creates one empty answer row per allocated question.
pub(crate) async fn bulk_create_placeholders(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    placeholders: &[AnswerPlaceholder<'_>],
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    if placeholders.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO exam_answers (
            id, session_id, question_id, question_index, selected_answer,
            is_correct, time_spent_seconds, is_flagged, created_at, updated_at
        ) ",
    );
    builder.push_values(placeholders, |mut row, placeholder| {
        row.push_bind(&placeholder.id)
            .push_bind(session_id)
            .push_bind(placeholder.question_id)
            .push_bind(placeholder.question_index)
            .push_bind("")
            .push_bind(false)
            .push_bind(0_i32)
            .push_bind(false)
            .push_bind(now)
            .push_bind(now);
    });
    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) async fn find_by_session_and_question(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    question_id: &str,
) -> Result<Option<ExamAnswer>, sqlx::Error> {
    sqlx::query_as::<_, ExamAnswer>(&format!(
        "SELECT {COLUMNS} FROM exam_answers WHERE session_id = $1 AND question_id = $2"
    ))
    .bind(session_id)
    .bind(question_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<ExamAnswer>, sqlx::Error> {
    sqlx::query_as::<_, ExamAnswer>(&format!(
        "SELECT {COLUMNS} FROM exam_answers WHERE session_id = $1 ORDER BY question_index"
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct UpdateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) selected_answer: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) is_flagged: bool,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update_submission(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpdateSubmission<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_answers SET selected_answer = $1, is_correct = $2, \
         time_spent_seconds = $3, is_flagged = $4, updated_at = $5 WHERE id = $6",
    )
    .bind(params.selected_answer)
    .bind(params.is_correct)
    .bind(params.time_spent_seconds)
    .bind(params.is_flagged)
    .bind(params.updated_at)
    .bind(params.id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn count_answered(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM exam_answers WHERE session_id = $1 AND selected_answer <> ''",
    )
    .bind(session_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn count_correct(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_answers WHERE session_id = $1 AND is_correct")
        .bind(session_id)
        .fetch_one(executor)
        .await
}

/// Answer row joined with its question's catalog position, ordered as presented.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SessionQuestionRow {
    pub(crate) question_index: i32,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) correct_answer: String,
    pub(crate) explanation: String,
    pub(crate) difficulty: Option<DifficultyLevel>,
    pub(crate) selected_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) is_flagged: bool,
    pub(crate) task_id: String,
    pub(crate) task_name: String,
    pub(crate) domain_name: String,
    pub(crate) domain_weight: f64,
    pub(crate) answered_at: time::PrimitiveDateTime,
}

pub(crate) async fn list_session_questions(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<SessionQuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionQuestionRow>(
        "SELECT a.question_index, a.question_id, q.text, q.option_a, q.option_b, q.option_c, \
                q.option_d, q.correct_answer, q.explanation, q.difficulty, a.selected_answer, \
                a.is_correct, a.time_spent_seconds, a.is_flagged, t.id AS task_id, \
                t.name AS task_name, d.name AS domain_name, d.weight AS domain_weight, \
                a.updated_at AS answered_at \
         FROM exam_answers a \
         JOIN questions q ON q.id = a.question_id \
         JOIN tasks t ON t.id = q.task_id \
         JOIN domains d ON d.id = t.domain_id \
         WHERE a.session_id = $1 \
         ORDER BY a.question_index",
    )
    .bind(session_id)
    .fetch_all(executor)
    .await
}

/// Per-domain accuracy rows from the user's completed exams; unanswered
/// placeholders are excluded so they do not count as attempts.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct DomainOutcomeRow {
    pub(crate) domain_name: String,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
}

pub(crate) async fn list_exam_outcomes_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<DomainOutcomeRow>, sqlx::Error> {
    sqlx::query_as::<_, DomainOutcomeRow>(
        "SELECT d.name AS domain_name, a.is_correct, a.time_spent_seconds \
         FROM exam_answers a \
         JOIN exam_sessions s ON s.id = a.session_id \
         JOIN questions q ON q.id = a.question_id \
         JOIN tasks t ON t.id = q.task_id \
         JOIN domains d ON d.id = t.domain_id \
         WHERE s.user_id = $1 AND s.status = $2 AND a.selected_answer <> ''",
    )
    .bind(user_id)
    .bind(ExamStatus::Completed)
    .fetch_all(pool)
    .await
}
