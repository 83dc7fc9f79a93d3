use sqlx::PgPool;

use crate::db::models::QuestionAttempt;
use crate::repositories::answers::DomainOutcomeRow;

pub(crate) const COLUMNS: &str =
    "id, user_id, question_id, selected_answer, is_correct, time_spent_seconds, created_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_answer: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    attempt: CreateAttempt<'_>,
) -> Result<QuestionAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuestionAttempt>(&format!(
        "INSERT INTO question_attempts (
            id, user_id, question_id, selected_answer, is_correct, time_spent_seconds, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING {COLUMNS}"
    ))
    .bind(attempt.id)
    .bind(attempt.user_id)
    .bind(attempt.question_id)
    .bind(attempt.selected_answer)
    .bind(attempt.is_correct)
    .bind(attempt.time_spent_seconds)
    .bind(attempt.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_outcomes_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<DomainOutcomeRow>, sqlx::Error> {
    sqlx::query_as::<_, DomainOutcomeRow>(
        "SELECT d.name AS domain_name, p.is_correct, p.time_spent_seconds \
         FROM question_attempts p \
         JOIN questions q ON q.id = p.question_id \
         JOIN tasks t ON t.id = q.task_id \
         JOIN domains d ON d.id = t.domain_id \
         WHERE p.user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
