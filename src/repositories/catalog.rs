use sqlx::PgPool;

use crate::db::models::{Domain, Question};

pub(crate) const DOMAIN_COLUMNS: &str = "id, name, weight, display_order";
pub(crate) const QUESTION_COLUMNS: &str = "\
    id, task_id, text, option_a, option_b, option_c, option_d, \
    correct_answer, explanation, difficulty";

pub(crate) async fn list_domains(pool: &PgPool) -> Result<Vec<Domain>, sqlx::Error> {
    sqlx::query_as::<_, Domain>(&format!(
        "SELECT {DOMAIN_COLUMNS} FROM domains ORDER BY display_order, name"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_question(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_questions_by_domain(
    pool: &PgPool,
    domain_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT q.id, q.task_id, q.text, q.option_a, q.option_b, q.option_c, q.option_d, \
                q.correct_answer, q.explanation, q.difficulty \
         FROM questions q \
         JOIN tasks t ON t.id = q.task_id \
         WHERE t.domain_id = $1 \
         ORDER BY q.id",
    )
    .bind(domain_id)
    .fetch_all(pool)
    .await
}
