use crate::db::models::ExamReport;

pub(crate) const COLUMNS: &str = "\
    id, session_id, score_percentage, passed, domain_breakdown, task_breakdown, \
    recommendations, strengths, weaknesses, created_at";

pub(crate) struct CreateReport<'a> {
    pub(crate) id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) score_percentage: f64,
    pub(crate) passed: bool,
    pub(crate) domain_breakdown: serde_json::Value,
    pub(crate) task_breakdown: serde_json::Value,
    pub(crate) recommendations: serde_json::Value,
    pub(crate) strengths: serde_json::Value,
    pub(crate) weaknesses: serde_json::Value,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    report: CreateReport<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_reports (
            id, session_id, score_percentage, passed, domain_breakdown, task_breakdown,
            recommendations, strengths, weaknesses, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
    )
    .bind(report.id)
    .bind(report.session_id)
    .bind(report.score_percentage)
    .bind(report.passed)
    .bind(report.domain_breakdown)
    .bind(report.task_breakdown)
    .bind(report.recommendations)
    .bind(report.strengths)
    .bind(report.weaknesses)
    .bind(report.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Option<ExamReport>, sqlx::Error> {
    sqlx::query_as::<_, ExamReport>(&format!(
        "SELECT {COLUMNS} FROM exam_reports WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_optional(executor)
    .await
}
