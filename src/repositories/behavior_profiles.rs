use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::{ExamBehaviorProfile, PatternEpisode};
use crate::db::types::BehaviorPattern;

pub(crate) const COLUMNS: &str = "\
    id, session_id, user_id, current_pattern, pattern_history, coaching_history, \
    recent_selections, total_answers, timed_answers, answers_in_target_band, \
    total_time_seconds, avg_time_seconds, fastest_answer_seconds, slowest_answer_seconds, \
    total_flags, consecutive_flags, max_consecutive_flags, question_revisits, \
    questions_skipped, rapid_answer_count, long_pause_count, consecutive_rapid, \
    revisit_alert_sent, panic_alert_sent, halfway_alert_sent, halfway_time_remaining, \
    halfway_questions_completed, pace_trajectory, engagement_score, focus_score, \
    created_at, updated_at";

pub(crate) async fn find_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<ExamBehaviorProfile>, sqlx::Error> {
    sqlx::query_as::<_, ExamBehaviorProfile>(&format!(
        "SELECT {COLUMNS} FROM exam_behavior_profiles WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await
}

/// Inserts the lazily-created profile; a concurrent insert for the same
/// session loses to the unique constraint and re-reads instead.
pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    session_id: &str,
    user_id: &str,
    pattern_history: Json<Vec<PatternEpisode>>,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_behavior_profiles (
            id, session_id, user_id, current_pattern, pattern_history, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$6)
        ON CONFLICT (session_id) DO NOTHING",
    )
    .bind(id)
    .bind(session_id)
    .bind(user_id)
    .bind(BehaviorPattern::Normal)
    .bind(pattern_history)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) struct UpdateProfile<'a> {
    pub(crate) profile: &'a ExamBehaviorProfile,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    params: UpdateProfile<'_>,
) -> Result<(), sqlx::Error> {
    let profile = params.profile;
    sqlx::query(
        "UPDATE exam_behavior_profiles SET \
            current_pattern = $1, pattern_history = $2, coaching_history = $3, \
            recent_selections = $4, total_answers = $5, timed_answers = $6, \
            answers_in_target_band = $7, total_time_seconds = $8, avg_time_seconds = $9, \
            fastest_answer_seconds = $10, slowest_answer_seconds = $11, total_flags = $12, \
            consecutive_flags = $13, max_consecutive_flags = $14, question_revisits = $15, \
            questions_skipped = $16, rapid_answer_count = $17, long_pause_count = $18, \
            consecutive_rapid = $19, revisit_alert_sent = $20, panic_alert_sent = $21, \
            halfway_alert_sent = $22, halfway_time_remaining = $23, \
            halfway_questions_completed = $24, pace_trajectory = $25, engagement_score = $26, \
            focus_score = $27, updated_at = $28 \
         WHERE id = $29",
    )
    .bind(profile.current_pattern)
    .bind(&profile.pattern_history)
    .bind(&profile.coaching_history)
    .bind(&profile.recent_selections)
    .bind(profile.total_answers)
    .bind(profile.timed_answers)
    .bind(profile.answers_in_target_band)
    .bind(profile.total_time_seconds)
    .bind(profile.avg_time_seconds)
    .bind(profile.fastest_answer_seconds)
    .bind(profile.slowest_answer_seconds)
    .bind(profile.total_flags)
    .bind(profile.consecutive_flags)
    .bind(profile.max_consecutive_flags)
    .bind(profile.question_revisits)
    .bind(profile.questions_skipped)
    .bind(profile.rapid_answer_count)
    .bind(profile.long_pause_count)
    .bind(profile.consecutive_rapid)
    .bind(profile.revisit_alert_sent)
    .bind(profile.panic_alert_sent)
    .bind(profile.halfway_alert_sent)
    .bind(profile.halfway_time_remaining)
    .bind(profile.halfway_questions_completed)
    .bind(profile.pace_trajectory)
    .bind(profile.engagement_score)
    .bind(profile.focus_score)
    .bind(params.updated_at)
    .bind(&profile.id)
    .execute(pool)
    .await?;
    Ok(())
}
