pub(crate) mod engine;
pub(crate) mod tape;

use anyhow::{Context, Result};
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{ExamBehaviorProfile, ExamSession};
use crate::repositories;
use crate::services::blueprint::ExamBlueprint;

pub(crate) use engine::AnswerEvent;

/// The profile is created lazily on the first answer event of a session.
pub(crate) async fn load_or_create_profile(
    state: &AppState,
    session: &ExamSession,
) -> Result<ExamBehaviorProfile> {
    if let Some(profile) =
        repositories::behavior_profiles::find_by_session(state.db(), &session.id)
            .await
            .context("Failed to fetch behavior profile")?
    {
        return Ok(profile);
    }

    let now = primitive_now_utc();
    repositories::behavior_profiles::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &session.id,
        &session.user_id,
        Json(engine::initial_history(now)),
        now,
    )
    .await
    .context("Failed to create behavior profile")?;

    repositories::behavior_profiles::find_by_session(state.db(), &session.id)
        .await
        .context("Failed to fetch behavior profile")?
        .context("Behavior profile missing after creation")
}

/// Runs the state machine for one submitted answer and persists the result.
/// Callers treat any error here as a logged non-event: coaching must never
/// fail an answer submission.
pub(crate) async fn record_answer_event(
    state: &AppState,
    session: &ExamSession,
    event: &AnswerEvent,
) -> Result<()> {
    let blueprint = ExamBlueprint::from_settings(state.settings().exam());
    let mut profile = load_or_create_profile(state, session).await?;

    let now = primitive_now_utc();
    let alerts = engine::apply_event(&mut profile, &blueprint, event, now);
    if !alerts.is_empty() {
        tracing::debug!(
            session_id = %session.id,
            alerts = alerts.len(),
            pattern = ?profile.current_pattern,
            "coaching alerts emitted"
        );
    }

    repositories::behavior_profiles::update(
        state.db(),
        repositories::behavior_profiles::UpdateProfile { profile: &profile, updated_at: now },
    )
    .await
    .context("Failed to persist behavior profile")?;

    metrics::counter!("coach_answer_events_total").increment(1);

    Ok(())
}
