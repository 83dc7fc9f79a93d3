pub(crate) mod answers;
pub(crate) mod helpers;
pub(crate) mod lifecycle;
pub(crate) mod session;

#[cfg(test)]
mod tests;

use axum::routing::{get, post};
use axum::Router;

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(session::create_session).get(session::list_sessions))
        .route("/sessions/:session_id", get(session::get_session))
        .route("/sessions/:session_id/questions", get(session::get_session_questions))
        .route("/sessions/:session_id/resume", get(session::resume_session))
        .route("/sessions/:session_id/answers", post(answers::submit_answer))
        .route("/sessions/:session_id/complete", post(lifecycle::complete_session))
        .route("/sessions/:session_id/abandon", post(lifecycle::abandon_session))
        .route("/sessions/:session_id/report", get(lifecycle::get_report))
}
