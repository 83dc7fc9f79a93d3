use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::exams::helpers;
use crate::api::guards::CurrentUser;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::schemas::exam::{
    CreateSessionRequest, ListSessionsQuery, ResumeResponse, SessionQuestionResponse,
    SessionResponse,
};
use crate::services::allocator::{self, AllocationError, DomainPool};
use crate::services::blueprint::ExamBlueprint;
use crate::services::performance;

pub(crate) async fn create_session(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let request = payload.map(|Json(inner)| inner).unwrap_or_default();
    let blueprint = ExamBlueprint::from_settings(state.settings().exam());

    // Advisory pre-check outside the transaction for the fast path; the
    // authoritative check happens again under the per-user lock below.
    let existing = repositories::sessions::find_in_progress_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check active sessions"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "An in-progress exam session already exists for this user".to_string(),
        ));
    }

    let window = state.settings().exam().session_create_window_seconds.max(1);
    let rate_key = format!("session-create:{}", user.id);
    let allowed = match state.redis().rate_limit(&rate_key, 1, window).await {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "Failed to check session-create rate limit");
            true
        }
    };
    if !allowed {
        return Err(ApiError::TooManyRequests("Session creation rate limit exceeded"));
    }

    let performance = performance::domain_performance_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to aggregate domain performance"))?;

    let domains = repositories::catalog::list_domains(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch domains"))?;
    if domains.is_empty() {
        return Err(ApiError::InvalidState("Question catalog has no domains".to_string()));
    }

    let mut pools = Vec::with_capacity(domains.len());
    for domain in domains {
        let questions = repositories::catalog::list_questions_by_domain(state.db(), &domain.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch domain questions"))?;
        pools.push(DomainPool { domain, questions });
    }

    let seed = rand::random::<u64>();
    let allocation_seed = i64::from_ne_bytes(seed.to_ne_bytes());
    let mut rng = StdRng::seed_from_u64(seed);

    let selected = allocator::allocate(
        &mut rng,
        blueprint.total_questions,
        &pools,
        &performance,
        request.adaptive_difficulty,
    )
    .map_err(|err| match err {
        AllocationError::DomainShortage { .. } => ApiError::InvalidState(err.to_string()),
        AllocationError::NoDomains => {
            ApiError::InvalidState("Question catalog has no domains".to_string())
        }
    })?;

    let now = helpers::now_primitive();
    let session_id = Uuid::new_v4().to_string();

    let placeholders: Vec<repositories::answers::AnswerPlaceholder<'_>> = selected
        .iter()
        .enumerate()
        .map(|(index, question)| repositories::answers::AnswerPlaceholder {
            id: Uuid::new_v4().to_string(),
            question_id: &question.id,
            question_index: index as i32,
        })
        .collect();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::sessions::acquire_user_lock(&mut *tx, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire session lock"))?;

    let existing = repositories::sessions::find_in_progress_by_user(&mut *tx, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check active sessions"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "An in-progress exam session already exists for this user".to_string(),
        ));
    }

    repositories::sessions::create(
        &mut *tx,
        repositories::sessions::CreateSession {
            id: &session_id,
            user_id: &user.id,
            status: ExamStatus::InProgress,
            started_at: now,
            questions_count: selected.len() as i32,
            adaptive_difficulty: request.adaptive_difficulty,
            duration_minutes: blueprint.duration_minutes as i32,
            allocation_seed,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create session"))?;

    repositories::answers::bulk_create_placeholders(&mut *tx, &session_id, &placeholders, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create answer placeholders"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("exam_sessions_created_total").increment(1);

    let session = repositories::sessions::fetch_one_by_id(state.db(), &session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?;
    let remaining = helpers::remaining_for(&session);

    Ok((StatusCode::CREATED, Json(SessionResponse::from_session(session, remaining))))
}

pub(crate) async fn list_sessions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<PaginatedResponse<SessionResponse>>, ApiError> {
    let sessions = repositories::sessions::list_by_user(
        state.db(),
        &user.id,
        query.status,
        query.skip,
        query.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list sessions"))?;

    let total_count = repositories::sessions::count_by_user(state.db(), &user.id, query.status)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count sessions"))?;

    let items = sessions
        .into_iter()
        .map(|session| {
            let remaining = helpers::remaining_for(&session);
            SessionResponse::from_session(session, remaining)
        })
        .collect();

    Ok(Json(PaginatedResponse { items, total_count, skip: query.skip, limit: query.limit }))
}

pub(crate) async fn get_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;
    let remaining = helpers::remaining_for(&session);
    Ok(Json(SessionResponse::from_session(session, remaining)))
}

pub(crate) async fn get_session_questions(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionQuestionResponse>>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;

    let rows = repositories::answers::list_session_questions(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session questions"))?;

    let reveal = session.status != ExamStatus::InProgress;
    let questions =
        rows.into_iter().map(|row| SessionQuestionResponse::from_row(row, reveal)).collect();

    Ok(Json(questions))
}

pub(crate) async fn resume_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ResumeResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user).await?;
    let session = helpers::reconcile_expiry(&state, session).await?;

    let rows = repositories::answers::list_session_questions(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session questions"))?;

    let reveal = session.status != ExamStatus::InProgress;
    let questions: Vec<SessionQuestionResponse> =
        rows.into_iter().map(|row| SessionQuestionResponse::from_row(row, reveal)).collect();

    // The first question still needing attention: unanswered, or flagged for
    // a revisit. None once everything is settled or the session has ended.
    let current_question = if session.status == ExamStatus::InProgress {
        questions
            .iter()
            .find(|question| question.selected_answer.is_empty() || question.is_flagged)
            .cloned()
    } else {
        None
    };

    let remaining = helpers::remaining_for(&session);
    Ok(Json(ResumeResponse {
        session: SessionResponse::from_session(session, remaining),
        questions,
        current_question,
    }))
}
