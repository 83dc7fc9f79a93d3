use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

async fn create_session_for(
    ctx: &test_support::TestContext,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams/sessions",
            Some(token),
            Some(json!({"adaptive_difficulty": true})),
        ))
        .await
        .expect("create session");
    let status = response.status();
    let body = test_support::read_json(response).await;
    (status, body)
}

async fn submit_answer(
    ctx: &test_support::TestContext,
    token: &str,
    session_id: &str,
    question_id: &str,
    selected: &str,
    seconds: i64,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/sessions/{session_id}/answers"),
            Some(token),
            Some(json!({
                "question_id": question_id,
                "selected_answer": selected,
                "time_spent_seconds": seconds,
                "is_flagged": false
            })),
        ))
        .await
        .expect("submit answer");
    let status = response.status();
    let body = test_support::read_json(response).await;
    (status, body)
}

async fn session_questions(
    ctx: &test_support::TestContext,
    token: &str,
    session_id: &str,
) -> Vec<serde_json::Value> {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/questions"),
            Some(token),
            None,
        ))
        .await
        .expect("session questions");
    assert_eq!(response.status(), StatusCode::OK);
    test_support::read_json(response).await.as_array().expect("question list").clone()
}

#[tokio::test]
async fn session_lifecycle_end_to_end() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let user =
        test_support::insert_user(ctx.state.db(), "candidate@example.com", "Candidate", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (status, created) = create_session_for(&ctx, &token).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["questions_count"], 185);
    assert_eq!(created["status"], "in_progress");
    assert_eq!(created["current_question_index"], 0);
    let session_id = created["id"].as_str().expect("session id").to_string();

    let questions = session_questions(&ctx, &token, &session_id).await;
    assert_eq!(questions.len(), 185);
    assert!(questions.iter().all(|q| q["selected_answer"] == "" && q["is_correct"] == false));
    // Mid-exam the key is withheld.
    assert!(questions.iter().all(|q| q["correct_answer"].is_null()));

    // Static weights on a blank history: 61 / 76 / 48.
    let count_domain = |name: &str| questions.iter().filter(|q| q["domain_name"] == name).count();
    assert_eq!(count_domain("People"), 61);
    assert_eq!(count_domain("Process"), 76);
    assert_eq!(count_domain("Business Environment"), 48);

    for question in &questions {
        let question_id = question["question_id"].as_str().expect("question id");
        let (status, body) =
            submit_answer(&ctx, &token, &session_id, question_id, "a", 70).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["is_correct"], true);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/sessions/{session_id}/complete"),
            Some(&token),
            None,
        ))
        .await
        .expect("complete session");
    let status = response.status();
    let completed = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {completed}");
    assert_eq!(completed["score_percentage"], 100.0);
    assert_eq!(completed["passed"], true);
    assert_eq!(completed["time_expired"], false);
    assert_eq!(completed["domain_breakdown"]["People"]["total"], 61);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/report"),
            Some(&token),
            None,
        ))
        .await
        .expect("get report");
    let status = response.status();
    let report = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {report}");
    assert_eq!(report["passed"], true);
    assert!(!report["recommendations"].as_array().unwrap().is_empty());
    assert!(report["strengths"]
        .as_array()
        .unwrap()
        .iter()
        .any(|entry| entry.as_str().unwrap().contains("People")));

    // Completed sessions reveal the key.
    let questions = session_questions(&ctx, &token, &session_id).await;
    assert!(questions.iter().all(|q| q["correct_answer"] == "A"));

    // The coach followed along.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/coach/summary"),
            Some(&token),
            None,
        ))
        .await
        .expect("coach summary");
    let status = response.status();
    let summary = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {summary}");
    assert_eq!(summary["total_answers"], 185);
    assert_eq!(summary["current_pattern"], "normal");
}

#[tokio::test]
async fn creating_a_second_session_conflicts() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let user =
        test_support::insert_user(ctx.state.db(), "busy@example.com", "Busy User", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (status, body) = create_session_for(&ctx, &token).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");

    let (status, body) = create_session_for(&ctx, &token).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
}

#[tokio::test]
async fn allocation_shortage_rejects_creation_without_partial_writes() {
    let ctx = test_support::setup_test_context().await;
    // Far too few questions for a 185-question exam.
    test_support::seed_pmp_catalog(ctx.state.db(), 10).await;

    let user =
        test_support::insert_user(ctx.state.db(), "short@example.com", "Short Pool", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (status, body) = create_session_for(&ctx, &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "response: {body}");

    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions")
        .fetch_one(ctx.state.db())
        .await
        .expect("count sessions");
    assert_eq!(sessions, 0);
    let answers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_answers")
        .fetch_one(ctx.state.db())
        .await
        .expect("count answers");
    assert_eq!(answers, 0);
}

#[tokio::test]
async fn foreign_sessions_are_forbidden_not_missing() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let owner =
        test_support::insert_user(ctx.state.db(), "owner@example.com", "Owner", "pw-secret").await;
    let outsider =
        test_support::insert_user(ctx.state.db(), "outsider@example.com", "Outsider", "pw-secret")
            .await;
    let owner_token = test_support::bearer_token(&owner.id, ctx.state.settings());
    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());

    let (status, created) = create_session_for(&ctx, &owner_token).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let session_id = created["id"].as_str().unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/questions"),
            Some(&outsider_token),
            None,
        ))
        .await
        .expect("questions as outsider");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams/sessions/does-not-exist/questions",
            Some(&outsider_token),
            None,
        ))
        .await
        .expect("questions for unknown session");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resubmission_updates_the_same_row_in_place() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let user =
        test_support::insert_user(ctx.state.db(), "redo@example.com", "Redo User", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (_, created) = create_session_for(&ctx, &token).await;
    let session_id = created["id"].as_str().unwrap().to_string();
    let questions = session_questions(&ctx, &token, &session_id).await;
    let question_id = questions[0]["question_id"].as_str().unwrap().to_string();

    let (status, first) = submit_answer(&ctx, &token, &session_id, &question_id, "B", 40).await;
    assert_eq!(status, StatusCode::OK, "response: {first}");
    assert_eq!(first["is_correct"], false);
    assert_eq!(first["is_revisit"], false);
    assert_eq!(first["answered_count"], 1);

    let (status, second) = submit_answer(&ctx, &token, &session_id, &question_id, "A", 55).await;
    assert_eq!(status, StatusCode::OK, "response: {second}");
    assert_eq!(second["is_correct"], true);
    assert_eq!(second["is_revisit"], true);
    assert_eq!(second["answered_count"], 1);

    // Row count for the session is untouched by resubmission.
    let row_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM exam_answers WHERE session_id = $1")
            .bind(&session_id)
            .fetch_one(ctx.state.db())
            .await
            .expect("row count");
    assert_eq!(row_count, 185);
}

#[tokio::test]
async fn terminal_sessions_reject_mutations_with_invalid_state() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let user =
        test_support::insert_user(ctx.state.db(), "quitter@example.com", "Quitter", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (_, created) = create_session_for(&ctx, &token).await;
    let session_id = created["id"].as_str().unwrap().to_string();
    let questions = session_questions(&ctx, &token, &session_id).await;
    let question_id = questions[0]["question_id"].as_str().unwrap().to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/sessions/{session_id}/abandon"),
            Some(&token),
            None,
        ))
        .await
        .expect("abandon session");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = submit_answer(&ctx, &token, &session_id, &question_id, "A", 30).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "response: {body}");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/sessions/{session_id}/abandon"),
            Some(&token),
            None,
        ))
        .await
        .expect("abandon again");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // No report is generated for abandoned sessions.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/report"),
            Some(&token),
            None,
        ))
        .await
        .expect("report for abandoned");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn complete_without_force_reports_outstanding_questions() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let user =
        test_support::insert_user(ctx.state.db(), "partial@example.com", "Partial", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (_, created) = create_session_for(&ctx, &token).await;
    let session_id = created["id"].as_str().unwrap().to_string();
    let questions = session_questions(&ctx, &token, &session_id).await;
    let question_id = questions[0]["question_id"].as_str().unwrap().to_string();

    submit_answer(&ctx, &token, &session_id, &question_id, "A", 60).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/sessions/{session_id}/complete"),
            Some(&token),
            None,
        ))
        .await
        .expect("complete without force");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert!(body["detail"].as_str().unwrap().contains("184"));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/sessions/{session_id}/complete?force=true"),
            Some(&token),
            None,
        ))
        .await
        .expect("complete with force");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["passed"], false);
}

#[tokio::test]
async fn coach_flags_rushing_after_three_rapid_answers() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_pmp_catalog(ctx.state.db(), 90).await;

    let user =
        test_support::insert_user(ctx.state.db(), "rusher@example.com", "Rusher", "pw-secret")
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let (_, created) = create_session_for(&ctx, &token).await;
    let session_id = created["id"].as_str().unwrap().to_string();
    let questions = session_questions(&ctx, &token, &session_id).await;

    for (question, seconds) in questions.iter().take(3).zip([10_i64, 15, 20]) {
        let question_id = question["question_id"].as_str().unwrap();
        let (status, body) =
            submit_answer(&ctx, &token, &session_id, question_id, "A", seconds).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/coach/summary"),
            Some(&token),
            None,
        ))
        .await
        .expect("coach summary");
    let status = response.status();
    let summary = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {summary}");
    assert_eq!(summary["current_pattern"], "rushing");

    let warnings: Vec<&serde_json::Value> = summary["coaching_history"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|alert| alert["severity"] == "warning")
        .collect();
    assert_eq!(warnings.len(), 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/sessions/{session_id}/coach/game-tape"),
            Some(&token),
            None,
        ))
        .await
        .expect("game tape");
    let status = response.status();
    let tape = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {tape}");
    let events = tape.as_array().unwrap();
    // Three answer events plus at least the rushing warning.
    assert!(events.len() >= 4);
    assert!(events
        .iter()
        .any(|event| event["kind"] == "answer" && event["pattern"] == "rushing"));
}
