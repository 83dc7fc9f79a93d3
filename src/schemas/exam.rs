use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{ExamReport, ExamSession};
use crate::db::types::{DifficultyLevel, ExamStatus};
use crate::repositories::answers::SessionQuestionRow;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSessionRequest {
    #[serde(default = "default_adaptive", alias = "adaptiveDifficulty")]
    pub(crate) adaptive_difficulty: bool,
}

impl Default for CreateSessionRequest {
    fn default() -> Self {
        Self { adaptive_difficulty: default_adaptive() }
    }
}

fn default_adaptive() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitAnswerRequest {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(default, alias = "selectedAnswer")]
    pub(crate) selected_answer: String,
    #[serde(default, alias = "timeSpentSeconds")]
    #[validate(range(min = 0, message = "time_spent_seconds must be non-negative"))]
    pub(crate) time_spent_seconds: i32,
    #[serde(default, alias = "isFlagged")]
    pub(crate) is_flagged: bool,
}

/// Empty string marks a skipped question; anything else must be one of the
/// four option letters.
pub(crate) fn is_valid_answer_choice(value: &str) -> bool {
    value.is_empty() || matches!(value.to_ascii_uppercase().as_str(), "A" | "B" | "C" | "D")
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListSessionsQuery {
    #[serde(default)]
    pub(crate) status: Option<ExamStatus>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompleteSessionQuery {
    #[serde(default)]
    pub(crate) force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) status: ExamStatus,
    pub(crate) started_at: String,
    pub(crate) ended_at: Option<String>,
    pub(crate) total_time_seconds: Option<i32>,
    pub(crate) questions_count: i32,
    pub(crate) correct_count: i32,
    pub(crate) current_question_index: i32,
    pub(crate) time_expired: bool,
    pub(crate) adaptive_difficulty: bool,
    pub(crate) duration_minutes: i32,
    pub(crate) remaining_seconds: i64,
}

impl SessionResponse {
    pub(crate) fn from_session(session: ExamSession, remaining_seconds: i64) -> Self {
        Self {
            id: session.id,
            status: session.status,
            started_at: format_primitive(session.started_at),
            ended_at: session.ended_at.map(format_primitive),
            total_time_seconds: session.total_time_seconds,
            questions_count: session.questions_count,
            correct_count: session.correct_count,
            current_question_index: session.current_question_index,
            time_expired: session.time_expired,
            adaptive_difficulty: session.adaptive_difficulty,
            duration_minutes: session.duration_minutes,
            remaining_seconds,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) question_id: String,
    pub(crate) question_index: i32,
    pub(crate) selected_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) is_flagged: bool,
    pub(crate) is_revisit: bool,
    pub(crate) answered_count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SessionQuestionResponse {
    pub(crate) index: i32,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) selected_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) is_flagged: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) domain_name: String,
    pub(crate) task_name: String,
    /// Withheld while the session is in progress.
    pub(crate) correct_answer: Option<String>,
    pub(crate) explanation: Option<String>,
}

impl SessionQuestionResponse {
    pub(crate) fn from_row(row: SessionQuestionRow, reveal_answers: bool) -> Self {
        let difficulty = row.difficulty.unwrap_or(DifficultyLevel::Medium);
        Self {
            index: row.question_index,
            question_id: row.question_id,
            text: row.text,
            option_a: row.option_a,
            option_b: row.option_b,
            option_c: row.option_c,
            option_d: row.option_d,
            difficulty,
            selected_answer: row.selected_answer,
            is_correct: row.is_correct,
            is_flagged: row.is_flagged,
            time_spent_seconds: row.time_spent_seconds,
            domain_name: row.domain_name,
            task_name: row.task_name,
            correct_answer: reveal_answers.then_some(row.correct_answer),
            explanation: reveal_answers.then_some(row.explanation),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResumeResponse {
    pub(crate) session: SessionResponse,
    pub(crate) questions: Vec<SessionQuestionResponse>,
    pub(crate) current_question: Option<SessionQuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionResponse {
    pub(crate) session_id: String,
    pub(crate) score_percentage: f64,
    pub(crate) passed: bool,
    pub(crate) domain_breakdown: serde_json::Value,
    pub(crate) task_breakdown: serde_json::Value,
    pub(crate) time_spent_seconds: i32,
    pub(crate) time_expired: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportResponse {
    pub(crate) session_id: String,
    pub(crate) score_percentage: f64,
    pub(crate) passed: bool,
    pub(crate) domain_breakdown: serde_json::Value,
    pub(crate) task_breakdown: serde_json::Value,
    pub(crate) recommendations: Vec<String>,
    pub(crate) strengths: Vec<String>,
    pub(crate) weaknesses: Vec<String>,
    pub(crate) created_at: String,
}

impl From<ExamReport> for ReportResponse {
    fn from(report: ExamReport) -> Self {
        Self {
            session_id: report.session_id,
            score_percentage: report.score_percentage,
            passed: report.passed,
            domain_breakdown: report.domain_breakdown.0,
            task_breakdown: report.task_breakdown.0,
            recommendations: report.recommendations.0,
            strengths: report.strengths.0,
            weaknesses: report.weaknesses.0,
            created_at: format_primitive(report.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_choice_accepts_letters_and_empty() {
        assert!(is_valid_answer_choice(""));
        assert!(is_valid_answer_choice("A"));
        assert!(is_valid_answer_choice("d"));
        assert!(!is_valid_answer_choice("E"));
        assert!(!is_valid_answer_choice("AB"));
    }
}
