use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    BehaviorPattern, CoachingSeverity, DifficultyLevel, ExamStatus, PaceTrajectory,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Domain {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) weight: f64,
    pub(crate) display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) correct_answer: String,
    pub(crate) explanation: String,
    pub(crate) difficulty: Option<DifficultyLevel>,
}

impl Question {
    /// Questions without an assigned difficulty count as medium.
    pub(crate) fn effective_difficulty(&self) -> DifficultyLevel {
        self.difficulty.unwrap_or(DifficultyLevel::Medium)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionAttempt {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) status: ExamStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) ended_at: Option<PrimitiveDateTime>,
    pub(crate) total_time_seconds: Option<i32>,
    pub(crate) questions_count: i32,
    pub(crate) correct_count: i32,
    pub(crate) current_question_index: i32,
    pub(crate) time_expired: bool,
    pub(crate) adaptive_difficulty: bool,
    pub(crate) duration_minutes: i32,
    pub(crate) allocation_seed: i64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAnswer {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) question_index: i32,
    pub(crate) selected_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) is_flagged: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl ExamAnswer {
    pub(crate) fn is_answered(&self) -> bool {
        !self.selected_answer.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamReport {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) score_percentage: f64,
    pub(crate) passed: bool,
    pub(crate) domain_breakdown: Json<serde_json::Value>,
    pub(crate) task_breakdown: Json<serde_json::Value>,
    pub(crate) recommendations: Json<Vec<String>>,
    pub(crate) strengths: Json<Vec<String>>,
    pub(crate) weaknesses: Json<Vec<String>>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// One closed episode of a detected pattern, plus the currently open one
/// (end fields unset until the next transition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PatternEpisode {
    pub(crate) pattern: BehaviorPattern,
    pub(crate) start_question_index: i32,
    pub(crate) end_question_index: Option<i32>,
    pub(crate) duration_seconds: Option<i64>,
    pub(crate) started_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CoachingAlert {
    pub(crate) question_index: i32,
    pub(crate) severity: CoachingSeverity,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) timestamp: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamBehaviorProfile {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) user_id: String,
    pub(crate) current_pattern: BehaviorPattern,
    pub(crate) pattern_history: Json<Vec<PatternEpisode>>,
    pub(crate) coaching_history: Json<Vec<CoachingAlert>>,
    /// Emptiness of the last five submitted answers, oldest first.
    pub(crate) recent_selections: Json<Vec<bool>>,
    pub(crate) total_answers: i32,
    pub(crate) timed_answers: i32,
    pub(crate) answers_in_target_band: i32,
    pub(crate) total_time_seconds: i64,
    pub(crate) avg_time_seconds: f64,
    pub(crate) fastest_answer_seconds: Option<i32>,
    pub(crate) slowest_answer_seconds: Option<i32>,
    pub(crate) total_flags: i32,
    pub(crate) consecutive_flags: i32,
    pub(crate) max_consecutive_flags: i32,
    pub(crate) question_revisits: i32,
    pub(crate) questions_skipped: i32,
    pub(crate) rapid_answer_count: i32,
    pub(crate) long_pause_count: i32,
    pub(crate) consecutive_rapid: i32,
    pub(crate) revisit_alert_sent: bool,
    pub(crate) panic_alert_sent: bool,
    pub(crate) halfway_alert_sent: bool,
    pub(crate) halfway_time_remaining: Option<i64>,
    pub(crate) halfway_questions_completed: Option<i32>,
    pub(crate) pace_trajectory: PaceTrajectory,
    pub(crate) engagement_score: f64,
    pub(crate) focus_score: f64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
