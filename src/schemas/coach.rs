use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::ExamBehaviorProfile;
use crate::db::types::{BehaviorPattern, CoachingSeverity, PaceTrajectory};
use crate::services::coach::tape::TapeEvent;

#[derive(Debug, Serialize)]
pub(crate) struct CoachMetricsResponse {
    pub(crate) pattern: BehaviorPattern,
    pub(crate) engagement_score: f64,
    pub(crate) focus_score: f64,
    pub(crate) pace_trajectory: PaceTrajectory,
    pub(crate) time_remaining_seconds: i64,
    pub(crate) questions_completed: i32,
    pub(crate) avg_time_seconds: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PatternEpisodeResponse {
    pub(crate) pattern: BehaviorPattern,
    pub(crate) start_question_index: i32,
    pub(crate) end_question_index: Option<i32>,
    pub(crate) duration_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CoachingAlertResponse {
    pub(crate) question_index: i32,
    pub(crate) severity: CoachingSeverity,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) timestamp: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BehaviorSummaryResponse {
    pub(crate) session_id: String,
    pub(crate) current_pattern: BehaviorPattern,
    pub(crate) pattern_history: Vec<PatternEpisodeResponse>,
    pub(crate) coaching_history: Vec<CoachingAlertResponse>,
    pub(crate) total_answers: i32,
    pub(crate) avg_time_seconds: f64,
    pub(crate) fastest_answer_seconds: Option<i32>,
    pub(crate) slowest_answer_seconds: Option<i32>,
    pub(crate) total_flags: i32,
    pub(crate) max_consecutive_flags: i32,
    pub(crate) question_revisits: i32,
    pub(crate) questions_skipped: i32,
    pub(crate) rapid_answer_count: i32,
    pub(crate) long_pause_count: i32,
    pub(crate) halfway_time_remaining: Option<i64>,
    pub(crate) halfway_questions_completed: Option<i32>,
    pub(crate) pace_trajectory: PaceTrajectory,
    pub(crate) engagement_score: f64,
    pub(crate) focus_score: f64,
}

impl From<ExamBehaviorProfile> for BehaviorSummaryResponse {
    fn from(profile: ExamBehaviorProfile) -> Self {
        Self {
            session_id: profile.session_id,
            current_pattern: profile.current_pattern,
            pattern_history: profile
                .pattern_history
                .0
                .into_iter()
                .map(|episode| PatternEpisodeResponse {
                    pattern: episode.pattern,
                    start_question_index: episode.start_question_index,
                    end_question_index: episode.end_question_index,
                    duration_seconds: episode.duration_seconds,
                })
                .collect(),
            coaching_history: profile
                .coaching_history
                .0
                .into_iter()
                .map(|alert| CoachingAlertResponse {
                    question_index: alert.question_index,
                    severity: alert.severity,
                    title: alert.title,
                    message: alert.message,
                    timestamp: format_primitive(alert.timestamp),
                })
                .collect(),
            total_answers: profile.total_answers,
            avg_time_seconds: profile.avg_time_seconds,
            fastest_answer_seconds: profile.fastest_answer_seconds,
            slowest_answer_seconds: profile.slowest_answer_seconds,
            total_flags: profile.total_flags,
            max_consecutive_flags: profile.max_consecutive_flags,
            question_revisits: profile.question_revisits,
            questions_skipped: profile.questions_skipped,
            rapid_answer_count: profile.rapid_answer_count,
            long_pause_count: profile.long_pause_count,
            halfway_time_remaining: profile.halfway_time_remaining,
            halfway_questions_completed: profile.halfway_questions_completed,
            pace_trajectory: profile.pace_trajectory,
            engagement_score: profile.engagement_score,
            focus_score: profile.focus_score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum TapeEventResponse {
    Answer {
        timestamp: String,
        question_index: i32,
        time_spent_seconds: i32,
        is_correct: bool,
        is_flagged: bool,
        skipped: bool,
        pattern: Option<BehaviorPattern>,
    },
    Coaching {
        timestamp: String,
        question_index: i32,
        severity: CoachingSeverity,
        title: String,
        message: String,
    },
}

impl From<TapeEvent> for TapeEventResponse {
    fn from(event: TapeEvent) -> Self {
        match event {
            TapeEvent::Answer {
                timestamp,
                question_index,
                time_spent_seconds,
                is_correct,
                is_flagged,
                skipped,
                pattern,
            } => TapeEventResponse::Answer {
                timestamp: format_primitive(timestamp),
                question_index,
                time_spent_seconds,
                is_correct,
                is_flagged,
                skipped,
                pattern,
            },
            TapeEvent::Coaching { timestamp, question_index, severity, title, message } => {
                TapeEventResponse::Coaching {
                    timestamp: format_primitive(timestamp),
                    question_index,
                    severity,
                    title,
                    message,
                }
            }
        }
    }
}
