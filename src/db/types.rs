use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficultylevel", rename_all = "lowercase")]
pub(crate) enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "examstatus", rename_all = "snake_case")]
pub(crate) enum ExamStatus {
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "behaviorpattern", rename_all = "snake_case")]
pub(crate) enum BehaviorPattern {
    Normal,
    Rushing,
    Dwelling,
    Panic,
    Guessing,
    FlaggingSpree,
    Skipping,
    RevisitLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "coachingseverity", rename_all = "lowercase")]
pub(crate) enum CoachingSeverity {
    Info,
    Suggestion,
    Warning,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "pacetrajectory", rename_all = "snake_case")]
pub(crate) enum PaceTrajectory {
    Ahead,
    OnTrack,
    Behind,
    Critical,
}
