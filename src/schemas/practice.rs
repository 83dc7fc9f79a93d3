use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PracticeAnswerRequest {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(alias = "selectedAnswer")]
    pub(crate) selected_answer: String,
    #[serde(default, alias = "timeSpentSeconds")]
    #[validate(range(min = 0, message = "time_spent_seconds must be non-negative"))]
    pub(crate) time_spent_seconds: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct PracticeAnswerResponse {
    pub(crate) question_id: String,
    pub(crate) selected_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) correct_answer: String,
    pub(crate) explanation: String,
}
