use std::collections::HashMap;

use sqlx::PgPool;

use crate::repositories;
use crate::repositories::answers::DomainOutcomeRow;
use crate::services::blueprint::MIN_SAMPLE_FOR_ADAPTATION;

const EXAM_WEIGHT: f64 = 0.7;
const PRACTICE_WEIGHT: f64 = 0.3;

/// Historical accuracy for one domain, blended from completed exams and
/// standalone practice answers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DomainPerformance {
    pub(crate) accuracy: f64,
    pub(crate) attempts: i64,
    pub(crate) avg_response_seconds: Option<f64>,
    pub(crate) sufficient_data: bool,
}

impl DomainPerformance {
    fn empty() -> Self {
        Self { accuracy: 0.0, attempts: 0, avg_response_seconds: None, sufficient_data: false }
    }
}

#[derive(Debug, Default)]
struct SourceTally {
    total: i64,
    correct: i64,
    timed_total: i64,
    timed_seconds: i64,
}

impl SourceTally {
    fn record(&mut self, row: &DomainOutcomeRow) {
        self.total += 1;
        if row.is_correct {
            self.correct += 1;
        }
        if row.time_spent_seconds > 0 {
            self.timed_total += 1;
            self.timed_seconds += row.time_spent_seconds as i64;
        }
    }

    fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }
}

pub(crate) async fn domain_performance_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<HashMap<String, DomainPerformance>, sqlx::Error> {
    let exam_rows = repositories::answers::list_exam_outcomes_by_user(pool, user_id).await?;
    let practice_rows = repositories::attempts::list_outcomes_by_user(pool, user_id).await?;
    Ok(aggregate(&exam_rows, &practice_rows))
}

/// Exam history dominates with weight 0.7 once at least one exam data point
/// exists; with no exam data the practice accuracy is used as-is. Absent data
/// yields the neutral default (accuracy 0, zero attempts).
pub(crate) fn aggregate(
    exam_rows: &[DomainOutcomeRow],
    practice_rows: &[DomainOutcomeRow],
) -> HashMap<String, DomainPerformance> {
    let mut exam: HashMap<String, SourceTally> = HashMap::new();
    let mut practice: HashMap<String, SourceTally> = HashMap::new();

    for row in exam_rows {
        exam.entry(row.domain_name.clone()).or_default().record(row);
    }
    for row in practice_rows {
        practice.entry(row.domain_name.clone()).or_default().record(row);
    }

    let mut result = HashMap::new();
    let names: std::collections::HashSet<&String> = exam.keys().chain(practice.keys()).collect();

    for name in names {
        let exam_tally = exam.get(name);
        let practice_tally = practice.get(name);

        let exam_accuracy = exam_tally.and_then(SourceTally::accuracy);
        let practice_accuracy = practice_tally.and_then(SourceTally::accuracy);

        let accuracy = match (exam_accuracy, practice_accuracy) {
            (Some(exam_acc), Some(practice_acc)) => {
                exam_acc * EXAM_WEIGHT + practice_acc * PRACTICE_WEIGHT
            }
            (Some(exam_acc), None) => exam_acc,
            (None, Some(practice_acc)) => practice_acc,
            (None, None) => 0.0,
        };

        let attempts = exam_tally.map_or(0, |tally| tally.total)
            + practice_tally.map_or(0, |tally| tally.total);

        let timed_total = exam_tally.map_or(0, |tally| tally.timed_total)
            + practice_tally.map_or(0, |tally| tally.timed_total);
        let timed_seconds = exam_tally.map_or(0, |tally| tally.timed_seconds)
            + practice_tally.map_or(0, |tally| tally.timed_seconds);
        let avg_response_seconds =
            (timed_total > 0).then(|| timed_seconds as f64 / timed_total as f64);

        result.insert(
            name.clone(),
            DomainPerformance {
                accuracy,
                attempts,
                avg_response_seconds,
                sufficient_data: attempts >= MIN_SAMPLE_FOR_ADAPTATION,
            },
        );
    }

    result
}

pub(crate) fn performance_or_empty<'a>(
    performance: &'a HashMap<String, DomainPerformance>,
    domain_name: &str,
) -> std::borrow::Cow<'a, DomainPerformance> {
    match performance.get(domain_name) {
        Some(found) => std::borrow::Cow::Borrowed(found),
        None => std::borrow::Cow::Owned(DomainPerformance::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(domain: &str, correct: bool, seconds: i32) -> DomainOutcomeRow {
        DomainOutcomeRow {
            domain_name: domain.to_string(),
            is_correct: correct,
            time_spent_seconds: seconds,
        }
    }

    #[test]
    fn blends_exam_and_practice_with_fixed_weights() {
        // Exam: 1/2 correct. Practice: 1/1 correct.
        let exam = vec![row("People", true, 60), row("People", false, 90)];
        let practice = vec![row("People", true, 45)];

        let result = aggregate(&exam, &practice);
        let people = result.get("People").expect("domain present");

        assert!((people.accuracy - (0.5 * 0.7 + 1.0 * 0.3)).abs() < 1e-9);
        assert_eq!(people.attempts, 3);
        assert!(!people.sufficient_data);
        assert!((people.avg_response_seconds.unwrap() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn exam_accuracy_stands_alone_without_practice() {
        let exam = vec![row("Process", true, 0), row("Process", true, 0)];
        let result = aggregate(&exam, &[]);
        let process = result.get("Process").unwrap();

        assert_eq!(process.accuracy, 1.0);
        assert_eq!(process.avg_response_seconds, None);
    }

    #[test]
    fn practice_accuracy_used_when_no_exam_data() {
        let practice =
            vec![row("Business Environment", false, 30), row("Business Environment", true, 30)];
        let result = aggregate(&[], &practice);
        let domain = result.get("Business Environment").unwrap();

        assert_eq!(domain.accuracy, 0.5);
        assert_eq!(domain.attempts, 2);
    }

    #[test]
    fn sufficient_data_requires_five_combined_attempts() {
        let exam = vec![row("People", true, 60); 3];
        let practice = vec![row("People", false, 60); 2];
        let result = aggregate(&exam, &practice);
        assert!(result.get("People").unwrap().sufficient_data);

        let result = aggregate(&exam, &practice[..1]);
        assert!(!result.get("People").unwrap().sufficient_data);
    }

    #[test]
    fn unknown_domain_yields_neutral_default() {
        let performance = aggregate(&[], &[]);
        let neutral = performance_or_empty(&performance, "People");
        assert_eq!(neutral.accuracy, 0.0);
        assert_eq!(neutral.attempts, 0);
        assert!(!neutral.sufficient_data);
    }
}
