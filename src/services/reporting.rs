use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::repositories::answers::SessionQuestionRow;
use crate::services::blueprint::ExamBlueprint;

const STRONG_DOMAIN_PCT: f64 = 75.0;
const ADEQUATE_DOMAIN_PCT: f64 = 60.0;
const WEAK_DOMAIN_PCT: f64 = 60.0;
const WEAK_TASK_PCT: f64 = 65.0;
const MAX_TASK_CALLOUTS: usize = 4;
const MIN_DOMAIN_QUESTIONS_FOR_ADVICE: usize = 5;
const MIN_TASK_QUESTIONS_FOR_ADVICE: usize = 2;
const SLOW_PACE_RATIO: f64 = 1.3;
const FAST_PACE_RATIO: f64 = 0.6;
const DOMAIN_SLOW_PACE_RATIO: f64 = 1.5;
const COMPLETION_RATE_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BreakdownStats {
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) percentage: f64,
    pub(crate) avg_time_per_question: f64,
    pub(crate) weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TaskBreakdownStats {
    pub(crate) task_name: String,
    pub(crate) domain_name: String,
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) percentage: f64,
    pub(crate) avg_time_per_question: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportContent {
    pub(crate) score_percentage: f64,
    pub(crate) passed: bool,
    pub(crate) domain_breakdown: BTreeMap<String, BreakdownStats>,
    pub(crate) task_breakdown: BTreeMap<String, TaskBreakdownStats>,
    pub(crate) strengths: Vec<String>,
    pub(crate) weaknesses: Vec<String>,
    pub(crate) recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportInput<'a> {
    pub(crate) rows: &'a [SessionQuestionRow],
    pub(crate) questions_count: i32,
    pub(crate) time_expired: bool,
}

#[derive(Default)]
struct Tally {
    correct: usize,
    total: usize,
    time_seconds: i64,
}

impl Tally {
    fn record(&mut self, row: &SessionQuestionRow) {
        self.total += 1;
        if row.is_correct {
            self.correct += 1;
        }
        self.time_seconds += row.time_spent_seconds as i64;
    }

    fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }

    fn avg_time(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.time_seconds as f64 / self.total as f64
        }
    }
}

/// Pure function of the session's answers; identical input yields identical
/// output (BTreeMap keeps the breakdown ordering stable).
pub(crate) fn build_report(blueprint: &ExamBlueprint, input: ReportInput<'_>) -> ReportContent {
    let mut domain_tallies: BTreeMap<String, (Tally, f64)> = BTreeMap::new();
    let mut task_tallies: BTreeMap<String, (Tally, String, String)> = BTreeMap::new();

    let mut correct_count = 0_usize;
    let mut answered_count = 0_usize;
    let mut total_time_seconds = 0_i64;

    for row in input.rows {
        if row.is_correct {
            correct_count += 1;
        }
        if !row.selected_answer.is_empty() {
            answered_count += 1;
        }
        total_time_seconds += row.time_spent_seconds as i64;

        domain_tallies
            .entry(row.domain_name.clone())
            .or_insert_with(|| (Tally::default(), row.domain_weight))
            .0
            .record(row);
        task_tallies
            .entry(row.task_id.clone())
            .or_insert_with(|| {
                (Tally::default(), row.task_name.clone(), row.domain_name.clone())
            })
            .0
            .record(row);
    }

    let questions_count = input.questions_count.max(0) as usize;
    let score_percentage = if questions_count == 0 {
        0.0
    } else {
        correct_count as f64 / questions_count as f64 * 100.0
    };
    let passed = score_percentage >= blueprint.passing_threshold;

    let domain_breakdown: BTreeMap<String, BreakdownStats> = domain_tallies
        .iter()
        .map(|(name, (tally, weight))| {
            (
                name.clone(),
                BreakdownStats {
                    correct: tally.correct,
                    total: tally.total,
                    percentage: tally.percentage(),
                    avg_time_per_question: tally.avg_time(),
                    weight: *weight,
                },
            )
        })
        .collect();

    let task_breakdown: BTreeMap<String, TaskBreakdownStats> = task_tallies
        .iter()
        .map(|(task_id, (tally, task_name, domain_name))| {
            (
                task_id.clone(),
                TaskBreakdownStats {
                    task_name: task_name.clone(),
                    domain_name: domain_name.clone(),
                    correct: tally.correct,
                    total: tally.total,
                    percentage: tally.percentage(),
                    avg_time_per_question: tally.avg_time(),
                },
            )
        })
        .collect();

    let strengths = collect_strengths(&domain_breakdown, passed);
    let weaknesses = collect_weaknesses(&domain_breakdown);
    let weak_tasks = weakest_tasks(&task_breakdown);
    let recommendations = build_recommendations(RecommendationInput {
        blueprint,
        score_percentage,
        passed,
        domain_breakdown: &domain_breakdown,
        weak_tasks: &weak_tasks,
        answered_count,
        questions_count,
        total_time_seconds,
        time_expired: input.time_expired,
    });

    ReportContent {
        score_percentage,
        passed,
        domain_breakdown,
        task_breakdown,
        strengths,
        weaknesses,
        recommendations,
    }
}

fn collect_strengths(
    domain_breakdown: &BTreeMap<String, BreakdownStats>,
    passed: bool,
) -> Vec<String> {
    let mut strengths = Vec::new();
    for (name, stats) in domain_breakdown {
        if stats.percentage >= STRONG_DOMAIN_PCT {
            strengths.push(format!("Strong performance in {name} ({:.1}%)", stats.percentage));
        }
    }
    if passed {
        for (name, stats) in domain_breakdown {
            if stats.percentage >= ADEQUATE_DOMAIN_PCT && stats.percentage < STRONG_DOMAIN_PCT {
                strengths.push(format!("Adequate performance in {name} ({:.1}%)", stats.percentage));
            }
        }
    }
    strengths
}

fn collect_weaknesses(domain_breakdown: &BTreeMap<String, BreakdownStats>) -> Vec<String> {
    domain_breakdown
        .iter()
        .filter(|(_, stats)| stats.total > 0 && stats.percentage < WEAK_DOMAIN_PCT)
        .map(|(name, stats)| format!("Needs work: {name} ({:.1}%)", stats.percentage))
        .collect()
}

/// Weakest tasks with enough in-session sample, worst first, capped at four.
fn weakest_tasks(
    task_breakdown: &BTreeMap<String, TaskBreakdownStats>,
) -> Vec<TaskBreakdownStats> {
    let mut tasks: Vec<TaskBreakdownStats> = task_breakdown
        .values()
        .filter(|stats| {
            stats.total >= MIN_TASK_QUESTIONS_FOR_ADVICE && stats.percentage < WEAK_TASK_PCT
        })
        .cloned()
        .collect();
    tasks.sort_by(|a, b| {
        a.percentage
            .partial_cmp(&b.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.task_name.cmp(&b.task_name))
    });
    tasks.truncate(MAX_TASK_CALLOUTS);
    tasks
}

struct RecommendationInput<'a> {
    blueprint: &'a ExamBlueprint,
    score_percentage: f64,
    passed: bool,
    domain_breakdown: &'a BTreeMap<String, BreakdownStats>,
    weak_tasks: &'a [TaskBreakdownStats],
    answered_count: usize,
    questions_count: usize,
    total_time_seconds: i64,
    time_expired: bool,
}

/// Fixed checklist; the emission order is part of the contract and feeds the
/// UI directly.
fn build_recommendations(input: RecommendationInput<'_>) -> Vec<String> {
    let mut recommendations = Vec::new();
    let threshold = input.blueprint.passing_threshold;
    let target = input.blueprint.target_seconds_per_question();

    if input.passed {
        let margin = input.score_percentage - threshold;
        if margin < 5.0 {
            recommendations.push(format!(
                "You passed with {:.1}%, a narrow margin over the {threshold:.0}% threshold. \
                 Shore up your weakest areas before exam day.",
                input.score_percentage
            ));
        } else {
            recommendations.push(format!(
                "You passed with {:.1}%. Keep your routine and focus revision on the areas below.",
                input.score_percentage
            ));
        }
    } else {
        recommendations.push(format!(
            "You scored {:.1}%, below the {threshold:.0}% passing threshold. \
             Plan targeted revision before your next attempt.",
            input.score_percentage
        ));
    }

    for (name, stats) in input.domain_breakdown {
        if stats.total >= MIN_DOMAIN_QUESTIONS_FOR_ADVICE && stats.percentage < WEAK_DOMAIN_PCT {
            recommendations.push(format!(
                "{name} came in at {:.1}% over {} questions. Prioritize this domain in revision.",
                stats.percentage, stats.total
            ));
        }
    }

    for task in input.weak_tasks {
        recommendations.push(format!(
            "Task '{}' ({}) scored {:.1}% over {} questions. Review this topic specifically.",
            task.task_name, task.domain_name, task.percentage, task.total
        ));
    }

    if input.questions_count > 0 {
        let avg = input.total_time_seconds as f64 / input.questions_count as f64;
        if avg > target * SLOW_PACE_RATIO {
            recommendations.push(format!(
                "Your average pace was {avg:.0}s per question against a {target:.0}s target. \
                 Practice timed blocks to speed up.",
            ));
        } else if avg < target * FAST_PACE_RATIO {
            recommendations.push(format!(
                "Your average pace was {avg:.0}s per question against a {target:.0}s target. \
                 Slow down and re-read the scenarios; speed is not the constraint.",
            ));
        }
    }

    for (name, stats) in input.domain_breakdown {
        if stats.total >= MIN_DOMAIN_QUESTIONS_FOR_ADVICE
            && stats.avg_time_per_question > target * DOMAIN_SLOW_PACE_RATIO
        {
            recommendations.push(format!(
                "{name} questions took {:.0}s on average, well over the {target:.0}s target. \
                 Drill this domain's question style for speed.",
                stats.avg_time_per_question
            ));
        }
    }

    if input.questions_count > 0 && !input.time_expired {
        let completion = input.answered_count as f64 / input.questions_count as f64;
        if completion < COMPLETION_RATE_THRESHOLD {
            recommendations.push(format!(
                "You answered {} of {} questions with time to spare. \
                 Commit to an answer on every question; unanswered counts as wrong.",
                input.answered_count, input.questions_count
            ));
        }
    }

    if input.time_expired {
        recommendations.push(
            "Time ran out before you finished. Build a pacing checkpoint habit: \
             be past question 60 at the first break and past 120 at the second."
                .to_string(),
        );
    }

    let mut priority_domains: Vec<&str> = Vec::new();
    for task in input.weak_tasks {
        if !priority_domains.contains(&task.domain_name.as_str()) {
            priority_domains.push(task.domain_name.as_str());
        }
        if priority_domains.len() == 2 {
            break;
        }
    }
    if !priority_domains.is_empty() {
        recommendations.push(format!(
            "Highest-impact next step: focused study in {}.",
            priority_domains.join(" and ")
        ));
    }

    recommendations
}
