use serde::Serialize;
use time::PrimitiveDateTime;

use crate::db::models::{CoachingAlert, ExamAnswer};
use crate::db::types::{BehaviorPattern, CoachingSeverity};
use crate::services::coach::engine::{LONG_PAUSE_SECONDS, RAPID_ANSWER_SECONDS};

/// Post-exam replay: answer events and coaching alerts merged into one
/// timeline. Read-only; nothing downstream feeds back into the state machine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum TapeEvent {
    Answer {
        timestamp: PrimitiveDateTime,
        question_index: i32,
        time_spent_seconds: i32,
        is_correct: bool,
        is_flagged: bool,
        skipped: bool,
        pattern: Option<BehaviorPattern>,
    },
    Coaching {
        timestamp: PrimitiveDateTime,
        question_index: i32,
        severity: CoachingSeverity,
        title: String,
        message: String,
    },
}

impl TapeEvent {
    fn timestamp(&self) -> PrimitiveDateTime {
        match self {
            TapeEvent::Answer { timestamp, .. } | TapeEvent::Coaching { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

fn per_answer_pattern(time_spent_seconds: i32) -> Option<BehaviorPattern> {
    if time_spent_seconds < RAPID_ANSWER_SECONDS {
        Some(BehaviorPattern::Rushing)
    } else if time_spent_seconds > LONG_PAUSE_SECONDS {
        Some(BehaviorPattern::Dwelling)
    } else {
        None
    }
}

pub(crate) fn build_game_tape(
    answers: &[ExamAnswer],
    coaching_history: &[CoachingAlert],
) -> Vec<TapeEvent> {
    let mut events: Vec<TapeEvent> = answers
        .iter()
        .filter(|answer| answer.updated_at > answer.created_at)
        .map(|answer| TapeEvent::Answer {
            timestamp: answer.updated_at,
            question_index: answer.question_index,
            time_spent_seconds: answer.time_spent_seconds,
            is_correct: answer.is_correct,
            is_flagged: answer.is_flagged,
            skipped: !answer.is_answered(),
            pattern: per_answer_pattern(answer.time_spent_seconds),
        })
        .collect();

    events.extend(coaching_history.iter().map(|alert| TapeEvent::Coaching {
        timestamp: alert.timestamp,
        question_index: alert.question_index,
        severity: alert.severity,
        title: alert.title.clone(),
        message: alert.message.clone(),
    }));

    events.sort_by_key(TapeEvent::timestamp);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time};

    fn at(minute: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::June, 2).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(11, minute, 0).unwrap())
    }

    fn answer(index: i32, seconds: i32, submitted_at: PrimitiveDateTime) -> ExamAnswer {
        ExamAnswer {
            id: format!("a{index}"),
            session_id: "session-1".to_string(),
            question_id: format!("q{index}"),
            question_index: index,
            selected_answer: "A".to_string(),
            is_correct: true,
            time_spent_seconds: seconds,
            is_flagged: false,
            created_at: at(0),
            updated_at: submitted_at,
        }
    }

    #[test]
    fn tape_is_sorted_by_timestamp_across_both_sources() {
        let answers = vec![answer(0, 20, at(5)), answer(1, 200, at(15))];
        let alerts = vec![CoachingAlert {
            question_index: 0,
            severity: CoachingSeverity::Warning,
            title: "Slow down".to_string(),
            message: String::new(),
            timestamp: at(10),
        }];

        let tape = build_game_tape(&answers, &alerts);
        assert_eq!(tape.len(), 3);
        assert!(matches!(tape[0], TapeEvent::Answer { question_index: 0, .. }));
        assert!(matches!(tape[1], TapeEvent::Coaching { .. }));
        assert!(matches!(tape[2], TapeEvent::Answer { question_index: 1, .. }));
    }

    #[test]
    fn per_answer_patterns_follow_the_timing_thresholds() {
        let answers =
            vec![answer(0, 20, at(1)), answer(1, 90, at(2)), answer(2, 181, at(3))];
        let tape = build_game_tape(&answers, &[]);

        let patterns: Vec<Option<BehaviorPattern>> = tape
            .iter()
            .map(|event| match event {
                TapeEvent::Answer { pattern, .. } => *pattern,
                TapeEvent::Coaching { .. } => panic!("unexpected coaching event"),
            })
            .collect();

        assert_eq!(
            patterns,
            vec![Some(BehaviorPattern::Rushing), None, Some(BehaviorPattern::Dwelling)]
        );
    }

    #[test]
    fn untouched_placeholder_rows_are_excluded() {
        let mut untouched = answer(0, 0, at(0));
        untouched.selected_answer = String::new();
        untouched.updated_at = untouched.created_at;

        let touched = answer(1, 60, at(0) + Duration::minutes(2));

        let tape = build_game_tape(&[untouched, touched], &[]);
        assert_eq!(tape.len(), 1);
    }
}
