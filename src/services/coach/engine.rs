use time::PrimitiveDateTime;

use crate::db::models::{CoachingAlert, ExamBehaviorProfile, PatternEpisode};
use crate::db::types::{BehaviorPattern, CoachingSeverity, PaceTrajectory};
use crate::services::blueprint::ExamBlueprint;

pub(crate) const RAPID_ANSWER_SECONDS: i32 = 30;
pub(crate) const LONG_PAUSE_SECONDS: i32 = 180;
const ENGAGED_BAND_MIN: i32 = 45;
const ENGAGED_BAND_MAX: i32 = 150;
const RUSHING_STREAK: i32 = 3;
const FLAGGING_STREAK: i32 = 4;
const REVISIT_LOOP_THRESHOLD: i32 = 5;
const SKIP_WINDOW: usize = 5;
const SKIP_THRESHOLD: usize = 3;
const PANIC_RAPID_MIN: i32 = 2;
const LOW_SCORE_THRESHOLD: f64 = 60.0;
const PACE_CRITICAL_RATIO: f64 = 1.5;
const PACE_BEHIND_RATIO: f64 = 1.2;
const PACE_AHEAD_RATIO: f64 = 0.7;
const HALFWAY_BUDGET_RATIO: f64 = 0.8;
const CRITICAL_SECONDS_PER_QUESTION: f64 = 30.0;
const LATE_EXAM_FRACTION: f64 = 0.75;

/// One submitted answer, as seen by the coach. All detection is driven by
/// these events; a long pause only becomes visible through the
/// time_spent_seconds of the answer that ends it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnswerEvent {
    pub(crate) question_index: i32,
    pub(crate) time_spent_seconds: i32,
    pub(crate) is_flagged: bool,
    pub(crate) is_revisit: bool,
    pub(crate) is_skip: bool,
    /// Count of answered questions after this event.
    pub(crate) answered_count: i32,
    pub(crate) questions_count: i32,
    pub(crate) remaining_seconds: i64,
}

pub(crate) fn initial_history(now: PrimitiveDateTime) -> Vec<PatternEpisode> {
    vec![PatternEpisode {
        pattern: BehaviorPattern::Normal,
        start_question_index: 0,
        end_question_index: None,
        duration_seconds: None,
        started_at: now,
    }]
}

/// Applies one answer event: counters, pattern rules in fixed order (a later
/// match overrides an earlier one), scores, pace, proactive alerts. Returns
/// the alerts emitted for this event; they are also appended to
/// coaching_history.
pub(crate) fn apply_event(
    profile: &mut ExamBehaviorProfile,
    blueprint: &ExamBlueprint,
    event: &AnswerEvent,
    now: PrimitiveDateTime,
) -> Vec<CoachingAlert> {
    update_counters(profile, event);

    let mut alerts: Vec<CoachingAlert> = Vec::new();
    let mut emit = |profile: &mut ExamBehaviorProfile,
                    severity: CoachingSeverity,
                    title: &str,
                    message: String| {
        let alert = CoachingAlert {
            question_index: event.question_index,
            severity,
            title: title.to_string(),
            message,
            timestamp: now,
        };
        profile.coaching_history.0.push(alert.clone());
        alerts.push(alert);
    };

    let mut detected: Option<BehaviorPattern> = None;

    // 1. Rushing: three consecutive sub-30s answers; alerted once per streak.
    if profile.consecutive_rapid >= RUSHING_STREAK {
        detected = Some(BehaviorPattern::Rushing);
        if profile.consecutive_rapid == RUSHING_STREAK {
            emit(
                profile,
                CoachingSeverity::Warning,
                "Slow down",
                format!(
                    "Your last {RUSHING_STREAK} answers each took under {RAPID_ANSWER_SECONDS} \
                     seconds. Rushed answers are where careless mistakes happen."
                ),
            );
        }
    }

    // 2. Dwelling: a single answer over the long-pause threshold.
    if event.time_spent_seconds > LONG_PAUSE_SECONDS {
        detected = Some(BehaviorPattern::Dwelling);
        emit(
            profile,
            CoachingSeverity::Suggestion,
            "Move on",
            format!(
                "That question took {}s. Flag it and come back; one question is never worth \
                 the exam.",
                event.time_spent_seconds
            ),
        );
    }

    // 3. Panic: rapid answers and a long pause in the same session. The
    // cumulative condition never un-matches, so the alert fires only once.
    if profile.rapid_answer_count >= PANIC_RAPID_MIN && profile.long_pause_count >= 1 {
        detected = Some(BehaviorPattern::Panic);
        if !profile.panic_alert_sent {
            profile.panic_alert_sent = true;
            emit(
                profile,
                CoachingSeverity::Urgent,
                "Reset and breathe",
                "Rapid answers mixed with long stalls usually mean panic, not strategy. \
                 Take ten seconds, then work one question at a time."
                    .to_string(),
            );
        }
    }

    // 4. Flagging spree: four or more consecutive flags; alerted once per streak.
    if profile.consecutive_flags >= FLAGGING_STREAK {
        detected = Some(BehaviorPattern::FlaggingSpree);
        if profile.consecutive_flags == FLAGGING_STREAK {
            emit(
                profile,
                CoachingSeverity::Info,
                "Flagging a lot",
                format!(
                    "You have flagged {FLAGGING_STREAK} questions in a row. Flags are for \
                     genuine revisits; answer what you can on the first pass."
                ),
            );
        }
    }

    // 5. Revisit loop: alerted exactly once, when the counter first passes the
    // threshold; the pattern itself persists.
    if profile.question_revisits > REVISIT_LOOP_THRESHOLD {
        detected = Some(BehaviorPattern::RevisitLoop);
        if !profile.revisit_alert_sent {
            profile.revisit_alert_sent = true;
            let message = format!(
                "You have changed answers {} times. First instincts are usually right; \
                 only revise with a concrete reason.",
                profile.question_revisits
            );
            emit(profile, CoachingSeverity::Suggestion, "Trust your first answer", message);
        }
    }

    // 6. Skipping: three or more of the last five answers left blank. No
    // dedicated alert beyond the pattern tag.
    let recent = &profile.recent_selections.0;
    if recent.len() >= SKIP_WINDOW
        && recent.iter().filter(|skipped| **skipped).count() >= SKIP_THRESHOLD
    {
        detected = Some(BehaviorPattern::Skipping);
    }

    if let Some(pattern) = detected {
        transition_pattern(profile, pattern, event.question_index, now);
    }

    profile.engagement_score = engagement_score(profile);
    profile.focus_score = focus_score(profile);
    profile.pace_trajectory = pace_trajectory(
        event.remaining_seconds,
        (event.questions_count - event.answered_count).max(0),
        blueprint.target_seconds_per_question(),
    );

    proactive_alerts(profile, blueprint, event, &mut emit);

    alerts
}

fn update_counters(profile: &mut ExamBehaviorProfile, event: &AnswerEvent) {
    profile.total_answers += 1;

    let seconds = event.time_spent_seconds;
    profile.total_time_seconds += seconds as i64;
    profile.avg_time_seconds = profile.total_time_seconds as f64 / profile.total_answers as f64;

    if seconds > 0 {
        profile.timed_answers += 1;
        if (ENGAGED_BAND_MIN..=ENGAGED_BAND_MAX).contains(&seconds) {
            profile.answers_in_target_band += 1;
        }
        profile.fastest_answer_seconds = Some(match profile.fastest_answer_seconds {
            Some(fastest) => fastest.min(seconds),
            None => seconds,
        });
        profile.slowest_answer_seconds = Some(match profile.slowest_answer_seconds {
            Some(slowest) => slowest.max(seconds),
            None => seconds,
        });
    }

    if seconds < RAPID_ANSWER_SECONDS {
        profile.rapid_answer_count += 1;
        profile.consecutive_rapid += 1;
    } else {
        profile.consecutive_rapid = 0;
    }

    if seconds > LONG_PAUSE_SECONDS {
        profile.long_pause_count += 1;
    }

    if event.is_flagged {
        profile.total_flags += 1;
        profile.consecutive_flags += 1;
        profile.max_consecutive_flags =
            profile.max_consecutive_flags.max(profile.consecutive_flags);
    } else {
        profile.consecutive_flags = 0;
    }

    if event.is_revisit {
        profile.question_revisits += 1;
    }
    if event.is_skip {
        profile.questions_skipped += 1;
    }

    let recent = &mut profile.recent_selections.0;
    recent.push(event.is_skip);
    if recent.len() > SKIP_WINDOW {
        let overflow = recent.len() - SKIP_WINDOW;
        recent.drain(..overflow);
    }
}

fn transition_pattern(
    profile: &mut ExamBehaviorProfile,
    pattern: BehaviorPattern,
    question_index: i32,
    now: PrimitiveDateTime,
) {
    if profile.current_pattern == pattern {
        return;
    }

    if let Some(open) = profile.pattern_history.0.last_mut() {
        open.end_question_index = Some(question_index);
        open.duration_seconds = Some(
            (now.assume_utc().unix_timestamp() - open.started_at.assume_utc().unix_timestamp())
                .max(0),
        );
    }

    profile.pattern_history.0.push(PatternEpisode {
        pattern,
        start_question_index: question_index,
        end_question_index: None,
        duration_seconds: None,
        started_at: now,
    });
    profile.current_pattern = pattern;
}

/// Base is the share of timed answers inside the comfortable band, with flat
/// penalties for every rushed or dwelled answer.
pub(crate) fn engagement_score(profile: &ExamBehaviorProfile) -> f64 {
    let base = if profile.timed_answers > 0 {
        profile.answers_in_target_band as f64 / profile.timed_answers as f64 * 100.0
    } else {
        0.0
    };
    let score = base
        - 5.0 * profile.rapid_answer_count as f64
        - 3.0 * profile.long_pause_count as f64;
    score.clamp(0.0, 100.0)
}

pub(crate) fn focus_score(profile: &ExamBehaviorProfile) -> f64 {
    let mut score = 100.0
        - 5.0 * profile.question_revisits as f64
        - 3.0 * profile.questions_skipped as f64
        - 2.0 * (profile.consecutive_flags - 3).max(0) as f64;

    if profile.total_answers > 10
        && (profile.question_revisits as f64) < profile.total_answers as f64 * 0.10
    {
        score += 2.0;
    }

    score.clamp(0.0, 100.0)
}

/// Required-pace ratio: target seconds per question over the seconds actually
/// available per remaining question. Exhausted time is critical regardless.
pub(crate) fn pace_trajectory(
    remaining_seconds: i64,
    remaining_questions: i32,
    target_seconds_per_question: f64,
) -> PaceTrajectory {
    if remaining_seconds <= 0 {
        return PaceTrajectory::Critical;
    }
    if remaining_questions <= 0 {
        return PaceTrajectory::OnTrack;
    }

    let available = remaining_seconds as f64 / remaining_questions as f64;
    let ratio = target_seconds_per_question / available;

    if ratio > PACE_CRITICAL_RATIO {
        PaceTrajectory::Critical
    } else if ratio > PACE_BEHIND_RATIO {
        PaceTrajectory::Behind
    } else if ratio < PACE_AHEAD_RATIO {
        PaceTrajectory::Ahead
    } else {
        PaceTrajectory::OnTrack
    }
}

fn proactive_alerts(
    profile: &mut ExamBehaviorProfile,
    blueprint: &ExamBlueprint,
    event: &AnswerEvent,
    emit: &mut impl FnMut(&mut ExamBehaviorProfile, CoachingSeverity, &str, String),
) {
    // Halfway snapshot is captured exactly once, at the 50% mark.
    if !profile.halfway_alert_sent && event.answered_count == event.questions_count / 2 {
        profile.halfway_alert_sent = true;
        profile.halfway_time_remaining = Some(event.remaining_seconds);
        profile.halfway_questions_completed = Some(event.answered_count);

        let half_budget = blueprint.duration_seconds() as f64 / 2.0;
        if (event.remaining_seconds as f64) < half_budget * HALFWAY_BUDGET_RATIO {
            emit(
                profile,
                CoachingSeverity::Warning,
                "Behind at the half",
                format!(
                    "Halfway through the questions with {} minutes left; that is under 80% of \
                     the half-time budget. Pick up the pace on the ones you know.",
                    event.remaining_seconds / 60
                ),
            );
        }
    }

    // Late-exam time crunch re-fires while the condition holds.
    let remaining_questions = (event.questions_count - event.answered_count).max(0);
    if remaining_questions > 0
        && (event.answered_count as f64) > event.questions_count as f64 * LATE_EXAM_FRACTION
    {
        let per_question = event.remaining_seconds as f64 / remaining_questions as f64;
        if per_question < CRITICAL_SECONDS_PER_QUESTION {
            emit(
                profile,
                CoachingSeverity::Urgent,
                "Time critical",
                format!(
                    "{} questions left with about {:.0}s each. Answer everything; blank \
                     questions score zero.",
                    remaining_questions, per_question
                ),
            );
        }
    }

    if profile.engagement_score < LOW_SCORE_THRESHOLD {
        emit(
            profile,
            CoachingSeverity::Suggestion,
            "Engagement dropping",
            "Your answer rhythm is off the comfortable range. Settle into a steady pace: \
             read, decide, commit."
                .to_string(),
        );
    }

    if profile.focus_score < LOW_SCORE_THRESHOLD {
        emit(
            profile,
            CoachingSeverity::Info,
            "Focus slipping",
            "Frequent skips, flags and answer changes are costing you focus. \
             Work questions to completion where you can."
                .to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::{Date, Duration, Time};

    fn at(minute: u8, second: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::June, 2).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(10, minute, second).unwrap())
    }

    fn fresh_profile(now: PrimitiveDateTime) -> ExamBehaviorProfile {
        ExamBehaviorProfile {
            id: "profile-1".to_string(),
            session_id: "session-1".to_string(),
            user_id: "user-1".to_string(),
            current_pattern: BehaviorPattern::Normal,
            pattern_history: Json(initial_history(now)),
            coaching_history: Json(Vec::new()),
            recent_selections: Json(Vec::new()),
            total_answers: 0,
            timed_answers: 0,
            answers_in_target_band: 0,
            total_time_seconds: 0,
            avg_time_seconds: 0.0,
            fastest_answer_seconds: None,
            slowest_answer_seconds: None,
            total_flags: 0,
            consecutive_flags: 0,
            max_consecutive_flags: 0,
            question_revisits: 0,
            questions_skipped: 0,
            rapid_answer_count: 0,
            long_pause_count: 0,
            consecutive_rapid: 0,
            revisit_alert_sent: false,
            panic_alert_sent: false,
            halfway_alert_sent: false,
            halfway_time_remaining: None,
            halfway_questions_completed: None,
            pace_trajectory: PaceTrajectory::OnTrack,
            engagement_score: 100.0,
            focus_score: 100.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(question_index: i32, seconds: i32) -> AnswerEvent {
        AnswerEvent {
            question_index,
            time_spent_seconds: seconds,
            is_flagged: false,
            is_revisit: false,
            is_skip: false,
            answered_count: question_index + 1,
            questions_count: 185,
            remaining_seconds: 14_000,
        }
    }

    #[test]
    fn three_rapid_answers_trigger_rushing_with_one_warning() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        let warnings = |alerts: &[CoachingAlert]| {
            alerts.iter().filter(|a| a.severity == CoachingSeverity::Warning).count()
        };

        let alerts = apply_event(&mut profile, &blueprint, &event(0, 10), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Normal);
        assert_eq!(warnings(&alerts), 0);

        let alerts = apply_event(&mut profile, &blueprint, &event(1, 15), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Normal);
        assert_eq!(warnings(&alerts), 0);

        let alerts = apply_event(&mut profile, &blueprint, &event(2, 20), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Rushing);
        assert_eq!(warnings(&alerts), 1);

        // Fourth rapid answer keeps the pattern but does not re-alert.
        let alerts = apply_event(&mut profile, &blueprint, &event(3, 12), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Rushing);
        assert_eq!(warnings(&alerts), 0);
    }

    #[test]
    fn rushing_streak_resets_on_a_slow_answer() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        apply_event(&mut profile, &blueprint, &event(0, 10), now);
        apply_event(&mut profile, &blueprint, &event(1, 12), now);
        apply_event(&mut profile, &blueprint, &event(2, 90), now);
        assert_eq!(profile.consecutive_rapid, 0);

        apply_event(&mut profile, &blueprint, &event(3, 10), now);
        assert_eq!(profile.consecutive_rapid, 1);
        assert_eq!(profile.current_pattern, BehaviorPattern::Normal);
    }

    #[test]
    fn dwelling_detected_and_counts_long_pause() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        let alerts = apply_event(&mut profile, &blueprint, &event(0, 200), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Dwelling);
        assert_eq!(profile.long_pause_count, 1);
        assert!(alerts.iter().any(|a| a.severity == CoachingSeverity::Suggestion));
    }

    #[test]
    fn panic_overrides_rushing_and_dwelling_and_alerts_once() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        apply_event(&mut profile, &blueprint, &event(0, 10), now);
        apply_event(&mut profile, &blueprint, &event(1, 10), now);
        // Two rapids on record plus this long pause: panic.
        let alerts = apply_event(&mut profile, &blueprint, &event(2, 200), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Panic);
        assert_eq!(
            alerts.iter().filter(|a| a.severity == CoachingSeverity::Urgent).count(),
            1
        );

        // Condition still holds on the next event but the alert is spent.
        let alerts = apply_event(&mut profile, &blueprint, &event(3, 60), now);
        assert_eq!(profile.current_pattern, BehaviorPattern::Panic);
        assert_eq!(
            alerts.iter().filter(|a| a.severity == CoachingSeverity::Urgent).count(),
            0
        );
    }

    #[test]
    fn four_consecutive_flags_mark_flagging_spree() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        for index in 0..4 {
            let mut flagged = event(index, 70);
            flagged.is_flagged = true;
            apply_event(&mut profile, &blueprint, &flagged, now);
        }

        assert_eq!(profile.current_pattern, BehaviorPattern::FlaggingSpree);
        assert_eq!(profile.max_consecutive_flags, 4);
        assert_eq!(
            profile
                .coaching_history
                .0
                .iter()
                .filter(|a| a.severity == CoachingSeverity::Info && a.title == "Flagging a lot")
                .count(),
            1
        );
    }

    #[test]
    fn revisit_loop_alert_fires_exactly_once_at_six() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        let revisit_alerts = |profile: &ExamBehaviorProfile| {
            profile
                .coaching_history
                .0
                .iter()
                .filter(|a| a.title == "Trust your first answer")
                .count()
        };

        for index in 0..5 {
            let mut revisit = event(index, 70);
            revisit.is_revisit = true;
            apply_event(&mut profile, &blueprint, &revisit, now);
        }
        assert_eq!(profile.question_revisits, 5);
        assert_eq!(profile.current_pattern, BehaviorPattern::Normal);
        assert_eq!(revisit_alerts(&profile), 0);

        let mut revisit = event(5, 70);
        revisit.is_revisit = true;
        apply_event(&mut profile, &blueprint, &revisit, now);
        assert_eq!(profile.question_revisits, 6);
        assert_eq!(profile.current_pattern, BehaviorPattern::RevisitLoop);
        assert_eq!(revisit_alerts(&profile), 1);

        for index in 6..9 {
            let mut revisit = event(index, 70);
            revisit.is_revisit = true;
            apply_event(&mut profile, &blueprint, &revisit, now);
        }
        assert_eq!(profile.current_pattern, BehaviorPattern::RevisitLoop);
        assert_eq!(revisit_alerts(&profile), 1);
    }

    #[test]
    fn skipping_needs_three_blanks_in_the_last_five() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        for index in 0..5 {
            let mut skip = event(index, 70);
            skip.is_skip = index % 2 == 0;
            apply_event(&mut profile, &blueprint, &skip, now);
        }
        // Window holds [skip, answer, skip, answer, skip].
        assert_eq!(profile.current_pattern, BehaviorPattern::Skipping);
        assert_eq!(profile.questions_skipped, 3);
    }

    #[test]
    fn later_rules_override_earlier_ones_for_the_same_event() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        // Build a five-event window with three skips; the final event is also
        // rapid, so rule 1 matches but rule 6 wins.
        for index in 0..4 {
            let mut skip = event(index, 10);
            skip.is_skip = index < 2;
            apply_event(&mut profile, &blueprint, &skip, now);
        }
        let mut last = event(4, 10);
        last.is_skip = true;
        apply_event(&mut profile, &blueprint, &last, now);

        assert!(profile.consecutive_rapid >= RUSHING_STREAK);
        assert_eq!(profile.current_pattern, BehaviorPattern::Skipping);
    }

    #[test]
    fn pattern_transitions_close_previous_episode() {
        let blueprint = ExamBlueprint::standard();
        let start = at(0, 0);
        let mut profile = fresh_profile(start);

        let later = start + Duration::minutes(5);
        apply_event(&mut profile, &blueprint, &event(0, 200), later);

        let history = &profile.pattern_history.0;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].pattern, BehaviorPattern::Normal);
        assert_eq!(history[0].end_question_index, Some(0));
        assert_eq!(history[0].duration_seconds, Some(300));
        assert_eq!(history[1].pattern, BehaviorPattern::Dwelling);
        assert_eq!(history[1].end_question_index, None);
    }

    #[test]
    fn engagement_rewards_the_comfort_band_and_penalizes_extremes() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        apply_event(&mut profile, &blueprint, &event(0, 60), now);
        apply_event(&mut profile, &blueprint, &event(1, 90), now);
        assert_eq!(profile.engagement_score, 100.0);

        apply_event(&mut profile, &blueprint, &event(2, 10), now);
        // Base 2/3 in band, minus one rapid penalty.
        let expected = (2.0 / 3.0 * 100.0) - 5.0;
        assert!((profile.engagement_score - expected).abs() < 1e-9);
    }

    #[test]
    fn focus_penalizes_revisits_skips_and_flag_streaks() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        let mut busy = event(0, 70);
        busy.is_revisit = true;
        apply_event(&mut profile, &blueprint, &busy, now);
        assert_eq!(profile.focus_score, 95.0);

        let mut skip = event(1, 70);
        skip.is_skip = true;
        apply_event(&mut profile, &blueprint, &skip, now);
        assert_eq!(profile.focus_score, 92.0);

        for index in 2..7 {
            let mut flagged = event(index, 70);
            flagged.is_flagged = true;
            apply_event(&mut profile, &blueprint, &flagged, now);
        }
        // Five consecutive flags: two beyond the grace of three.
        assert_eq!(profile.focus_score, 88.0);
    }

    #[test]
    fn focus_bonus_for_few_revisits_on_a_long_run() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        for index in 0..11 {
            apply_event(&mut profile, &blueprint, &event(index, 70), now);
        }
        assert_eq!(profile.focus_score, 100.0);
        // Clamped at 100, but the bonus shows once a deduction exists.
        let mut skip = event(11, 70);
        skip.is_skip = true;
        apply_event(&mut profile, &blueprint, &skip, now);
        assert_eq!(profile.focus_score, 99.0);
    }

    #[test]
    fn pace_classification_tracks_required_ratio() {
        let target = ExamBlueprint::standard().target_seconds_per_question();

        // Plenty of time per remaining question.
        assert_eq!(pace_trajectory(14_000, 100, target), PaceTrajectory::Ahead);
        // Roughly on budget.
        assert_eq!(pace_trajectory(7_800, 100, target), PaceTrajectory::OnTrack);
        // Noticeably short on time.
        assert_eq!(pace_trajectory(6_000, 100, target), PaceTrajectory::Behind);
        // Far too little time left.
        assert_eq!(pace_trajectory(4_000, 100, target), PaceTrajectory::Critical);
        // Exhausted clock is critical no matter what.
        assert_eq!(pace_trajectory(0, 1, target), PaceTrajectory::Critical);
        assert_eq!(pace_trajectory(0, 0, target), PaceTrajectory::Critical);
    }

    #[test]
    fn halfway_snapshot_captured_once_and_warns_when_behind() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        let mut halfway = event(91, 70);
        halfway.answered_count = 92;
        halfway.remaining_seconds = 5_000; // under 80% of the 7200s half budget
        apply_event(&mut profile, &blueprint, &halfway, now);

        assert!(profile.halfway_alert_sent);
        assert_eq!(profile.halfway_time_remaining, Some(5_000));
        assert_eq!(profile.halfway_questions_completed, Some(92));
        assert_eq!(
            profile
                .coaching_history
                .0
                .iter()
                .filter(|a| a.title == "Behind at the half")
                .count(),
            1
        );

        // Subsequent events never retake the snapshot.
        let mut again = event(92, 70);
        again.answered_count = 92;
        again.remaining_seconds = 100;
        apply_event(&mut profile, &blueprint, &again, now);
        assert_eq!(profile.halfway_time_remaining, Some(5_000));
    }

    #[test]
    fn critical_time_alert_refires_each_event() {
        let blueprint = ExamBlueprint::standard();
        let now = at(0, 0);
        let mut profile = fresh_profile(now);

        for offset in 0..2 {
            let mut crunch = event(160 + offset, 70);
            crunch.answered_count = 161 + offset;
            crunch.remaining_seconds = 300; // 24 remaining -> ~12.5s each
            apply_event(&mut profile, &blueprint, &crunch, now);
        }

        assert_eq!(
            profile.coaching_history.0.iter().filter(|a| a.title == "Time critical").count(),
            2
        );
    }
}
