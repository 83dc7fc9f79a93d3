use crate::core::config::ExamSettings;

/// Combined exam + practice attempts below this count leave a domain
/// unclassified: no weight adjustment, no difficulty steering.
pub(crate) const MIN_SAMPLE_FOR_ADAPTATION: i64 = 5;

/// Fixed PMP passing threshold. Deliberately not configurable.
const PASSING_THRESHOLD: f64 = 65.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DifficultyProfile {
    pub(crate) name: &'static str,
    pub(crate) easy: f64,
    pub(crate) medium: f64,
    pub(crate) hard: f64,
}

pub(crate) const PROFILE_EASIER: DifficultyProfile =
    DifficultyProfile { name: "easier", easy: 0.50, medium: 0.40, hard: 0.10 };
pub(crate) const PROFILE_HARDER: DifficultyProfile =
    DifficultyProfile { name: "harder", easy: 0.10, medium: 0.40, hard: 0.50 };
pub(crate) const PROFILE_MIXED: DifficultyProfile =
    DifficultyProfile { name: "mixed", easy: 0.25, medium: 0.50, hard: 0.25 };

impl DifficultyProfile {
    /// Easy and hard bands floor; medium absorbs the rounding remainder.
    pub(crate) fn band_counts(&self, total: usize) -> (usize, usize, usize) {
        let easy = (total as f64 * self.easy).floor() as usize;
        let hard = (total as f64 * self.hard).floor() as usize;
        let medium = total - easy - hard;
        (easy, medium, hard)
    }
}

/// Picks the difficulty mix for a domain from the user's historical accuracy.
pub(crate) fn difficulty_profile_for(accuracy: f64, attempts: i64) -> DifficultyProfile {
    if attempts >= MIN_SAMPLE_FOR_ADAPTATION {
        if accuracy < 0.65 {
            return PROFILE_EASIER;
        }
        if accuracy > 0.85 {
            return PROFILE_HARDER;
        }
    }
    PROFILE_MIXED
}

/// Weight multiplier applied before renormalization when a domain has enough
/// history: weak domains get more questions, strong domains fewer.
pub(crate) fn adaptive_weight_multiplier(accuracy: f64) -> f64 {
    if accuracy < 0.60 {
        1.30
    } else if accuracy < 0.75 {
        1.15
    } else if accuracy <= 0.85 {
        1.00
    } else {
        0.90
    }
}

/// Immutable per-exam configuration, built once and passed down into the
/// allocator, report generator and behavior coach.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExamBlueprint {
    pub(crate) total_questions: u32,
    pub(crate) duration_minutes: u32,
    pub(crate) passing_threshold: f64,
}

impl ExamBlueprint {
    pub(crate) fn standard() -> Self {
        Self { total_questions: 185, duration_minutes: 240, passing_threshold: PASSING_THRESHOLD }
    }

    pub(crate) fn from_settings(settings: &ExamSettings) -> Self {
        Self {
            total_questions: settings.total_questions,
            duration_minutes: settings.duration_minutes,
            passing_threshold: PASSING_THRESHOLD,
        }
    }

    pub(crate) fn duration_seconds(&self) -> i64 {
        self.duration_minutes as i64 * 60
    }

    pub(crate) fn target_seconds_per_question(&self) -> f64 {
        self.duration_seconds() as f64 / self.total_questions as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_counts_medium_absorbs_remainder() {
        let (easy, medium, hard) = PROFILE_MIXED.band_counts(61);
        assert_eq!(easy, 15);
        assert_eq!(hard, 15);
        assert_eq!(medium, 31);
        assert_eq!(easy + medium + hard, 61);

        let (easy, medium, hard) = PROFILE_EASIER.band_counts(48);
        assert_eq!(easy, 24);
        assert_eq!(hard, 4);
        assert_eq!(medium, 20);
    }

    #[test]
    fn profile_selection_boundaries() {
        assert_eq!(difficulty_profile_for(0.64, 5), PROFILE_EASIER);
        assert_eq!(difficulty_profile_for(0.65, 5), PROFILE_MIXED);
        assert_eq!(difficulty_profile_for(0.85, 5), PROFILE_MIXED);
        assert_eq!(difficulty_profile_for(0.86, 5), PROFILE_HARDER);
        // Below the sample floor the mix never adapts.
        assert_eq!(difficulty_profile_for(0.10, 4), PROFILE_MIXED);
        assert_eq!(difficulty_profile_for(0.99, 4), PROFILE_MIXED);
    }

    #[test]
    fn weight_multiplier_boundaries() {
        assert_eq!(adaptive_weight_multiplier(0.59), 1.30);
        assert_eq!(adaptive_weight_multiplier(0.60), 1.15);
        assert_eq!(adaptive_weight_multiplier(0.74), 1.15);
        assert_eq!(adaptive_weight_multiplier(0.75), 1.00);
        assert_eq!(adaptive_weight_multiplier(0.85), 1.00);
        assert_eq!(adaptive_weight_multiplier(0.86), 0.90);
    }

    #[test]
    fn standard_blueprint_targets() {
        let blueprint = ExamBlueprint::standard();
        assert_eq!(blueprint.duration_seconds(), 14_400);
        let target = blueprint.target_seconds_per_question();
        assert!((target - 77.8378).abs() < 0.001);
    }
}
