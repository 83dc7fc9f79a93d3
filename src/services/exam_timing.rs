use time::PrimitiveDateTime;

/// Seconds elapsed since the session started, never negative.
pub(crate) fn elapsed_seconds(started_at: PrimitiveDateTime, now: PrimitiveDateTime) -> i64 {
    let elapsed = now.assume_utc().unix_timestamp() - started_at.assume_utc().unix_timestamp();
    elapsed.max(0)
}

/// Remaining wall-clock budget, floored at zero. There is no stored countdown;
/// the deadline is always recomputed from the start timestamp so pausing
/// requests cannot stretch the exam.
pub(crate) fn remaining_seconds(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> i64 {
    let budget = duration_minutes as i64 * 60;
    (budget - elapsed_seconds(started_at, now)).max(0)
}

pub(crate) fn is_expired(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> bool {
    remaining_seconds(started_at, duration_minutes, now) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time};

    fn at(hour: u8, minute: u8, second: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, time::Month::April, 10).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, second).unwrap())
    }

    #[test]
    fn remaining_counts_down_from_full_budget() {
        let start = at(9, 0, 0);
        assert_eq!(remaining_seconds(start, 240, start), 14_400);
        assert_eq!(remaining_seconds(start, 240, start + Duration::minutes(90)), 9_000);
    }

    #[test]
    fn remaining_is_non_increasing_and_floors_at_zero() {
        let start = at(9, 0, 0);
        let mut previous = i64::MAX;
        for minutes in [0_i64, 30, 120, 239, 240, 300] {
            let remaining = remaining_seconds(start, 240, start + Duration::minutes(minutes));
            assert!(remaining <= previous);
            assert!(remaining >= 0);
            previous = remaining;
        }
        assert_eq!(remaining_seconds(start, 240, start + Duration::minutes(300)), 0);
    }

    #[test]
    fn expiry_flips_exactly_at_the_deadline() {
        let start = at(9, 0, 0);
        assert!(!is_expired(start, 240, start + Duration::seconds(14_399)));
        assert!(is_expired(start, 240, start + Duration::seconds(14_400)));
    }

    #[test]
    fn clock_skew_before_start_reads_as_zero_elapsed() {
        let start = at(9, 0, 0);
        assert_eq!(elapsed_seconds(start, start - Duration::seconds(5)), 0);
        assert_eq!(remaining_seconds(start, 240, start - Duration::seconds(5)), 14_400);
    }
}
