//! Bonus-claim decision logic
//!
//! A user may claim the periodic bonus once the cooldown since their last
//! claim has elapsed. The countdown shown on rejection uses the same floored
//! hour/minute/second arithmetic as the reply template expects (hours wrap
//! at 24).

use chrono::{DateTime, Utc};

use crate::core::config::rewards;

/// Outcome of a bonus claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusOutcome {
    /// Cooldown elapsed; the reward can be granted
    Granted,
    /// Cooldown still running; components of the remaining wait
    Cooldown { hours: i64, minutes: i64, seconds: i64 },
}

/// Decides whether a bonus claim succeeds at `now` given the last claim time.
pub fn evaluate(last_bonus: DateTime<Utc>, now: DateTime<Utc>) -> BonusOutcome {
    let elapsed = now - last_bonus;
    if elapsed >= rewards::bonus_cooldown() {
        return BonusOutcome::Granted;
    }

    let remaining_ms = ((last_bonus + rewards::bonus_cooldown()) - now).num_milliseconds();
    let hours = (remaining_ms / (1000 * 60 * 60)) % 24;
    let minutes = (remaining_ms % (1000 * 60 * 60)) / (1000 * 60);
    let seconds = (remaining_ms % (1000 * 60)) / 1000;

    BonusOutcome::Cooldown { hours, minutes, seconds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sentinel_dated_user_is_immediately_eligible() {
        let now = Utc::now();
        assert_eq!(evaluate(rewards::bonus_epoch(), now), BonusOutcome::Granted);
    }

    #[test]
    fn granted_exactly_at_cooldown_boundary() {
        let now = Utc::now();
        assert_eq!(evaluate(now - rewards::bonus_cooldown(), now), BonusOutcome::Granted);
    }

    #[test]
    fn rejected_one_second_before_boundary() {
        let now = Utc::now();
        let last = now - rewards::bonus_cooldown() + Duration::seconds(1);
        assert_eq!(
            evaluate(last, now),
            BonusOutcome::Cooldown {
                hours: 0,
                minutes: 0,
                seconds: 1
            }
        );
    }

    #[test]
    fn countdown_components_are_floored() {
        let now = Utc::now();
        // 30 minutes elapsed out of 2 hours: 1h 30m 0s remain.
        let last = now - Duration::minutes(30);
        assert_eq!(
            evaluate(last, now),
            BonusOutcome::Cooldown {
                hours: 1,
                minutes: 30,
                seconds: 0
            }
        );
    }

    #[test]
    fn sub_minute_remainder_reports_seconds_only() {
        let now = Utc::now();
        let last = now - rewards::bonus_cooldown() + Duration::seconds(45);
        assert_eq!(
            evaluate(last, now),
            BonusOutcome::Cooldown {
                hours: 0,
                minutes: 0,
                seconds: 45
            }
        );
    }
}
