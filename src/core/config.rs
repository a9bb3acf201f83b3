use once_cell::sync::Lazy;
use std::env;

/// Configuration constants for the bot

/// Path to the SQLite database file
/// Read from DATABASE_PATH environment variable
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "cagnotte.sqlite".to_string()));

/// Path to the log file
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "cagnotte.log".to_string()));

/// Public HTTPS URL Telegram should deliver webhook updates to (webhook mode only)
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| env::var("WEBHOOK_URL").ok());

/// Local port the webhook listener binds to
pub static WEBHOOK_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEBHOOK_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(8443)
});

/// Required-channel configuration
pub mod channels {
    use once_cell::sync::Lazy;
    use std::env;

    /// Channels a user must belong to before the main menu unlocks.
    /// Read from REQUIRED_CHANNELS as a comma-separated list of chat ids.
    pub static REQUIRED: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("REQUIRED_CHANNELS")
            .map(|raw| parse_id_list(&raw))
            .unwrap_or_else(|_| vec![-1002193506007, -1002240023653])
    });

    /// Invite links shown in the verification prompt, one per required channel.
    /// Read from CHANNEL_INVITE_LINKS as a comma-separated list.
    pub static INVITE_LINKS: Lazy<Vec<String>> = Lazy::new(|| {
        env::var("CHANNEL_INVITE_LINKS")
            .map(|raw| {
                raw.split(',')
                    .map(|link| link.trim().to_string())
                    .filter(|link| !link.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "https://t.me/+kYc5KkGc2sNkMWM0".to_string(),
                    "https://t.me/+u3zoFAGLbTk0Zjg0".to_string(),
                ]
            })
    });

    pub(crate) fn parse_id_list(raw: &str) -> Vec<i64> {
        raw.split(',').filter_map(|part| part.trim().parse().ok()).collect()
    }

    #[cfg(test)]
    mod tests {
        use super::parse_id_list;

        #[test]
        fn parses_comma_separated_ids() {
            assert_eq!(
                parse_id_list("-1002193506007, -1002240023653"),
                vec![-1002193506007, -1002240023653]
            );
        }

        #[test]
        fn skips_garbage_entries() {
            assert_eq!(parse_id_list("42,notanid,,7"), vec![42, 7]);
        }
    }
}

/// Operations-chat configuration
pub mod ops {
    use once_cell::sync::Lazy;
    use std::env;

    /// Chat receiving withdrawal-approval announcements.
    pub static CHAT_ID: Lazy<i64> = Lazy::new(|| {
        env::var("OPS_CHAT_ID")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(-1002240023653)
    });
}

/// Reward amounts and the bonus clock
pub mod rewards {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use once_cell::sync::Lazy;

    /// Deep-link payload prefix carried by referral links (`?start=ref_<id>`)
    pub const REFERRAL_PREFIX: &str = "ref_";

    /// FCFA credited to the inviter for each new user joining via their link
    pub const REFERRAL_REWARD: i64 = 5500;

    /// FCFA granted per bonus claim
    pub const BONUS_REWARD: i64 = 750;

    /// Hours between two bonus claims
    pub const BONUS_COOLDOWN_HOURS: i64 = 2;

    /// Bonus cooldown duration
    pub fn bonus_cooldown() -> Duration {
        Duration::hours(BONUS_COOLDOWN_HOURS)
    }

    /// Sentinel `last_bonus_date` for new rows so the first claim always succeeds.
    static BONUS_EPOCH: Lazy<DateTime<Utc>> = Lazy::new(|| Utc.with_ymd_and_hms(2000, 12, 1, 0, 0, 0).unwrap());

    pub fn bonus_epoch() -> DateTime<Utc> {
        *BONUS_EPOCH
    }
}

/// Withdrawal thresholds
pub mod withdrawal {
    /// Minimum FCFA balance and minimum requested amount for a withdrawal
    pub const MIN_AMOUNT: i64 = 40000;

    /// Minimum number of invited users before a withdrawal is approved
    pub const MIN_INVITED_USERS: i64 = 5;
}

/// Task-offer limits
pub mod tasks {
    /// A user completes at most this many tasks, and the list offers at most this many at once
    pub const MAX_COMPLETED: usize = 2;
}

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
