//! Bot initialization and command-text matching
//!
//! Commands are matched on the raw message text so `/start` can carry an
//! optional deep-link payload; `command_payload` understands the
//! `/cmd@botname args` form used in group chats.

use reqwest::ClientBuilder;
use teloxide::prelude::*;

use crate::core::config;

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, network issues, etc.)
pub fn create_bot() -> anyhow::Result<Bot> {
    // Check if local Bot API server is configured
    let bot = if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        Bot::from_env_with_client(ClientBuilder::new().timeout(config::network::timeout()).build()?).set_api_url(url)
    } else {
        Bot::from_env_with_client(ClientBuilder::new().timeout(config::network::timeout()).build()?)
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
///
/// Only /start is advertised; /channel stays an unlisted operator tool.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![BotCommand::new("start", "démarrer le bot")]).await?;

    Ok(())
}

/// Extracts the argument tail of a command invocation.
///
/// Returns `Some(tail)` (possibly empty, trimmed) when `text` invokes
/// `/command` or `/command@anybot`, `None` otherwise.
pub fn command_payload<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let rest = text.strip_prefix('/')?.strip_prefix(command)?;
    // Accept an optional @botname suffix before the arguments.
    let rest = match rest.strip_prefix('@') {
        Some(mention) => {
            let end = mention.find(char::is_whitespace).unwrap_or(mention.len());
            &mention[end..]
        }
        None => rest,
    };
    if rest.is_empty() {
        return Some("");
    }
    // Reject longer command names sharing the prefix (e.g. /startx).
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

/// Whether the message text invokes the given command at all.
pub fn is_command(text: &str, command: &str) -> bool {
    command_payload(text, command).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command_yields_empty_payload() {
        assert_eq!(command_payload("/start", "start"), Some(""));
    }

    #[test]
    fn command_with_payload() {
        assert_eq!(command_payload("/start ref_123456", "start"), Some("ref_123456"));
    }

    #[test]
    fn command_with_mention_and_payload() {
        assert_eq!(command_payload("/start@cagnotte_bot ref_9", "start"), Some("ref_9"));
        assert_eq!(command_payload("/start@cagnotte_bot", "start"), Some(""));
    }

    #[test]
    fn rejects_other_commands_sharing_the_prefix() {
        assert_eq!(command_payload("/startup", "start"), None);
        assert_eq!(command_payload("/channel", "start"), None);
        assert_eq!(command_payload("plain text", "start"), None);
    }

    #[test]
    fn is_command_matches_channel() {
        assert!(is_command("/channel", "channel"));
        assert!(!is_command("/start", "channel"));
    }
}
