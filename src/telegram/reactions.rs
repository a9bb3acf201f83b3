use rand::seq::SliceRandom;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ReactionType};

/// Reactions attached to withdrawal announcements in the operations chat.
const WITHDRAWAL_REACTIONS: [&str; 4] = ["👍", "🔥", "🎉", "❤"];

/// Picks one of the fixed announcement reactions uniformly at random.
pub fn pick_withdrawal_reaction() -> &'static str {
    WITHDRAWAL_REACTIONS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(WITHDRAWAL_REACTIONS[0])
}

/// Try to set a reaction; failures are logged and swallowed.
pub async fn try_set_reaction(bot: &Bot, chat_id: ChatId, message_id: MessageId, emoji: &str) {
    let reaction = vec![ReactionType::Emoji {
        emoji: emoji.to_string(),
    }];
    if let Err(e) = bot.set_message_reaction(chat_id, message_id).reaction(reaction).await {
        log::warn!("Failed to set reaction '{}' for chat {}: {}", emoji, chat_id.0, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_reaction_comes_from_the_fixed_set() {
        for _ in 0..32 {
            assert!(WITHDRAWAL_REACTIONS.contains(&pick_withdrawal_reaction()));
        }
    }
}
