//! Operations-chat notifications

use teloxide::prelude::*;

use crate::core::config;
use crate::telegram::reactions;

/// Announces an approved withdrawal in the operations chat and reacts to it.
///
/// The announcement is operator-facing and always French. Failures are logged
/// and never propagated: by the time this runs, the user-facing flow already
/// committed.
pub async fn notify_withdrawal_approved(bot: &Bot, user_id: i64, user_name: &str, amount: i64, bot_username: Option<&str>) {
    let chat = ChatId(*config::ops::CHAT_ID);
    let text = format!(
        "⚔ NOUVEAU RETRAIT ⚔\n\n▪️ Status : Approuvé ✅\n▪️ User Identifiant: {}\n▪️ Retrait effectué par: {}\n▪️ Montant Retiré : {} FCFA\n\n🤴 Bot @{}",
        user_id,
        user_name,
        amount,
        bot_username.unwrap_or("cagnotte_bot"),
    );

    match bot.send_message(chat, text).disable_notification(true).await {
        Ok(message) => {
            reactions::try_set_reaction(bot, chat, message.id, reactions::pick_withdrawal_reaction()).await;
        }
        Err(e) => log::error!("Failed to announce withdrawal of user {}: {}", user_id, e),
    }
}
