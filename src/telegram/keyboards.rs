//! Static keyboard layouts and button-caption matching
//!
//! The main menu is a reply keyboard whose captions are localized, so the
//! text-message handler matches incoming text against the captions of every
//! supported language rather than a single literal.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, UserId};
use unic_langid::LanguageIdentifier;

use crate::i18n::{self, t};

/// Actions reachable from the main reply keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Balance,
    Share,
    Bonus,
    Tasks,
    Withdraw,
    AddNumber,
    Procedure,
}

const CAPTION_KEYS: &[(&str, MenuAction)] = &[
    ("keyboard.balance", MenuAction::Balance),
    ("keyboard.share", MenuAction::Share),
    ("keyboard.bonus", MenuAction::Bonus),
    ("keyboard.tasks", MenuAction::Tasks),
    ("keyboard.withdraw", MenuAction::Withdraw),
    ("keyboard.add-number", MenuAction::AddNumber),
    ("keyboard.procedure", MenuAction::Procedure),
];

/// Resolves a message text to a menu action, across all supported languages.
pub fn menu_action(text: &str) -> Option<MenuAction> {
    for &(code, _) in i18n::SUPPORTED_LANGS {
        let lang = i18n::lang_from_code(code);
        for &(key, action) in CAPTION_KEYS {
            if t(&lang, key) == text {
                return Some(action);
            }
        }
    }
    None
}

/// The main reply keyboard shown to verified users.
pub fn main_keyboard(lang: &LanguageIdentifier) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(t(lang, "keyboard.balance")),
            KeyboardButton::new(t(lang, "keyboard.share")),
        ],
        vec![
            KeyboardButton::new(t(lang, "keyboard.bonus")),
            KeyboardButton::new(t(lang, "keyboard.tasks")),
        ],
        vec![KeyboardButton::new(t(lang, "keyboard.withdraw"))],
        vec![
            KeyboardButton::new(t(lang, "keyboard.add-number")),
            KeyboardButton::new(t(lang, "keyboard.procedure")),
        ],
    ])
    .resize_keyboard()
}

/// Inline "register" button attached to the verification prompt.
pub fn verify_keyboard(lang: &LanguageIdentifier, user_id: UserId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t(lang, "verify.button"),
        format!("verify_{}", user_id),
    )]])
}

/// Inline button opening the add/change payout-number flow.
pub fn settings_keyboard(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t(lang, "number.button"),
        "addNum".to_string(),
    )]])
}

/// Inline "Check" button re-submitting the offered task ids.
pub fn check_keyboard(lang: &LanguageIdentifier, task_ids: &[&str]) -> InlineKeyboardMarkup {
    let data = task_ids
        .iter()
        .fold("task".to_string(), |acc, id| format!("{}_{}", acc, id));
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t(lang, "task.check-button"),
        data,
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_captions_in_both_languages() {
        assert_eq!(menu_action("💰 Mon Solde 💰"), Some(MenuAction::Balance));
        assert_eq!(menu_action("💰 My Balance 💰"), Some(MenuAction::Balance));
        assert_eq!(menu_action("Effectuer un Retrait 🏦"), Some(MenuAction::Withdraw));
        assert_eq!(menu_action("Make a Withdrawal 🏦"), Some(MenuAction::Withdraw));
        assert_eq!(menu_action("🚩 Tâche"), Some(MenuAction::Tasks));
        assert_eq!(menu_action("🚩 Task"), Some(MenuAction::Tasks));
    }

    #[test]
    fn ignores_free_text() {
        assert_eq!(menu_action("hello there"), None);
        assert_eq!(menu_action(""), None);
        assert_eq!(menu_action("40000"), None);
    }

    #[test]
    fn main_keyboard_has_all_seven_buttons() {
        let keyboard = main_keyboard(&i18n::lang_from_code("fr"));
        let count: usize = keyboard.keyboard.iter().map(|row| row.len()).sum();
        assert_eq!(count, 7);
    }

    #[test]
    fn check_keyboard_encodes_task_ids() {
        let keyboard = check_keyboard(&i18n::lang_from_code("en"), &["ab12", "cd34"]);
        let button = &keyboard.inline_keyboard[0][0];
        match &button.kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "task_ab12_cd34");
            }
            other => panic!("unexpected button kind: {:?}", other),
        }
    }
}
