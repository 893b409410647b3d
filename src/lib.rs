//! Telegram trend-script bot.
//!
//! A webhook-driven conversation engine that gates an OpenAI-backed script
//! generator behind per-user trial and subscription quotas. Inbound updates
//! arrive over HTTP, the engine walks a short menu dialogue (content type,
//! then language), and a completed selection triggers one generation call
//! whose result is relayed back to the chat.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod store;
pub mod telegram;

pub use error::{Error, Result};

/// Telegram chat identity. Keys the per-user quota records.
pub type ChatId = i64;

/// Content style a script can be requested for. Doubles as the button
/// labels of the content-type menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    TikTok,
    YouTube,
    General,
    Custom,
}

impl ContentType {
    /// Menu order: rendered as a 2×2 grid, row-major.
    pub const ALL: [ContentType; 4] = [Self::TikTok, Self::YouTube, Self::General, Self::Custom];

    pub fn label(self) -> &'static str {
        match self {
            Self::TikTok => "TikTok",
            Self::YouTube => "YouTube",
            Self::General => "General",
            Self::Custom => "Custom",
        }
    }

    /// Exact label match; selection labels are case-sensitive.
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value| value.label() == text)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Output language of a generated script. Doubles as the button labels of
/// the language menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Arabic,
    English,
    French,
    Other,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::Arabic, Self::English, Self::French, Self::Other];

    pub fn label(self) -> &'static str {
        match self {
            Self::Arabic => "Arabic",
            Self::English => "English",
            Self::French => "French",
            Self::Other => "Other",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value| value.label() == text)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A reply the engine wants delivered to the chat.
///
/// The engine decides; the Telegram client maps each action onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Plain text. `clear_keyboard` also removes any custom reply keyboard
    /// the client is still showing.
    Plain { text: String, clear_keyboard: bool },
    /// Text with a reply-keyboard grid of button labels. `one_time` tells
    /// the client to dismiss the keyboard after a single selection.
    Menu {
        text: String,
        rows: Vec<Vec<String>>,
        one_time: bool,
    },
}

impl OutboundAction {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain {
            text: text.into(),
            clear_keyboard: false,
        }
    }

    pub fn plain_clear_keyboard(text: impl Into<String>) -> Self {
        Self::Plain {
            text: text.into(),
            clear_keyboard: true,
        }
    }

    pub fn menu(text: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Menu {
            text: text.into(),
            rows,
            one_time: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_exactly() {
        assert_eq!(ContentType::from_label("YouTube"), Some(ContentType::YouTube));
        assert_eq!(Language::from_label("Arabic"), Some(Language::Arabic));
    }

    #[test]
    fn label_matching_is_case_sensitive() {
        assert_eq!(ContentType::from_label("tiktok"), None);
        assert_eq!(Language::from_label("ENGLISH"), None);
    }

    #[test]
    fn commands_are_not_labels() {
        assert_eq!(ContentType::from_label("/trend"), None);
        assert_eq!(Language::from_label(""), None);
    }
}
