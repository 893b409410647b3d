//! The conversation engine: quota gating and the menu dialogue.
//!
//! `handle` is an ordered decision list over the inbound text; the first
//! matching rule wins and the order is part of the contract. The engine
//! never returns an error — generator failures degrade to a fixed reply and
//! everything else is a user-visible fallback, so the webhook can always
//! acknowledge.

use crate::llm::ScriptGenerator;
use crate::store::UserStateStore;
use crate::{ChatId, ContentType, Language, OutboundAction};

use chrono::Utc;
use std::sync::Arc;

const NO_TEXT_REPLY: &str = "Send /trend to start or /help for commands.";

const QUOTA_EXHAUSTED_REPLY: &str = "🚫 You have no tries left. Use /buy, /earn or /invite.";

const CHOOSE_CONTENT_TYPE_REPLY: &str = "Choose content type:";

const CHOOSE_LANGUAGE_REPLY: &str = "Choose language:";

const BUY_REPLY: &str = "Choose package:\n\
    1️⃣ $2 = 5 tries\n\
    2️⃣ $5 = 1 week unlimited\n\
    3️⃣ $10 = 1 month unlimited\n\
    4️⃣ $60 = 1 year (50% off)";

const EARN_REPLY: &str = "Get extra free try! Follow one of the platforms below and send a screenshot:\n\
    \n\
    1️⃣ Facebook: https://facebook.com/soundous.Eco\n\
    2️⃣ YouTube: https://youtube.com/@Xrst_vente\n\
    3️⃣ Instagram: https://instagram.com/@Xrst_vente\n\
    4️⃣ TikTok: https://tiktok.com/@Xrst_vente\n\
    (Max 3 per day)";

/// Labels of the follow-and-screenshot tasks, menu order.
const EARN_TASKS: [&str; 4] = ["Facebook", "YouTube", "Instagram", "TikTok"];

const INVITE_REPLY: &str = "Share your bot link:\n\
    https://t.me/TrendForgeIdeasBot\n\
    Each new user = +5 free tries (max 3 per day).";

const UNRECOGNIZED_REPLY: &str =
    "Command not recognized. Send /trend to start or /help for available commands.";

const GENERATION_FAILED_REPLY: &str =
    "⚠️ Something went wrong while writing your script. Please try again in a moment.";

/// Decides replies and state transitions for one inbound message.
pub struct ConversationEngine {
    store: Arc<dyn UserStateStore>,
    generator: Arc<dyn ScriptGenerator>,
}

impl ConversationEngine {
    pub fn new(store: Arc<dyn UserStateStore>, generator: Arc<dyn ScriptGenerator>) -> Self {
        Self { store, generator }
    }

    /// Handle one inbound text for one chat.
    ///
    /// Commands always interrupt an in-flight menu selection; language
    /// labels only match while a content type is pending; content-type
    /// labels are accepted in either dialogue state (re-selection simply
    /// overwrites the pending value).
    pub async fn handle(&self, chat_id: ChatId, raw_text: &str) -> Vec<OutboundAction> {
        let text = raw_text.trim();

        if text.is_empty() {
            return vec![OutboundAction::plain(NO_TEXT_REPLY)];
        }

        let record = self.store.get_or_create(chat_id).await;
        // Held for the rest of the handling, including the generation
        // round-trip: a second message from the same user waits here, so
        // quota decrement and pending-field read/clear stay atomic per user.
        let mut record = record.lock().await;

        if text == "/trend" {
            let subscribed = record.has_active_subscription(Utc::now());
            if !subscribed && record.tries_left <= 0 {
                // Must not mutate anything: the exhausted reply is
                // repeatable without burning state.
                return vec![OutboundAction::plain(QUOTA_EXHAUSTED_REPLY)];
            }
            record.clear_pending();
            if !subscribed {
                record.tries_left -= 1;
            }
            vec![OutboundAction::menu(
                CHOOSE_CONTENT_TYPE_REPLY,
                content_type_keyboard(),
            )]
        } else if text.starts_with("/buy") {
            record.clear_pending();
            vec![OutboundAction::plain_clear_keyboard(BUY_REPLY)]
        } else if text.starts_with("/earn") {
            record.clear_pending();
            vec![OutboundAction::menu(EARN_REPLY, earn_keyboard())]
        } else if text.starts_with("/invite") {
            record.clear_pending();
            vec![OutboundAction::plain(INVITE_REPLY)]
        } else if let Some(content_type) = ContentType::from_label(text) {
            record.pending_content_type = Some(content_type);
            vec![OutboundAction::menu(
                CHOOSE_LANGUAGE_REPLY,
                language_keyboard(),
            )]
        } else if let Some(language) = Language::from_label(text)
            && let Some(content_type) = record.pending_content_type
        {
            // Selection complete. Return the dialogue to idle before the
            // generation call so a failure cannot re-arm the menu flow.
            record.pending_language = Some(language);
            record.clear_pending();

            match self.generator.generate(content_type, language).await {
                Ok(script) => vec![OutboundAction::plain(script)],
                Err(error) => {
                    tracing::warn!(
                        chat_id,
                        %content_type,
                        %language,
                        %error,
                        "script generation failed"
                    );
                    vec![OutboundAction::plain(GENERATION_FAILED_REPLY)]
                }
            }
        } else {
            // Includes a language label sent with no content type in
            // flight — there is nothing to attach it to.
            vec![OutboundAction::plain(UNRECOGNIZED_REPLY)]
        }
    }
}

// Menus are built from the same label tables the matcher parses, so the
// buttons and the recognizer cannot drift apart.

fn content_type_keyboard() -> Vec<Vec<String>> {
    two_by_two(ContentType::ALL.map(ContentType::label))
}

fn language_keyboard() -> Vec<Vec<String>> {
    two_by_two(Language::ALL.map(Language::label))
}

fn earn_keyboard() -> Vec<Vec<String>> {
    two_by_two(EARN_TASKS)
}

fn two_by_two(labels: [&str; 4]) -> Vec<Vec<String>> {
    vec![
        vec![labels[0].to_owned(), labels[1].to_owned()],
        vec![labels[2].to_owned(), labels[3].to_owned()],
    ]
}
