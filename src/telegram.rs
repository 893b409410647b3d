//! Telegram transport: inbound update envelope types and the outbound
//! Bot API client.
//!
//! Only the fields the bot consumes are modeled. Inbound parsing is
//! deliberately lenient — anything that doesn't carry a usable message is
//! acknowledged upstream and dropped, never treated as an error.

use crate::error::{Result, TelegramError};
use crate::{ChatId, OutboundAction};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Inbound envelope
// ---------------------------------------------------------------------------

/// One webhook delivery from Telegram.
#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
}

impl Update {
    /// Either the new message or an edit; the bot treats both the same.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Option<Chat>,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl Message {
    /// Prefer `chat.id` so replies land correctly in groups; fall back to
    /// the sender id for stripped-down payloads.
    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat
            .as_ref()
            .map(|chat| chat.id)
            .or_else(|| self.from.as_ref().map(|user| user.id))
    }

    /// Message text, falling back to the media caption, falling back to
    /// empty (a photo with no caption still deserves the help reply).
    pub fn text_or_caption(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct User {
    pub id: ChatId,
}

/// `getMe` result, used to verify the configured token at startup.
#[derive(Debug, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    #[serde(default)]
    pub username: String,
}

// ---------------------------------------------------------------------------
// Outbound client
// ---------------------------------------------------------------------------

/// Long-lived Bot API client. Holds its own credential; constructed once at
/// startup and shared behind the API state.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(TelegramError::Http)?;

        Ok(Self {
            http,
            base_url: format!("{TELEGRAM_API_BASE}/bot{token}"),
        })
    }

    /// Verify the token and fetch the bot's own identity.
    pub async fn get_me(&self) -> Result<BotIdentity> {
        self.call_get("getMe").await
    }

    /// Current webhook configuration, proxied by the diagnostics endpoint.
    pub async fn get_webhook_info(&self) -> Result<serde_json::Value> {
        self.call_get("getWebhookInfo").await
    }

    /// Send one engine action to a chat.
    pub async fn deliver(&self, chat_id: ChatId, action: &OutboundAction) -> Result<()> {
        let payload = payload_for(chat_id, action);
        let _: serde_json::Value = self.call_post("sendMessage", &payload).await?;
        Ok(())
    }

    async fn call_get<T: DeserializeOwned>(&self, method: &str) -> Result<T> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(TelegramError::Http)?;
        read_envelope(response).await
    }

    async fn call_post<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(TelegramError::Http)?;
        read_envelope(response).await
    }
}

/// Unwrap the Bot API `{ok, result, description}` envelope.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TelegramError::Api {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let envelope: ApiEnvelope<T> = response.json().await.map_err(TelegramError::Http)?;
    if !envelope.ok {
        return Err(TelegramError::Rejected {
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_owned()),
        }
        .into());
    }

    match envelope.result {
        Some(result) => Ok(result),
        None => Err(TelegramError::Rejected {
            description: "response missing result field".to_owned(),
        }
        .into()),
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

// ---------------------------------------------------------------------------
// sendMessage payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

#[derive(Debug, Serialize)]
struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    one_time_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

#[derive(Debug, Serialize)]
struct ReplyKeyboardRemove {
    remove_keyboard: bool,
}

fn payload_for(chat_id: ChatId, action: &OutboundAction) -> SendMessagePayload<'_> {
    match action {
        OutboundAction::Plain {
            text,
            clear_keyboard,
        } => SendMessagePayload {
            chat_id,
            text,
            reply_markup: clear_keyboard.then_some(ReplyMarkup::Remove(ReplyKeyboardRemove {
                remove_keyboard: true,
            })),
        },
        OutboundAction::Menu {
            text,
            rows,
            one_time,
        } => SendMessagePayload {
            chat_id,
            text,
            reply_markup: Some(ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
                keyboard: rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|label| KeyboardButton {
                                text: label.clone(),
                            })
                            .collect()
                    })
                    .collect(),
                one_time_keyboard: *one_time,
            })),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -----------------------------------------------------------------------
    // Inbound parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parses_plain_text_update() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 7,
            "message": {
                "chat": {"id": 42},
                "from": {"id": 99},
                "text": "/trend"
            }
        }))
        .unwrap();

        let message = update.message().unwrap();
        assert_eq!(message.chat_id(), Some(42));
        assert_eq!(message.text_or_caption(), "/trend");
    }

    #[test]
    fn edited_message_is_treated_like_a_message() {
        let update: Update = serde_json::from_value(json!({
            "edited_message": {
                "chat": {"id": 5},
                "text": "YouTube"
            }
        }))
        .unwrap();

        let message = update.message().unwrap();
        assert_eq!(message.chat_id(), Some(5));
        assert_eq!(message.text_or_caption(), "YouTube");
    }

    #[test]
    fn caption_stands_in_for_missing_text() {
        let update: Update = serde_json::from_value(json!({
            "message": {
                "chat": {"id": 5},
                "caption": "/buy"
            }
        }))
        .unwrap();

        assert_eq!(update.message().unwrap().text_or_caption(), "/buy");
    }

    #[test]
    fn chat_id_falls_back_to_sender_id() {
        let update: Update = serde_json::from_value(json!({
            "message": {
                "from": {"id": 31},
                "text": "hi"
            }
        }))
        .unwrap();

        assert_eq!(update.message().unwrap().chat_id(), Some(31));
    }

    #[test]
    fn update_without_message_yields_none() {
        let update: Update = serde_json::from_value(json!({"update_id": 1})).unwrap();
        assert!(update.message().is_none());
    }

    // -----------------------------------------------------------------------
    // Outbound payload shapes
    // -----------------------------------------------------------------------

    #[test]
    fn plain_reply_omits_reply_markup() {
        let payload = serde_json::to_value(payload_for(5, &OutboundAction::plain("hello"))).unwrap();

        assert_eq!(payload["chat_id"], 5);
        assert_eq!(payload["text"], "hello");
        assert!(payload.get("reply_markup").is_none());
    }

    #[test]
    fn clear_keyboard_reply_carries_removal_flag() {
        let payload = serde_json::to_value(payload_for(
            5,
            &OutboundAction::plain_clear_keyboard("packages"),
        ))
        .unwrap();

        assert_eq!(payload["reply_markup"]["remove_keyboard"], true);
    }

    #[test]
    fn menu_reply_serializes_keyboard_grid() {
        let rows = vec![
            vec!["TikTok".to_owned(), "YouTube".to_owned()],
            vec!["General".to_owned(), "Custom".to_owned()],
        ];
        let payload =
            serde_json::to_value(payload_for(5, &OutboundAction::menu("Choose:", rows))).unwrap();

        let markup = &payload["reply_markup"];
        assert_eq!(markup["one_time_keyboard"], true);
        assert_eq!(markup["keyboard"][0][0]["text"], "TikTok");
        assert_eq!(markup["keyboard"][1][1]["text"], "Custom");
    }
}
