// # Telegram Bot API transport
//
// Minimal long-polling client: only the five methods the daemon needs.
// Everything here is plumbing; what to show is decided by `SessionEngine`.
//
// ## Security Requirements
//
// - The bot token is part of every request URL; URLs are never logged and
//   reqwest errors are stripped of them before they propagate

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use zonebot_core::engine::render::{Keyboard, Notice, Screen};
use zonebot_core::{Event, UserId};

/// Telegram refuses callback answers longer than this
const CALLBACK_TEXT_LIMIT: usize = 200;

/// Edit failure Telegram reports when the new content equals the old
const NOT_MODIFIED: &str = "message is not modified";

/// Chat identifier
pub type ChatId = i64;

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// One entry from `getUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.label.clone(),
                            callback_data: button.action.encode(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

// ── Inbound ─────────────────────────────────────────────────────────

/// An update the daemon knows how to dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A text message
    Text {
        chat: ChatId,
        user: UserId,
        text: String,
    },

    /// A button press on one of the bot's messages
    Callback {
        id: String,
        chat: ChatId,
        message_id: i64,
        user: UserId,
        data: String,
    },
}

impl Inbound {
    /// Extract the dispatchable part of an update
    ///
    /// Updates without a sender, text or callback data are ignored.
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(query) = update.callback_query {
            let message = query.message?;
            return Some(Inbound::Callback {
                id: query.id,
                chat: message.chat.id,
                message_id: message.message_id,
                user: query.from.id,
                data: query.data.unwrap_or_default(),
            });
        }

        let message = update.message?;
        Some(Inbound::Text {
            chat: message.chat.id,
            user: message.from?.id,
            text: message.text?,
        })
    }

    /// Sender identity
    pub fn user(&self) -> UserId {
        match self {
            Inbound::Text { user, .. } | Inbound::Callback { user, .. } => *user,
        }
    }

    /// Engine event for this update
    pub fn event(&self) -> Event {
        match self {
            Inbound::Text { user, text, .. } if is_start_command(text) => Event::Start(*user),
            Inbound::Text { user, text, .. } => Event::Text(*user, text.clone()),
            Inbound::Callback { user, data, .. } => Event::Select(*user, data.clone()),
        }
    }
}

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

// ── Client ──────────────────────────────────────────────────────────

/// Telegram Bot API client
#[derive(Clone)]
pub struct BotApi {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApi")
            .field("bot_token", &"<REDACTED>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl BotApi {
    /// Create a client for the bot identified by `token`
    pub fn new(base_url: &str, token: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
            request_timeout,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Value,
        timeout: Duration,
    ) -> Result<ApiReply<T>> {
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} request failed", method))?;

        response
            .json::<ApiReply<T>>()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} returned an unreadable response", method))
    }

    async fn invoke<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let reply = self.call::<T>(method, &params, self.request_timeout).await?;
        if !reply.ok {
            bail!(
                "{} failed: {}",
                method,
                reply.description.unwrap_or_else(|| "no description".to_string())
            );
        }
        Ok(reply.result)
    }

    /// Switch the bot to long polling
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        self.invoke::<Value>(
            "deleteWebhook",
            json!({ "drop_pending_updates": drop_pending_updates }),
        )
        .await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, poll_timeout: Duration) -> Result<Vec<Update>> {
        let params = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        let reply = self
            .call::<Vec<Update>>("getUpdates", &params, self.request_timeout + poll_timeout)
            .await?;
        if !reply.ok {
            bail!(
                "getUpdates failed: {}",
                reply.description.unwrap_or_default()
            );
        }
        Ok(reply.result.unwrap_or_default())
    }

    /// Send `screen` as a new message
    pub async fn send_message(&self, chat: ChatId, screen: &Screen) -> Result<()> {
        let mut params = json!({
            "chat_id": chat,
            "text": screen.text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = &screen.keyboard {
            params["reply_markup"] = serde_json::to_value(InlineKeyboardMarkup::from(keyboard))?;
        }
        self.invoke::<Value>("sendMessage", params).await?;
        Ok(())
    }

    /// Replace the content of an existing message with `screen`
    ///
    /// Re-rendering an identical screen is not an error.
    pub async fn edit_message(&self, chat: ChatId, message_id: i64, screen: &Screen) -> Result<()> {
        let keyboard = screen.keyboard.clone().unwrap_or_default();
        let params = json!({
            "chat_id": chat,
            "message_id": message_id,
            "text": screen.text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
            "reply_markup": InlineKeyboardMarkup::from(&keyboard),
        });

        let reply = self
            .call::<Value>("editMessageText", &params, self.request_timeout)
            .await?;
        if reply.ok {
            return Ok(());
        }
        let description = reply.description.unwrap_or_default();
        if description.contains(NOT_MODIFIED) {
            tracing::debug!(chat, message_id, "Screen unchanged, edit skipped");
            return Ok(());
        }
        bail!("editMessageText failed: {}", description)
    }

    /// Acknowledge a button press, optionally with a toast or alert
    pub async fn answer_callback(&self, callback_id: &str, notice: Option<&Notice>) -> Result<()> {
        let mut params = json!({ "callback_query_id": callback_id });
        if let Some(notice) = notice {
            params["text"] = Value::String(clip(&notice.text, CALLBACK_TEXT_LIMIT));
            params["show_alert"] = Value::Bool(notice.alert);
        }
        self.invoke::<Value>("answerCallbackQuery", params).await?;
        Ok(())
    }
}

fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonebot_core::Action;

    fn update(value: Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_start_command_becomes_start_event() {
        let inbound = Inbound::from_update(update(json!({
            "update_id": 1,
            "message": {"message_id": 5, "chat": {"id": 7}, "from": {"id": 42}, "text": "/start"}
        })))
        .unwrap();

        assert_eq!(inbound.user(), 42);
        assert_eq!(inbound.event(), Event::Start(42));

        let other = Inbound::Text {
            chat: 7,
            user: 42,
            text: "/starting".to_string(),
        };
        assert_eq!(other.event(), Event::Text(42, "/starting".to_string()));
    }

    #[test]
    fn test_callback_becomes_select_event() {
        let inbound = Inbound::from_update(update(json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 42},
                "data": "zones",
                "message": {"message_id": 9, "chat": {"id": 7}}
            }
        })))
        .unwrap();

        assert_eq!(
            inbound,
            Inbound::Callback {
                id: "cb1".to_string(),
                chat: 7,
                message_id: 9,
                user: 42,
                data: "zones".to_string(),
            }
        );
        assert_eq!(inbound.event(), Event::Select(42, "zones".to_string()));
    }

    #[test]
    fn test_updates_without_text_are_ignored() {
        let sticker = update(json!({
            "update_id": 3,
            "message": {"message_id": 5, "chat": {"id": 7}, "from": {"id": 42}}
        }));
        assert!(Inbound::from_update(sticker).is_none());

        let empty = update(json!({"update_id": 4}));
        assert!(Inbound::from_update(empty).is_none());
    }

    #[test]
    fn test_keyboard_markup_uses_encoded_actions() {
        let keyboard = Keyboard::new()
            .button("Zones", Action::Zones)
            .row(vec![]);
        let markup = InlineKeyboardMarkup::from(&keyboard);

        assert_eq!(
            serde_json::to_value(markup).unwrap(),
            json!({"inline_keyboard": [[{"text": "Zones", "callback_data": "zones"}]]})
        );
    }

    #[test]
    fn test_reply_parsing() {
        let reply: ApiReply<Value> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is not modified"
        }))
        .unwrap();
        assert!(!reply.ok);
        assert!(reply.description.unwrap().contains(NOT_MODIFIED));
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 2), "hé");
        assert_eq!(clip("ok", 200), "ok");
    }

    #[test]
    fn test_debug_hides_token() {
        let api =
            BotApi::new("https://api.telegram.org", "123:secret", Duration::from_secs(5)).unwrap();
        assert!(!format!("{:?}", api).contains("secret"));
    }
}
