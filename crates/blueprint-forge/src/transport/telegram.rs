//! Telegram Bot API adapter for the [`Notifier`] contract, plus the
//! `getUpdates` long-poll loop that feeds the orchestrator.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Affordance, ChatId, MessageRef, Notifier};

pub struct TelegramNotifier {
    http: reqwest::Client,
    base: String,
}

impl TelegramNotifier {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{token}"),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    /// Call a Bot API method and unwrap Telegram's `{ok, result}` envelope.
    async fn call(&self, method: &str, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(self.url(method))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("telegram {method} failed to send"))?;

        let envelope: Value = response
            .json()
            .await
            .with_context(|| format!("telegram {method} returned non-JSON"))?;

        if envelope.get("ok").and_then(Value::as_bool) != Some(true) {
            let desc = envelope
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("telegram {method} rejected: {desc}"));
        }
        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .http
            .post(self.url("getUpdates"))
            // Leave headroom over the server-side long-poll window.
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&json!({ "offset": offset, "timeout": timeout_secs }))
            .send()
            .await
            .context("getUpdates failed")?;

        #[derive(Deserialize)]
        struct Envelope {
            ok: bool,
            #[serde(default)]
            result: Vec<Update>,
        }
        let envelope: Envelope = response.json().await.context("getUpdates returned non-JSON")?;
        if !envelope.ok {
            return Err(anyhow!("getUpdates rejected"));
        }
        Ok(envelope.result)
    }

    /// Acknowledge a button press so the client stops its spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.call("answerCallbackQuery", json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }
}

fn confirm_keyboard(affordance: &Affordance) -> Value {
    json!({
        "inline_keyboard": [[{ "text": affordance.label, "callback_data": affordance.data }]]
    })
}

fn message_ref_from(result: &Value, chat: ChatId) -> Result<MessageRef> {
    let message_id = result
        .get("message_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("telegram response missing message_id"))?;
    Ok(MessageRef { chat, message_id })
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageRef> {
        let result = self
            .call("sendMessage", json!({ "chat_id": chat, "text": text }))
            .await?;
        message_ref_from(&result, chat)
    }

    async fn edit_message(&self, msg: &MessageRef, text: &str) -> Result<()> {
        self.call(
            "editMessageText",
            json!({ "chat_id": msg.chat, "message_id": msg.message_id, "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn edit_with_affordance(
        &self,
        msg: &MessageRef,
        text: &str,
        affordance: &Affordance,
    ) -> Result<()> {
        self.call(
            "editMessageText",
            json!({
                "chat_id": msg.chat,
                "message_id": msg.message_id,
                "text": text,
                "reply_markup": confirm_keyboard(affordance),
            }),
        )
        .await?;
        Ok(())
    }

    async fn remove_affordance(&self, msg: &MessageRef) -> Result<()> {
        self.call(
            "editMessageReplyMarkup",
            json!({ "chat_id": msg.chat, "message_id": msg.message_id }),
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: &MessageRef) -> Result<()> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": msg.chat, "message_id": msg.message_id }),
        )
        .await?;
        Ok(())
    }

    async fn send_file(&self, chat: ChatId, file: &Path, caption: &str) -> Result<()> {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("cannot read archive {}", file.display()))?;
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive.tar.gz".into());
        debug!(%filename, size = bytes.len(), "uploading archive");

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let response = self
            .http
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .context("sendDocument failed to send")?;

        let envelope: Value = response.json().await.context("sendDocument returned non-JSON")?;
        if envelope.get("ok").and_then(Value::as_bool) != Some(true) {
            let desc = envelope
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("sendDocument rejected: {desc}"));
        }
        Ok(())
    }
}

// ── Incoming update schema (the fields we consume) ─────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

impl IncomingMessage {
    pub fn msg_ref(&self) -> MessageRef {
        MessageRef {
            chat: self.chat.id,
            message_id: self.message_id,
        }
    }
}
