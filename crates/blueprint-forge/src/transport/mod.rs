//! Transport collaborator contract.
//!
//! The pipeline reports progress and delivers archives through this trait
//! and never reasons about retries, rate limits, or formatting beyond
//! plain text. The production implementation is [`telegram`]; tests use
//! recording fakes.

pub mod telegram;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

/// One requester conversation.
pub type ChatId = i64;

/// Handle to a sent message, used for in-place edits and deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: i64,
}

/// A single confirmation button attached to a message.
#[derive(Debug, Clone)]
pub struct Affordance {
    pub label: String,
    /// Opaque callback payload echoed back on press.
    pub data: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageRef>;

    async fn edit_message(&self, msg: &MessageRef, text: &str) -> Result<()>;

    /// Edit a message and attach (or replace) its confirmation button.
    async fn edit_with_affordance(
        &self,
        msg: &MessageRef,
        text: &str,
        affordance: &Affordance,
    ) -> Result<()>;

    /// Strip the confirmation button so it cannot be pressed twice.
    async fn remove_affordance(&self, msg: &MessageRef) -> Result<()>;

    async fn delete_message(&self, msg: &MessageRef) -> Result<()>;

    /// Deliver a file with a caption.
    async fn send_file(&self, chat: ChatId, file: &Path, caption: &str) -> Result<()>;
}

/// One status message edited in place across phase transitions, so the
/// chat is not flooded with per-file messages. Edit failures are logged
/// and swallowed — progress reporting must never break a build.
pub struct StatusMessage<'a> {
    notifier: &'a dyn Notifier,
    msg: MessageRef,
}

impl<'a> StatusMessage<'a> {
    pub fn new(notifier: &'a dyn Notifier, msg: MessageRef) -> Self {
        Self { notifier, msg }
    }

    pub fn msg(&self) -> &MessageRef {
        &self.msg
    }

    pub async fn update(&self, text: &str) {
        if let Err(e) = self.notifier.edit_message(&self.msg, text).await {
            warn!("status update failed: {e}");
        }
    }

    /// Delete the status message once the run has nothing more to say.
    pub async fn clear(&self) {
        if let Err(e) = self.notifier.delete_message(&self.msg).await {
            warn!("status delete failed: {e}");
        }
    }
}
