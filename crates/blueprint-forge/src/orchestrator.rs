//! Session orchestration: wires the draft and build phases to the
//! transport, owns the confirmation handshake, and keeps all progress in
//! one status message per run.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::client::ChatService;
use crate::config::ForgeConfig;
use crate::draft;
use crate::error::ConfirmError;
use crate::naming;
use crate::package;
use crate::pipeline;
use crate::sandbox;
use crate::store::BlueprintStore;
use crate::transport::{Affordance, ChatId, MessageRef, Notifier, StatusMessage};

const USAGE_HINT: &str =
    "💡 Usage: /create <what you want>\nExample: /create a Python FastAPI backend with auth";

pub const CONFIRM_LABEL: &str = "🚀 Build & ship";

pub struct Orchestrator {
    config: ForgeConfig,
    store: Arc<BlueprintStore>,
    service: Arc<dyn ChatService>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        config: ForgeConfig,
        store: Arc<BlueprintStore>,
        service: Arc<dyn ChatService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            service,
            notifier,
        }
    }

    /// Phase 1: draft a blueprint and offer the confirmation button.
    pub async fn handle_create(&self, chat: ChatId, request: &str) {
        let session = chat.to_string();
        let request = request.trim();
        if request.is_empty() {
            if let Err(e) = self.notifier.send_message(chat, USAGE_HINT).await {
                warn!(session = %session, "failed to send usage hint: {e}");
            }
            return;
        }

        let status_msg = match self
            .notifier
            .send_message(chat, "⏳ Drafting the architecture…")
            .await
        {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session = %session, "cannot open status message: {e}");
                return;
            }
        };

        let outcome = draft::draft(
            self.service.as_ref(),
            self.store.as_ref(),
            &self.config.draft_params(),
            self.config.max_files,
            &session,
            request,
        )
        .await;

        match outcome {
            Ok(out) => {
                let text = draft_listing(&out.blueprint, self.config.max_files);
                let affordance = Affordance {
                    label: CONFIRM_LABEL.into(),
                    data: format!("build|{session}|{}", out.draft_id.simple()),
                };
                if let Err(e) = self
                    .notifier
                    .edit_with_affordance(&status_msg, &text, &affordance)
                    .await
                {
                    warn!(session = %session, "failed to present draft: {e}");
                }
            }
            Err(e) => {
                info!(session = %session, "draft failed: {e}");
                let status = StatusMessage::new(self.notifier.as_ref(), status_msg);
                status.update(&e.user_message()).await;
            }
        }
    }

    /// Phase 2: confirmation pressed — build, package, deliver, clean up.
    ///
    /// `data` is the affordance payload (`build|<session>|<draft_id>`);
    /// `source` is the message carrying the button, reused as the progress
    /// message for the whole run.
    pub async fn handle_confirm(&self, chat: ChatId, data: &str, source: MessageRef) {
        self.store.sweep(Instant::now());

        // Strip the button first so a second press has nothing to hit.
        // Best-effort only; the store lock below is the real guarantee.
        if let Err(e) = self.notifier.remove_affordance(&source).await {
            warn!("failed to remove confirmation button: {e}");
        }

        let Some((session, draft_id)) = parse_confirm_data(data, chat) else {
            warn!(chat, data, "ignoring malformed confirmation payload");
            return;
        };

        let status = StatusMessage::new(self.notifier.as_ref(), source);

        let blueprint = match self.store.confirm(&session, draft_id) {
            Ok(bp) => bp,
            Err(e) => {
                status.update(e.user_message()).await;
                return;
            }
        };

        if !self.store.try_lock(&session) {
            status
                .update(ConfirmError::BuildInProgress.user_message())
                .await;
            return;
        }

        let working_dir = self
            .config
            .build_root
            .join(format!("build_{session}_{}", naming::short_suffix()));

        info!(
            session = %session,
            project = %blueprint.project_name,
            files = blueprint.files.len(),
            dir = %working_dir.display(),
            "build confirmed"
        );
        status
            .update(&format!("🚀 Building {} file(s)…", blueprint.files.len()))
            .await;

        let report = pipeline::build(
            self.service.as_ref(),
            &self.config.file_params(),
            &blueprint,
            &working_dir,
            &status,
        )
        .await;

        status.update("📦 All files processed. Packaging…").await;

        let caption = format!(
            "🎉 Project {} is ready!\n\n{}",
            blueprint.project_name,
            report.summary_line()
        );
        let delivery = package::package_and_cleanup(
            self.notifier.as_ref(),
            chat,
            self.store.as_ref(),
            &session,
            &working_dir,
            &blueprint.project_name,
            &caption,
        )
        .await;

        match delivery {
            Ok(()) => status.clear().await,
            Err(e) => status.update(&format!("❌ Failed to deliver the archive: {e}")).await,
        }
    }
}

/// Parse and authenticate a confirmation payload. The embedded session
/// must match the chat the button came from.
fn parse_confirm_data(data: &str, chat: ChatId) -> Option<(String, Uuid)> {
    let mut parts = data.split('|');
    if parts.next() != Some("build") {
        return None;
    }
    let session = parts.next()?;
    if session != chat.to_string() {
        return None;
    }
    let draft_id = Uuid::parse_str(parts.next()?).ok()?;
    Some((session.to_string(), draft_id))
}

/// The confirmation text: project name plus the sanitized file listing.
fn draft_listing(blueprint: &crate::blueprint::Blueprint, max_files: usize) -> String {
    let mut text = format!(
        "📝 Draft: {}\nFiles ({}/{max_files}):\n",
        blueprint.project_name,
        blueprint.files.len()
    );
    for (i, spec) in blueprint.files.iter().enumerate() {
        match sandbox::sanitize_relative(&spec.filepath) {
            Ok(safe) => text.push_str(&format!("{}. `{safe}`\n", i + 1)),
            Err(_) => text.push_str(&format!("{}. ⚠️ `{}` (invalid path)\n", i + 1, spec.filepath)),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use crate::blueprint::{Blueprint, FileSpec};

    use super::*;

    #[test]
    fn confirm_data_round_trips() {
        let id = Uuid::new_v4();
        let data = format!("build|42|{}", id.simple());
        let (session, parsed) = parse_confirm_data(&data, 42).unwrap();
        assert_eq!(session, "42");
        assert_eq!(parsed, id);
    }

    #[test]
    fn confirm_data_for_other_chat_is_rejected() {
        let data = format!("build|42|{}", Uuid::new_v4().simple());
        assert!(parse_confirm_data(&data, 43).is_none());
    }

    #[test]
    fn malformed_confirm_data_is_rejected() {
        assert!(parse_confirm_data("build|42", 42).is_none());
        assert!(parse_confirm_data("nuke|42|abc", 42).is_none());
        assert!(parse_confirm_data("build|42|not-a-uuid", 42).is_none());
    }

    #[test]
    fn listing_marks_invalid_paths() {
        let bp = Blueprint {
            project_name: "P".into(),
            summary: String::new(),
            files: vec![
                FileSpec { filepath: "main.py".into(), description: String::new() },
                FileSpec { filepath: "../evil.sh".into(), description: String::new() },
            ],
        };
        let text = draft_listing(&bp, 10);
        assert!(text.contains("1. `main.py`"));
        assert!(text.contains("invalid path"));
        assert!(text.contains("(2/10)"));
    }
}
