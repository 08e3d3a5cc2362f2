//! Shared fakes for integration tests: a scripted generation service and
//! a recording transport that snapshots delivered archives before the
//! packager deletes them.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;

use blueprint_forge::blueprint::{Blueprint, FileSpec};
use blueprint_forge::client::{ChatRequest, ChatService};
use blueprint_forge::config::ForgeConfig;
use blueprint_forge::transport::{Affordance, ChatId, MessageRef, Notifier};

// ── Scripted generation service ────────────────────────────────────────

/// What the fake service does for one call, in call order.
pub enum Step {
    Reply(String),
    Empty,
    /// Never resolves; pair with `start_paused` so the deadline fires.
    Hang,
}

pub struct ScriptedService {
    steps: Mutex<Vec<Step>>,
}

impl ScriptedService {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps),
        }
    }
}

#[async_trait]
impl ChatService for ScriptedService {
    async fn chat(&self, _request: ChatRequest) -> Result<String> {
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.is_empty() {
                return Err(anyhow!("scripted service ran out of steps"));
            }
            steps.remove(0)
        };
        match step {
            Step::Reply(text) => Ok(text),
            Step::Empty => Ok(String::new()),
            Step::Hang => std::future::pending().await,
        }
    }
}

// ── Recording transport ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Sent { id: i64, text: String },
    Edited { id: i64, text: String },
    EditedWithAffordance { id: i64, text: String, data: String },
    AffordanceRemoved { id: i64 },
    Deleted { id: i64 },
    FileSent { caption: String },
}

#[derive(Default)]
pub struct RecordingNotifier {
    next_id: AtomicI64,
    pub events: Mutex<Vec<Event>>,
    /// (path, content) entries of every delivered archive, captured at
    /// delivery time because the packager deletes the file afterwards.
    pub archive_entries: Mutex<Vec<(String, String)>>,
    /// When set, `send_file` fails to exercise the cleanup-on-failure path.
    pub fail_delivery: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_delivery() -> Self {
        Self {
            fail_delivery: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn archived_paths(&self) -> Vec<String> {
        self.archive_entries
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn archived_content(&self, suffix: &str) -> Option<String> {
        self.archive_entries
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.ends_with(suffix))
            .map(|(_, c)| c.clone())
    }

    /// The last in-place edit of a given message, i.e. its final status.
    pub fn last_edit_text(&self, id: i64) -> Option<String> {
        self.events()
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::Edited { id: i, text } if *i == id => Some(text.clone()),
                Event::EditedWithAffordance { id: i, text, .. } if *i == id => Some(text.clone()),
                _ => None,
            })
    }

    pub fn last_affordance_data(&self) -> Option<String> {
        self.events().iter().rev().find_map(|e| match e {
            Event::EditedWithAffordance { data, .. } => Some(data.clone()),
            _ => None,
        })
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageRef> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.push(Event::Sent {
            id: message_id,
            text: text.to_string(),
        });
        Ok(MessageRef { chat, message_id })
    }

    async fn edit_message(&self, msg: &MessageRef, text: &str) -> Result<()> {
        self.push(Event::Edited {
            id: msg.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn edit_with_affordance(
        &self,
        msg: &MessageRef,
        text: &str,
        affordance: &Affordance,
    ) -> Result<()> {
        self.push(Event::EditedWithAffordance {
            id: msg.message_id,
            text: text.to_string(),
            data: affordance.data.clone(),
        });
        Ok(())
    }

    async fn remove_affordance(&self, msg: &MessageRef) -> Result<()> {
        self.push(Event::AffordanceRemoved { id: msg.message_id });
        Ok(())
    }

    async fn delete_message(&self, msg: &MessageRef) -> Result<()> {
        self.push(Event::Deleted { id: msg.message_id });
        Ok(())
    }

    async fn send_file(&self, _chat: ChatId, file: &Path, caption: &str) -> Result<()> {
        if self.fail_delivery {
            return Err(anyhow!("simulated transport outage"));
        }
        // Snapshot the archive now; it will be gone after cleanup.
        let tar = GzDecoder::new(std::fs::File::open(file)?);
        let mut archive = tar::Archive::new(tar);
        let mut captured = self.archive_entries.lock().unwrap();
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path()?.to_string_lossy().into_owned();
            let mut content = String::new();
            use std::io::Read as _;
            entry.read_to_string(&mut content)?;
            captured.push((path, content));
        }
        self.push(Event::FileSent {
            caption: caption.to_string(),
        });
        Ok(())
    }
}

// ── Builders ───────────────────────────────────────────────────────────

pub fn test_config(build_root: &Path) -> ForgeConfig {
    ForgeConfig {
        telegram_token: "test-token".into(),
        generation_api_key: "test-key".into(),
        generation_base_url: "http://localhost:0".into(),
        model: "test-model".into(),
        max_files: 10,
        blueprint_ttl: Duration::from_secs(3600),
        draft_timeout: Duration::from_secs(60),
        file_timeout: Duration::from_secs(120),
        build_root: build_root.to_path_buf(),
    }
}

pub fn blueprint(name: &str, paths: &[&str]) -> Blueprint {
    Blueprint {
        project_name: name.into(),
        summary: "test project".into(),
        files: paths
            .iter()
            .map(|p| FileSpec {
                filepath: (*p).to_string(),
                description: format!("logic for {p}"),
            })
            .collect(),
    }
}

pub fn manifest_json(paths: &[&str]) -> String {
    serde_json::to_string(&blueprint("Test Project", paths)).unwrap()
}

pub fn python3_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_ok()
}
