//! File synthesis pipeline.
//!
//! Strictly sequential in manifest order — later files see a rolling
//! summary of earlier ones — with per-file failure tolerance: a bad path,
//! a timeout, or an empty response costs that one file, never the batch.
//! The requester gets everything that could be produced.

use std::path::Path;

use tracing::{error, info, warn};

use crate::blueprint::Blueprint;
use crate::client::{ChatOptions, ChatRequest, ChatService};
use crate::config::GenerationParams;
use crate::context::ContextMemory;
use crate::error::FileError;
use crate::fences;
use crate::prompts;
use crate::sandbox;
use crate::transport::StatusMessage;
use crate::verify;

/// Outcome of one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Synthesized and written.
    Written,
    /// Written, but the syntax check failed; the file carries a TODO banner.
    SyntaxFlagged,
    /// Path failed sanitization; nothing was written.
    Skipped,
    /// Generation failed (timeout, empty response, service or I/O error).
    Failed,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: String,
    pub status: FileStatus,
    pub error: Option<String>,
}

/// Per-file record of one build run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub entries: Vec<FileOutcome>,
}

impl BuildReport {
    fn record(&mut self, path: impl Into<String>, status: FileStatus, error: Option<String>) {
        self.entries.push(FileOutcome {
            path: path.into(),
            status,
            error,
        });
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Everything that landed in the archive (clean or flagged).
    pub fn written(&self) -> usize {
        self.count(FileStatus::Written) + self.count(FileStatus::SyntaxFlagged)
    }

    /// One-line summary for the delivery caption.
    pub fn summary_line(&self) -> String {
        let mut line = format!("✅ {} file(s) written", self.written());
        let flagged = self.count(FileStatus::SyntaxFlagged);
        if flagged > 0 {
            line.push_str(&format!(", {flagged} flagged for syntax"));
        }
        let skipped = self.count(FileStatus::Skipped);
        if skipped > 0 {
            line.push_str(&format!(", {skipped} skipped"));
        }
        let failed = self.count(FileStatus::Failed);
        if failed > 0 {
            line.push_str(&format!(", {failed} failed"));
        }
        line
    }
}

/// Synthesize every manifest entry into `working_dir`.
///
/// Creates the sandbox, walks the manifest in order, and returns a report
/// covering every entry. Never aborts early; cleanup belongs to the
/// packager, not here.
pub async fn build(
    service: &dyn ChatService,
    params: &GenerationParams,
    blueprint: &Blueprint,
    working_dir: &Path,
    status: &StatusMessage<'_>,
) -> BuildReport {
    let mut report = BuildReport::default();
    let mut memory = ContextMemory::new();
    let total = blueprint.files.len();

    if let Err(e) = tokio::fs::create_dir_all(working_dir).await {
        error!(dir = %working_dir.display(), "failed to create sandbox: {e}");
        for spec in &blueprint.files {
            report.record(
                spec.filepath.clone(),
                FileStatus::Failed,
                Some(format!("sandbox unavailable: {e}")),
            );
        }
        return report;
    }

    for (index, spec) in blueprint.files.iter().enumerate() {
        let ordinal = index + 1;

        let safe_path = match sandbox::sanitize_relative(&spec.filepath) {
            Ok(p) => p,
            Err(e) => {
                let err = FileError::InvalidPath(e);
                warn!(raw = %spec.filepath, "skipping file: {err}");
                status
                    .update(&format!("⚠️ [{ordinal}/{total}] skipped `{}`: {err}", spec.filepath))
                    .await;
                report.record(spec.filepath.clone(), FileStatus::Skipped, Some(err.to_string()));
                continue;
            }
        };

        status
            .update(&format!("⏳ [{ordinal}/{total}] writing `{safe_path}`…"))
            .await;

        match synthesize_one(service, params, &safe_path, &spec.description, &memory, working_dir)
            .await
        {
            Ok(code) => {
                memory.push(&safe_path, &code);

                let full_path = working_dir.join(&safe_path);
                if verify::is_checkable(&safe_path) {
                    if let Some(syntax_err) = verify::check_python(&full_path).await {
                        warn!(path = %safe_path, "syntax check failed, flagging file");
                        let flagged = verify::flag_content(&syntax_err, &code);
                        if let Err(e) = tokio::fs::write(&full_path, flagged).await {
                            report.record(safe_path, FileStatus::Failed, Some(e.to_string()));
                            continue;
                        }
                        report.record(safe_path, FileStatus::SyntaxFlagged, Some(syntax_err));
                        continue;
                    }
                }
                info!(path = %safe_path, ordinal, total, "file written");
                report.record(safe_path, FileStatus::Written, None);
            }
            Err(e) => {
                warn!(path = %safe_path, ordinal, total, "file generation failed: {e}");
                status
                    .update(&format!("❌ [{ordinal}/{total}] failed `{safe_path}`: {e}"))
                    .await;
                report.record(safe_path, FileStatus::Failed, Some(e.to_string()));
            }
        }
    }

    report
}

/// One per-file exchange: prompt with rolling context, bounded call,
/// fence strip, write. Returns the written content for memory/flagging.
async fn synthesize_one(
    service: &dyn ChatService,
    params: &GenerationParams,
    safe_path: &str,
    description: &str,
    memory: &ContextMemory,
    working_dir: &Path,
) -> Result<String, FileError> {
    let full_path = working_dir.join(safe_path);
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FileError::Other(format!("mkdir failed: {e}")))?;
    }

    let request = ChatRequest::single(
        params.model.clone(),
        prompts::file_prompt(safe_path, description, &memory.render()),
        ChatOptions {
            temperature: params.temperature,
            num_predict: params.num_predict,
        },
    );

    let raw = match tokio::time::timeout(params.deadline, service.chat(request)).await {
        Ok(Ok(content)) => content,
        Ok(Err(e)) => return Err(FileError::Other(e.to_string())),
        Err(_) => return Err(FileError::Timeout(params.deadline.as_secs())),
    };

    if raw.trim().is_empty() {
        return Err(FileError::EmptyGeneration);
    }
    let code = fences::strip_fences(&raw);
    if code.trim().is_empty() {
        return Err(FileError::EmptyGeneration);
    }

    tokio::fs::write(&full_path, &code)
        .await
        .map_err(|e| FileError::Other(format!("write failed: {e}")))?;
    Ok(code)
}
