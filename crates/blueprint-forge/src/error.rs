//! Error taxonomy for the two pipeline phases.
//!
//! Drafting errors are fatal to that draft attempt and never touch the
//! store. Per-file errors are recorded in the build report and never abort
//! the batch. Nothing here propagates as a process crash; the orchestrator
//! renders every variant as user-visible status text.

use thiserror::Error;

use crate::sandbox::PathError;

/// Failures of the drafting phase. All of these leave the store untouched.
#[derive(Debug, Error)]
pub enum DraftError {
    /// The generation service did not answer within the draft deadline.
    #[error("draft timed out after {0}s")]
    Timeout(u64),

    /// The response was not a parseable blueprint payload.
    #[error("draft response was malformed: {0}")]
    Malformed(String),

    /// The service designed a project with zero files.
    #[error("draft contained no files")]
    Empty,

    /// The service designed more files than the hard ceiling allows.
    /// Never truncated — the requester is asked to narrow scope.
    #[error("draft designed {designed} files, limit is {max}")]
    TooLarge { designed: usize, max: usize },

    /// Transport-level failure talking to the generation service.
    #[error("generation service error: {0}")]
    Service(#[source] anyhow::Error),
}

impl DraftError {
    /// Status text shown to the requester when a draft attempt fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout(secs) => format!(
                "❌ Timeout: the generation service took longer than {secs}s to draft. Try again."
            ),
            Self::Malformed(_) => {
                "❌ The generation service returned a broken blueprint. Try again.".into()
            }
            Self::Empty => "❌ The generation service designed no files at all.".into(),
            Self::TooLarge { designed, max } => format!(
                "❌ Project too large: the draft has {designed} files, the limit is {max}.\n\
                 Narrow the scope of your request (for example: start with an MVP)."
            ),
            Self::Service(e) => format!("❌ Generation service error: {e}"),
        }
    }
}

/// Why one file of a build failed. Per-file, never fatal to the batch.
#[derive(Debug, Error)]
pub enum FileError {
    /// The AI-supplied path failed sanitization. Reported as `Skipped`.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The generation call exceeded the per-file deadline.
    #[error("generation timed out after {0}s")]
    Timeout(u64),

    /// The service answered with an empty body.
    #[error("empty generation")]
    EmptyGeneration,

    /// Transport-level failure or local I/O failure for this file.
    #[error("{0}")]
    Other(String),
}

/// Failure confirming a drafted blueprint.
#[derive(Debug, Error)]
pub enum ConfirmError {
    /// The record was reaped, never existed, or was overwritten by a
    /// newer draft. The requester must redraft.
    #[error("blueprint expired or superseded")]
    Expired,

    /// Another build for the same session is still running.
    #[error("a build is already in progress for this session")]
    BuildInProgress,
}

impl ConfirmError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Expired => "❌ Blueprint expired (drafts live 1 hour). Run /create again.",
            Self::BuildInProgress => "⏳ A build is already running for this chat. Wait for it to finish.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_surfaces_both_counts() {
        let err = DraftError::TooLarge { designed: 14, max: 10 };
        let msg = err.user_message();
        assert!(msg.contains("14"), "designed count missing: {msg}");
        assert!(msg.contains("10"), "limit missing: {msg}");
    }

    #[test]
    fn invalid_path_wraps_sanitizer_error() {
        let err = FileError::from(PathError::Traversal("../evil.sh".into()));
        assert!(err.to_string().contains("../evil.sh"));
    }

    #[test]
    fn expired_message_points_at_redraft() {
        assert!(ConfirmError::Expired.user_message().contains("/create"));
    }
}
