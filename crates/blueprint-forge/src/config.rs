//! Environment-backed configuration.
//!
//! Two credentials are required at startup (`TELEGRAM_TOKEN`,
//! `GENERATION_API_KEY`); the process refuses to start without them.
//! Everything else has a default and an env override.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Hard ceiling on blueprint size. Overridable via `FORGE_MAX_FILES`.
pub const DEFAULT_MAX_FILES: usize = 10;

/// How long an unconfirmed blueprint stays buildable (seconds).
pub const DEFAULT_BLUEPRINT_TTL_SECS: u64 = 3600;

/// Deadline for the drafting call.
pub const DEFAULT_DRAFT_TIMEOUT_SECS: u64 = 60;

/// Deadline for each per-file generation call.
pub const DEFAULT_FILE_TIMEOUT_SECS: u64 = 120;

/// Output allowance for per-file calls. File bodies need far more room
/// than the draft manifest, which uses the service default.
pub const FILE_NUM_PREDICT: u32 = 8192;

/// Parameters for one generation call: which model, how creative,
/// how much output, and how long we are willing to wait.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub num_predict: Option<u32>,
    pub deadline: Duration,
}

/// Top-level configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    /// Telegram bot token (required).
    pub telegram_token: String,
    /// Bearer key for the generation service (required).
    pub generation_api_key: String,
    /// Base URL of the generation service.
    pub generation_base_url: String,
    /// Model identifier sent with every generation call.
    pub model: String,
    /// Maximum files a single blueprint may contain.
    pub max_files: usize,
    /// TTL for unconfirmed blueprints.
    pub blueprint_ttl: Duration,
    /// Deadline for the drafting call.
    pub draft_timeout: Duration,
    /// Deadline for each per-file call.
    pub file_timeout: Duration,
    /// Directory under which per-run sandboxes are created.
    pub build_root: PathBuf,
}

impl ForgeConfig {
    /// Load from the environment. Fails fast when a credential is missing.
    pub fn from_env() -> Result<Self> {
        let telegram_token = match std::env::var("TELEGRAM_TOKEN") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => bail!("TELEGRAM_TOKEN is not set"),
        };
        let generation_api_key = match std::env::var("GENERATION_API_KEY") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => bail!("GENERATION_API_KEY is not set"),
        };

        Ok(Self {
            telegram_token,
            generation_api_key,
            generation_base_url: std::env::var("GENERATION_BASE_URL")
                .unwrap_or_else(|_| "https://ollama.com".into()),
            model: std::env::var("GENERATION_MODEL").unwrap_or_else(|_| "glm-5:cloud".into()),
            max_files: usize_from_env("FORGE_MAX_FILES", DEFAULT_MAX_FILES),
            blueprint_ttl: timeout_from_env("FORGE_BLUEPRINT_TTL_SECS", DEFAULT_BLUEPRINT_TTL_SECS),
            draft_timeout: timeout_from_env("FORGE_DRAFT_TIMEOUT_SECS", DEFAULT_DRAFT_TIMEOUT_SECS),
            file_timeout: timeout_from_env("FORGE_FILE_TIMEOUT_SECS", DEFAULT_FILE_TIMEOUT_SECS),
            build_root: std::env::var("FORGE_BUILD_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
        })
    }

    /// Parameters for the drafting call (low creativity, default output size).
    pub fn draft_params(&self) -> GenerationParams {
        GenerationParams {
            model: self.model.clone(),
            temperature: 0.2,
            num_predict: None,
            deadline: self.draft_timeout,
        }
    }

    /// Parameters for per-file calls (near-deterministic, large output).
    pub fn file_params(&self) -> GenerationParams {
        GenerationParams {
            model: self.model.clone(),
            temperature: 0.1,
            num_predict: Some(FILE_NUM_PREDICT),
            deadline: self.file_timeout,
        }
    }
}

/// Read a duration (in seconds) from an env var, falling back to a default.
pub fn timeout_from_env(var: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

fn usize_from_env(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}
