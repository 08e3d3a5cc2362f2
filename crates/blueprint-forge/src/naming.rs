//! Collision-resistant, filesystem-safe archive names.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Fallback stem when the project name sanitizes down to nothing.
const DEFAULT_STEM: &str = "project";

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());

/// Build an archive stem from a free-text project name.
///
/// Non-alphanumeric characters become `_`, leading/trailing `_` are
/// trimmed, and a sortable timestamp plus a short random suffix make
/// collisions across concurrent builds negligible. Output always matches
/// `^[A-Za-z0-9_]+_\d{8}_\d{6}_[0-9a-f]{6}$`.
pub fn archive_stem(project_name: &str) -> String {
    let cleaned = NON_ALNUM.replace_all(project_name, "_");
    let cleaned = cleaned.trim_matches('_');
    let stem = if cleaned.is_empty() { DEFAULT_STEM } else { cleaned };

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("{stem}_{timestamp}_{}", short_suffix())
}

/// Six lowercase hex chars of a fresh v4 UUID.
pub fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}
