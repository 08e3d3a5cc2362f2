//! Blueprint data model: the structured manifest the drafting phase
//! produces and the build phase consumes. Immutable once drafted.

use serde::{Deserialize, Serialize};

/// One planned file: an AI-supplied relative path (untrusted until it
/// passes the sanitizer) and a free-text generation instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    pub filepath: String,
    #[serde(default)]
    pub description: String,
}

/// The drafted manifest. Invariant, enforced at draft time:
/// `1 <= files.len() <= max_files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

fn default_project_name() -> String {
    "Unnamed Project".into()
}
