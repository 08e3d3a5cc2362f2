//! Rolling per-run context memory.
//!
//! After each file is written, its path and first lines are appended here
//! and replayed into every later generation prompt. This keeps imports,
//! names, and signatures consistent across files without resending full
//! bodies. Append-only, scoped to one build run.

use std::fmt::Write as _;

/// Lines kept per file — enough for imports and top-level declarations.
pub const SUMMARY_LINES: usize = 10;

#[derive(Debug, Default)]
pub struct ContextMemory {
    entries: Vec<String>,
}

impl ContextMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a freshly written file: path header, first
    /// [`SUMMARY_LINES`] lines, ellipsis marker.
    pub fn push(&mut self, path: &str, content: &str) {
        let head: Vec<&str> = content.lines().take(SUMMARY_LINES).collect();
        let mut entry = format!("--- {path} ---\n");
        let _ = writeln!(entry, "{}...", head.join("\n"));
        self.entries.push(entry);
    }

    /// Render all entries for prompt injection. Empty string when no
    /// files have been written yet.
    pub fn render(&self) -> String {
        self.entries.join("\n")
    }
}
