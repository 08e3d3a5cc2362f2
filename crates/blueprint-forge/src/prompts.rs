//! Prompt builders for the two generation phases.
//!
//! Bump `PROMPT_VERSION` whenever wording changes — it is logged with
//! every generation call so regressions can be traced to a prompt change.

pub const PROMPT_VERSION: &str = "1.0.0";

/// Architect prompt: turn a free-form request into a bounded JSON
/// manifest. The file ceiling is stated up front; the hard check happens
/// after parsing regardless of whether the model obeys.
pub fn draft_prompt(user_request: &str, max_files: usize) -> String {
    format!(
        r#"You are an elite Software Architect. User wants: "{user_request}"
Break it down into modular files. STRICT RULE: MAXIMUM {max_files} FILES.
Return ONLY valid JSON:
{{
    "project_name": "Project Name", "summary": "Short explanation",
    "files": [{{"filepath": "filename.ext", "description": "detailed logic"}}]
}}"#
    )
}

/// Per-file prompt: target path, its planned logic, and the rolling
/// summary of every file already written in this run.
pub fn file_prompt(path: &str, description: &str, context_memory: &str) -> String {
    let memory_block = if context_memory.is_empty() {
        String::new()
    } else {
        format!("\nCRITICAL CONTEXT (Existing files):\n{context_memory}")
    };
    format!(
        "Write production code for {path}. Logic: {description}\n{memory_block}\n\
         Return ONLY the code inside ``` markdown."
    )
}
