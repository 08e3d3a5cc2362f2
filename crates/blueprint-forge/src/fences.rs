//! Code-fence normalization for generation-service output.
//!
//! Models routinely wrap payloads in markdown fences even when told not
//! to. Two flavors are handled: [`extract_payload`] pulls a structured
//! payload out of surrounding prose, [`strip_fences`] unwraps a file body
//! that arrived as one fenced block. Both are idempotent on already-clean
//! input.

/// Extract a structured payload (e.g. blueprint JSON) from a response that
/// may bury it in a ```` ```json ```` block with prose around it.
pub fn extract_payload(raw: &str) -> &str {
    let text = raw.trim();

    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        return match body.find("```") {
            Some(end) => body[..end].trim(),
            None => body.trim(),
        };
    }
    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        // Drop a language tag on the fence line, if any.
        let body = match body.find('\n') {
            Some(nl) => &body[nl + 1..],
            None => body,
        };
        return match body.find("```") {
            Some(end) => body[..end].trim(),
            None => body.trim(),
        };
    }
    text
}

/// Unwrap a file body: if the first line is a fence marker, drop it; if
/// the last line is a closing fence, drop that too. Inner fences survive.
pub fn strip_fences(raw: &str) -> String {
    let text = raw.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().collect();
    lines.remove(0);
    if lines.last().map(|l| l.trim() == "```").unwrap_or(false) {
        lines.pop();
    }
    lines.join("\n")
}
