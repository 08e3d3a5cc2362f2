//! Syntax-only verification for the one recognized source type.
//!
//! Python files get a `python3 -m py_compile` pass after writing. The
//! check is advisory: a failure flags the file, it never fails the build
//! step, and a missing or hung interpreter means the file simply goes
//! unverified.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::warn;

const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Extension eligible for verification.
pub fn is_checkable(path: &str) -> bool {
    path.ends_with(".py")
}

/// Run a syntax-only compile check on a written file.
///
/// Returns `Some(error_text)` when the interpreter reports a syntax
/// error, `None` when the file passes or the check cannot run.
pub async fn check_python(path: &Path) -> Option<String> {
    let result = Command::new("python3")
        .args(["-m", "py_compile"])
        .arg(path)
        .output();

    let output = match tokio::time::timeout(CHECK_TIMEOUT, result).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(path = %path.display(), "python3 unavailable, skipping syntax check: {e}");
            return None;
        }
        Err(_) => {
            warn!(path = %path.display(), "syntax check timed out, skipping");
            return None;
        }
    };

    if output.status.success() {
        return None;
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Some(stderr.trim().to_string())
}

/// Prepend a visible marker plus the captured error to flagged content.
/// The file stays in the archive; the requester sees what to fix first.
pub fn flag_content(error: &str, code: &str) -> String {
    let banner: String = error.lines().map(|line| format!("# {line}\n")).collect();
    format!("# TODO: Fix syntax error\n{banner}\n{code}")
}
