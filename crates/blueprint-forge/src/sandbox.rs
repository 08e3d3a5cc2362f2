//! Path sanitizer for AI-supplied file paths.
//!
//! Every path written during a build passes through [`sanitize_relative`]
//! before touching the sandbox. The check is purely lexical — no
//! filesystem access — so it can run before the file exists.

use std::path::{Component, Path};

use thiserror::Error;

/// Why a requested path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty or whitespace-only file path")]
    Empty,

    #[error("path `{0}` escapes the sandbox")]
    Traversal(String),

    #[error("absolute path `{0}` not allowed")]
    Absolute(String),
}

/// Validate and normalize a relative path.
///
/// Rules, in order: reject empty/whitespace-only input; strip leading
/// separators; resolve `.` and `..` segments lexically; reject anything
/// that would climb above the sandbox root. Accepted output uses `/`
/// separators and is idempotent under a second pass.
pub fn sanitize_relative(raw: &str) -> Result<String, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }

    // A leading separator is stripped rather than rejected, matching how
    // "/src/main.py" from a model is almost always meant as relative.
    let stripped = trimmed.trim_start_matches('/');
    if stripped.is_empty() {
        return Err(PathError::Empty);
    }

    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(stripped).components() {
        match component {
            Component::Normal(seg) => match seg.to_str() {
                Some(s) => parts.push(s),
                None => return Err(PathError::Traversal(trimmed.to_string())),
            },
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the sandbox root is a traversal attempt.
                if parts.pop().is_none() {
                    return Err(PathError::Traversal(trimmed.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute(trimmed.to_string()));
            }
        }
    }

    if parts.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_path() {
        assert_eq!(sanitize_relative("src/main.py").unwrap(), "src/main.py");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(sanitize_relative(""), Err(PathError::Empty));
        assert_eq!(sanitize_relative("   "), Err(PathError::Empty));
    }

    #[test]
    fn rejects_parent_traversal() {
        assert!(matches!(
            sanitize_relative("../evil.sh"),
            Err(PathError::Traversal(_))
        ));
        assert!(matches!(
            sanitize_relative("a/../../evil.sh"),
            Err(PathError::Traversal(_))
        ));
    }

    #[test]
    fn resolves_internal_dot_segments() {
        assert_eq!(
            sanitize_relative("src/./sub/../main.py").unwrap(),
            "src/main.py"
        );
    }

    #[test]
    fn strips_leading_separator() {
        assert_eq!(sanitize_relative("/src/app.py").unwrap(), "src/app.py");
    }

    #[test]
    fn bare_dot_is_rejected_as_empty() {
        assert_eq!(sanitize_relative("."), Err(PathError::Empty));
    }

    #[test]
    fn idempotent_on_accepted_paths() {
        for raw in ["src/main.py", "/a/b/c.txt", "x/./y/../z.py", "deep/tree/file"] {
            let once = sanitize_relative(raw).unwrap();
            let twice = sanitize_relative(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }
}
