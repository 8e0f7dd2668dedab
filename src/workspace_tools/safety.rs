use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    #[error("Path traversal attempt blocked")]
    PathTraversal,
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Command failed: {0}")]
    CommandFailed(String),
    #[error("Timeout")]
    Timeout,
}

/// Normalize a workspace path to its `/`-rooted form.
///
/// `a.js`, `./a.js` and `/a.js` all become `/a.js`. Backslashes are treated as
/// separators and `..` may not climb above the workspace root.
pub fn normalize_path(raw: &str) -> Result<String, SafetyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SafetyError::InvalidPath("path is empty".to_string()));
    }
    if trimmed.contains('\0') {
        return Err(SafetyError::InvalidPath("path contains NUL".to_string()));
    }

    let normalized = trimmed.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for comp in normalized.split('/').filter(|s| !s.is_empty()) {
        match comp {
            "." => continue,
            ".." => {
                if parts.pop().is_none() {
                    return Err(SafetyError::PathTraversal);
                }
            }
            other => parts.push(other),
        }
    }

    Ok(format!("/{}", parts.join("/")))
}

/// Same as [`normalize_path`] but rejects the root itself, for tools that
/// need a file.
pub fn normalize_file_path(raw: &str) -> Result<String, SafetyError> {
    let path = normalize_path(raw)?;
    if path == "/" {
        return Err(SafetyError::InvalidPath(format!("'{}' is not a file path", raw)));
    }
    Ok(path)
}

/// Map a normalized workspace path onto a directory on disk.
pub fn disk_path(root: &Path, workspace_path: &str) -> PathBuf {
    root.join(workspace_path.trim_start_matches('/'))
}

/// Truncate string with metadata
pub fn truncate_string(s: &str, max_chars: usize) -> (String, bool) {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => (s[..cut].to_string(), true),
        None => (s.to_string(), false),
    }
}

/// Safe command spawn with timeout
pub async fn safe_spawn(
    cmd: &str,
    args: &[&str],
    cwd: &Path,
    timeout_secs: u64,
) -> Result<(String, String, i32), SafetyError> {
    let output = timeout(
        Duration::from_secs(timeout_secs),
        Command::new(cmd)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0")
            .output(),
    )
    .await
    .map_err(|_| SafetyError::Timeout)?
    .map_err(|e| SafetyError::CommandFailed(e.to_string()))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    Ok((stdout, stderr, code))
}

/// Check if git is available
pub fn has_git() -> bool {
    which::which("git").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        let (result, truncated) = truncate_string("hello", 10);
        assert_eq!(result, "hello");
        assert!(!truncated);

        let (result, truncated) = truncate_string("hello world", 5);
        assert_eq!(result, "hello");
        assert!(truncated);

        let (result, truncated) = truncate_string(&"é".repeat(150), 200);
        assert_eq!(result.chars().count(), 150);
        assert!(!truncated);

        let (result, truncated) = truncate_string("héllo", 2);
        assert_eq!(result, "hé");
        assert!(truncated);
    }

    #[test]
    fn test_normalize_path_forms() {
        assert_eq!(normalize_path("a.js").unwrap(), "/a.js");
        assert_eq!(normalize_path("./src/a.js").unwrap(), "/src/a.js");
        assert_eq!(normalize_path("/src//lib/../a.js").unwrap(), "/src/a.js");
        assert_eq!(normalize_path("src\\a.js").unwrap(), "/src/a.js");
        assert_eq!(normalize_path(".").unwrap(), "/");
    }

    #[test]
    fn test_normalize_path_traversal() {
        assert!(matches!(normalize_path("../../../etc/passwd"), Err(SafetyError::PathTraversal)));
        assert!(matches!(normalize_path("/a/../../b"), Err(SafetyError::PathTraversal)));
    }

    #[test]
    fn test_normalize_file_path_rejects_root() {
        assert!(normalize_file_path("/").is_err());
        assert!(normalize_file_path("").is_err());
    }

    #[test]
    fn test_disk_path() {
        let root = Path::new("/tmp/repo");
        assert_eq!(disk_path(root, "/src/a.js"), PathBuf::from("/tmp/repo/src/a.js"));
    }

    #[tokio::test]
    async fn test_safe_spawn_reports_missing_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = safe_spawn("definitely-not-a-real-binary-xyz", &[], dir.path(), 5).await;
        assert!(matches!(result, Err(SafetyError::CommandFailed(_))));
    }
}
