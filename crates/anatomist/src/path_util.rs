//! Path normalization for rendered source locations.

use std::path::Path;

use crate::AnatomistError;

/// Normalizes a file path to an absolute UTF-8 string with forward slashes.
///
/// `dunce::canonicalize` resolves symlinks and `..` without producing the
/// `\\?\` verbatim prefix on Windows, so the result can be dropped straight
/// into a `file:///` location.
///
/// # Errors
/// - `AnatomistError::IoError` if canonicalization fails (file not found, permissions, etc.)
/// - `AnatomistError::ParseFailure` if the path contains non-UTF-8 characters
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use anatomist::path_util::normalize_path;
///
/// let normalized = normalize_path(Path::new("./src/main/java/App.java")).unwrap();
/// // On Windows: "C:/Users/name/project/src/main/java/App.java"
/// // On Unix: "/home/name/project/src/main/java/App.java"
/// ```
pub fn normalize_path(path: &Path) -> Result<String, AnatomistError> {
    let canonical = dunce::canonicalize(path)?;
    let s = canonical.to_str().ok_or_else(|| {
        AnatomistError::ParseFailure(format!("Non-UTF-8 path: {}", canonical.display()))
    })?;
    Ok(to_forward_slashes(s))
}

/// `C:\a\b` → `C:/a/b`.
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_resolves_dot_segments() {
        let tmp = std::env::temp_dir().join("test_path_util_dots");
        fs::create_dir_all(tmp.join("src")).ok();
        fs::write(tmp.join("App.java"), "class App {}").ok();

        let normalized = normalize_path(&tmp.join("src/../App.java")).unwrap();
        assert!(normalized.ends_with("/App.java"));
        assert!(!normalized.contains(".."));
        assert!(!normalized.contains('\\'));

        fs::remove_dir_all(tmp).ok();
    }

    #[test]
    fn test_normalize_nonexistent_path() {
        let result = normalize_path(Path::new("/this/does/not/exist/Nowhere.java"));
        assert!(matches!(result, Err(AnatomistError::IoError(_))));
    }

    #[test]
    fn test_forward_slashes() {
        assert_eq!(to_forward_slashes(r"C:\work\App.java"), "C:/work/App.java");
    }
}
