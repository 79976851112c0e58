//! Platform-specific path resolution.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::error::PathError;

/// Directory of the workspace this binary was built from.
///
/// Only meaningful for development builds; installed binaries treat it as
/// one more candidate that usually does not exist.
pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("GODCODE_REPO_ROOT"))
}

/// Get the root directory for application data (the `.env` overrides file).
///
/// Resolution order:
/// 1. `GODCODE_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/godcode`), created on demand
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("GODCODE_DATA_DIR")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    let root = dirs::data_local_dir()
        .ok_or(PathError::NoDataDir)?
        .join("godcode");

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}

/// Get the root directory for bundled resources.
///
/// Resolution order:
/// 1. `GODCODE_RESOURCE_DIR` environment variable
/// 2. Falls back to the data root
pub fn resource_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("GODCODE_RESOURCE_DIR")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    data_root()
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

/// Normalize a setter value. Blank means "unset".
pub fn normalize_optional_path(raw: &str) -> Result<Option<PathBuf>, PathError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    normalize_user_path(raw).map(Some)
}

/// Like [`normalize_optional_path`], but a bare program name such as
/// `python3` is kept as given and looked up on `PATH` at spawn time.
pub fn normalize_executable_path(raw: &str) -> Result<Option<PathBuf>, PathError> {
    let trimmed = raw.trim();
    let mut components = Path::new(trimmed).components();
    let bare = !trimmed.starts_with('~')
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();
    if bare {
        return Ok(Some(PathBuf::from(trimmed)));
    }
    normalize_optional_path(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::{ENV_LOCK, EnvVarGuard};
    use tempfile::tempdir;

    #[test]
    fn data_root_honours_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempdir().unwrap();
        let _env = EnvVarGuard::set("GODCODE_DATA_DIR", temp.path().to_str().unwrap());
        assert_eq!(data_root().unwrap(), temp.path());
    }

    #[test]
    fn resource_root_falls_back_to_data_root() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempdir().unwrap();
        let _data = EnvVarGuard::set("GODCODE_DATA_DIR", temp.path().to_str().unwrap());
        let _res = EnvVarGuard::set("GODCODE_RESOURCE_DIR", "");
        assert_eq!(resource_root().unwrap(), temp.path());
    }

    #[test]
    fn normalize_rejects_blank() {
        assert!(matches!(normalize_user_path("   "), Err(PathError::EmptyPath)));
    }

    #[test]
    fn normalize_makes_relative_paths_absolute() {
        let path = normalize_user_path("backend").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("backend"));
    }

    #[test]
    fn optional_blank_is_unset() {
        assert_eq!(normalize_optional_path(" \t").unwrap(), None);
    }

    #[test]
    fn optional_relative_path_is_anchored_at_cwd() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(
            normalize_optional_path("apps/backend").unwrap(),
            Some(cwd.join("apps/backend"))
        );
    }

    #[test]
    fn bare_executable_names_are_kept() {
        assert_eq!(
            normalize_executable_path(" python3 ").unwrap(),
            Some(PathBuf::from("python3"))
        );
    }

    #[test]
    fn executable_paths_are_made_absolute() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(
            normalize_executable_path("./venv/bin/python").unwrap(),
            Some(cwd.join("./venv/bin/python"))
        );
        assert_eq!(
            normalize_executable_path("/usr/bin/python3").unwrap(),
            Some(PathBuf::from("/usr/bin/python3"))
        );
        assert_eq!(normalize_executable_path("").unwrap(), None);
    }
}
