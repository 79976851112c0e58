//! `.env` persistence for user overrides.
//!
//! The file is a plain `KEY=value` list. Unknown lines and comments are
//! preserved on rewrite; only the touched key changes.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::data_root;
use crate::ports::{LocationStore, StoredPaths};

/// `.env` key holding the runtime executable override.
pub const RUNTIME_PATH_KEY: &str = "GODCODE_RUNTIME_PATH";

/// `.env` key holding the backend root override.
pub const BACKEND_ROOT_KEY: &str = "GODCODE_BACKEND_ROOT";

/// Location of the `.env` file that stores user overrides.
pub fn env_file_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(".env"))
}

fn env_file_error(path: &Path, e: &std::io::Error) -> PathError {
    PathError::EnvFileError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, PathError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).map_err(|e| env_file_error(path, &e))?;
    Ok(contents.lines().map(ToString::to_string).collect())
}

fn lookup_env_value(path: &Path, key: &str) -> Result<Option<String>, PathError> {
    let value = read_lines(path)?.into_iter().find_map(|line| {
        let (lhs, rhs) = line.split_once('=')?;
        (lhs.trim() == key).then(|| unquote(rhs.trim()).to_string())
    });
    Ok(value.filter(|v| !v.is_empty()))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn write_env_value(path: &Path, key: &str, value: &str) -> Result<(), PathError> {
    let clear = value.trim().is_empty();
    let mut written = false;
    let mut output: Vec<String> = Vec::new();

    for line in read_lines(path)? {
        match line.split_once('=') {
            Some((lhs, _)) if lhs.trim() == key => {
                if !written && !clear {
                    output.push(format!("{key}={value}"));
                }
                written = true;
            }
            _ => output.push(line),
        }
    }

    if !written && !clear {
        output.push(format!("{key}={value}"));
    }

    while output.last().is_some_and(String::is_empty) {
        output.pop();
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| PathError::CreateFailed {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| env_file_error(path, &e))?;

    let mut content = output.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    file.write_all(content.as_bytes())
        .map_err(|e| env_file_error(path, &e))?;

    tracing::debug!(path = %path.display(), key, cleared = clear, "Persisted env override");
    Ok(())
}

/// `LocationStore` backed by a `.env` file.
#[derive(Debug, Clone)]
pub struct EnvFileLocationStore {
    path: PathBuf,
}

impl EnvFileLocationStore {
    /// Store backed by an explicit file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by `<data_root>/.env`.
    pub fn from_data_root() -> Result<Self, PathError> {
        Ok(Self::new(env_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocationStore for EnvFileLocationStore {
    fn load(&self) -> Result<StoredPaths, PathError> {
        Ok(StoredPaths {
            runtime_path: lookup_env_value(&self.path, RUNTIME_PATH_KEY)?,
            backend_root: lookup_env_value(&self.path, BACKEND_ROOT_KEY)?,
        })
    }

    fn save_runtime_path(&self, value: &str) -> Result<(), PathError> {
        write_env_value(&self.path, RUNTIME_PATH_KEY, value)
    }

    fn save_backend_root(&self, value: &str) -> Result<(), PathError> {
        write_env_value(&self.path, BACKEND_ROOT_KEY, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::{ENV_LOCK, EnvVarGuard};
    use tempfile::tempdir;

    #[test]
    fn data_root_store_writes_into_data_root() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempdir().unwrap();
        let _env = EnvVarGuard::set("GODCODE_DATA_DIR", temp.path().to_str().unwrap());

        let store = EnvFileLocationStore::from_data_root().unwrap();
        assert_eq!(store.path(), temp.path().join(".env"));
        store.save_runtime_path("/usr/bin/python3").unwrap();

        let contents = fs::read_to_string(temp.path().join(".env")).unwrap();
        assert_eq!(contents, "GODCODE_RUNTIME_PATH=/usr/bin/python3\n");
        assert_eq!(
            store.load().unwrap().runtime_path.as_deref(),
            Some("/usr/bin/python3")
        );
    }

    #[test]
    fn update_preserves_other_lines() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".env");
        fs::write(&path, "# comment\nOTHER=1\nGODCODE_BACKEND_ROOT=/old\n").unwrap();

        let store = EnvFileLocationStore::new(&path);
        store.save_backend_root("/new").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "# comment\nOTHER=1\nGODCODE_BACKEND_ROOT=/new\n");
    }

    #[test]
    fn empty_value_clears_key() {
        let temp = tempdir().unwrap();
        let store = EnvFileLocationStore::new(temp.path().join(".env"));
        store.save_runtime_path("/usr/bin/python3").unwrap();
        store.save_backend_root("/opt/backend").unwrap();

        store.save_runtime_path("").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.runtime_path, None);
        assert_eq!(loaded.backend_root.as_deref(), Some("/opt/backend"));
    }

    #[test]
    fn missing_file_loads_as_unconfigured() {
        let temp = tempdir().unwrap();
        let store = EnvFileLocationStore::new(temp.path().join("nested").join(".env"));
        assert_eq!(store.load().unwrap(), StoredPaths::default());
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".env");
        fs::write(&path, "GODCODE_RUNTIME_PATH=\"/opt/py/bin/python3\"\n").unwrap();
        let store = EnvFileLocationStore::new(&path);
        assert_eq!(
            store.load().unwrap().runtime_path.as_deref(),
            Some("/opt/py/bin/python3")
        );
    }
}
