//! Backend root discovery.

use std::path::PathBuf;

use godcode_core::ResolutionError;
use tracing::{debug, info};

use super::config::ResolverConfig;

pub(super) fn resolve_backend_root(config: &ResolverConfig) -> Result<PathBuf, ResolutionError> {
    for candidate in &config.backend_candidates {
        if candidate.join(&config.entry_file).is_file() {
            let root = candidate.canonicalize().unwrap_or_else(|_| candidate.clone());
            info!(backend_root = %root.display(), "Resolved backend root");
            return Ok(root);
        }
        debug!(candidate = %candidate.display(), "No entry file in backend candidate");
    }

    Err(ResolutionError::BackendNotFound {
        tried: config.backend_candidates.clone(),
        entry_file: config.entry_file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_directory_with_entry_file_wins() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("dev");
        let bundled = temp.path().join("bundled");
        let later = temp.path().join("later");
        for dir in [&empty, &bundled, &later] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(bundled.join("run.py"), "").unwrap();
        fs::write(later.join("run.py"), "").unwrap();

        let mut config = ResolverConfig::empty();
        config.backend_candidates = vec![empty, bundled.clone(), later];

        let root = resolve_backend_root(&config).unwrap();
        assert_eq!(root, bundled.canonicalize().unwrap());
    }

    #[test]
    fn a_directory_named_like_the_entry_file_does_not_count() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("run.py")).unwrap();

        let mut config = ResolverConfig::empty();
        config.backend_candidates = vec![temp.path().to_path_buf()];

        let err = resolve_backend_root(&config).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::BackendNotFound { ref tried, ref entry_file }
                if tried.len() == 1 && entry_file == "run.py"
        ));
    }
}
