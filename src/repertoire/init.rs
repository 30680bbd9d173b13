use crate::api::TrainerApi;
use crate::error::{RepertoireError, Result};
use crate::store::fs::FileStore;
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;

/// Overrides the platform data directory.
pub const HOME_ENV: &str = "REPERTOIRE_HOME";

pub struct RepertoireContext {
    pub api: TrainerApi<FileStore>,
    pub data_dir: PathBuf,
}

/// Picks the data directory: `REPERTOIRE_HOME` when set and non-empty,
/// otherwise the platform's per-user data directory.
pub fn resolve_data_dir(home_override: Option<String>) -> Result<PathBuf> {
    if let Some(home) = home_override.filter(|h| !h.trim().is_empty()) {
        return Ok(PathBuf::from(home));
    }
    let proj_dirs = ProjectDirs::from("com", "repertoire", "repertoire")
        .ok_or_else(|| RepertoireError::Store("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

pub fn initialize() -> Result<RepertoireContext> {
    let data_dir = resolve_data_dir(std::env::var(HOME_ENV).ok())?;
    debug!(data_dir = %data_dir.display(), "using data directory");

    let api = TrainerApi::new(FileStore::new(data_dir.clone()));
    Ok(RepertoireContext { api, data_dir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn override_wins() {
        let temp = TempDir::new().unwrap();
        let dir = resolve_data_dir(Some(temp.path().display().to_string())).unwrap();
        assert_eq!(dir, temp.path());
    }

    #[test]
    fn blank_override_is_ignored() {
        // Platform dirs may be unavailable in a bare sandbox, so only check
        // that a blank override never comes back as the chosen path.
        if let Ok(dir) = resolve_data_dir(Some("  ".into())) {
            assert_ne!(dir, PathBuf::from("  "));
        }
    }

    #[test]
    fn file_store_lands_in_data_dir() {
        let temp = TempDir::new().unwrap();
        let dir = resolve_data_dir(Some(temp.path().display().to_string())).unwrap();
        let api = TrainerApi::new(FileStore::new(dir.clone()));
        assert_eq!(api.store().kv().root(), dir.as_path());
    }
}
