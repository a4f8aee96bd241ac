use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the per-user layout with a single root, e.g. a container volume
const BASE_PATH_ENV: &str = "POPCORN_BASE_PATH";

/// The container root named by `var`, when it is set and the directory exists.
fn container_root(var: Option<OsString>) -> Option<PathBuf> {
    let base = PathBuf::from(var.filter(|v| !v.is_empty())?);
    base.is_dir().then_some(base)
}

#[derive(Debug, Clone)]
pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("popcorn");

        Ok(Self::rooted_at(base_dir))
    }

    /// Lay out every directory below a single root (containers, tests).
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("popcorn.log")
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = container_root(std::env::var_os(BASE_PATH_ENV)) {
            return Self::rooted_at(base);
        }

        Self::new().unwrap_or_else(|_| Self::rooted_at(".popcorn"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_layout() {
        let paths = PathManager::rooted_at("/tmp/popcorn-test");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/popcorn-test/config.toml"));
        assert_eq!(paths.data_dir(), Path::new("/tmp/popcorn-test/data"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/popcorn-test/logs/popcorn.log"));
    }

    #[test]
    fn test_container_root_needs_the_variable() {
        assert_eq!(container_root(None), None);
        assert_eq!(container_root(Some(OsString::new())), None);
    }

    #[test]
    fn test_container_root_needs_an_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert_eq!(container_root(Some(missing.into_os_string())), None);
        assert_eq!(
            container_root(Some(dir.path().as_os_str().to_owned())),
            Some(dir.path().to_path_buf())
        );
    }
}
