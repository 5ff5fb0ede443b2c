//! File system reads.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_read_file() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");

        assert!(!runtime.exists(&file_path));
        assert!(runtime.read_to_string(&file_path).is_err());

        std::fs::write(&file_path, r#"{"url": "https://tasks.example.com"}"#).unwrap();

        assert!(runtime.exists(&file_path));
        assert_eq!(
            runtime.read_to_string(&file_path).unwrap(),
            r#"{"url": "https://tasks.example.com"}"#
        );
    }
}
