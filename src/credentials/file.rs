//! JSON config file credential source.

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::{CredentialProvider, CredentialSource, Credentials};
use crate::runtime::Runtime;

const CONFIG_DISPLAY_PATH: &str = "~/.config/vikunja-mcp/config.json";

/// `~/.config/vikunja-mcp/config.json`, when a home directory is known.
pub fn default_config_path(runtime: &dyn Runtime) -> Option<PathBuf> {
    runtime
        .home_dir()
        .map(|home| home.join(".config").join("vikunja-mcp").join("config.json"))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    url: Option<String>,
    vikunja_url: Option<String>,
    token: Option<String>,
    vikunja_token: Option<String>,
}

impl ConfigFile {
    fn into_credentials(self) -> Credentials {
        let url = first_non_empty(self.url, self.vikunja_url);
        let token = first_non_empty(self.token, self.vikunja_token);
        Credentials::new(url, token)
    }
}

fn first_non_empty(primary: Option<String>, alias: Option<String>) -> Option<String> {
    primary
        .filter(|v| !v.trim().is_empty())
        .or(alias)
}

pub struct ConfigFileProvider {
    runtime: Arc<dyn Runtime>,
    path: Option<PathBuf>,
}

impl ConfigFileProvider {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        let path = default_config_path(runtime.as_ref());
        Self { runtime, path }
    }

    pub fn with_path(runtime: Arc<dyn Runtime>, path: PathBuf) -> Self {
        Self {
            runtime,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

#[async_trait]
impl CredentialProvider for ConfigFileProvider {
    fn source(&self) -> CredentialSource {
        CredentialSource::ConfigFile
    }

    async fn resolve(&self) -> Option<Credentials> {
        let path = self.path.as_ref()?;
        if !self.runtime.exists(path) {
            debug!("Config file {} does not exist", path.display());
            return None;
        }

        let content = match self.runtime.read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Ignoring unreadable config file {}: {:#}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<ConfigFile>(&content) {
            Ok(config) => Some(config.into_credentials()),
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn setup_hint(&self) -> String {
        let path = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| CONFIG_DISPLAY_PATH.to_string());
        format!(
            "Create config file: {} with {{\"url\": \"https://vikunja.example.com\", \"token\": \"<api-token>\"}}",
            path
        )
    }
}
