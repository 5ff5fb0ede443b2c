//! Environment variable credential source.

use async_trait::async_trait;
use std::sync::Arc;

use super::{CredentialProvider, CredentialSource, Credentials};
use crate::runtime::Runtime;

pub const URL_ENV_VAR: &str = "VIKUNJA_URL";
pub const TOKEN_ENV_VAR: &str = "VIKUNJA_TOKEN";

pub struct EnvProvider {
    runtime: Arc<dyn Runtime>,
}

impl EnvProvider {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl CredentialProvider for EnvProvider {
    fn source(&self) -> CredentialSource {
        CredentialSource::Environment
    }

    async fn resolve(&self) -> Option<Credentials> {
        let url = self.runtime.env_var(URL_ENV_VAR).ok();
        let token = self.runtime.env_var(TOKEN_ENV_VAR).ok();
        if url.is_none() && token.is_none() {
            return None;
        }
        Some(Credentials::new(url, token))
    }

    fn setup_hint(&self) -> String {
        format!(
            "Set the {} and {} environment variables",
            URL_ENV_VAR, TOKEN_ENV_VAR
        )
    }
}
