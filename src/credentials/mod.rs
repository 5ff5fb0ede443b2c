//! Credential resolution for the Vikunja API.
//!
//! Credentials come from an ordered chain of [`CredentialProvider`]s. The
//! standard chain is: OpenBao agent, then the JSON config file, then the
//! `VIKUNJA_URL` / `VIKUNJA_TOKEN` environment variables. The first provider
//! that yields both a URL and a token wins; values are never merged across
//! providers.

mod agent;
mod env;
mod file;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

use crate::runtime::Runtime;

pub use agent::{
    AgentProvider, AgentSettings, DEFAULT_AGENT_ADDR, DEFAULT_AGENT_TIMEOUT_SECS,
    DEFAULT_ARC_CLIENT, DEFAULT_ARC_ENVIRONMENT,
};
pub use env::{EnvProvider, TOKEN_ENV_VAR, URL_ENV_VAR};
pub use file::{ConfigFileProvider, default_config_path};

/// Where a set of credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Agent,
    ConfigFile,
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Agent => write!(f, "OpenBao agent"),
            CredentialSource::ConfigFile => write!(f, "config file"),
            CredentialSource::Environment => write!(f, "environment"),
        }
    }
}

/// Values one provider found. Either may be missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub url: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    /// Builds credentials, treating blank values as absent.
    pub fn new(url: Option<String>, token: Option<String>) -> Self {
        Self {
            url: non_blank(url),
            token: non_blank(token),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }

    fn into_config(self) -> Option<ClientConfig> {
        match (self.url, self.token) {
            (Some(url), Some(token)) => Some(ClientConfig::new(&url, &token)),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("token", &self.token.as_deref().map(mask_token))
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolved connection settings for the API client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub bearer_token: String,
}

impl ClientConfig {
    pub fn new(base_url: &str, bearer_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &mask_token(&self.bearer_token))
            .finish()
    }
}

/// Masks a secret for logging, keeping at most four characters on each end.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Fatal configuration failures at client construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Vikunja URL not found. Either:\n{hints}")]
    MissingUrl { hints: String },

    #[error("Vikunja API token not found. Either:\n{hints}")]
    MissingToken { hints: String },

    #[error(
        "OpenBao agent is required but did not provide Vikunja credentials.\n{hints}\n\
         For local development only, set OPENBAO_DEV_MODE=1 (or pass --dev-mode) to allow \
         the config file and environment fallbacks."
    )]
    AgentRequired { hints: String },
}

/// A single place credentials may come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn source(&self) -> CredentialSource;

    /// Looks up credentials. `None` when the source is unavailable.
    async fn resolve(&self) -> Option<Credentials>;

    /// One line telling the user how to supply credentials through this source.
    fn setup_hint(&self) -> String;
}

/// Controls whether the agent is mandatory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentPolicy {
    /// Only the agent is consulted, and its failure is fatal.
    pub require_agent: bool,
    /// Re-enables non-agent providers while `require_agent` is set.
    pub dev_mode: bool,
}

impl AgentPolicy {
    fn allows(&self, source: CredentialSource) -> bool {
        !self.require_agent || self.dev_mode || source == CredentialSource::Agent
    }
}

/// Ordered list of providers consulted until one yields a full pair.
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
    policy: AgentPolicy,
}

impl CredentialChain {
    pub fn new(policy: AgentPolicy) -> Self {
        Self {
            providers: Vec::new(),
            policy,
        }
    }

    /// Agent, config file, environment.
    pub fn standard(
        runtime: Arc<dyn Runtime>,
        settings: AgentSettings,
        policy: AgentPolicy,
    ) -> Result<Self> {
        let agent = AgentProvider::new(runtime.clone(), settings)?;
        Ok(Self::new(policy)
            .with_provider(Box::new(agent))
            .with_provider(Box::new(ConfigFileProvider::new(runtime.clone())))
            .with_provider(Box::new(EnvProvider::new(runtime))))
    }

    pub fn with_provider(mut self, provider: Box<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn policy(&self) -> AgentPolicy {
        self.policy
    }

    /// Walks the chain and returns the first complete configuration.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self) -> Result<(ClientConfig, CredentialSource), ConfigError> {
        let mut url_seen = false;
        let mut hints = Vec::new();

        for provider in &self.providers {
            let source = provider.source();
            if !self.policy.allows(source) {
                debug!("Skipping {} credentials: agent is required", source);
                continue;
            }
            hints.push(provider.setup_hint());

            let Some(credentials) = provider.resolve().await else {
                debug!("No credentials from {}", source);
                continue;
            };
            debug!("Credentials from {}: {:?}", source, credentials);
            url_seen |= credentials.url.is_some();

            if let Some(config) = credentials.into_config() {
                if self.policy.require_agent && source != CredentialSource::Agent {
                    warn!(
                        "[DEV MODE] Using {} credentials instead of the OpenBao agent. \
                         Do not run with OPENBAO_DEV_MODE in production.",
                        source
                    );
                }
                info!(
                    "Using Vikunja credentials from {} (token {})",
                    source,
                    mask_token(&config.bearer_token)
                );
                return Ok((config, source));
            }
            debug!("Incomplete credentials from {}, trying next source", source);
        }

        let hints = format_hints(&hints);
        if self.policy.require_agent && !self.policy.dev_mode {
            Err(ConfigError::AgentRequired { hints })
        } else if !url_seen {
            Err(ConfigError::MissingUrl { hints })
        } else {
            Err(ConfigError::MissingToken { hints })
        }
    }
}

fn format_hints(hints: &[String]) -> String {
    hints
        .iter()
        .enumerate()
        .map(|(i, hint)| format!("  {}. {}", i + 1, hint))
        .collect::<Vec<_>>()
        .join("\n")
}
