//! OpenBao agent credential source (KV v2 secrets engine).

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{CredentialProvider, CredentialSource, Credentials};
use crate::runtime::Runtime;

pub const DEFAULT_AGENT_ADDR: &str = "http://127.0.0.1:18200";
pub const DEFAULT_AGENT_TIMEOUT_SECS: f64 = 5.0;
pub const DEFAULT_ARC_CLIENT: &str = "client0";
pub const DEFAULT_ARC_ENVIRONMENT: &str = "prod";

/// Health endpoint statuses that mean the agent is up (sealed, standby and
/// friends still answer).
const HEALTHY_STATUSES: [u16; 6] = [200, 429, 472, 473, 501, 503];

/// Connection settings for the local OpenBao agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub addr: String,
    pub timeout: Duration,
    pub arc_client: String,
    pub arc_environment: String,
    /// Overrides the identifier otherwise derived from git or `$USER`.
    pub identifier: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_AGENT_ADDR.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_AGENT_TIMEOUT_SECS),
            arc_client: DEFAULT_ARC_CLIENT.to_string(),
            arc_environment: DEFAULT_ARC_ENVIRONMENT.to_string(),
            identifier: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AgentError {
    #[error("cannot connect to OpenBao agent at {addr}: {detail}")]
    NotRunning { addr: String, detail: String },

    #[error("secret not found: {0}")]
    SecretNotFound(String),

    #[error("failed to read secret: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("malformed secret response: {0}")]
    Malformed(String),
}

#[derive(Debug, Default, Deserialize)]
struct KvEnvelope {
    #[serde(default)]
    data: KvData,
}

#[derive(Debug, Default, Deserialize)]
struct KvData {
    #[serde(default)]
    data: VikunjaSecret,
}

#[derive(Debug, Default, Deserialize)]
struct VikunjaSecret {
    url: Option<String>,
    token: Option<String>,
}

pub struct AgentProvider {
    settings: AgentSettings,
    secret_path: String,
    http: Client,
}

impl AgentProvider {
    pub fn new(runtime: Arc<dyn Runtime>, settings: AgentSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Vault-Request", HeaderValue::from_static("true"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .context("Failed to build OpenBao agent HTTP client")?;

        let secret_path = format!(
            "{}/{}-mcp-vikunja-{}",
            settings.arc_client,
            settings.arc_environment,
            identifier(runtime.as_ref(), &settings)
        );

        Ok(Self {
            settings,
            secret_path,
            http,
        })
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// `{client}/{environment}-mcp-vikunja-{identifier}`, relative to the KV mount.
    /// Derived once at construction.
    pub fn secret_path(&self) -> &str {
        &self.secret_path
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.settings.addr.trim_end_matches('/'), path)
    }

    #[tracing::instrument(skip(self))]
    async fn is_available(&self) -> bool {
        match self.http.get(self.endpoint("sys/health")).send().await {
            Ok(response) => {
                let healthy = HEALTHY_STATUSES.contains(&response.status().as_u16());
                debug!(
                    "OpenBao agent health at {}: {} (healthy: {})",
                    self.settings.addr,
                    response.status(),
                    healthy
                );
                healthy
            }
            Err(e) => {
                debug!("OpenBao agent not reachable at {}: {}", self.settings.addr, e);
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn read_secret(&self, path: &str) -> Result<VikunjaSecret, AgentError> {
        let path = path.trim_start_matches('/');
        let response = self
            .http
            .get(self.endpoint(&format!("secret/data/{}", path)))
            .send()
            .await
            .map_err(|e| AgentError::NotRunning {
                addr: self.settings.addr.clone(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AgentError::SecretNotFound(path.to_string()));
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: KvEnvelope = response
            .json()
            .await
            .map_err(|e| AgentError::Malformed(e.to_string()))?;
        Ok(envelope.data.data)
    }
}

/// Explicit override, then the local part of the git email, then `$USER`.
fn identifier(runtime: &dyn Runtime, settings: &AgentSettings) -> String {
    if let Some(id) = settings.identifier.as_deref().map(str::trim)
        && !id.is_empty()
    {
        return id.to_string();
    }

    if let Some(email) = runtime.git_user_email()
        && let Some(local) = email.split('@').next().map(str::trim)
        && !local.is_empty()
    {
        return local.to_string();
    }

    match runtime.env_var("USER") {
        Ok(user) if !user.trim().is_empty() => user.trim().to_string(),
        _ => "default".to_string(),
    }
}

#[async_trait]
impl CredentialProvider for AgentProvider {
    fn source(&self) -> CredentialSource {
        CredentialSource::Agent
    }

    async fn resolve(&self) -> Option<Credentials> {
        if !self.is_available().await {
            return None;
        }

        match self.read_secret(&self.secret_path).await {
            Ok(secret) => Some(Credentials::new(secret.url, secret.token)),
            Err(e) => {
                warn!("OpenBao agent lookup failed: {}", e);
                None
            }
        }
    }

    fn setup_hint(&self) -> String {
        format!(
            "Store the secret in OpenBao (agent at {}): bao kv put secret/{} url=https://vikunja.example.com token=<api-token>",
            self.settings.addr, self.secret_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime_with_identity(email: Option<&str>, user: Option<&str>) -> Arc<dyn Runtime> {
        let mut runtime = MockRuntime::new();
        let email = email.map(str::to_string);
        runtime
            .expect_git_user_email()
            .returning(move || email.clone());
        let user = user.map(str::to_string);
        runtime.expect_env_var().with(eq("USER")).returning(move |_| {
            user.clone().ok_or(std::env::VarError::NotPresent)
        });
        Arc::new(runtime)
    }

    fn provider(addr: &str, runtime: Arc<dyn Runtime>) -> AgentProvider {
        let settings = AgentSettings {
            addr: addr.to_string(),
            timeout: Duration::from_secs(2),
            ..AgentSettings::default()
        };
        AgentProvider::new(runtime, settings).unwrap()
    }

    #[test]
    fn test_secret_path_uses_git_email_local_part() {
        let p = provider(
            DEFAULT_AGENT_ADDR,
            runtime_with_identity(Some("sam@example.com"), Some("ignored")),
        );
        assert_eq!(p.secret_path(), "client0/prod-mcp-vikunja-sam");
    }

    #[test]
    fn test_secret_path_falls_back_to_user_then_default() {
        let p = provider(DEFAULT_AGENT_ADDR, runtime_with_identity(None, Some("kayla")));
        assert_eq!(p.secret_path(), "client0/prod-mcp-vikunja-kayla");

        let p = provider(DEFAULT_AGENT_ADDR, runtime_with_identity(None, None));
        assert_eq!(p.secret_path(), "client0/prod-mcp-vikunja-default");
    }

    #[test]
    fn test_secret_path_explicit_overrides() {
        let settings = AgentSettings {
            arc_client: "acme".into(),
            arc_environment: "staging".into(),
            identifier: Some("ci-bot".into()),
            ..AgentSettings::default()
        };
        let p = AgentProvider::new(Arc::new(MockRuntime::new()), settings).unwrap();
        assert_eq!(p.secret_path(), "acme/staging-mcp-vikunja-ci-bot");
    }

    #[tokio::test]
    async fn test_resolve_reads_kv_secret() {
        let mut server = mockito::Server::new_async().await;
        let health = server
            .mock("GET", "/v1/sys/health")
            .match_header("x-vault-request", "true")
            .with_status(200)
            .create_async()
            .await;
        let secret = server
            .mock("GET", "/v1/secret/data/client0/prod-mcp-vikunja-sam")
            .match_header("x-vault-request", "true")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"data": {"url": "https://tasks.example.com", "token": "tk_agent"}, "metadata": {"version": 2}}}"#,
            )
            .create_async()
            .await;

        let p = provider(&server.url(), runtime_with_identity(Some("sam@example.com"), None));
        let creds = p.resolve().await.unwrap();

        health.assert_async().await;
        secret.assert_async().await;
        assert_eq!(creds.url.as_deref(), Some("https://tasks.example.com"));
        assert_eq!(creds.token.as_deref(), Some("tk_agent"));
    }

    #[tokio::test]
    async fn test_resolve_sealed_agent_still_counts_as_available() {
        let mut server = mockito::Server::new_async().await;
        let _health = server
            .mock("GET", "/v1/sys/health")
            .with_status(503)
            .create_async()
            .await;
        let secret = server
            .mock("GET", "/v1/secret/data/client0/prod-mcp-vikunja-sam")
            .with_status(404)
            .create_async()
            .await;

        let p = provider(&server.url(), runtime_with_identity(Some("sam@example.com"), None));
        assert!(p.resolve().await.is_none());
        secret.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_unhealthy_agent_skips_secret_read() {
        let mut server = mockito::Server::new_async().await;
        let _health = server
            .mock("GET", "/v1/sys/health")
            .with_status(500)
            .create_async()
            .await;
        let secret = server
            .mock("GET", mockito::Matcher::Regex("^/v1/secret/.*".into()))
            .expect(0)
            .create_async()
            .await;

        let p = provider(&server.url(), runtime_with_identity(Some("sam@example.com"), None));
        assert!(p.resolve().await.is_none());
        secret.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_unreachable_agent() {
        let p = provider(
            "http://127.0.0.1:1",
            runtime_with_identity(Some("sam@example.com"), None),
        );
        assert!(p.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_identity_is_looked_up_once() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_git_user_email()
            .times(1)
            .returning(|| Some("sam@example.com".to_string()));
        runtime.expect_env_var().times(0);

        let p = provider("http://127.0.0.1:1", Arc::new(runtime));
        assert!(p.resolve().await.is_none());
        assert!(p.setup_hint().contains("client0/prod-mcp-vikunja-sam"));
        assert_eq!(p.secret_path(), "client0/prod-mcp-vikunja-sam");
    }

    #[test]
    fn test_setup_hint_mentions_bao_kv_put() {
        let p = provider(
            "http://127.0.0.1:18200",
            runtime_with_identity(Some("sam@example.com"), None),
        );
        let hint = p.setup_hint();
        assert!(hint.contains("bao kv put secret/client0/prod-mcp-vikunja-sam"));
        assert!(hint.contains("http://127.0.0.1:18200"));
    }
}
