//! Authenticated Vikunja API client with retry on rate limits and transient
//! network failures.

use log::{debug, info};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::retry::{
    ApiError, AttemptOutcome, RetryPolicy, classify_status, classify_transport, run_with_retry,
};
use crate::credentials::{ClientConfig, ConfigError, CredentialChain, CredentialSource, mask_token};
use crate::runtime::Runtime;

pub const API_VERSION: &str = "v1";

/// Per-request transport timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query string pairs. Keys may repeat.
pub type Query<'a> = [(&'a str, String)];

pub struct VikunjaClient {
    config: ClientConfig,
    source: CredentialSource,
    api_base: String,
    runtime: Arc<dyn Runtime>,
    retry: RetryPolicy,
    timeout: Duration,
    session: Mutex<Option<Client>>,
    sessions_opened: AtomicUsize,
}

impl VikunjaClient {
    /// Resolves credentials through `chain` and builds a client.
    /// No connection is opened until the first request.
    pub async fn connect(
        runtime: Arc<dyn Runtime>,
        chain: &CredentialChain,
    ) -> Result<Self, ConfigError> {
        let (config, source) = chain.resolve().await?;
        Ok(Self::new(config, source, runtime))
    }

    pub fn new(config: ClientConfig, source: CredentialSource, runtime: Arc<dyn Runtime>) -> Self {
        let config = ClientConfig::new(&config.base_url, &config.bearer_token);
        let api_base = format!("{}/api/{}", config.base_url, API_VERSION);
        debug!(
            "Vikunja client for {} (token {}, from {})",
            api_base,
            mask_token(&config.bearer_token),
            source
        );

        Self {
            config,
            source,
            api_base,
            runtime,
            retry: RetryPolicy::default(),
            timeout: REQUEST_TIMEOUT,
            session: Mutex::new(None),
            sessions_opened: AtomicUsize::new(0),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Overrides the per-request timeout. Applies to sessions opened afterwards.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn is_connected(&self) -> bool {
        self.lock_session().is_some()
    }

    /// How many HTTP sessions this client has opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Client>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the shared session, opening it on first use.
    fn session(&self) -> Result<Client, ApiError> {
        let mut slot = self.lock_session();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = self.build_session()?;
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        debug!("Opened HTTP session for {}", self.api_base);
        *slot = Some(client.clone());
        Ok(client)
    }

    fn build_session(&self) -> Result<Client, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", self.config.bearer_token))
            .map_err(|e| ApiError::Unexpected {
                kind: "InvalidHeader".to_string(),
                detail: e.to_string(),
            })?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Client::builder()
            .default_headers(headers)
            .user_agent(concat!("vikunja-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()
            .map_err(|e| ApiError::Unexpected {
                kind: "ClientBuilder".to_string(),
                detail: e.to_string(),
            })
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base, endpoint.trim_start_matches('/'))
    }

    /// Sends one logical request and returns the parsed JSON body unmodified.
    /// An empty success body yields `Value::Null`.
    #[tracing::instrument(skip(self, query, body))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&Query<'_>>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let session = self.session()?;
        let url = self.url_for(endpoint);
        let operation_name = format!("{} {}", method, endpoint);
        debug!("{} {}", method, url);

        run_with_retry(self.runtime.as_ref(), &self.retry, &operation_name, |_| {
            self.attempt(&session, method.clone(), &url, query, body)
        })
        .await
    }

    async fn attempt(
        &self,
        session: &Client,
        method: Method,
        url: &str,
        query: Option<&Query<'_>>,
        body: Option<&Value>,
    ) -> AttemptOutcome<Value> {
        let mut builder = session.request(method, url);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return classify_transport(&e),
        };

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Could not read {} error body from {}: {}", status, url, e);
                    String::new()
                }
            };
            return classify_status(status, body);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return classify_transport(&e),
        };

        if text.trim().is_empty() {
            return AttemptOutcome::Success(Value::Null);
        }

        match serde_json::from_str(&text) {
            Ok(value) => AttemptOutcome::Success(value),
            Err(e) => AttemptOutcome::Terminal(ApiError::Unexpected {
                kind: "InvalidJson".to_string(),
                detail: e.to_string(),
            }),
        }
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, None, None).await
    }

    pub async fn get_with_query(
        &self,
        endpoint: &str,
        query: &Query<'_>,
    ) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, Some(query), None).await
    }

    pub async fn put(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, endpoint, None, Some(body)).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, endpoint, None, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint, None, None).await
    }

    /// Releases the HTTP session. Safe to call repeatedly or before any request.
    pub fn close(&self) {
        if self.lock_session().take().is_some() {
            info!("Closed Vikunja HTTP session");
        }
    }
}
