//! OpenAI-compatible chat client for thought proposals and critiques.
//!
//! Every call is one independent sampled completion (`n = 1`), so two calls
//! with identical context may legitimately return different text. Works
//! against any server exposing `/v1/chat/completions` (SGLang, vLLM,
//! llama.cpp server, hosted APIs).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use serde::Serialize;
use url::Url;

use crate::prompt::PromptContext;
use crate::types::OracleConfig;

/// Sends per chat call; only 5xx responses are retried.
const SEND_ATTEMPTS: u32 = 3;
/// First retry delay, doubled on each further retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
/// Consecutive transport failures that pause the client.
const TRIP_AFTER: u32 = 3;
/// How long a tripped client rejects calls without touching the network.
const COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    open_until: Option<Instant>,
}

/// Shared across clones so every attempt sees the same server health.
#[derive(Debug, Default)]
struct Breaker(Mutex<BreakerState>);

impl Breaker {
    fn state(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject the call while the cooldown runs; close again once it is over.
    fn admit(&self) -> anyhow::Result<()> {
        let mut state = self.state();
        let Some(until) = state.open_until else {
            return Ok(());
        };
        let now = Instant::now();
        if now < until {
            anyhow::bail!(
                "oracle paused: circuit breaker open after {} transport failures, {}s left",
                state.failures,
                (until - now).as_secs()
            );
        }
        *state = BreakerState::default();
        tracing::info!("Oracle cooldown over, accepting calls again");
        Ok(())
    }

    fn transport_ok(&self) {
        self.state().failures = 0;
    }

    fn transport_failed(&self) {
        let mut state = self.state();
        state.failures += 1;
        if state.failures >= TRIP_AFTER && state.open_until.is_none() {
            state.open_until = Some(Instant::now() + COOLDOWN);
            tracing::error!(
                failures = state.failures,
                cooldown_s = COOLDOWN.as_secs(),
                "Oracle unreachable, pausing all calls"
            );
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    top_p: f64,
    max_tokens: usize,
    n: usize,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// HTTP client for an OpenAI-compatible chat server.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: Url,
    config: OracleConfig,
    api_key: Option<String>,
    breaker: Arc<Breaker>,
}

impl ChatClient {
    /// Create a client and verify the server is reachable.
    pub async fn new(config: OracleConfig) -> anyhow::Result<Self> {
        let this = Self::build(config)?;
        this.health_check().await?;
        Ok(this)
    }

    /// Create a client without contacting the server.
    pub fn build(config: OracleConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.server_url)
            .map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {e}", config.server_url))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());

        Ok(Self {
            client,
            base_url,
            config,
            api_key,
            breaker: Arc::default(),
        })
    }

    /// Settings this client was built from.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Verify the server is reachable and responding.
    pub async fn health_check(&self) -> anyhow::Result<()> {
        let url = self.base_url.join("/v1/models")?;
        let mut req = self.client.get(url).timeout(Duration::from_secs(10));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| {
            anyhow::anyhow!("Oracle server unreachable at {}: {e}", self.config.server_url)
        })?;
        if !resp.status().is_success() {
            anyhow::bail!(
                "Oracle server at {} returned {} for /v1/models",
                self.config.server_url,
                resp.status()
            );
        }
        tracing::info!(url = %self.config.server_url, "Oracle server is reachable");
        Ok(())
    }

    /// Sample one thought proposal.
    pub async fn propose(&self, context: &PromptContext) -> anyhow::Result<String> {
        self.complete(context, self.config.temperature).await
    }

    /// Sample one critique.
    pub async fn critique(&self, context: &PromptContext) -> anyhow::Result<String> {
        self.complete(context, self.config.critique_temperature).await
    }

    async fn complete(&self, context: &PromptContext, temperature: f64) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &context.system,
                },
                ChatMessage {
                    role: "user",
                    content: &context.user,
                },
            ],
            temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            n: 1,
        };

        let resp = self.send_chat(&request).await?;
        let body = resp.bytes().await?;

        let val: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            let preview: String = String::from_utf8_lossy(&body).chars().take(200).collect();
            anyhow::anyhow!("Failed to decode chat response: {e}; body: {preview}")
        })?;

        let text = val
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                let preview: String = val.to_string().chars().take(200).collect();
                anyhow::anyhow!("Chat response has no choices[0].message.content: {preview}")
            })?;

        tracing::debug!(chars = text.len(), temperature, "Oracle completion received");
        Ok(text.to_string())
    }

    /// POST one chat request, retrying 5xx replies with doubling delays.
    ///
    /// 4xx replies and transport errors are returned at once; transport errors
    /// also count toward pausing the client.
    async fn send_chat(&self, request: &ChatRequest<'_>) -> anyhow::Result<Response> {
        self.breaker.admit()?;
        let url = self.base_url.join("/v1/chat/completions")?;

        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 1;
        loop {
            let mut req = self.client.post(url.clone()).json(request);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }

            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::warn!(error = %e, %url, "Oracle transport failure");
                    self.breaker.transport_failed();
                    anyhow::bail!("oracle unreachable at {url}: {e}");
                }
            };
            self.breaker.transport_ok();

            let status = resp.status();
            if status.is_server_error() && attempt < SEND_ATTEMPTS {
                tracing::debug!(%status, attempt, delay_ms = delay.as_millis() as u64, "Oracle server error, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
                continue;
            }
            if status.is_client_error() || status.is_server_error() {
                let detail = resp.text().await.unwrap_or_default();
                anyhow::bail!("oracle call failed ({status}) after {attempt} tries: {detail}");
            }
            return Ok(resp);
        }
    }
}
