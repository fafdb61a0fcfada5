//! Minimal client for the board's text-completion service.
//!
//! The adventure engine asks this service for short flavor text (room
//! descriptions, NPC dialogue). The client is deliberately narrow: one
//! endpoint, one-shot completions, no streaming. Callers are expected to
//! wrap every call in their own timeout and fall back to canned text when
//! the service is slow or down.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "scribe-1";

/// Errors that can occur when talking to the text service.
#[derive(Debug, Error)]
pub enum Error {
    #[error("text service not configured - set TEXTGEN_BASE_URL")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Text-completion client.
#[derive(Clone)]
pub struct TextGen {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl TextGen {
    /// Create a new client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a client from environment variables.
    ///
    /// Reads `TEXTGEN_BASE_URL` (required), `TEXTGEN_API_KEY` and
    /// `TEXTGEN_MODEL` (optional).
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("TEXTGEN_BASE_URL").map_err(|_| Error::NotConfigured)?;
        let mut client = Self::new(base_url);
        if let Ok(key) = std::env::var("TEXTGEN_API_KEY") {
            client.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("TEXTGEN_MODEL") {
            client.model = model;
        }
        Ok(client)
    }

    /// Set the API key for this client.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send a completion request and return the generated text.
    pub async fn complete(&self, request: Request) -> Result<Completion, Error> {
        let api_request = ApiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{}/v1/complete", self.base_url.trim_end_matches('/')))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(Completion {
            text: api_response.text,
            model: api_response.model,
        })
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref key) = self.api_key {
            headers.insert(
                "authorization",
                HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
            );
        }
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub prompt: String,
    pub system: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            system: None,
            max_tokens: 256,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A completion returned by the service.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated text.
    pub text: String,
    /// The model that produced it.
    pub model: String,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    text: String,
    #[serde(default)]
    model: String,
}
