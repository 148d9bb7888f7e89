use crate::error::{Result, VectorStoreError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const STUB_DIMENSION: usize = 384;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmbeddingMode {
    OpenAi,
    Stub,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "stub" => Ok(Self::Stub),
            other => Err(VectorStoreError::InvalidConfig(format!(
                "Unsupported KALE_EMBEDDING_MODE '{other}' (expected 'openai' or 'stub')"
            ))),
        }
    }

    fn from_env() -> Result<Self> {
        match env::var("KALE_EMBEDDING_MODE") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::OpenAi),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Stub => "stub",
        }
    }
}

/// Settings for the embedding provider, usually read from the environment.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: usize,
    pub batch_size: usize,
    pub stub_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::OpenAi,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            batch_size: DEFAULT_BATCH_SIZE,
            stub_dimension: STUB_DIMENSION,
        }
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            stub_dimension: dimension,
            ..Default::default()
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            mode: EmbeddingMode::from_env()?,
            ..Default::default()
        };
        if let Ok(model) = env::var("KALE_EMBEDDING_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        config.api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = env::var("KALE_EMBEDDING_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }
}

#[derive(Clone)]
struct StubBackend {
    dimension: usize,
}

impl StubBackend {
    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect()
    }
}

struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_retries: usize,
    batch_size: usize,
}

impl OpenAiBackend {
    fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(VectorStoreError::MissingCredential("OPENAI_API_KEY"))?;

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {api_key}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| VectorStoreError::InvalidConfig("invalid OpenAI API key".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_retries: config.max_retries.max(1),
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.embed_one_batch(batch).await?);
        }
        Ok(out)
    }

    async fn embed_one_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
            };
            match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp.json().await?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(VectorStoreError::EmbeddingError(format!(
                                "provider returned {} embeddings for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        return Ok(parsed.data.into_iter().map(|d| d.embedding).collect());
                    }

                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if status == StatusCode::UNAUTHORIZED {
                        return Err(VectorStoreError::InvalidConfig(
                            "embedding provider rejected OPENAI_API_KEY".into(),
                        ));
                    }
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        log::warn!("Embedding request failed ({status}); retry {attempt}");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(VectorStoreError::EmbeddingError(format!(
                        "embeddings request failed ({status}): {}",
                        truncate_body(&body)
                    )));
                }
                Err(err) => {
                    if err.is_timeout() || err.is_connect() {
                        if attempt + 1 < self.max_retries {
                            attempt += 1;
                            log::warn!("Embedding transport error ({err}); retry {attempt}");
                            tokio::time::sleep(retry_backoff(attempt)).await;
                            continue;
                        }
                    }
                    return Err(err.into());
                }
            }
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(250 * (1 << capped))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}…")
    } else {
        body.to_string()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

enum EmbeddingBackend {
    OpenAi(OpenAiBackend),
    Stub(StubBackend),
}

/// Embedding provider used identically at index time and query time
pub struct EmbeddingModel {
    backend: EmbeddingBackend,
    model_id: String,
}

impl EmbeddingModel {
    pub fn from_env() -> Result<Self> {
        Self::new(&EmbeddingConfig::from_env()?)
    }

    /// Fails fast when the OpenAI backend is selected without a credential.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        match config.mode {
            EmbeddingMode::Stub => {
                if config.stub_dimension == 0 {
                    return Err(VectorStoreError::InvalidConfig(
                        "stub embedding dimension must be > 0".into(),
                    ));
                }
                Ok(Self {
                    model_id: format!("stub-{}", config.stub_dimension),
                    backend: EmbeddingBackend::Stub(StubBackend {
                        dimension: config.stub_dimension,
                    }),
                })
            }
            EmbeddingMode::OpenAi => {
                let backend = OpenAiBackend::new(config)?;
                log::info!("Using OpenAI embeddings model '{}'", config.model);
                Ok(Self {
                    model_id: config.model.clone(),
                    backend: EmbeddingBackend::OpenAi(backend),
                })
            }
        }
    }

    #[must_use]
    pub fn stub(dimension: usize) -> Self {
        Self {
            model_id: format!("stub-{dimension}"),
            backend: EmbeddingBackend::Stub(StubBackend { dimension }),
        }
    }

    /// Identifier recorded in collections built with this model
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Known output dimensionality, when it can be told without a request
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        match &self.backend {
            EmbeddingBackend::Stub(stub) => Some(stub.dimension),
            EmbeddingBackend::OpenAi(backend) => match backend.model.as_str() {
                "text-embedding-ada-002" | "text-embedding-3-small" => Some(1536),
                "text-embedding-3-large" => Some(3072),
                _ => None,
            },
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text]).await?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }

    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        match &self.backend {
            EmbeddingBackend::Stub(stub) => Ok(stub.embed_batch(texts)),
            EmbeddingBackend::OpenAi(backend) => backend.embed_batch(texts).await,
        }
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

/// Deterministic pseudo-embedding: identical text maps to an identical unit vector.
fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
