use crate::error::{ChatError, Result};
use crate::message::Message;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Text deltas of one streamed completion, in arrival order.
pub type DeltaStream = BoxStream<'static, Result<String>>;

/// A chat-completions backend that streams its reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open one streaming request over the full history.
    async fn stream_completion(&self, messages: &[Message]) -> Result<DeltaStream>;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct OpenAiChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub connect_timeout: Duration,
}

/// OpenAI-compatible `/chat/completions` with `stream: true`.
pub struct OpenAiChatProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiChatProvider {
    pub fn new(config: OpenAiChatConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ChatError::MissingCredential("OPENAI_API_KEY"));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiChatProvider {
    async fn stream_completion(&self, messages: &[Message]) -> Result<DeltaStream> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    ChatError::InvalidConfig("completion provider rejected OPENAI_API_KEY".into())
                }
                StatusCode::NOT_FOUND => ChatError::InvalidConfig(format!(
                    "completion model '{}' not available: {body}",
                    self.model
                )),
                _ => ChatError::Provider(format!("chat completion failed ({status}): {body}")),
            });
        }
        log::debug!("Streaming completion from {}", self.model);

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();
        let state = SseState {
            bytes,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        };
        Ok(stream::unfold(state, next_delta).boxed())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

struct SseState {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

async fn next_delta(mut state: SseState) -> Option<(Result<String>, SseState)> {
    loop {
        if let Some(delta) = state.pending.pop_front() {
            return Some((Ok(delta), state));
        }
        if state.done {
            return None;
        }
        match state.bytes.next().await {
            Some(Ok(chunk)) => {
                for event in state.decoder.push(&chunk) {
                    match event {
                        SseEvent::Delta(text) => state.pending.push_back(text),
                        SseEvent::Done => state.done = true,
                    }
                }
            }
            Some(Err(err)) => {
                state.done = true;
                return Some((Err(err.into()), state));
            }
            None => {
                state.done = true;
                if !state.decoder.is_idle() {
                    log::debug!("Completion stream ended without [DONE]");
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    Delta(String),
    Done,
}

/// Line-buffered decoder for `data:` frames of a chat-completions stream.
/// Buffers raw bytes so a code point split across network chunks survives.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                events.push(SseEvent::Done);
                continue;
            }
            match serde_json::from_str::<ChatChunk>(data) {
                Ok(chunk) => {
                    for choice in chunk.choices {
                        if let Some(content) = choice.delta.content {
                            events.push(SseEvent::Delta(content));
                        }
                    }
                }
                Err(err) => log::debug!("Skipping malformed stream frame: {err}"),
            }
        }
        events
    }

    fn is_idle(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}
