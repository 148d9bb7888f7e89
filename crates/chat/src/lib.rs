//! # Kale Chat
//!
//! The conversational core of the PyKale assistant.
//!
//! ## One turn
//!
//! ```text
//! user text
//!     │
//!     ├──> ChunkRetriever::retrieve(text, k)      (errors → empty context)
//!     │
//!     ├──> ConversationStore
//!     │      [system prompt] [user] [context] ...
//!     │
//!     ├──> CompletionProvider ──> ReplyStream ──> on_delta(...)
//!     │
//!     └──> commit raw reply ──> strip_tokens / find_triggered_tokens
//!                                     └─> NavAction ("Go to ...")
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kale_chat::{load_system_prompt, ChatConfig, ChatSession, OpenAiChatProvider};
//! use kale_search::Retriever;
//! use kale_vector_store::{EmbeddingModel, VectorCollection};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ChatConfig::from_env()?;
//!     let collection = Arc::new(VectorCollection::open("vector_db", "pykale_xml").await?);
//!     let retriever = Retriever::new(collection, Arc::new(EmbeddingModel::from_env()?))?;
//!     let provider = OpenAiChatProvider::new(config.openai()?)?;
//!
//!     let mut session = ChatSession::new(load_system_prompt(&config.system_prompt_path)?);
//!     let outcome = session
//!         .run_turn("What is domain adaptation?", &retriever, &provider, |delta| {
//!             print!("{delta}")
//!         })
//!         .await?;
//!     for action in outcome.actions {
//!         println!("[{}]", action.label);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod message;
mod navigation;
mod page;
mod placeholder;
mod provider;
mod session;
mod store;
mod streamer;

pub use config::{load_system_prompt, ChatConfig, DEFAULT_SYSTEM_PROMPT_PATH};
pub use error::{ChatError, Result};
pub use message::{Message, Role};
pub use navigation::{NavAction, NavigationBridge, SessionNavigator};
pub use page::Page;
pub use placeholder::{find_triggered_tokens, strip_tokens, NavToken};
pub use provider::{
    CompletionProvider, DeltaStream, OpenAiChatConfig, OpenAiChatProvider, DEFAULT_CHAT_MODEL,
};
pub use session::{ChatSession, TurnOutcome};
pub use store::{ContextPolicy, ConversationStore, StoreState};
pub use streamer::{stream_reply, Reply, ReplyStream, DEFAULT_STREAM_TIMEOUT};
