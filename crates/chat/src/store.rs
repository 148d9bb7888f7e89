use crate::error::{ChatError, Result};
use crate::message::{Message, Role};
use kale_search::format_context;
use kale_text_chunker::Chunk;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No system prompt yet
    Empty,
    /// Idle; ready for a user turn
    SystemPrimed,
    /// A user turn is submitted and its reply is outstanding
    AwaitingResponse,
}

/// Which injected context messages are sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextPolicy {
    /// Only the newest context message; older ones stay in the log.
    #[default]
    LatestOnly,
    /// Every context message ever injected.
    Accumulate,
}

impl FromStr for ContextPolicy {
    type Err = ChatError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latest" | "latest-only" | "latest_only" => Ok(Self::LatestOnly),
            "accumulate" | "all" => Ok(Self::Accumulate),
            other => Err(ChatError::InvalidConfig(format!(
                "unknown context policy '{other}' (expected 'latest' or 'accumulate')"
            ))),
        }
    }
}

/// Append-only message log of one conversation.
///
/// ```text
/// Empty ──prime──> SystemPrimed ──submit──> AwaitingResponse
///                       ^                         │
///                       └──commit / abandon───────┘
/// ```
#[derive(Debug, Clone)]
pub struct ConversationStore {
    system_prompt: String,
    messages: Vec<Message>,
    context_positions: Vec<usize>,
    state: StoreState,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            context_positions: Vec::new(),
            state: StoreState::Empty,
        }
    }

    #[must_use]
    pub const fn state(&self) -> StoreState {
        self.state
    }

    /// Inject the system prompt if the log holds none. Idempotent.
    pub fn prime(&mut self) {
        if self.state == StoreState::Empty {
            self.messages.push(Message::system(self.system_prompt.clone()));
            self.state = StoreState::SystemPrimed;
            log::debug!("Conversation primed with system prompt");
        }
    }

    /// The full log. Reading primes an empty store.
    pub fn messages(&mut self) -> &[Message] {
        self.prime();
        &self.messages
    }

    /// Append the user message followed by the context message built from `context`.
    pub fn submit_user_message(&mut self, text: &str, context: &[Chunk]) -> Result<()> {
        if self.state == StoreState::AwaitingResponse {
            return Err(ChatError::InvalidState(self.state));
        }
        self.prime();

        self.messages.push(Message::user(text));
        self.context_positions.push(self.messages.len());
        self.messages.push(Message::system(format_context(context)));
        self.state = StoreState::AwaitingResponse;
        Ok(())
    }

    pub fn commit_assistant_message(&mut self, text: impl Into<String>) -> Result<()> {
        if self.state != StoreState::AwaitingResponse {
            return Err(ChatError::InvalidState(self.state));
        }
        self.messages.push(Message::assistant(text));
        self.state = StoreState::SystemPrimed;
        Ok(())
    }

    /// Leave the outstanding turn without an assistant message.
    /// Returns false when no turn was outstanding.
    pub fn abandon_turn(&mut self) -> bool {
        if self.state == StoreState::AwaitingResponse {
            self.state = StoreState::SystemPrimed;
            true
        } else {
            false
        }
    }

    /// User and assistant messages, in order.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// The history to send to the completion provider.
    pub fn prompt_messages(&mut self, policy: ContextPolicy) -> Vec<Message> {
        self.prime();
        match policy {
            ContextPolicy::Accumulate => self.messages.clone(),
            ContextPolicy::LatestOnly => {
                let latest = self.context_positions.last().copied();
                self.messages
                    .iter()
                    .enumerate()
                    .filter(|(pos, _)| {
                        Some(*pos) == latest || !self.context_positions.contains(pos)
                    })
                    .map(|(_, message)| message.clone())
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text.to_string(), "pykale.xml", 0, 0)
    }

    fn roles(messages: &[Message]) -> Vec<Role> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn priming_is_idempotent() {
        let mut store = ConversationStore::new("You are the PyKale assistant.");
        assert_eq!(store.state(), StoreState::Empty);
        store.prime();
        store.prime();
        let _ = store.messages();
        let _ = store.prompt_messages(ContextPolicy::Accumulate);

        let systems = store
            .messages()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(systems, 1);
        assert_eq!(store.state(), StoreState::SystemPrimed);
    }

    #[test]
    fn submit_on_empty_store_primes_first() {
        let mut store = ConversationStore::new("prompt");
        store
            .submit_user_message("What is PyKale?", &[chunk("PyKale is a library")])
            .unwrap();

        assert_eq!(store.state(), StoreState::AwaitingResponse);
        assert_eq!(
            roles(store.messages()),
            vec![Role::System, Role::User, Role::System]
        );
        assert_eq!(
            store.messages()[2].content,
            "Relevant context:\nPyKale is a library"
        );
    }

    #[test]
    fn empty_context_still_appends_block() {
        let mut store = ConversationStore::new("prompt");
        store.submit_user_message("hi", &[]).unwrap();
        assert_eq!(store.messages()[2].content, "Relevant context:\n");
    }

    #[test]
    fn state_guards() {
        let mut store = ConversationStore::new("prompt");
        assert!(matches!(
            store.commit_assistant_message("early"),
            Err(ChatError::InvalidState(StoreState::Empty))
        ));

        store.submit_user_message("one", &[]).unwrap();
        assert!(matches!(
            store.submit_user_message("two", &[]),
            Err(ChatError::InvalidState(StoreState::AwaitingResponse))
        ));

        store.commit_assistant_message("answer").unwrap();
        assert_eq!(store.state(), StoreState::SystemPrimed);
        assert!(store.commit_assistant_message("again").is_err());
    }

    #[test]
    fn abandon_appends_nothing() {
        let mut store = ConversationStore::new("prompt");
        assert!(!store.abandon_turn());
        store.submit_user_message("question", &[]).unwrap();
        let before = store.messages().len();

        assert!(store.abandon_turn());
        assert_eq!(store.messages().len(), before);
        assert_eq!(store.state(), StoreState::SystemPrimed);
        store.submit_user_message("next", &[]).unwrap();
    }

    #[test]
    fn visible_messages_skip_system() {
        let mut store = ConversationStore::new("prompt");
        store.submit_user_message("q1", &[chunk("c1")]).unwrap();
        store.commit_assistant_message("a1").unwrap();

        let visible: Vec<&str> = store.visible_messages().map(|m| m.content.as_str()).collect();
        assert_eq!(visible, vec!["q1", "a1"]);
    }

    #[test]
    fn latest_only_policy_drops_stale_context_from_prompt() {
        let mut store = ConversationStore::new("prompt");
        store.submit_user_message("q1", &[chunk("c1")]).unwrap();
        store.commit_assistant_message("a1").unwrap();
        store.submit_user_message("q2", &[chunk("c2")]).unwrap();

        let latest: Vec<String> = store
            .prompt_messages(ContextPolicy::LatestOnly)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(
            latest,
            vec!["prompt", "q1", "a1", "q2", "Relevant context:\nc2"]
        );

        let all = store.prompt_messages(ContextPolicy::Accumulate);
        assert_eq!(all.len(), 6);
        assert_eq!(store.messages().len(), 6);
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("latest".parse::<ContextPolicy>().unwrap(), ContextPolicy::LatestOnly);
        assert_eq!(
            "Accumulate".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::Accumulate
        );
        assert!("sometimes".parse::<ContextPolicy>().is_err());
    }
}
