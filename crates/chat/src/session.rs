use crate::error::{ChatError, Result};
use crate::message::Message;
use crate::navigation::{NavAction, NavigationBridge, SessionNavigator};
use crate::placeholder::{find_triggered_tokens, strip_tokens};
use crate::provider::CompletionProvider;
use crate::store::{ContextPolicy, ConversationStore};
use crate::streamer::{stream_reply, Reply, ReplyStream, DEFAULT_STREAM_TIMEOUT};
use kale_search::{ChunkRetriever, DEFAULT_TOP_K};
use std::time::Duration;

const MAX_STREAM_ATTEMPTS: usize = 2;

/// Result of one completed user turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Reply with navigation placeholders removed
    pub display_text: String,
    /// One action per distinct placeholder in the reply
    pub actions: Vec<NavAction>,
    /// Why the reply ended early, if it did
    pub truncated: Option<ChatError>,
}

/// One user's conversation plus its page state.
pub struct ChatSession<N: NavigationBridge = SessionNavigator> {
    store: ConversationStore,
    navigator: N,
    policy: ContextPolicy,
    top_k: usize,
    stream_timeout: Duration,
    last_actions: Vec<NavAction>,
}

impl ChatSession<SessionNavigator> {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self::with_navigator(system_prompt, SessionNavigator::default())
    }
}

impl<N: NavigationBridge> ChatSession<N> {
    pub fn with_navigator(system_prompt: impl Into<String>, navigator: N) -> Self {
        Self {
            store: ConversationStore::new(system_prompt),
            navigator,
            policy: ContextPolicy::default(),
            top_k: DEFAULT_TOP_K,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            last_actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ContextPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Actions offered by the most recent reply.
    pub fn last_actions(&self) -> &[NavAction] {
        &self.last_actions
    }

    /// Trigger the `index`-th action of the most recent reply.
    pub fn follow_action(&mut self, index: usize) -> Option<&NavAction> {
        let action = self.last_actions.get(index)?;
        action.trigger(&mut self.navigator);
        Some(action)
    }

    /// Retrieve context, stream the reply through `on_delta`, commit it and
    /// resolve its navigation placeholders.
    ///
    /// Retrieval failures that are not configuration errors degrade to an empty
    /// context. A reply cut short after some text is committed as it stands; a
    /// reply that fails before any text abandons the turn and returns the error.
    pub async fn run_turn<F>(
        &mut self,
        text: &str,
        retriever: &dyn ChunkRetriever,
        provider: &dyn CompletionProvider,
        mut on_delta: F,
    ) -> Result<TurnOutcome>
    where
        F: FnMut(&str),
    {
        let context = match retriever.retrieve(text, self.top_k).await {
            Ok(chunks) => chunks,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                log::warn!("Retrieval failed, continuing without context: {err}");
                Vec::new()
            }
        };
        log::debug!("Turn context: {} chunks", context.len());

        self.store.submit_user_message(text, &context)?;
        let history = self.store.prompt_messages(self.policy);
        let pending = PendingTurn::new(&mut self.store);

        let reply =
            stream_with_retry(provider, &history, self.stream_timeout, &mut on_delta).await?;
        if reply.text.is_empty() {
            if let Some(err) = reply.truncated {
                return Err(err);
            }
        }

        // The log keeps the raw reply; placeholders are resolved for display only.
        pending.commit(reply.text.clone())?;
        let actions: Vec<NavAction> = find_triggered_tokens(&reply.text)
            .into_iter()
            .map(NavAction::for_token)
            .collect();
        self.last_actions = actions.clone();

        Ok(TurnOutcome {
            display_text: strip_tokens(&reply.text),
            actions,
            truncated: reply.truncated,
        })
    }
}

/// An outstanding turn in the store. Dropping it without [`PendingTurn::commit`],
/// including when the turn future itself is dropped, abandons the turn.
struct PendingTurn<'a> {
    store: &'a mut ConversationStore,
    committed: bool,
}

impl<'a> PendingTurn<'a> {
    fn new(store: &'a mut ConversationStore) -> Self {
        Self {
            store,
            committed: false,
        }
    }

    fn commit(mut self, text: String) -> Result<()> {
        self.store.commit_assistant_message(text)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.committed && self.store.abandon_turn() {
            log::debug!("Turn abandoned without an assistant message");
        }
    }
}

async fn stream_with_retry<F>(
    provider: &dyn CompletionProvider,
    history: &[Message],
    timeout: Duration,
    on_delta: &mut F,
) -> Result<Reply>
where
    F: FnMut(&str),
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut stream: ReplyStream = match stream_reply(provider, history, timeout).await {
            Ok(stream) => stream,
            Err(err) if !err.is_fatal() && attempt < MAX_STREAM_ATTEMPTS => {
                log::warn!("Opening completion stream failed: {err}; retrying");
                continue;
            }
            Err(err) => return Err(err),
        };

        while let Some(delta) = stream.next_delta().await {
            on_delta(&delta);
        }

        let silent_timeout = stream.buffer().is_empty()
            && matches!(stream.error(), Some(ChatError::Timeout(_)));
        if silent_timeout && attempt < MAX_STREAM_ATTEMPTS {
            log::warn!("Completion stream produced nothing before timing out; retrying");
            stream.abandon();
            continue;
        }
        return Ok(stream.finalize().await);
    }
}
