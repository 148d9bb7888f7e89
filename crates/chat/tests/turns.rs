use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use kale_chat::{
    ChatError, ChatSession, CompletionProvider, ContextPolicy, DeltaStream, Message,
    NavigationBridge, Page, Role, StoreState,
};
use kale_indexer::{build_index, IndexOptions};
use kale_search::{ChunkRetriever, Retriever, SearchError};
use kale_text_chunker::Chunk;
use kale_vector_store::{EmbeddingModel, VectorCollection, VectorStoreError};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Replays one scripted delta sequence per request and records the history it saw.
struct ScriptedProvider {
    scripts: Mutex<VecDeque<Vec<Result<String, ChatError>>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(scripts: Vec<Vec<Result<String, ChatError>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn stream_completion(&self, messages: &[Message]) -> kale_chat::Result<DeltaStream> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(stream::iter(script).boxed())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn ok(parts: &[&str]) -> Vec<Result<String, ChatError>> {
    parts.iter().map(|p| Ok(p.to_string())).collect()
}

struct FixedRetriever(Vec<Chunk>);

#[async_trait]
impl ChunkRetriever for FixedRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> kale_search::Result<Vec<Chunk>> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

struct FailingRetriever {
    fatal: bool,
}

#[async_trait]
impl ChunkRetriever for FailingRetriever {
    async fn retrieve(&self, _query: &str, _k: usize) -> kale_search::Result<Vec<Chunk>> {
        if self.fatal {
            Err(SearchError::VectorStoreError(VectorStoreError::ModelMismatch {
                stored: "text-embedding-ada-002".into(),
                configured: "stub-384".into(),
            }))
        } else {
            Err(SearchError::Timeout(Duration::from_secs(15)))
        }
    }
}

fn chunk(text: &str) -> Chunk {
    Chunk::new(text.to_string(), "pykale.xml", 0, 0)
}

#[tokio::test]
async fn turn_streams_commits_raw_and_offers_actions() {
    let provider = ScriptedProvider::new(vec![ok(&[
        "Start with ",
        "[LOADDATA_PAGE_LINK]",
        " then [HUB_LINK].",
    ])]);
    let retriever = FixedRetriever(vec![chunk("kale.loaddata reads videos")]);
    let mut session = ChatSession::new("You are the PyKale assistant.");

    let mut rendered = String::new();
    let outcome = session
        .run_turn("How do I load data?", &retriever, &provider, |d| {
            rendered.push_str(d)
        })
        .await
        .expect("turn");

    assert_eq!(rendered, "Start with [LOADDATA_PAGE_LINK] then [HUB_LINK].");
    assert_eq!(outcome.display_text, "Start with  then .");
    let labels: Vec<&str> = outcome.actions.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec!["Go to Hub Page", "Go to Load Data"]);
    assert!(outcome.truncated.is_none());

    let store = session.store_mut();
    assert_eq!(store.state(), StoreState::SystemPrimed);
    let roles: Vec<Role> = store.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::System, Role::Assistant]
    );
    assert_eq!(
        store.messages()[2].content,
        "Relevant context:\nkale.loaddata reads videos"
    );
    assert_eq!(
        store.messages()[3].content,
        "Start with [LOADDATA_PAGE_LINK] then [HUB_LINK]."
    );

    assert_eq!(session.navigator().current_page(), Page::ChatbotPage);
    let followed = session.follow_action(1).expect("action").page;
    assert_eq!(followed, Page::LoaddataPage);
    assert_eq!(session.navigator().current_page(), Page::LoaddataPage);
}

#[tokio::test]
async fn mid_stream_failure_commits_partial_reply() {
    let provider = ScriptedProvider::new(vec![vec![
        Ok("Domain adapt".to_string()),
        Ok("ation helps...".to_string()),
        Err(ChatError::Provider("connection reset".into())),
    ]]);
    let mut session = ChatSession::new("prompt");

    let outcome = session
        .run_turn("Explain domain adaptation", &FixedRetriever(vec![]), &provider, |_| {})
        .await
        .expect("partial reply is still a reply");

    assert_eq!(outcome.display_text, "Domain adaptation helps...");
    assert!(matches!(outcome.truncated, Some(ChatError::Provider(_))));
    let last = session.store_mut().messages().last().cloned().expect("message");
    assert_eq!(last, Message::assistant("Domain adaptation helps..."));
}

#[tokio::test]
async fn failure_before_any_text_abandons_turn() {
    let provider = ScriptedProvider::new(vec![vec![Err(ChatError::Provider("503".into()))]]);
    let mut session = ChatSession::new("prompt");

    let err = session
        .run_turn("hello", &FixedRetriever(vec![]), &provider, |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Provider(_)));

    let store = session.store_mut();
    assert_eq!(store.state(), StoreState::SystemPrimed);
    assert_eq!(store.messages().len(), 3);
    assert!(store.visible_messages().all(|m| m.role == Role::User));
}

#[tokio::test]
async fn transient_retrieval_failure_uses_empty_context() {
    let provider = ScriptedProvider::new(vec![ok(&["Sure."])]);
    let mut session = ChatSession::new("prompt");

    session
        .run_turn("hi", &FailingRetriever { fatal: false }, &provider, |_| {})
        .await
        .expect("turn");
    assert_eq!(session.store_mut().messages()[2].content, "Relevant context:\n");
}

#[tokio::test]
async fn fatal_retrieval_failure_stops_before_submit() {
    let provider = ScriptedProvider::new(vec![ok(&["unused"])]);
    let mut session = ChatSession::new("prompt");

    let err = session
        .run_turn("hi", &FailingRetriever { fatal: true }, &provider, |_| {})
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(session.store().state(), StoreState::Empty);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn latest_only_policy_sends_one_context_message() {
    let provider = ScriptedProvider::new(vec![ok(&["a1"]), ok(&["a2"])]);
    let retriever = FixedRetriever(vec![chunk("ctx")]);
    let mut session = ChatSession::new("prompt").with_policy(ContextPolicy::LatestOnly);

    session.run_turn("q1", &retriever, &provider, |_| {}).await.expect("turn 1");
    session.run_turn("q2", &retriever, &provider, |_| {}).await.expect("turn 2");

    let second = &provider.requests()[1];
    let contexts = second
        .iter()
        .filter(|m| m.role == Role::System && m.content.starts_with("Relevant context:"))
        .count();
    assert_eq!(contexts, 1);
    assert_eq!(second.len(), 5);
    assert_eq!(session.store_mut().messages().len(), 7);
}

#[tokio::test(start_paused = true)]
async fn silent_stall_is_retried_once() {
    struct StallingThenOk {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl CompletionProvider for StallingThenOk {
        async fn stream_completion(&self, _messages: &[Message]) -> kale_chat::Result<DeltaStream> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Ok(stream::pending().boxed())
            } else {
                Ok(stream::iter(vec![Ok("recovered".to_string())]).boxed())
            }
        }

        fn model(&self) -> &str {
            "stalling"
        }
    }

    let provider = StallingThenOk {
        calls: Mutex::new(0),
    };
    let mut session = ChatSession::new("prompt").with_stream_timeout(Duration::from_secs(5));
    let outcome = session
        .run_turn("hi", &FixedRetriever(vec![]), &provider, |_| {})
        .await
        .expect("turn");

    assert_eq!(outcome.display_text, "recovered");
    assert_eq!(*provider.calls.lock().unwrap(), 2);
}

/// First request sends one delta and then hangs; later requests answer at once.
struct HangsAfterFirstDelta {
    calls: Mutex<usize>,
}

#[async_trait]
impl CompletionProvider for HangsAfterFirstDelta {
    async fn stream_completion(&self, _messages: &[Message]) -> kale_chat::Result<DeltaStream> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            Ok(stream::iter(vec![Ok("partial".to_string())])
                .chain(stream::pending())
                .boxed())
        } else {
            Ok(stream::iter(vec![Ok("second answer".to_string())]).boxed())
        }
    }

    fn model(&self) -> &str {
        "hanging"
    }
}

#[tokio::test(start_paused = true)]
async fn dropped_turn_is_abandoned_and_session_stays_usable() {
    let provider = HangsAfterFirstDelta {
        calls: Mutex::new(0),
    };
    let retriever = FixedRetriever(vec![]);
    let mut session = ChatSession::new("prompt");

    let mut rendered = String::new();
    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        session.run_turn("q1", &retriever, &provider, |d| rendered.push_str(d)),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(rendered, "partial");

    assert_eq!(session.store().state(), StoreState::SystemPrimed);
    assert!(session
        .store()
        .visible_messages()
        .all(|m| m.role != Role::Assistant));

    let outcome = session
        .run_turn("q2", &retriever, &provider, |_| {})
        .await
        .expect("next turn after a dropped one");
    assert_eq!(outcome.display_text, "second answer");

    let store = session.store_mut();
    assert_eq!(store.state(), StoreState::SystemPrimed);
    let roles: Vec<Role> = store.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::System,
            Role::User,
            Role::System,
            Role::Assistant,
        ]
    );
    assert_eq!(
        store.messages().last().cloned(),
        Some(Message::assistant("second answer"))
    );
}

#[tokio::test]
async fn turn_after_failed_turn_succeeds() {
    let provider = ScriptedProvider::new(vec![
        vec![Err(ChatError::Provider("503".into()))],
        ok(&["back online"]),
    ]);
    let mut session = ChatSession::new("prompt");

    assert!(session
        .run_turn("first", &FixedRetriever(vec![]), &provider, |_| {})
        .await
        .is_err());
    let outcome = session
        .run_turn("second", &FixedRetriever(vec![]), &provider, |_| {})
        .await
        .expect("second turn");
    assert_eq!(outcome.display_text, "back online");
}

#[tokio::test]
async fn end_to_end_with_stub_embeddings() {
    let temp = TempDir::new().expect("tempdir");
    let embedder = Arc::new(EmbeddingModel::stub(64));
    let doc = "Domain adaptation aligns source and target distributions. ".repeat(40);
    build_index(
        &doc,
        temp.path(),
        "pykale_xml",
        embedder.clone(),
        IndexOptions::default(),
    )
    .await
    .expect("index");
    let collection = Arc::new(
        VectorCollection::open(temp.path(), "pykale_xml")
            .await
            .expect("open"),
    );
    let retriever = Retriever::new(collection, embedder).expect("retriever");

    let provider = ScriptedProvider::new(vec![ok(&["See [DOMAIN_ADAPTATION_LINK]."])]);
    let mut session = ChatSession::new("prompt");
    let outcome = session
        .run_turn("What is domain adaptation?", &retriever, &provider, |_| {})
        .await
        .expect("turn");

    assert_eq!(outcome.display_text, "See .");
    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].page, Page::DomainAdaptation);

    let context = &provider.requests()[0][2];
    assert!(context.content.starts_with("Relevant context:\n"));
    assert!(context.content.contains("Domain adaptation aligns"));
}
