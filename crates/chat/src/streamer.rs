use crate::error::{ChatError, Result};
use crate::message::Message;
use crate::provider::{CompletionProvider, DeltaStream};
use futures::StreamExt;
use std::time::Duration;

pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Final text of a streamed reply.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    /// Set when the provider failed or stalled before signalling completion.
    pub truncated: Option<ChatError>,
}

/// A single-consumer, non-restartable sequence of reply deltas.
///
/// Every delta handed out is also appended to an internal buffer, which
/// [`ReplyStream::finalize`] returns whether or not the provider finished.
pub struct ReplyStream {
    inner: Option<DeltaStream>,
    buffer: String,
    idle_timeout: Duration,
    error: Option<ChatError>,
}

impl ReplyStream {
    #[must_use]
    pub fn new(inner: DeltaStream, idle_timeout: Duration) -> Self {
        Self {
            inner: Some(inner),
            buffer: String::new(),
            idle_timeout,
            error: None,
        }
    }

    /// Next non-empty delta, or `None` once the stream is over. A provider error
    /// or a wait longer than the idle timeout also ends the stream; see
    /// [`ReplyStream::error`].
    pub async fn next_delta(&mut self) -> Option<String> {
        loop {
            let inner = self.inner.as_mut()?;
            let item = match tokio::time::timeout(self.idle_timeout, inner.next()).await {
                Ok(item) => item,
                Err(_) => {
                    self.end_with(ChatError::Timeout(self.idle_timeout));
                    return None;
                }
            };
            match item {
                Some(Ok(delta)) if delta.is_empty() => continue,
                Some(Ok(delta)) => {
                    self.buffer.push_str(&delta);
                    return Some(delta);
                }
                Some(Err(err)) => {
                    self.end_with(err);
                    return None;
                }
                None => {
                    self.inner = None;
                    return None;
                }
            }
        }
    }

    fn end_with(&mut self, err: ChatError) {
        log::warn!(
            "Completion stream ended early after {} chars: {err}",
            self.buffer.len()
        );
        self.inner = None;
        self.error = Some(err);
    }

    /// Text received so far.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn error(&self) -> Option<&ChatError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    /// Drain any remaining deltas and return the full text.
    pub async fn finalize(mut self) -> Reply {
        while self.next_delta().await.is_some() {}
        Reply {
            text: self.buffer,
            truncated: self.error,
        }
    }

    /// Close the underlying connection; the partial text is discarded.
    pub fn abandon(mut self) {
        if self.inner.take().is_some() {
            log::debug!("Reply stream abandoned after {} chars", self.buffer.len());
        }
    }
}

/// Open one streaming request for `history`.
pub async fn stream_reply(
    provider: &dyn CompletionProvider,
    history: &[Message],
    idle_timeout: Duration,
) -> Result<ReplyStream> {
    let opened = tokio::time::timeout(idle_timeout, provider.stream_completion(history))
        .await
        .map_err(|_| ChatError::Timeout(idle_timeout))??;
    Ok(ReplyStream::new(opened, idle_timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Flips its flag when the stream owning it is dropped.
    struct ClosedFlag(Arc<AtomicBool>);

    impl Drop for ClosedFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn scripted(items: Vec<Result<String>>) -> DeltaStream {
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn skips_empty_deltas_and_collects_text() {
        let mut reply = ReplyStream::new(
            scripted(vec![Ok("Py".into()), Ok(String::new()), Ok("Kale".into())]),
            Duration::from_secs(1),
        );
        assert_eq!(reply.next_delta().await.as_deref(), Some("Py"));
        assert_eq!(reply.next_delta().await.as_deref(), Some("Kale"));
        assert_eq!(reply.next_delta().await, None);
        assert!(reply.is_finished());

        let done = reply.finalize().await;
        assert_eq!(done.text, "PyKale");
        assert!(done.truncated.is_none());
    }

    #[tokio::test]
    async fn provider_error_keeps_partial_text() {
        let reply = ReplyStream::new(
            scripted(vec![
                Ok("Domain adapt".into()),
                Ok("ation helps...".into()),
                Err(ChatError::Provider("connection reset".into())),
                Ok("never seen".into()),
            ]),
            Duration::from_secs(1),
        );
        let done = reply.finalize().await;
        assert_eq!(done.text, "Domain adaptation helps...");
        assert!(matches!(done.truncated, Some(ChatError::Provider(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stall_ends_stream_with_timeout() {
        let stalled = stream::iter(vec![Ok("partial".to_string())])
            .chain(stream::pending())
            .boxed();
        let done = ReplyStream::new(stalled, Duration::from_secs(5))
            .finalize()
            .await;
        assert_eq!(done.text, "partial");
        assert!(matches!(done.truncated, Some(ChatError::Timeout(_))));
    }

    #[tokio::test]
    async fn abandon_after_first_delta_closes_the_stream() {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = ClosedFlag(closed.clone());
        let inner = stream::iter(vec![Ok("Domain".to_string())])
            .chain(stream::pending())
            .map(move |item| {
                let _owner = &flag;
                item
            })
            .boxed();

        let mut reply = ReplyStream::new(inner, Duration::from_secs(5));
        assert_eq!(reply.next_delta().await.as_deref(), Some("Domain"));
        assert_eq!(reply.buffer(), "Domain");
        assert!(!reply.is_finished());
        assert!(!closed.load(Ordering::SeqCst));

        reply.abandon();
        assert!(closed.load(Ordering::SeqCst));
    }
}
