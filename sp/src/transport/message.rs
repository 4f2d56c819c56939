//! Message transport - post envelopes to the contexts embedding the session
//!
//! An embedding context is anything that can receive a `sudoku-progress`
//! envelope: the parent that launched the session, or an opener that asked
//! for it. Each context is delivered to independently, so a dead parent never
//! stops the opener from hearing about progress and vice versa.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use super::spawn_delivery;
use crate::error::TransportError;
use crate::record::{MessageEnvelope, ProgressRecord};

/// Something that can receive progress envelopes
#[async_trait]
pub trait EmbeddingContext: Send + Sync {
    /// Short name used in log lines
    fn label(&self) -> &str;

    /// Deliver one envelope
    async fn post(&self, envelope: &MessageEnvelope) -> Result<(), TransportError>;
}

/// The contexts the current session can address; either may be absent
#[derive(Clone, Default)]
pub struct EmbeddingContexts {
    pub parent: Option<Arc<dyn EmbeddingContext>>,
    pub opener: Option<Arc<dyn EmbeddingContext>>,
}

impl EmbeddingContexts {
    pub fn with_parent(mut self, parent: Arc<dyn EmbeddingContext>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn EmbeddingContext>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_none() && self.opener.is_none()
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<dyn EmbeddingContext>> {
        self.parent.iter().chain(self.opener.iter())
    }
}

impl std::fmt::Debug for EmbeddingContexts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingContexts")
            .field("parent", &self.parent.as_ref().map(|c| c.label().to_string()))
            .field("opener", &self.opener.as_ref().map(|c| c.label().to_string()))
            .finish()
    }
}

/// Posts envelopes to every addressable embedding context
#[derive(Debug, Clone)]
pub struct MessageTransport {
    contexts: EmbeddingContexts,
}

impl MessageTransport {
    pub fn new(contexts: EmbeddingContexts) -> Self {
        debug!(?contexts, "MessageTransport::new: called");
        Self { contexts }
    }

    pub fn contexts(&self) -> &EmbeddingContexts {
        &self.contexts
    }

    /// Fire-and-forget post to each context; failures are logged only
    pub fn dispatch(&self, record: ProgressRecord, immediate: bool) {
        if self.contexts.is_empty() {
            debug!("MessageTransport::dispatch: no embedding context, skipping");
            return;
        }

        let envelope = Arc::new(MessageEnvelope::new(record, immediate));
        for context in self.contexts.iter() {
            let context = Arc::clone(context);
            let envelope = Arc::clone(&envelope);
            spawn_delivery(async move {
                if let Err(e) = context.post(&envelope).await {
                    warn!(context = context.label(), error = %e, "Failed to send progress via message");
                }
            });
        }
    }
}

/// In-process context backed by an unbounded channel
pub struct ChannelContext {
    label: String,
    tx: mpsc::UnboundedSender<MessageEnvelope>,
}

impl ChannelContext {
    pub fn new(label: impl Into<String>, tx: mpsc::UnboundedSender<MessageEnvelope>) -> Self {
        Self { label: label.into(), tx }
    }

    /// Create a context together with the receiving end
    pub fn pair(label: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<MessageEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(label, tx), rx)
    }
}

#[async_trait]
impl EmbeddingContext for ChannelContext {
    fn label(&self) -> &str {
        &self.label
    }

    async fn post(&self, envelope: &MessageEnvelope) -> Result<(), TransportError> {
        self.tx
            .send(envelope.clone())
            .map_err(|_| TransportError::Closed("channel receiver dropped"))
    }
}

/// Context that writes one JSON envelope per line to a byte stream
///
/// The `sp` binary uses this on stdout so a parent process reading the child's
/// output receives the envelopes.
pub struct WriterContext<W> {
    label: String,
    writer: Mutex<W>,
}

impl<W> WriterContext<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(label: impl Into<String>, writer: W) -> Self {
        Self {
            label: label.into(),
            writer: Mutex::new(writer),
        }
    }
}

impl WriterContext<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new("parent", tokio::io::stdout())
    }
}

#[async_trait]
impl<W> EmbeddingContext for WriterContext<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn label(&self) -> &str {
        &self.label
    }

    async fn post(&self, envelope: &MessageEnvelope) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(envelope)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(unix)]
mod socket {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;
    use tracing::debug;

    use super::EmbeddingContext;
    use crate::error::TransportError;
    use crate::record::MessageEnvelope;

    /// Context listening on a Unix domain socket
    ///
    /// Each envelope is one connection carrying one line of JSON.
    #[derive(Debug, Clone)]
    pub struct SocketContext {
        label: String,
        path: PathBuf,
        timeout: Duration,
    }

    impl SocketContext {
        pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, timeout: Duration) -> Self {
            Self {
                label: label.into(),
                path: path.into(),
                timeout,
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        async fn send_line(&self, line: &[u8]) -> Result<(), TransportError> {
            let mut stream = UnixStream::connect(&self.path).await?;
            stream.write_all(line).await?;
            stream.flush().await?;
            stream.shutdown().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingContext for SocketContext {
        fn label(&self) -> &str {
            &self.label
        }

        async fn post(&self, envelope: &MessageEnvelope) -> Result<(), TransportError> {
            debug!(path = %self.path.display(), "SocketContext::post: called");
            let mut line = serde_json::to_vec(envelope)?;
            line.push(b'\n');

            tokio::time::timeout(self.timeout, self.send_line(&line))
                .await
                .map_err(|_| TransportError::Timeout(self.timeout))?
        }
    }
}

#[cfg(unix)]
pub use socket::SocketContext;
