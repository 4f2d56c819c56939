//! Progress record delivery
//!
//! A [`Transport`] is chosen once when the tracker is built and never
//! re-decided per record. Every delivery is fire-and-forget: it runs on its own
//! task, failures are logged at `warn`, nothing is retried and nothing reaches
//! the caller.
//!
//! - [`NetworkTransport`] POSTs `{...record, immediate}` as JSON to the
//!   notification URL; without a URL it does nothing.
//! - [`MessageTransport`] posts a `sudoku-progress` envelope to each embedding
//!   context (parent, opener) independently.

mod message;
mod network;

use std::future::Future;

use tracing::{debug, warn};

use crate::record::ProgressRecord;

pub use message::{ChannelContext, EmbeddingContext, EmbeddingContexts, MessageTransport, WriterContext};
pub use network::{NetworkTransport, post_progress};

#[cfg(unix)]
pub use message::SocketContext;

/// Which delivery channel a tracker uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportMode {
    /// HTTP POST to the notification URL
    #[default]
    Network,
    /// Envelope posted to the embedding contexts
    Message,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Network => f.write_str("network"),
            TransportMode::Message => f.write_str("message"),
        }
    }
}

/// Delivery strategy, selected once at construction
pub enum Transport {
    Network(NetworkTransport),
    Message(MessageTransport),
}

impl Transport {
    pub fn mode(&self) -> TransportMode {
        match self {
            Transport::Network(_) => TransportMode::Network,
            Transport::Message(_) => TransportMode::Message,
        }
    }

    /// Hand `record` to the transport; returns immediately
    pub fn dispatch(&self, record: ProgressRecord, immediate: bool) {
        debug!(mode = %self.mode(), immediate, timestamp = record.timestamp, "Transport::dispatch: called");
        match self {
            Transport::Network(network) => network.dispatch(record, immediate),
            Transport::Message(message) => message.dispatch(record, immediate),
        }
    }
}

/// Run a delivery on the current tokio runtime without waiting for it
///
/// Outside a runtime the delivery is dropped with a warning.
pub(crate) fn spawn_delivery<F>(delivery: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(delivery);
        }
        Err(e) => {
            warn!(error = %e, "No async runtime available, dropping progress update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_mode_display() {
        assert_eq!(TransportMode::Network.to_string(), "network");
        assert_eq!(TransportMode::Message.to_string(), "message");
        assert_eq!(TransportMode::default(), TransportMode::Network);
    }

    #[test]
    fn test_spawn_delivery_without_runtime_is_dropped() {
        // Must not panic outside a runtime
        spawn_delivery(async {});
    }

    #[test]
    fn test_transport_reports_mode() {
        let network = Transport::Network(NetworkTransport::new(None, &Default::default()));
        assert_eq!(network.mode(), TransportMode::Network);

        let message = Transport::Message(MessageTransport::new(EmbeddingContexts::default()));
        assert_eq!(message.mode(), TransportMode::Message);
    }
}
