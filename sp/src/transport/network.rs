//! Network transport - POST progress records to a notification URL

use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use super::spawn_delivery;
use crate::config::NetworkConfig;
use crate::error::TransportError;
use crate::record::{NetworkPayload, ProgressRecord};

/// POSTs `{...record, immediate}` to the notification URL
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    client: reqwest::Client,
    target: Option<Url>,
    timeout: Duration,
}

impl NetworkTransport {
    /// Build a transport; `target == None` makes every dispatch a no-op
    pub fn new(target: Option<Url>, settings: &NetworkConfig) -> Self {
        debug!(target = ?target.as_ref().map(Url::as_str), "NetworkTransport::new: called");
        let timeout = settings.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .unwrap_or_default();
        Self {
            client,
            target,
            timeout,
        }
    }

    pub fn target(&self) -> Option<&Url> {
        self.target.as_ref()
    }

    /// Fire-and-forget POST; failures are logged only
    pub fn dispatch(&self, record: ProgressRecord, immediate: bool) {
        let Some(url) = self.target.clone() else {
            debug!("NetworkTransport::dispatch: no notification URL, skipping");
            return;
        };

        let client = self.client.clone();
        let timeout = self.timeout;
        let payload = NetworkPayload::new(record, immediate);
        spawn_delivery(async move {
            match post_progress(&client, &url, &payload, timeout).await {
                Ok(()) => {
                    debug!(%url, immediate, "NetworkTransport::dispatch: delivered");
                }
                Err(e) => {
                    warn!(%url, error = %e, unreachable = e.is_unreachable(), "Failed to send progress update");
                }
            }
        });
    }
}

/// POST one payload and check the response status
pub async fn post_progress(
    client: &reqwest::Client,
    url: &Url,
    payload: &NetworkPayload,
    timeout: Duration,
) -> Result<(), TransportError> {
    let response = client.post(url.clone()).json(payload).send().await.map_err(|e| {
        if e.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            TransportError::Network(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::GameState;

    fn record() -> ProgressRecord {
        ProgressRecord {
            session_id: "s".to_string(),
            timestamp: 0,
            game_state: GameState::default(),
        }
    }

    #[test]
    fn test_without_target_dispatch_is_noop() {
        let transport = NetworkTransport::new(None, &NetworkConfig::default());
        assert!(transport.target().is_none());
        // No runtime here: a no-op must not even try to spawn
        transport.dispatch(record(), true);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_swallowed() {
        // Port 9 (discard) on localhost is almost never listening
        let url = Url::parse("http://127.0.0.1:9/progress").unwrap();
        let settings = NetworkConfig {
            timeout_ms: 200,
            ..Default::default()
        };
        let transport = NetworkTransport::new(Some(url.clone()), &settings);
        assert_eq!(transport.target(), Some(&url));

        let delivery = tokio::spawn({
            let transport = transport.clone();
            async move { transport.dispatch(record(), false) }
        });
        assert!(delivery.await.is_ok(), "dispatch must not surface the failure");

        tokio::time::sleep(Duration::from_millis(300)).await;
        // Still usable after a failed delivery
        transport.dispatch(record(), true);
    }

    #[tokio::test]
    async fn test_post_progress_reports_connect_failure() {
        let client = reqwest::Client::new();
        let url = Url::parse("http://127.0.0.1:9/progress").unwrap();
        let payload = NetworkPayload::new(record(), false);

        let result = post_progress(&client, &url, &payload, Duration::from_millis(200)).await;
        assert!(result.is_err());
    }
}
