//! Launch parameter parsing
//!
//! The embedding context hands the session its parameters as a query string:
//!
//! | param      | meaning                              | default  |
//! |------------|--------------------------------------|----------|
//! | `session`  | opaque session identifier            | none     |
//! | `notify`   | HTTP endpoint URL                    | none     |
//! | `interval` | heartbeat period in milliseconds     | 5000     |
//! | `method`   | `message` selects message transport  | network  |
//!
//! Nothing here fails: an absent session means "do not track", a malformed
//! interval falls back to the default, a malformed URL counts as absent.

use reqwest::Url;
use tracing::{debug, warn};

use crate::transport::TransportMode;

/// Heartbeat period used when `interval` is absent or unparseable
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 5000;

/// Tracker settings taken from the launch parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Opaque session identifier, never empty
    pub session_id: String,
    /// Where network-mode records are POSTed
    pub notification_target: Option<Url>,
    /// Heartbeat period; 0 disables the heartbeat
    pub update_interval_ms: u64,
    pub transport_mode: TransportMode,
}

impl TrackerConfig {
    /// Build a config directly; `None` when `session_id` is empty
    pub fn new(session_id: impl Into<String>) -> Option<Self> {
        let session_id = session_id.into();
        if session_id.is_empty() {
            return None;
        }
        Some(Self {
            session_id,
            notification_target: None,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            transport_mode: TransportMode::Network,
        })
    }

    pub fn with_notification_target(mut self, target: Url) -> Self {
        self.notification_target = Some(target);
        self
    }

    pub fn with_update_interval_ms(mut self, interval_ms: u64) -> Self {
        self.update_interval_ms = interval_ms;
        self
    }

    pub fn with_transport_mode(mut self, mode: TransportMode) -> Self {
        self.transport_mode = mode;
        self
    }

    /// Parse key/value pairs; `None` when there is no usable session id
    ///
    /// When a key repeats, its first occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut session = None;
        let mut notify = None;
        let mut interval = None;
        let mut method = None;

        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "session" => &mut session,
                "notify" => &mut notify,
                "interval" => &mut interval,
                "method" => &mut method,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.as_ref().to_string());
            }
        }

        let Some(session_id) = session.filter(|s| !s.is_empty()) else {
            debug!("TrackerConfig::from_pairs: no session id, tracking disabled");
            return None;
        };

        let config = Self {
            session_id,
            notification_target: notify.as_deref().and_then(parse_target),
            update_interval_ms: parse_interval(interval.as_deref()),
            transport_mode: parse_method(method.as_deref()),
        };
        debug!(?config, "TrackerConfig::from_pairs: parsed");
        Some(config)
    }

    /// Parse a raw query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut carrier = Url::parse("about:blank").ok()?;
        carrier.set_query(Some(query));
        Self::from_launch_url(&carrier)
    }

    /// Parse the query of a full launch URL
    pub fn from_launch_url(url: &Url) -> Option<Self> {
        Self::from_pairs(url.query_pairs())
    }

    /// Parse either a full launch URL or a bare query string
    pub fn from_launch_input(input: &str) -> Option<Self> {
        match Url::parse(input) {
            Ok(url) if url.has_host() => Self::from_launch_url(&url),
            _ => Self::from_query(input),
        }
    }

    pub fn heartbeat_enabled(&self) -> bool {
        self.update_interval_ms > 0
    }
}

/// `interval` value: leading integer ms, default on failure, `<= 0` disables
///
/// Trailing text after the digits is ignored, so `2500ms` reads as 2500.
fn parse_interval(value: Option<&str>) -> u64 {
    match value.and_then(leading_integer) {
        Some(ms) if ms <= 0 => 0,
        Some(ms) => ms.unsigned_abs(),
        None => DEFAULT_UPDATE_INTERVAL_MS,
    }
}

/// Optional sign followed by at least one digit, after leading whitespace
fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let sign_len = usize::from(value.starts_with(['+', '-']));
    let digits_len = value[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let number = &value[..sign_len + digits_len];
    match number.parse::<i64>() {
        Ok(ms) => Some(ms),
        // Too many digits for i64: keep the sign, saturate the magnitude
        Err(_) if number.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

fn parse_method(value: Option<&str>) -> TransportMode {
    match value {
        Some("message") => TransportMode::Message,
        _ => TransportMode::Network,
    }
}

fn parse_target(value: &str) -> Option<Url> {
    if value.is_empty() {
        return None;
    }
    match Url::parse(value) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(notify = %value, error = %e, "Ignoring unparseable notification URL");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_only_session() {
        let config = TrackerConfig::from_query("session=abc").unwrap();
        assert_eq!(config.session_id, "abc");
        assert!(config.notification_target.is_none());
        assert_eq!(config.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);
        assert_eq!(config.transport_mode, TransportMode::Network);
        assert!(config.heartbeat_enabled());
    }

    #[test]
    fn test_missing_or_empty_session_disables_tracking() {
        assert!(TrackerConfig::from_query("notify=https://bot.example/p").is_none());
        assert!(TrackerConfig::from_query("session=&interval=100").is_none());
        assert!(TrackerConfig::from_query("").is_none());
        assert!(TrackerConfig::new("").is_none());
    }

    #[test]
    fn test_full_query() {
        let config = TrackerConfig::from_query(
            "?session=s-1&notify=https%3A%2F%2Fbot.example%2Fprogress%3Fx%3D1&interval=2500&method=message",
        )
        .unwrap();
        assert_eq!(config.session_id, "s-1");
        assert_eq!(
            config.notification_target.as_ref().map(Url::as_str),
            Some("https://bot.example/progress?x=1")
        );
        assert_eq!(config.update_interval_ms, 2500);
        assert_eq!(config.transport_mode, TransportMode::Message);
    }

    #[test]
    fn test_interval_parse_failure_uses_default() {
        let config = TrackerConfig::from_query("session=a&interval=soon").unwrap();
        assert_eq!(config.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);

        let config = TrackerConfig::from_query("session=a&interval=").unwrap();
        assert_eq!(config.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);
    }

    #[test]
    fn test_interval_numeric_prefix() {
        let config = TrackerConfig::from_query("session=a&interval=2500ms").unwrap();
        assert_eq!(config.update_interval_ms, 2500);

        let config = TrackerConfig::from_query("session=a&interval=%2B750.5").unwrap();
        assert_eq!(config.update_interval_ms, 750);

        let config = TrackerConfig::from_query("session=a&interval=-").unwrap();
        assert_eq!(config.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);

        let config = TrackerConfig::from_query("session=a&interval=99999999999999999999999").unwrap();
        assert_eq!(config.update_interval_ms, i64::MAX as u64);
    }

    #[test]
    fn test_non_positive_interval_disables_heartbeat() {
        let config = TrackerConfig::from_query("session=a&interval=0").unwrap();
        assert_eq!(config.update_interval_ms, 0);
        assert!(!config.heartbeat_enabled());

        let config = TrackerConfig::from_query("session=a&interval=-250").unwrap();
        assert_eq!(config.update_interval_ms, 0);
    }

    #[test]
    fn test_unknown_method_is_network() {
        let config = TrackerConfig::from_query("session=a&method=carrier-pigeon").unwrap();
        assert_eq!(config.transport_mode, TransportMode::Network);

        let config = TrackerConfig::from_query("session=a&method=Message").unwrap();
        assert_eq!(config.transport_mode, TransportMode::Network);
    }

    #[test]
    fn test_bad_notify_url_is_absent() {
        let config = TrackerConfig::from_query("session=a&notify=not%20a%20url").unwrap();
        assert!(config.notification_target.is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let config = TrackerConfig::from_pairs([("session", "first"), ("session", "second")]).unwrap();
        assert_eq!(config.session_id, "first");
    }

    #[test]
    fn test_from_launch_url() {
        let url = Url::parse("https://sudoku.example/play?session=xyz&interval=1000#board").unwrap();
        let config = TrackerConfig::from_launch_url(&url).unwrap();
        assert_eq!(config.session_id, "xyz");
        assert_eq!(config.update_interval_ms, 1000);
    }

    #[test]
    fn test_from_launch_input_accepts_both_forms() {
        let from_url = TrackerConfig::from_launch_input("https://sudoku.example/?session=q&method=message").unwrap();
        let from_query = TrackerConfig::from_launch_input("session=q&method=message").unwrap();
        assert_eq!(from_url, from_query);
    }

    #[test]
    fn test_builder_methods() {
        let url = Url::parse("http://localhost:8080/hook").unwrap();
        let config = TrackerConfig::new("s")
            .unwrap()
            .with_notification_target(url.clone())
            .with_update_interval_ms(0)
            .with_transport_mode(TransportMode::Message);
        assert_eq!(config.notification_target, Some(url));
        assert!(!config.heartbeat_enabled());
        assert_eq!(config.transport_mode, TransportMode::Message);
    }
}
