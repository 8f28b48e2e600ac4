//! Connection options and ambient application settings.

use std::time::Duration;

pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub(crate) const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ambient application settings shared by every connection a client makes.
///
/// The endpoint owns one of these; individual connect requests fill their
/// unset [`ConnectOptions`] fields from it.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// The application key the matcher authenticates requests with.
    pub app_key: String,
    /// The matcher service URL (`ws://` / `wss://`, or `mem://` for the
    /// in-memory transport).
    pub matcher_url: String,
    /// Default time allowed for a connection attempt to reach `Ready`.
    pub connect_timeout: Duration,
    /// Default interval between keep-alive pings on an established room.
    pub heartbeat_interval: Duration,
    /// Default time to wait for a pong before declaring the connection dead.
    pub heartbeat_timeout: Duration,
}

impl AppSettings {
    /// Creates settings with the given key and matcher URL and default
    /// timing values.
    pub fn new(app_key: impl Into<String>, matcher_url: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            matcher_url: matcher_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

/// Per-request connection configuration.
///
/// All fields are optional; unset fields are filled from [`AppSettings`]
/// before the connect call is issued. Callers that don't care pass
/// `ConnectOptions::default()`.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Application key override.
    pub app_key: Option<String>,
    /// Matcher URL override.
    pub matcher_url: Option<String>,
    /// Connect timeout override.
    pub connect_timeout: Option<Duration>,
    /// Heartbeat interval override.
    pub heartbeat_interval: Option<Duration>,
    /// Heartbeat timeout override.
    pub heartbeat_timeout: Option<Duration>,
}

impl ConnectOptions {
    /// Fills every unset field from the ambient settings.
    pub fn fill_from(&mut self, settings: &AppSettings) {
        self.app_key
            .get_or_insert_with(|| settings.app_key.clone());
        self.matcher_url
            .get_or_insert_with(|| settings.matcher_url.clone());
        self.connect_timeout.get_or_insert(settings.connect_timeout);
        self.heartbeat_interval
            .get_or_insert(settings.heartbeat_interval);
        self.heartbeat_timeout
            .get_or_insert(settings.heartbeat_timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_from_leaves_set_fields_alone() {
        let settings = AppSettings::new("ambient-key", "ws://ambient");
        let mut options = ConnectOptions {
            app_key: Some("explicit-key".into()),
            ..ConnectOptions::default()
        };
        options.fill_from(&settings);
        assert_eq!(options.app_key.as_deref(), Some("explicit-key"));
        assert_eq!(options.matcher_url.as_deref(), Some("ws://ambient"));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_fill_from_fills_everything_when_default() {
        let settings = AppSettings::new("k", "ws://m");
        let mut options = ConnectOptions::default();
        options.fill_from(&settings);
        assert_eq!(options.app_key.as_deref(), Some("k"));
        assert_eq!(options.matcher_url.as_deref(), Some("ws://m"));
        assert_eq!(options.heartbeat_interval, Some(Duration::from_secs(5)));
        assert_eq!(options.heartbeat_timeout, Some(Duration::from_secs(10)));
    }
}
