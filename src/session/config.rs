use std::time::Duration;

use crate::audio::CaptureConfig;

/// Language pair attached to every speech frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechConfig {
    /// Language spoken by the user
    pub language_code: String,

    /// Language the backend should reply in
    pub target_language_code: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language_code: "en-IN".to_string(),
            target_language_code: "en-IN".to_string(),
        }
    }
}

/// Configuration for a conversation session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL; the endpoint is `{server_url}/ws/{identity}`
    pub server_url: String,

    /// Delay before each reconnect attempt
    /// Default: 3 seconds
    pub reconnect_delay: Duration,

    pub speech: SpeechConfig,

    pub capture: CaptureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8000".to_string(),
            reconnect_delay: Duration::from_secs(3),
            speech: SpeechConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}
