use std::fmt;

/// Opaque per-process token scoping one conversation to one transport endpoint.
///
/// Generated once when the controller is built and never persisted. Reconnects
/// reuse the same identity so the backend keeps its conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    /// Generate a fresh random identity (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing token, e.g. one chosen by a test
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Endpoint URL for this identity under the given server base URL
    pub fn endpoint(&self, server_url: &str) -> String {
        format!("{}/ws/{}", server_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
