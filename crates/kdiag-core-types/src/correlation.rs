//! Correlation types for admin connection tracking
//!
//! Every accepted diagnostic connection gets a fresh `RequestId` so that the
//! dispatch log lines of one request can be tied back to the peer that sent it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single diagnostic request (one connection)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new time-ordered RequestId (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried for one admin connection
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    /// Remote address of the diagnostic client, when known
    pub peer: Option<String>,
}

impl RequestContext {
    /// Create a new context with a fresh RequestId
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            peer: None,
        }
    }

    /// Create a context for a connection from `peer`
    pub fn for_peer(peer: impl Into<String>) -> Self {
        Self {
            peer: Some(peer.into()),
            ..Self::new()
        }
    }

    /// Peer address for log fields, `"-"` when unknown
    pub fn peer_or_dash(&self) -> &str {
        self.peer.as_deref().unwrap_or("-")
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generation() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_context_for_peer() {
        let ctx = RequestContext::for_peer("127.0.0.1:50123");
        assert_eq!(ctx.peer_or_dash(), "127.0.0.1:50123");
    }

    #[test]
    fn test_context_without_peer_uses_dash() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.peer_or_dash(), "-");
        assert_ne!(ctx.request_id, RequestContext::new().request_id);
    }

    #[test]
    fn test_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
