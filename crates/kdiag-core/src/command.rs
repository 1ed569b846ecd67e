//! The four letter command contract
//!
//! Every diagnostic capability is a small stateless type implementing
//! `FourLetterCommand`. The registry owns one boxed instance per name and
//! hands out shared references; `run()` borrows the coordination service for
//! the duration of the call.

use crate::errors::ExError;
use crate::service::KeeperService;

/// Reply sent in place of any command that is unknown or not allow-listed
///
/// The same text is used for both cases so a client cannot tell which
/// commands exist.
pub const NOT_ALLOWED_MESSAGE: &str =
    "This instance is not allowed to run the requested command, it is not in the four letter word allow list.\n";

/// Full response to a diagnostic connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Written verbatim, then the connection is closed
    Text(String),
    /// Close without writing anything
    Silence,
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text(body.into())
    }

    /// Body text, `None` for silence
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(body) => Some(body),
            Reply::Silence => None,
        }
    }

    pub fn is_silence(&self) -> bool {
        matches!(self, Reply::Silence)
    }
}

/// A single named diagnostic capability
pub trait FourLetterCommand: Send + Sync {
    /// Exactly four ASCII bytes, e.g. `"mntr"`
    fn name(&self) -> &'static str;

    /// Produce the full response
    ///
    /// An `Err` is rendered by the dispatcher as one error line; commands
    /// with their own failure wording handle the error themselves.
    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError>;
}

/// Replies with `NOT_ALLOWED_MESSAGE`
///
/// Held by the dispatcher rather than registered, so sending `nopc` over
/// the wire is itself rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopCommand;

impl FourLetterCommand for NopCommand {
    fn name(&self) -> &'static str {
        "nopc"
    }

    fn run(&self, _keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        Ok(Reply::text(NOT_ALLOWED_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_accessors() {
        let reply = Reply::text("imok");
        assert_eq!(reply.as_text(), Some("imok"));
        assert!(!reply.is_silence());
        assert!(Reply::Silence.as_text().is_none());
    }

    #[test]
    fn test_not_allowed_message_is_single_line() {
        assert_eq!(NOT_ALLOWED_MESSAGE.lines().count(), 1);
        assert!(NOT_ALLOWED_MESSAGE.ends_with('\n'));
    }
}
