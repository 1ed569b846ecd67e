//! Liveness and read-only checks

use crate::command::{FourLetterCommand, Reply};
use crate::errors::ExError;
use crate::service::KeeperService;

/// Token `ruok` answers with when the server is healthy
pub const IMOK: &str = "imok";

/// Tests if the server is running in a non-error state
///
/// Replies `imok` when it is; otherwise writes nothing at all, and the
/// dropped connection is the failure signal. `imok` does not mean the
/// server has joined the quorum, only that the process is up and serving.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuokCommand;

impl FourLetterCommand for RuokCommand {
    fn name(&self) -> &'static str {
        "ruok"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        if keeper.is_server_active() {
            Ok(Reply::text(IMOK))
        } else {
            Ok(Reply::Silence)
        }
    }
}

/// Replies `ro` in read-only mode and `rw` otherwise
#[derive(Debug, Default, Clone, Copy)]
pub struct IsReadOnlyCommand;

impl FourLetterCommand for IsReadOnlyCommand {
    fn name(&self) -> &'static str {
        "isro"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        Ok(Reply::text(if keeper.is_read_only() { "ro" } else { "rw" }))
    }
}
