//! Raft log introspection and leadership/snapshot actions

use tracing::warn;

use crate::command::{FourLetterCommand, Reply};
use crate::commands::push_stat;
use crate::errors::ExError;
use crate::service::KeeperService;

/// Raft log information
///
/// ```text
/// first_log_idx	1
/// first_log_term	1
/// last_log_idx	101
/// last_log_term	1
/// last_committed_log_idx	100
/// leader_committed_log_idx	101
/// target_committed_log_idx	101
/// last_snapshot_idx	50
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInfoCommand;

impl FourLetterCommand for LogInfoCommand {
    fn name(&self) -> &'static str {
        "lgif"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let info = keeper.log_info()?;
        let mut buf = String::new();
        push_stat(&mut buf, "first_log_idx", info.first_log_idx);
        push_stat(&mut buf, "first_log_term", info.first_log_term);
        push_stat(&mut buf, "last_log_idx", info.last_log_idx);
        push_stat(&mut buf, "last_log_term", info.last_log_term);
        push_stat(&mut buf, "last_committed_log_idx", info.last_committed_log_idx);
        push_stat(&mut buf, "leader_committed_log_idx", info.leader_committed_log_idx);
        push_stat(&mut buf, "target_committed_log_idx", info.target_committed_log_idx);
        push_stat(&mut buf, "last_snapshot_idx", info.last_snapshot_idx);
        Ok(Reply::Text(buf))
    }
}

/// Schedules snapshot creation and replies with the covered log index
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateSnapshotCommand;

impl FourLetterCommand for CreateSnapshotCommand {
    fn name(&self) -> &'static str {
        "csnp"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        match keeper.create_snapshot() {
            Ok(log_idx) => Ok(Reply::Text(format!("{}\n", log_idx))),
            Err(err) => {
                warn!(command = self.name(), error = %err, "Snapshot creation was not scheduled");
                Ok(Reply::text("Failed to schedule snapshot creation task.\n"))
            }
        }
    }
}

/// Asks the current leader to transfer leadership to this server
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLeaderCommand;

impl FourLetterCommand for RequestLeaderCommand {
    fn name(&self) -> &'static str {
        "rqld"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let sent = keeper.request_leadership().unwrap_or_else(|err| {
            warn!(command = self.name(), error = %err, "Leadership request failed");
            false
        });
        Ok(Reply::text(if sent {
            "Sent leadership request to leader.\n"
        } else {
            "Failed to send leadership request to leader.\n"
        }))
    }
}

/// Gives up leadership and becomes a follower
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldLeadershipCommand;

impl FourLetterCommand for YieldLeadershipCommand {
    fn name(&self) -> &'static str {
        "ydld"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        keeper.yield_leadership();
        Ok(Reply::text("Sent yield leadership request to leader.\n"))
    }
}

/// Forces the server into recovery mode
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryCommand;

impl FourLetterCommand for RecoveryCommand {
    fn name(&self) -> &'static str {
        "rcvr"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        keeper.force_recovery()?;
        Ok(Reply::text("ok"))
    }
}
