//! Four letter command variants
//!
//! Each variant is a thin adapter over `KeeperService`: it names itself and
//! formats what the service reports. Grouped by what they look at.

pub mod connections;
pub mod environment;
pub mod liveness;
pub mod maintenance;
pub mod raft;
pub mod stats;
pub mod watches;

#[cfg(feature = "allocator-profiling")]
pub mod allocator;

use crate::errors::Result;
use crate::registry::CommandRegistry;
use crate::service::{KeeperService, SessionId};

pub use connections::{ConsCommand, DumpCommand, ResetConnStatsCommand};
pub use environment::{ApiVersionCommand, ConfCommand, EnviCommand, FeatureFlagsCommand};
pub use liveness::{IsReadOnlyCommand, RuokCommand};
pub use maintenance::{CleanResourcesCommand, DataSizeCommand, RecalculateCommand};
pub use raft::{
    CreateSnapshotCommand, LogInfoCommand, RecoveryCommand, RequestLeaderCommand,
    YieldLeadershipCommand,
};
pub use stats::{
    MonitorCommand, ProfileEventsCommand, ServerStatCommand, StatCommand, StatResetCommand,
};
pub use watches::{BriefWatchCommand, WatchByPathCommand, WatchCommand};

/// Reply of stat commands while the service is not serving requests
pub const NOT_SERVING_MESSAGE: &str = "This instance is not currently serving requests\n";

/// Register every standard command
///
/// # Errors
///
/// Fails if `registry` already holds one of the standard names or is
/// already initialized.
pub fn register_standard_commands(
    registry: &mut CommandRegistry,
    keeper: &dyn KeeperService,
) -> Result<()> {
    registry.register(Box::new(RuokCommand))?;
    registry.register(Box::new(MonitorCommand))?;
    registry.register(Box::new(StatResetCommand))?;
    registry.register(Box::new(ConfCommand))?;
    registry.register(Box::new(ConsCommand))?;
    registry.register(Box::new(ResetConnStatsCommand))?;
    registry.register(Box::new(ServerStatCommand))?;
    registry.register(Box::new(StatCommand))?;
    registry.register(Box::new(BriefWatchCommand))?;
    registry.register(Box::new(WatchCommand))?;
    registry.register(Box::new(WatchByPathCommand))?;
    registry.register(Box::new(DumpCommand))?;
    registry.register(Box::new(EnviCommand))?;
    registry.register(Box::new(DataSizeCommand))?;
    registry.register(Box::new(IsReadOnlyCommand))?;
    registry.register(Box::new(RecoveryCommand))?;
    registry.register(Box::new(ApiVersionCommand))?;
    registry.register(Box::new(CreateSnapshotCommand))?;
    registry.register(Box::new(LogInfoCommand))?;
    registry.register(Box::new(RequestLeaderCommand))?;
    registry.register(Box::new(RecalculateCommand))?;
    registry.register(Box::new(CleanResourcesCommand))?;
    registry.register(Box::new(FeatureFlagsCommand))?;
    registry.register(Box::new(YieldLeadershipCommand))?;
    registry.register(Box::new(ProfileEventsCommand))?;

    register_allocator_commands_if_supported(registry, keeper)
}

#[cfg(feature = "allocator-profiling")]
fn register_allocator_commands_if_supported(
    registry: &mut CommandRegistry,
    keeper: &dyn KeeperService,
) -> Result<()> {
    if keeper.allocator().is_some() {
        allocator::register_allocator_commands(registry)?;
    }
    Ok(())
}

#[cfg(not(feature = "allocator-profiling"))]
fn register_allocator_commands_if_supported(
    _registry: &mut CommandRegistry,
    _keeper: &dyn KeeperService,
) -> Result<()> {
    Ok(())
}

/// `key<TAB>value` line
pub(crate) fn push_stat(buf: &mut String, key: &str, value: impl std::fmt::Display) {
    buf.push_str(&format!("{}\t{}\n", key, value));
}

/// Session ids are printed as zero-padded hex
pub(crate) fn format_session_id(session_id: SessionId) -> String {
    format!("0x{:016x}", session_id)
}
