//! Watch introspection
//!
//! `wchc` and `wchp` walk every watch. With many watches they are expensive
//! and slow; callers of those two accept the latency.

use crate::command::{FourLetterCommand, Reply};
use crate::commands::format_session_id;
use crate::errors::ExError;
use crate::service::KeeperService;

/// Brief watch summary
#[derive(Debug, Default, Clone, Copy)]
pub struct BriefWatchCommand;

impl FourLetterCommand for BriefWatchCommand {
    fn name(&self) -> &'static str {
        "wchs"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let summary = keeper.watch_summary();
        Ok(Reply::Text(format!(
            "{} connections watching {} paths\nTotal watches:{}\n",
            summary.connections, summary.paths, summary.total_watches
        )))
    }
}

/// Watches by session: each session followed by its watched paths
#[derive(Debug, Default, Clone, Copy)]
pub struct WatchCommand;

impl FourLetterCommand for WatchCommand {
    fn name(&self) -> &'static str {
        "wchc"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let mut buf = String::new();
        for (session_id, paths) in keeper.watches_by_session() {
            buf.push_str(&format_session_id(session_id));
            buf.push('\n');
            for path in paths {
                buf.push('\t');
                buf.push_str(&path);
                buf.push('\n');
            }
        }
        Ok(Reply::Text(buf))
    }
}

/// Watches by path: each path followed by the sessions watching it
#[derive(Debug, Default, Clone, Copy)]
pub struct WatchByPathCommand;

impl FourLetterCommand for WatchByPathCommand {
    fn name(&self) -> &'static str {
        "wchp"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let mut buf = String::new();
        for (path, sessions) in keeper.watches_by_path() {
            buf.push_str(&path);
            buf.push('\n');
            for session_id in sessions {
                buf.push('\t');
                buf.push_str(&format_session_id(session_id));
                buf.push('\n');
            }
        }
        Ok(Reply::Text(buf))
    }
}
