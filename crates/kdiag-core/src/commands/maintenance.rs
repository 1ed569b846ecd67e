//! Maintenance actions and disk usage

use crate::command::{FourLetterCommand, Reply};
use crate::errors::ExError;
use crate::service::KeeperService;

/// Recalculates derived storage statistics
#[derive(Debug, Default, Clone, Copy)]
pub struct RecalculateCommand;

impl FourLetterCommand for RecalculateCommand {
    fn name(&self) -> &'static str {
        "rclc"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        keeper.recalculate_storage_stats();
        Ok(Reply::text("ok"))
    }
}

/// Releases stale resources held by the server
#[derive(Debug, Default, Clone, Copy)]
pub struct CleanResourcesCommand;

impl FourLetterCommand for CleanResourcesCommand {
    fn name(&self) -> &'static str {
        "clrs"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        keeper.clean_resources();
        Ok(Reply::text("ok"))
    }
}

/// Total size of snapshot and log files in bytes
#[derive(Debug, Default, Clone, Copy)]
pub struct DataSizeCommand;

impl FourLetterCommand for DataSizeCommand {
    fn name(&self) -> &'static str {
        "dirs"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let sizes = keeper.data_dir_sizes()?;
        Ok(Reply::Text(format!(
            "snapshot_dir_size: {}\nlog_dir_size: {}\n",
            sizes.snapshot_dir_bytes, sizes.log_dir_bytes
        )))
    }
}
