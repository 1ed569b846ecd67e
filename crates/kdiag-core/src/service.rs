//! Coordination service accessor interface
//!
//! Diagnostic commands never own coordination state. Each `run()` borrows a
//! `KeeperService` and reads or triggers what it reports on. Whether a
//! triggered action (snapshot, leadership transfer) has finished when the
//! call returns is up to the implementation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::errors::ExError;

/// Session identifier as assigned by the coordination service
pub type SessionId = i64;

/// Raft role of this server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerRole {
    Leader,
    Follower,
    Observer,
    Standalone,
}

impl ServerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerRole::Leader => "leader",
            ServerRole::Follower => "follower",
            ServerRole::Observer => "observer",
            ServerRole::Standalone => "standalone",
        }
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follower counts, only known on the leader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowerCounts {
    pub followers: u64,
    pub synced_followers: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadershipInfo {
    pub role: ServerRole,
    pub term: u64,
    /// `Some` only while this server is the leader
    pub followers: Option<FollowerCounts>,
}

/// Raft log positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogInfo {
    pub first_log_idx: u64,
    pub first_log_term: u64,
    pub last_log_idx: u64,
    pub last_log_term: u64,
    pub last_committed_log_idx: u64,
    pub leader_committed_log_idx: u64,
    pub target_committed_log_idx: u64,
    pub last_snapshot_idx: u64,
}

/// Data tree counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageCounts {
    pub node_count: u64,
    pub watch_count: u64,
    pub ephemerals_count: u64,
    pub session_count: u64,
    pub approximate_data_size: u64,
    pub key_arena_size: u64,
    pub latest_snapshot_size: u64,
}

/// Aggregate request counters since the last stat reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerStats {
    pub packets_received: u64,
    pub packets_sent: u64,
    pub min_latency_ms: u64,
    pub avg_latency_ms: u64,
    pub max_latency_ms: u64,
    pub outstanding_requests: u64,
    pub alive_connections: u64,
    pub last_zxid: i64,
}

/// One client connection and its statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub peer: String,
    pub session_id: SessionId,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub established: DateTime<Utc>,
    pub session_timeout_ms: u64,
    pub last_op: String,
    pub last_cxid: i64,
    pub last_zxid: i64,
    pub last_response: Option<DateTime<Utc>>,
    pub last_latency_ms: u64,
    pub min_latency_ms: u64,
    pub avg_latency_ms: u64,
    pub max_latency_ms: u64,
}

/// Summary of registered watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchSummary {
    pub connections: u64,
    pub paths: u64,
    pub total_watches: u64,
}

/// Open sessions and the ephemeral nodes they own
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionsDump {
    pub sessions: Vec<SessionId>,
    pub ephemerals: BTreeMap<SessionId, Vec<String>>,
}

/// Bytes used on disk by snapshots and raft logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataDirSizes {
    pub snapshot_dir_bytes: u64,
    pub log_dir_bytes: u64,
}

/// One effective configuration setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlag {
    pub name: String,
    pub enabled: bool,
}

/// Process-level event counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEvent {
    pub name: String,
    pub value: u64,
    pub description: String,
}

/// Accessors the diagnostic commands query or trigger
///
/// Implementations own their own concurrency discipline; the diagnostic
/// layer calls these from many connection handlers at once and adds no
/// locking of its own.
pub trait KeeperService: Send + Sync {
    /// Version string reported by `mntr`, `srvr`, `stat` and `envi`
    fn version(&self) -> String;

    /// Client protocol API version reported by `apiv`
    fn api_version(&self) -> u8;

    /// Whether the server is running in a non-error state and serving requests
    fn is_server_active(&self) -> bool;

    fn leadership(&self) -> LeadershipInfo;

    /// # Errors
    ///
    /// Fails when the raft log is not yet readable.
    fn log_info(&self) -> Result<LogInfo, ExError>;

    fn storage_counts(&self) -> StorageCounts;

    fn server_stats(&self) -> ServerStats;

    fn connections(&self) -> Vec<ConnectionInfo>;

    fn watch_summary(&self) -> WatchSummary;

    /// Watched paths grouped by session, sessions in ascending order
    fn watches_by_session(&self) -> Vec<(SessionId, Vec<String>)>;

    /// Watching sessions grouped by path, paths in ascending order
    fn watches_by_path(&self) -> Vec<(String, Vec<SessionId>)>;

    /// # Errors
    ///
    /// Returns `ExErrorKind::NotLeader` when this server cannot list sessions.
    fn sessions_dump(&self) -> Result<SessionsDump, ExError>;

    fn reset_connection_stats(&self);

    fn reset_server_stats(&self);

    /// Schedule snapshot creation, returning the log index it will cover
    ///
    /// # Errors
    ///
    /// Fails when the snapshot task could not be scheduled.
    fn create_snapshot(&self) -> Result<u64, ExError>;

    /// Ask the current leader to hand leadership to this server
    ///
    /// `Ok(false)` means the request was not sent (e.g. already leader).
    fn request_leadership(&self) -> Result<bool, ExError>;

    fn yield_leadership(&self);

    /// Enter recovery mode and resynchronize with the cluster
    ///
    /// The server must leave recovery mode on its own once the resync is
    /// done, either before returning or from its own background work.
    /// Nothing outside the implementation ends recovery.
    ///
    /// # Errors
    ///
    /// Fails when recovery mode cannot be entered.
    fn force_recovery(&self) -> Result<(), ExError>;

    fn recalculate_storage_stats(&self);

    fn clean_resources(&self);

    fn is_read_only(&self) -> bool;

    fn feature_flags(&self) -> Vec<FeatureFlag>;

    /// # Errors
    ///
    /// Fails when the storage directories cannot be read.
    fn data_dir_sizes(&self) -> Result<DataDirSizes, ExError>;

    fn configuration(&self) -> Vec<ConfigEntry>;

    fn profile_events(&self) -> Vec<ProfileEvent>;

    /// Allocator introspection, when the process allocator supports it
    fn allocator(&self) -> Option<&dyn AllocatorControl> {
        None
    }
}

/// Allocator statistics and heap profile toggles
pub trait AllocatorControl: Send + Sync {
    fn stats(&self) -> Result<String, ExError>;

    /// Flush the current heap profile, returning where it was written
    fn flush_profile(&self) -> Result<String, ExError>;

    fn enable_profile(&self) -> Result<(), ExError>;

    fn disable_profile(&self) -> Result<(), ExError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(ServerRole::Leader.to_string(), "leader");
        assert_eq!(ServerRole::Standalone.as_str(), "standalone");
    }
}
