//! In-memory coordination service
//!
//! `MemoryKeeper` holds a data tree, sessions, watches and request counters
//! in process memory. It backs `kdiag serve` and the test suites; a real
//! deployment would implement `KeeperService` over its own server state.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::KeeperSettings;
use crate::errors::{io_error, not_leader, unavailable, ExError};
#[cfg(feature = "allocator-profiling")]
use crate::service::AllocatorControl;
use crate::service::{
    ConfigEntry, ConnectionInfo, DataDirSizes, FeatureFlag, FollowerCounts,
    KeeperService, LeadershipInfo, LogInfo, ProfileEvent, ServerRole, ServerStats, SessionId,
    SessionsDump, StorageCounts, WatchSummary,
};

/// Version string reported when none is configured
pub const DEFAULT_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Client protocol API version
pub const API_VERSION: u8 = 1;

/// Counters reported by `pfev`
const PROFILE_EVENTS: &[(&str, &str)] = &[
    ("KeeperRequestTotal", "Number of requests processed"),
    ("KeeperSnapshotCreations", "Number of snapshots scheduled"),
    ("KeeperLeadershipRequests", "Number of leadership requests sent"),
    ("KeeperLeadershipYields", "Number of times leadership was given up"),
    ("KeeperStatResets", "Number of server stat resets"),
    ("KeeperConnectionStatResets", "Number of connection stat resets"),
    ("KeeperStorageRecalculations", "Number of storage stat recalculations"),
    ("KeeperCleanResources", "Number of resource cleanups"),
    ("KeeperRecoveries", "Number of forced recoveries"),
];

#[derive(Debug, Clone, Copy, Default)]
struct Latency {
    min: u64,
    max: u64,
    total: u64,
    count: u64,
}

impl Latency {
    fn record(&mut self, latency_ms: u64) {
        if self.count == 0 || latency_ms < self.min {
            self.min = latency_ms;
        }
        self.max = self.max.max(latency_ms);
        self.total += latency_ms;
        self.count += 1;
    }

    fn avg(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total / self.count
        }
    }
}

#[derive(Debug, Clone)]
struct Connection {
    peer: String,
    session_id: SessionId,
    established: DateTime<Utc>,
    packets_received: u64,
    packets_sent: u64,
    last_op: String,
    last_cxid: i64,
    last_zxid: i64,
    last_response: Option<DateTime<Utc>>,
    last_latency_ms: u64,
    latency: Latency,
}

impl Connection {
    fn new(peer: String, session_id: SessionId) -> Self {
        Self {
            peer,
            session_id,
            established: Utc::now(),
            packets_received: 0,
            packets_sent: 0,
            last_op: "NA".to_string(),
            last_cxid: -1,
            last_zxid: -1,
            last_response: None,
            last_latency_ms: 0,
            latency: Latency::default(),
        }
    }

    fn reset_stats(&mut self) {
        self.packets_received = 0;
        self.packets_sent = 0;
        self.last_op = "NA".to_string();
        self.last_cxid = -1;
        self.last_zxid = -1;
        self.last_response = None;
        self.last_latency_ms = 0;
        self.latency = Latency::default();
    }

    fn info(&self, session_timeout_ms: u64) -> ConnectionInfo {
        ConnectionInfo {
            peer: self.peer.clone(),
            session_id: self.session_id,
            packets_received: self.packets_received,
            packets_sent: self.packets_sent,
            established: self.established,
            session_timeout_ms,
            last_op: self.last_op.clone(),
            last_cxid: self.last_cxid,
            last_zxid: self.last_zxid,
            last_response: self.last_response,
            last_latency_ms: self.last_latency_ms,
            min_latency_ms: self.latency.min,
            avg_latency_ms: self.latency.avg(),
            max_latency_ms: self.latency.max,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RequestCounters {
    packets_received: u64,
    packets_sent: u64,
    latency: Latency,
    outstanding_requests: u64,
    last_zxid: i64,
}

#[derive(Debug)]
struct TreeState {
    role: ServerRole,
    term: u64,
    followers: Option<FollowerCounts>,
    log: LogInfo,
    /// path → data size in bytes
    nodes: BTreeMap<String, u64>,
    /// path → watching sessions
    watches: BTreeMap<String, BTreeSet<SessionId>>,
    /// owner session → ephemeral paths
    ephemerals: BTreeMap<SessionId, BTreeSet<String>>,
    connections: BTreeMap<SessionId, Connection>,
    approximate_data_size: u64,
    key_arena_size: u64,
    latest_snapshot_size: u64,
}

impl Default for TreeState {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), 0);
        let mut state = Self {
            role: ServerRole::Standalone,
            term: 1,
            followers: None,
            log: LogInfo::default(),
            nodes,
            watches: BTreeMap::new(),
            ephemerals: BTreeMap::new(),
            connections: BTreeMap::new(),
            approximate_data_size: 0,
            key_arena_size: 0,
            latest_snapshot_size: 0,
        };
        state.recalculate();
        state
    }
}

impl TreeState {
    fn recalculate(&mut self) {
        self.approximate_data_size = self
            .nodes
            .iter()
            .map(|(path, size)| path.len() as u64 + size)
            .sum();
        self.key_arena_size = self.nodes.keys().map(|path| path.len() as u64).sum();
    }

    fn watch_count(&self) -> u64 {
        self.watches.values().map(|s| s.len() as u64).sum()
    }

    fn ephemerals_count(&self) -> u64 {
        self.ephemerals.values().map(|p| p.len() as u64).sum()
    }
}

/// Heap profiling toggles without a real allocator behind them
#[cfg(feature = "allocator-profiling")]
#[derive(Debug, Default)]
pub struct MemoryAllocator {
    profiling: AtomicBool,
    flushes: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "allocator-profiling")]
impl AllocatorControl for MemoryAllocator {
    fn stats(&self) -> Result<String, ExError> {
        Ok(format!(
            "profiling: {}\nflushed_profiles: {}\n",
            self.profiling.load(Ordering::SeqCst),
            self.flushes.load(Ordering::SeqCst)
        ))
    }

    fn flush_profile(&self) -> Result<String, ExError> {
        if !self.profiling.load(Ordering::SeqCst) {
            return Err(unavailable(
                "allocator_flush_profile",
                "Heap profiling is not enabled",
            ));
        }
        let n = self.flushes.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("kdiag.{}.{}.heap", std::process::id(), n));
        Ok(format!("{}\n", path.display()))
    }

    fn enable_profile(&self) -> Result<(), ExError> {
        self.profiling.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable_profile(&self) -> Result<(), ExError> {
        self.profiling.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Coordination service state kept entirely in memory
#[derive(Debug)]
pub struct MemoryKeeper {
    version: String,
    settings: KeeperSettings,
    active: AtomicBool,
    read_only: AtomicBool,
    recovering: AtomicBool,
    state: RwLock<TreeState>,
    counters: Mutex<RequestCounters>,
    events: Mutex<BTreeMap<&'static str, u64>>,
    #[cfg(feature = "allocator-profiling")]
    allocator: Option<MemoryAllocator>,
}

impl Default for MemoryKeeper {
    fn default() -> Self {
        Self::from_config(&KeeperSettings::default())
    }
}

impl MemoryKeeper {
    /// Active standalone server with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Active standalone server configured from the `[keeper]` section
    pub fn from_config(settings: &KeeperSettings) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            settings: settings.clone(),
            active: AtomicBool::new(true),
            read_only: AtomicBool::new(settings.read_only),
            recovering: AtomicBool::new(false),
            state: RwLock::new(TreeState::default()),
            counters: Mutex::new(RequestCounters::default()),
            events: Mutex::new(PROFILE_EVENTS.iter().map(|(name, _)| (*name, 0)).collect()),
            #[cfg(feature = "allocator-profiling")]
            allocator: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Expose allocator introspection so the `jm**` commands register
    #[cfg(feature = "allocator-profiling")]
    pub fn with_allocator(mut self) -> Self {
        self.allocator = Some(MemoryAllocator::default());
        self
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering.load(Ordering::SeqCst)
    }

    /// Change role and term; follower counts are cleared unless leader
    pub fn set_role(&self, role: ServerRole, term: u64) {
        let mut state = self.write_state();
        state.role = role;
        state.term = term;
        if role == ServerRole::Leader {
            state.followers.get_or_insert_with(FollowerCounts::default);
        } else {
            state.followers = None;
        }
    }

    /// Follower counts, only kept while leader
    pub fn set_followers(&self, followers: u64, synced_followers: u64) {
        let mut state = self.write_state();
        if state.role == ServerRole::Leader {
            state.followers = Some(FollowerCounts {
                followers,
                synced_followers,
            });
        }
    }

    pub fn set_log_info(&self, log: LogInfo) {
        self.write_state().log = log;
    }

    /// Create or overwrite a persistent node
    pub fn create_node(&self, path: impl Into<String>, data_len: u64) {
        let mut state = self.write_state();
        state.nodes.insert(path.into(), data_len);
        state.recalculate();
    }

    /// Create a node owned by `session_id`, removed when the session closes
    pub fn create_ephemeral(&self, session_id: SessionId, path: impl Into<String>, data_len: u64) {
        let path = path.into();
        let mut state = self.write_state();
        state.nodes.insert(path.clone(), data_len);
        state.ephemerals.entry(session_id).or_default().insert(path);
        state.recalculate();
    }

    /// Register a client connection for `session_id`
    pub fn open_session(&self, session_id: SessionId, peer: impl Into<String>) {
        let peer = peer.into();
        debug!(session_id, peer = %peer, "Session opened");
        self.write_state()
            .connections
            .insert(session_id, Connection::new(peer, session_id));
    }

    /// Drop a session with its watches and ephemeral nodes
    pub fn close_session(&self, session_id: SessionId) {
        let mut state = self.write_state();
        state.connections.remove(&session_id);
        if let Some(paths) = state.ephemerals.remove(&session_id) {
            for path in paths {
                state.nodes.remove(&path);
            }
        }
        for watchers in state.watches.values_mut() {
            watchers.remove(&session_id);
        }
        state.watches.retain(|_, watchers| !watchers.is_empty());
        state.recalculate();
        debug!(session_id, "Session closed");
    }

    pub fn add_watch(&self, session_id: SessionId, path: impl Into<String>) {
        self.write_state()
            .watches
            .entry(path.into())
            .or_default()
            .insert(session_id);
    }

    /// Record one request/response pair served for `session_id`
    ///
    /// Each request advances the zxid. Unknown sessions only count toward
    /// the aggregate statistics.
    pub fn record_request(&self, session_id: SessionId, op: &str, latency_ms: u64) {
        let zxid = {
            let mut counters = self.lock_counters();
            counters.packets_received += 1;
            counters.packets_sent += 1;
            counters.latency.record(latency_ms);
            counters.last_zxid += 1;
            counters.last_zxid
        };

        {
            let mut state = self.write_state();
            if let Some(conn) = state.connections.get_mut(&session_id) {
                conn.packets_received += 1;
                conn.packets_sent += 1;
                conn.last_op = op.to_string();
                conn.last_cxid += 1;
                conn.last_zxid = zxid;
                conn.last_response = Some(Utc::now());
                conn.last_latency_ms = latency_ms;
                conn.latency.record(latency_ms);
            }
            state.log.last_log_idx += 1;
            state.log.last_committed_log_idx = state.log.last_log_idx;
        }

        self.bump("KeeperRequestTotal");
    }

    pub fn set_outstanding_requests(&self, outstanding: u64) {
        self.lock_counters().outstanding_requests = outstanding;
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_counters(&self) -> MutexGuard<'_, RequestCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self, event: &'static str) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        *events.entry(event).or_insert(0) += 1;
    }
}

impl KeeperService for MemoryKeeper {
    fn version(&self) -> String {
        self.version.clone()
    }

    fn api_version(&self) -> u8 {
        API_VERSION
    }

    fn is_server_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.is_recovering()
    }

    fn leadership(&self) -> LeadershipInfo {
        let state = self.read_state();
        LeadershipInfo {
            role: state.role,
            term: state.term,
            followers: state.followers,
        }
    }

    fn log_info(&self) -> Result<LogInfo, ExError> {
        Ok(self.read_state().log)
    }

    fn storage_counts(&self) -> StorageCounts {
        let state = self.read_state();
        StorageCounts {
            node_count: state.nodes.len() as u64,
            watch_count: state.watch_count(),
            ephemerals_count: state.ephemerals_count(),
            session_count: state.connections.len() as u64,
            approximate_data_size: state.approximate_data_size,
            key_arena_size: state.key_arena_size,
            latest_snapshot_size: state.latest_snapshot_size,
        }
    }

    fn server_stats(&self) -> ServerStats {
        let alive_connections = self.read_state().connections.len() as u64;
        let counters = self.lock_counters();
        ServerStats {
            packets_received: counters.packets_received,
            packets_sent: counters.packets_sent,
            min_latency_ms: counters.latency.min,
            avg_latency_ms: counters.latency.avg(),
            max_latency_ms: counters.latency.max,
            outstanding_requests: counters.outstanding_requests,
            alive_connections,
            last_zxid: counters.last_zxid,
        }
    }

    fn connections(&self) -> Vec<ConnectionInfo> {
        let timeout = self.settings.session_timeout_ms;
        self.read_state()
            .connections
            .values()
            .map(|conn| conn.info(timeout))
            .collect()
    }

    fn watch_summary(&self) -> WatchSummary {
        let state = self.read_state();
        let sessions: BTreeSet<SessionId> = state.watches.values().flatten().copied().collect();
        WatchSummary {
            connections: sessions.len() as u64,
            paths: state.watches.len() as u64,
            total_watches: state.watch_count(),
        }
    }

    fn watches_by_session(&self) -> Vec<(SessionId, Vec<String>)> {
        let state = self.read_state();
        let mut by_session: BTreeMap<SessionId, Vec<String>> = BTreeMap::new();
        for (path, sessions) in &state.watches {
            for session_id in sessions {
                by_session.entry(*session_id).or_default().push(path.clone());
            }
        }
        by_session.into_iter().collect()
    }

    fn watches_by_path(&self) -> Vec<(String, Vec<SessionId>)> {
        self.read_state()
            .watches
            .iter()
            .map(|(path, sessions)| (path.clone(), sessions.iter().copied().collect()))
            .collect()
    }

    fn sessions_dump(&self) -> Result<SessionsDump, ExError> {
        let state = self.read_state();
        if !matches!(state.role, ServerRole::Leader | ServerRole::Standalone) {
            return Err(not_leader("sessions_dump"));
        }
        Ok(SessionsDump {
            sessions: state.connections.keys().copied().collect(),
            ephemerals: state
                .ephemerals
                .iter()
                .filter(|(_, paths)| !paths.is_empty())
                .map(|(session_id, paths)| (*session_id, paths.iter().cloned().collect()))
                .collect(),
        })
    }

    fn reset_connection_stats(&self) {
        for conn in self.write_state().connections.values_mut() {
            conn.reset_stats();
        }
        self.bump("KeeperConnectionStatResets");
    }

    fn reset_server_stats(&self) {
        {
            let mut counters = self.lock_counters();
            counters.packets_received = 0;
            counters.packets_sent = 0;
            counters.latency = Latency::default();
        }
        self.bump("KeeperStatResets");
    }

    fn create_snapshot(&self) -> Result<u64, ExError> {
        if !self.is_server_active() {
            return Err(unavailable(
                "create_snapshot",
                "Server is not serving requests",
            ));
        }
        let log_idx = {
            let mut state = self.write_state();
            state.log.last_snapshot_idx = state.log.last_committed_log_idx;
            state.latest_snapshot_size = state.approximate_data_size;
            state.log.last_snapshot_idx
        };
        self.bump("KeeperSnapshotCreations");
        info!(log_idx, "Snapshot scheduled");
        Ok(log_idx)
    }

    fn request_leadership(&self) -> Result<bool, ExError> {
        if !self.is_server_active() {
            return Err(unavailable(
                "request_leadership",
                "Server is not serving requests",
            ));
        }
        let role = self.read_state().role;
        if matches!(role, ServerRole::Leader | ServerRole::Standalone) {
            return Ok(false);
        }
        self.bump("KeeperLeadershipRequests");
        info!(role = %role, "Leadership requested");
        Ok(true)
    }

    fn yield_leadership(&self) {
        let yielded = {
            let mut state = self.write_state();
            if state.role == ServerRole::Leader {
                state.role = ServerRole::Follower;
                state.followers = None;
                true
            } else {
                false
            }
        };
        if yielded {
            self.bump("KeeperLeadershipYields");
            info!("Leadership yielded");
        }
    }

    /// Recovers in place: the committed index catches up with the log and
    /// derived storage stats are rebuilt, then the server serves again.
    fn force_recovery(&self) -> Result<(), ExError> {
        self.recovering.store(true, Ordering::SeqCst);
        info!("Entered recovery mode");
        {
            let mut state = self.write_state();
            state.log.last_committed_log_idx = state.log.last_log_idx;
            state.recalculate();
        }
        self.bump("KeeperRecoveries");
        self.recovering.store(false, Ordering::SeqCst);
        info!("Recovery finished");
        Ok(())
    }

    fn recalculate_storage_stats(&self) {
        self.write_state().recalculate();
        self.bump("KeeperStorageRecalculations");
    }

    fn clean_resources(&self) {
        {
            let mut state = self.write_state();
            let TreeState {
                watches,
                ephemerals,
                connections,
                ..
            } = &mut *state;
            for watchers in watches.values_mut() {
                watchers.retain(|session_id| connections.contains_key(session_id));
            }
            watches.retain(|_, watchers| !watchers.is_empty());
            ephemerals.retain(|_, paths| !paths.is_empty());
        }
        self.bump("KeeperCleanResources");
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    fn feature_flags(&self) -> Vec<FeatureFlag> {
        self.settings
            .feature_flags
            .iter()
            .map(|(name, enabled)| FeatureFlag {
                name: name.clone(),
                enabled: *enabled,
            })
            .collect()
    }

    fn data_dir_sizes(&self) -> Result<DataDirSizes, ExError> {
        Ok(DataDirSizes {
            snapshot_dir_bytes: optional_dir_size(self.settings.snapshot_storage_path.as_deref())?,
            log_dir_bytes: optional_dir_size(self.settings.log_storage_path.as_deref())?,
        })
    }

    fn configuration(&self) -> Vec<ConfigEntry> {
        self.settings.entries()
    }

    fn profile_events(&self) -> Vec<ProfileEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        PROFILE_EVENTS
            .iter()
            .map(|(name, description)| ProfileEvent {
                name: name.to_string(),
                value: events.get(name).copied().unwrap_or(0),
                description: description.to_string(),
            })
            .collect()
    }

    #[cfg(feature = "allocator-profiling")]
    fn allocator(&self) -> Option<&dyn AllocatorControl> {
        self.allocator.as_ref().map(|a| a as &dyn AllocatorControl)
    }
}

fn optional_dir_size(path: Option<&Path>) -> Result<u64, ExError> {
    match path {
        Some(path) if path.exists() => dir_size(path),
        _ => Ok(0),
    }
}

/// Total size of regular files under `path`
fn dir_size(path: &Path) -> Result<u64, ExError> {
    let mut total = 0;
    for entry in fs::read_dir(path).map_err(|e| io_error("data_dir_sizes", e))? {
        let entry = entry.map_err(|e| io_error("data_dir_sizes", e))?;
        let metadata = entry
            .metadata()
            .map_err(|e| io_error("data_dir_sizes", e))?;
        if metadata.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}
