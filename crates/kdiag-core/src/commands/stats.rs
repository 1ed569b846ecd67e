//! Aggregate metrics and stat reset

use crate::command::{FourLetterCommand, Reply};
use crate::commands::{push_stat, NOT_SERVING_MESSAGE};
use crate::errors::ExError;
use crate::process;
use crate::service::{KeeperService, ServerRole};

/// Outputs variables for monitoring the health of the cluster
///
/// ```text
/// zk_version	v1.4.0
/// zk_avg_latency	0
/// zk_max_latency	0
/// zk_min_latency	0
/// zk_packets_received	70
/// zk_packets_sent	69
/// zk_num_alive_connections	1
/// zk_outstanding_requests	0
/// zk_server_state	leader
/// zk_znode_count	4
/// zk_watch_count	0
/// zk_ephemerals_count	0
/// zk_approximate_data_size	27
/// zk_key_arena_size	0
/// zk_latest_snapshot_size	0
/// zk_open_file_descriptor_count	23    - Linux only
/// zk_max_file_descriptor_count	1024  - Linux only
/// zk_followers	2                     - leader only
/// zk_synced_followers	2             - leader only
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorCommand;

impl FourLetterCommand for MonitorCommand {
    fn name(&self) -> &'static str {
        "mntr"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        if !keeper.is_server_active() {
            return Ok(Reply::text(NOT_SERVING_MESSAGE));
        }

        let stats = keeper.server_stats();
        let counts = keeper.storage_counts();
        let leadership = keeper.leadership();

        let mut buf = String::new();
        push_stat(&mut buf, "zk_version", keeper.version());
        push_stat(&mut buf, "zk_avg_latency", stats.avg_latency_ms);
        push_stat(&mut buf, "zk_max_latency", stats.max_latency_ms);
        push_stat(&mut buf, "zk_min_latency", stats.min_latency_ms);
        push_stat(&mut buf, "zk_packets_received", stats.packets_received);
        push_stat(&mut buf, "zk_packets_sent", stats.packets_sent);
        push_stat(&mut buf, "zk_num_alive_connections", stats.alive_connections);
        push_stat(&mut buf, "zk_outstanding_requests", stats.outstanding_requests);
        push_stat(&mut buf, "zk_server_state", leadership.role);
        push_stat(&mut buf, "zk_znode_count", counts.node_count);
        push_stat(&mut buf, "zk_watch_count", counts.watch_count);
        push_stat(&mut buf, "zk_ephemerals_count", counts.ephemerals_count);
        push_stat(&mut buf, "zk_approximate_data_size", counts.approximate_data_size);
        push_stat(&mut buf, "zk_key_arena_size", counts.key_arena_size);
        push_stat(&mut buf, "zk_latest_snapshot_size", counts.latest_snapshot_size);

        if let Some(open) = process::open_file_descriptors() {
            push_stat(&mut buf, "zk_open_file_descriptor_count", open);
        }
        if let Some(max) = process::max_file_descriptors() {
            push_stat(&mut buf, "zk_max_file_descriptor_count", max);
        }

        if leadership.role == ServerRole::Leader {
            let followers = leadership.followers.unwrap_or_default();
            push_stat(&mut buf, "zk_followers", followers.followers);
            push_stat(&mut buf, "zk_synced_followers", followers.synced_followers);
        }

        Ok(Reply::Text(buf))
    }
}

/// Lists full details for the server
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerStatCommand;

impl FourLetterCommand for ServerStatCommand {
    fn name(&self) -> &'static str {
        "srvr"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        if !keeper.is_server_active() {
            return Ok(Reply::text(NOT_SERVING_MESSAGE));
        }
        let mut buf = version_line(keeper);
        buf.push_str(&server_stat_body(keeper));
        Ok(Reply::Text(buf))
    }
}

/// Lists brief details for the server and connected clients
#[derive(Debug, Default, Clone, Copy)]
pub struct StatCommand;

impl FourLetterCommand for StatCommand {
    fn name(&self) -> &'static str {
        "stat"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        if !keeper.is_server_active() {
            return Ok(Reply::text(NOT_SERVING_MESSAGE));
        }
        let mut buf = version_line(keeper);
        buf.push_str("Clients:\n");
        for conn in keeper.connections() {
            buf.push_str(&format!(
                " {}(recved={},sent={})\n",
                conn.peer, conn.packets_received, conn.packets_sent
            ));
        }
        buf.push('\n');
        buf.push_str(&server_stat_body(keeper));
        Ok(Reply::Text(buf))
    }
}

/// Resets aggregate server statistics
#[derive(Debug, Default, Clone, Copy)]
pub struct StatResetCommand;

impl FourLetterCommand for StatResetCommand {
    fn name(&self) -> &'static str {
        "srst"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        keeper.reset_server_stats();
        Ok(Reply::text("Server stats reset.\n"))
    }
}

/// Dumps process-level event counters, `name<TAB>value<TAB>description`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileEventsCommand;

impl FourLetterCommand for ProfileEventsCommand {
    fn name(&self) -> &'static str {
        "pfev"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let mut buf = String::new();
        for event in keeper.profile_events() {
            buf.push_str(&format!(
                "{}\t{}\t{}\n",
                event.name, event.value, event.description
            ));
        }
        Ok(Reply::Text(buf))
    }
}

fn version_line(keeper: &dyn KeeperService) -> String {
    format!("Keeper version: {}\n", keeper.version())
}

/// Shared tail of `srvr` and `stat`
fn server_stat_body(keeper: &dyn KeeperService) -> String {
    let stats = keeper.server_stats();
    let leadership = keeper.leadership();
    let counts = keeper.storage_counts();

    let mut buf = String::new();
    buf.push_str(&format!(
        "Latency min/avg/max: {}/{}/{}\n",
        stats.min_latency_ms, stats.avg_latency_ms, stats.max_latency_ms
    ));
    buf.push_str(&format!("Received: {}\n", stats.packets_received));
    buf.push_str(&format!("Sent: {}\n", stats.packets_sent));
    buf.push_str(&format!("Connections: {}\n", stats.alive_connections));
    buf.push_str(&format!("Outstanding: {}\n", stats.outstanding_requests));
    buf.push_str(&format!("Zxid: 0x{:016x}\n", stats.last_zxid));
    buf.push_str(&format!("Mode: {}\n", leadership.role));
    buf.push_str(&format!("Term: {}\n", leadership.term));
    buf.push_str(&format!("Node count: {}\n", counts.node_count));
    buf
}
