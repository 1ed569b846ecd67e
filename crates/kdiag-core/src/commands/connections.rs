//! Connection and session introspection

use crate::command::{FourLetterCommand, Reply};
use crate::commands::format_session_id;
use crate::errors::ExError;
use crate::service::{ConnectionInfo, KeeperService};

/// Lists full connection/session details for all connected clients
///
/// One line per connection: packets received/sent, session id, last
/// operation, establishment time, timeout, last cxid/zxid, last response
/// time and latencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsCommand;

impl FourLetterCommand for ConsCommand {
    fn name(&self) -> &'static str {
        "cons"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let mut buf = String::new();
        for conn in keeper.connections() {
            buf.push_str(&format_connection(&conn));
        }
        buf.push('\n');
        Ok(Reply::Text(buf))
    }
}

fn format_connection(conn: &ConnectionInfo) -> String {
    format!(
        " {}(recved={},sent={},sid={},lop={},est={},to={},lcxid=0x{:016x},lzxid=0x{:016x},lresp={},llat={},minlat={},avglat={},maxlat={})\n",
        conn.peer,
        conn.packets_received,
        conn.packets_sent,
        format_session_id(conn.session_id),
        conn.last_op,
        conn.established.timestamp_millis(),
        conn.session_timeout_ms,
        conn.last_cxid,
        conn.last_zxid,
        conn.last_response.map(|t| t.timestamp_millis()).unwrap_or(0),
        conn.last_latency_ms,
        conn.min_latency_ms,
        conn.avg_latency_ms,
        conn.max_latency_ms,
    )
}

/// Resets connection/session statistics for all connections
#[derive(Debug, Default, Clone, Copy)]
pub struct ResetConnStatsCommand;

impl FourLetterCommand for ResetConnStatsCommand {
    fn name(&self) -> &'static str {
        "crst"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        keeper.reset_connection_stats();
        Ok(Reply::text("Connection stats reset.\n"))
    }
}

/// Lists outstanding sessions and their ephemeral nodes
///
/// Only the leader can answer; elsewhere the error is reported as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct DumpCommand;

impl FourLetterCommand for DumpCommand {
    fn name(&self) -> &'static str {
        "dump"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let dump = keeper.sessions_dump()?;

        let mut buf = format!("Sessions dump ({}):\n", dump.sessions.len());
        for session_id in &dump.sessions {
            buf.push_str(&format_session_id(*session_id));
            buf.push('\n');
        }

        buf.push_str(&format!(
            "Sessions with Ephemerals ({}):\n",
            dump.ephemerals.len()
        ));
        for (session_id, paths) in &dump.ephemerals {
            buf.push_str(&format_session_id(*session_id));
            buf.push('\n');
            for path in paths {
                buf.push('\t');
                buf.push_str(path);
                buf.push('\n');
            }
        }
        Ok(Reply::Text(buf))
    }
}
