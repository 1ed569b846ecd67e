//! One diagnostic connection

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use kdiag_core::{log_op_end, log_op_start, Dispatcher, Reply, COMMAND_LEN};
use kdiag_core_types::schema::OP_ADMIN_CONNECTION;
use kdiag_core_types::RequestContext;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, Instrument};

/// How long a client may take to send its four bytes
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve a single connection: read a token, dispatch, reply, close
///
/// A client that disconnects or stalls before sending four bytes is
/// dropped without a reply. Dispatch runs on the blocking pool since
/// commands call synchronous accessors.
///
/// # Errors
///
/// Returns the IO error if writing the reply fails.
pub async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Dispatcher,
    read_timeout: Duration,
) -> io::Result<()> {
    let ctx = RequestContext::for_peer(peer.to_string());
    let span = tracing::info_span!(
        "admin_connection",
        peer = %peer,
        request_id = %ctx.request_id
    );

    async move {
        let start = Instant::now();
        log_op_start!(OP_ADMIN_CONNECTION);

        let mut token = [0u8; COMMAND_LEN];
        match timeout(read_timeout, stream.read_exact(&mut token)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("Client closed before sending a full command");
                return Ok(());
            }
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                debug!(
                    timeout_ms = read_timeout.as_millis() as u64,
                    "Timed out waiting for command"
                );
                return Ok(());
            }
        }

        let reply =
            tokio::task::spawn_blocking(move || dispatcher.dispatch_with_context(token, &ctx))
                .await
                .map_err(io::Error::other)?;

        let written = match reply {
            Reply::Text(body) => {
                stream.write_all(body.as_bytes()).await?;
                stream.shutdown().await?;
                body.len()
            }
            Reply::Silence => 0,
        };

        log_op_end!(
            OP_ADMIN_CONNECTION,
            duration_ms = start.elapsed().as_millis() as u64,
            bytes_written = written as u64
        );
        Ok(())
    }
    .instrument(span)
    .await
}
