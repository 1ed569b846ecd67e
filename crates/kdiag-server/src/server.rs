//! Accept loop

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use kdiag_core::errors::{io_error, ExError};
use kdiag_core::Dispatcher;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, error, info, warn};

use crate::connection::{handle_connection, DEFAULT_READ_TIMEOUT};

/// Listener bound to the admin address, serving one task per connection
pub struct AdminServer {
    listener: TcpListener,
    dispatcher: Dispatcher,
    read_timeout: Duration,
}

impl AdminServer {
    /// Bind the admin listener
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Io` if the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs, dispatcher: Dispatcher) -> Result<Self, ExError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| io_error("admin_bind", e))?;
        Ok(Self {
            listener,
            dispatcher,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// # Errors
    ///
    /// Returns `ExErrorKind::Io` if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ExError> {
        self.listener
            .local_addr()
            .map_err(|e| io_error("admin_local_addr", e))
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Accept errors are logged and the loop continues. Connections already
    /// accepted keep running to completion on their own tasks.
    ///
    /// # Errors
    ///
    /// Fails only if the listener has no local address.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), ExError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(
            addr = %addr,
            enabled = %self.dispatcher.registry().allow_list().names().join(","),
            "Admin listener accepting four letter commands"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested, admin listener stopping");
                    break;
                }

                conn = self.listener.accept() => {
                    let (stream, peer) = match conn {
                        Ok(c) => c,
                        Err(e) => {
                            error!(err = %e, "Admin accept error");
                            continue;
                        }
                    };

                    debug!(peer = %peer, "New admin connection");
                    let dispatcher = self.dispatcher.clone();
                    let read_timeout = self.read_timeout;
                    tokio::spawn(async move {
                        let served = handle_connection(stream, peer, dispatcher, read_timeout).await;
                        if let Err(e) = served {
                            warn!(peer = %peer, err = %e, "Admin connection error");
                        }
                    });
                }
            }
        }

        info!("Admin listener stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(err = %e, "SIGTERM handler unavailable, waiting for Ctrl-C only");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
