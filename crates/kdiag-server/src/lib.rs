//! kdiag Server - TCP admin listener for four letter commands
//!
//! A client connects, writes exactly four bytes, reads the reply until the
//! server closes the connection. There is no framing and no keep-alive:
//! one command per connection.

pub mod connection;
pub mod server;

pub use connection::{handle_connection, DEFAULT_READ_TIMEOUT};
pub use server::{shutdown_signal, AdminServer};
