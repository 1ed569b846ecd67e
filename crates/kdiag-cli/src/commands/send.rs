//! Raw four letter client

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use clap::Args;
use kdiag_core::COMMAND_LEN;

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Admin listener address, e.g. 127.0.0.1:9181
    pub addr: String,

    /// Four letter command, e.g. ruok
    pub command: String,

    /// Connect and read timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

pub fn execute(args: SendArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.command.len() != COMMAND_LEN {
        return Err(format!(
            "Command must be exactly {} bytes, got {:?}",
            COMMAND_LEN, args.command
        )
        .into());
    }

    let timeout = Duration::from_secs(args.timeout);
    let addr = args
        .addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("Address did not resolve: {}", args.addr))?;

    let mut stream = TcpStream::connect_timeout(&addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.write_all(args.command.as_bytes())?;

    // Silence is a valid reply: an empty body is printed as nothing
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply)?;

    let mut stdout = std::io::stdout();
    stdout.write_all(&reply)?;
    stdout.flush()?;
    Ok(())
}
