//! kdiag CLI
//!
//! Runs the four letter command admin listener and talks to one

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "kdiag")]
#[command(about = "kdiag - Four letter word diagnostics for a coordination service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the admin listener over an in-memory coordination service
    Serve(commands::serve::ServeArgs),
    /// Send one four letter command and print the reply
    Send(commands::send::SendArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args),
        Commands::Send(args) => commands::send::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
