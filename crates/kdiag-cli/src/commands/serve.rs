//! Admin listener command

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use kdiag_core::logging_facility::{init, Profile};
use kdiag_core::{CommandRegistry, Dispatcher, KdiagConfig, KeeperService, MemoryKeeper};
use kdiag_server::{shutdown_signal, AdminServer};
use tracing::info;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override `[admin] listen`
    #[arg(long)]
    pub listen: Option<String>,

    /// Override `[admin] four_letter_word_allow_list`
    #[arg(long)]
    pub allow_list: Option<String>,

    /// Emit JSON structured logs
    #[arg(long)]
    pub json_logs: bool,
}

pub fn execute(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    init(if args.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let mut config = match &args.config {
        Some(path) => KdiagConfig::from_file(path)?,
        None => KdiagConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.admin.listen = listen;
    }
    if let Some(allow_list) = args.allow_list {
        config.admin.four_letter_word_allow_list = allow_list;
    }

    let keeper = Arc::new(MemoryKeeper::from_config(&config.keeper));
    let registry = CommandRegistry::standard(keeper.as_ref(), &config.admin)?;
    info!(
        server_id = config.keeper.server_id,
        registered = registry.len(),
        "Four letter command registry ready"
    );
    let service: Arc<dyn KeeperService> = keeper;
    let dispatcher = Dispatcher::new(Arc::new(registry), service);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let server = AdminServer::bind(config.admin.listen.as_str(), dispatcher).await?;
        let addr = server.local_addr()?;
        println!("Listening on {}", addr);
        std::io::stdout().flush()?;
        server.serve_until(shutdown_signal()).await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
