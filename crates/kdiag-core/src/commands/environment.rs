//! Environment, configuration and feature flag dumps

use kdiag_core_types::sensitive::is_sensitive_key;
use kdiag_core_types::Sensitive;

use crate::command::{FourLetterCommand, Reply};
use crate::commands::push_stat;
use crate::errors::ExError;
use crate::process;
use crate::service::KeeperService;

/// Details about the serving environment
#[derive(Debug, Default, Clone, Copy)]
pub struct EnviCommand;

impl FourLetterCommand for EnviCommand {
    fn name(&self) -> &'static str {
        "envi"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let entries = [
            ("keeper.version", keeper.version()),
            ("host.name", process::host_name()),
            ("os.name", std::env::consts::OS.to_string()),
            ("os.arch", std::env::consts::ARCH.to_string()),
            ("cpu.count", process::cpu_count().to_string()),
            ("user.name", process::user_name()),
            ("user.home", process::user_home()),
            ("user.dir", process::working_dir()),
            ("user.tmp", std::env::temp_dir().display().to_string()),
        ];

        let mut buf = String::from("Environment:\n");
        for (key, value) in entries {
            buf.push_str(&format!("{}={}\n", key, value));
        }
        Ok(Reply::Text(buf))
    }
}

/// Effective configuration, `key=value`, credentials redacted
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfCommand;

impl FourLetterCommand for ConfCommand {
    fn name(&self) -> &'static str {
        "conf"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let mut buf = String::new();
        for entry in keeper.configuration() {
            if is_sensitive_key(&entry.key) {
                buf.push_str(&format!("{}={}\n", entry.key, Sensitive::new(entry.value)));
            } else {
                buf.push_str(&format!("{}={}\n", entry.key, entry.value));
            }
        }
        Ok(Reply::Text(buf))
    }
}

/// Feature flags, `name<TAB>1` or `name<TAB>0`
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureFlagsCommand;

impl FourLetterCommand for FeatureFlagsCommand {
    fn name(&self) -> &'static str {
        "ftfl"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        let mut buf = String::new();
        for flag in keeper.feature_flags() {
            push_stat(&mut buf, &flag.name, u8::from(flag.enabled));
        }
        Ok(Reply::Text(buf))
    }
}

/// Client protocol API version
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiVersionCommand;

impl FourLetterCommand for ApiVersionCommand {
    fn name(&self) -> &'static str {
        "apiv"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        Ok(Reply::Text(keeper.api_version().to_string()))
    }
}
