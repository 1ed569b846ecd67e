//! Four letter command registry
//!
//! Built once during single-threaded startup: commands are registered, then
//! the allow list is initialized, which marks the registry initialized and
//! closes it to further writes. After that the registry is only read, so it
//! is shared between connection handlers behind an `Arc` with no locking.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::allow_list::AllowList;
use crate::codec::CommandCode;
use crate::command::FourLetterCommand;
use crate::commands::register_standard_commands;
use crate::config::AdminSettings;
use crate::errors::{DiagError, Result};
use crate::service::KeeperService;
use crate::types::schema::OP_ALLOW_LIST_INIT;

/// Code → command table plus the allow list gate
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<CommandCode, Box<dyn FourLetterCommand>>,
    allow_list: AllowList,
    initialized: bool,
}

impl CommandRegistry {
    /// Empty, uninitialized registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every standard command and the configured allow list
    ///
    /// Allocator commands are included only when built with the
    /// `allocator-profiling` feature and `keeper` exposes an allocator.
    ///
    /// # Errors
    ///
    /// Propagates registration contract violations (duplicate names).
    pub fn standard(keeper: &dyn KeeperService, settings: &AdminSettings) -> Result<Self> {
        let mut registry = Self::new();
        register_standard_commands(&mut registry, keeper)?;
        registry.initialize_allow_list(settings)?;
        Ok(registry)
    }

    /// Register a command under the code of its name
    ///
    /// Duplicate names are rejected; the first registration stays.
    ///
    /// # Errors
    ///
    /// - `RegistryAlreadyInitialized` after `initialize_allow_list`
    /// - `InvalidCommandName` if the name is not exactly four bytes
    /// - `DuplicateCommand` if the code is already taken
    pub fn register(&mut self, command: Box<dyn FourLetterCommand>) -> Result<CommandCode> {
        if self.initialized {
            return Err(DiagError::RegistryAlreadyInitialized);
        }
        let name = command.name();
        let code = CommandCode::from_name(name).ok_or_else(|| DiagError::InvalidCommandName {
            name: name.to_string(),
        })?;
        if self.commands.contains_key(&code) {
            return Err(DiagError::DuplicateCommand {
                name: name.to_string(),
            });
        }
        debug!(command = name, code = code.raw(), "Registered four letter command");
        self.commands.insert(code, command);
        Ok(code)
    }

    /// Parse the allow list from settings and mark the registry initialized
    ///
    /// Explicit names that match no registered command are dropped.
    ///
    /// # Errors
    ///
    /// `RegistryAlreadyInitialized` on a second call.
    pub fn initialize_allow_list(&mut self, settings: &AdminSettings) -> Result<()> {
        if self.initialized {
            return Err(DiagError::RegistryAlreadyInitialized);
        }
        let allow_list = AllowList::parse(&settings.four_letter_word_allow_list)
            .retain_known(|code| self.commands.contains_key(&code));
        info!(
            op = OP_ALLOW_LIST_INIT,
            enabled = %allow_list.names().join(","),
            registered = self.commands.len(),
            "Four letter command allow list initialized"
        );
        self.allow_list = allow_list;
        self.initialized = true;
        Ok(())
    }

    /// # Errors
    ///
    /// `RegistryNotInitialized` until `initialize_allow_list` has run.
    pub fn check_initialization(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DiagError::RegistryNotInitialized)
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a command is registered under `code`
    pub fn is_known(&self, code: CommandCode) -> bool {
        self.commands.contains_key(&code)
    }

    /// Whether the allow list permits `code`
    ///
    /// Under the wildcard this holds for any code, registered or not.
    pub fn is_enabled(&self, code: CommandCode) -> bool {
        self.allow_list.permits(code)
    }

    /// Registered command for `code`
    ///
    /// # Errors
    ///
    /// - `RegistryNotInitialized` before initialization
    /// - `UnknownCommand` if nothing is registered under `code`
    pub fn get(&self, code: CommandCode) -> Result<&dyn FourLetterCommand> {
        self.check_initialization()?;
        self.commands
            .get(&code)
            .map(|command| command.as_ref())
            .ok_or_else(|| DiagError::UnknownCommand { name: code.name() })
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Registered names in ascending order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.values().map(|c| c.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Reply;
    use crate::errors::ExError;

    struct Fixed(&'static str);

    impl FourLetterCommand for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn run(&self, _keeper: &dyn KeeperService) -> std::result::Result<Reply, ExError> {
            Ok(Reply::text(self.0))
        }
    }

    fn code(name: &str) -> CommandCode {
        CommandCode::from_name(name).unwrap()
    }

    #[test]
    fn test_register_then_initialize() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(Fixed("ruok"))).unwrap();
        registry.register(Box::new(Fixed("mntr"))).unwrap();
        assert!(!registry.is_initialized());

        registry
            .initialize_allow_list(&AdminSettings::with_allow_list("ruok"))
            .unwrap();

        assert!(registry.is_initialized());
        assert!(registry.is_known(code("mntr")));
        assert!(registry.is_enabled(code("ruok")));
        assert!(!registry.is_enabled(code("mntr")));
        assert_eq!(registry.names(), vec!["mntr", "ruok"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(Fixed("ruok"))).unwrap();
        let err = registry.register(Box::new(Fixed("ruok"))).unwrap_err();
        assert_eq!(
            err,
            DiagError::DuplicateCommand {
                name: "ruok".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut registry = CommandRegistry::new();
        let err = registry.register(Box::new(Fixed("ok"))).unwrap_err();
        assert!(matches!(err, DiagError::InvalidCommandName { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_before_initialization_fails() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(Fixed("ruok"))).unwrap();
        assert_eq!(
            registry.get(code("ruok")).err(),
            Some(DiagError::RegistryNotInitialized)
        );
    }

    #[test]
    fn test_registry_closed_after_initialization() {
        let mut registry = CommandRegistry::new();
        registry
            .initialize_allow_list(&AdminSettings::with_allow_list("*"))
            .unwrap();

        assert_eq!(
            registry.register(Box::new(Fixed("ruok"))).unwrap_err(),
            DiagError::RegistryAlreadyInitialized
        );
        assert_eq!(
            registry
                .initialize_allow_list(&AdminSettings::default())
                .unwrap_err(),
            DiagError::RegistryAlreadyInitialized
        );
    }

    #[test]
    fn test_get_unknown_code() {
        let mut registry = CommandRegistry::new();
        registry
            .initialize_allow_list(&AdminSettings::with_allow_list("*"))
            .unwrap();
        assert_eq!(
            registry.get(code("xxxx")).err(),
            Some(DiagError::UnknownCommand {
                name: "xxxx".to_string()
            })
        );
    }
}
