use thiserror::Error;

/// Result type alias for registry contract checks
pub type Result<T> = std::result::Result<T, DiagError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log fields and in the
/// error lines a diagnostic command renders when an accessor fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Registry contract
    InvalidCommandName,
    UnknownCommand,
    DuplicateCommand,
    NotInitialized,
    AlreadyInitialized,

    // Coordination service
    NotLeader,
    Unavailable,

    // Configuration / IO
    InvalidConfig,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidCommandName => "ERR_INVALID_COMMAND_NAME",
            ExErrorKind::UnknownCommand => "ERR_UNKNOWN_COMMAND",
            ExErrorKind::DuplicateCommand => "ERR_DUPLICATE_COMMAND",
            ExErrorKind::NotInitialized => "ERR_NOT_INITIALIZED",
            ExErrorKind::AlreadyInitialized => "ERR_ALREADY_INITIALIZED",
            ExErrorKind::NotLeader => "ERR_NOT_LEADER",
            ExErrorKind::Unavailable => "ERR_UNAVAILABLE",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// operation and command context used when rendering a reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    command: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            command: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the four letter command name this error belongs to
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(command) = &self.command {
            write!(f, " command '{}'", command)?;
        }
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Registry and dispatch contract violations
///
/// None of these can be triggered by a diagnostic client; they signal a
/// programming error in how the registry was assembled or used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagError {
    /// Command name is not exactly four bytes
    #[error("Invalid four letter command name: {name:?}")]
    InvalidCommandName { name: String },

    /// A command with the same code is already registered
    #[error("Four letter command already registered: {name}")]
    DuplicateCommand { name: String },

    /// Lookup of a code that has no registered command
    #[error("Unknown four letter command: {name}")]
    UnknownCommand { name: String },

    /// Registry used before the allow list was initialized
    #[error("Four letter command registry is not initialized")]
    RegistryNotInitialized,

    /// Registration or allow list initialization after initialization
    #[error("Four letter command registry is already initialized")]
    RegistryAlreadyInitialized,
}

impl From<DiagError> for ExError {
    fn from(err: DiagError) -> Self {
        let message = err.to_string();
        match err {
            DiagError::InvalidCommandName { name } => {
                ExError::new(ExErrorKind::InvalidCommandName)
                    .with_op("register_command")
                    .with_command(name)
                    .with_message(message)
            }
            DiagError::DuplicateCommand { name } => ExError::new(ExErrorKind::DuplicateCommand)
                .with_op("register_command")
                .with_command(name)
                .with_message(message),
            DiagError::UnknownCommand { name } => ExError::new(ExErrorKind::UnknownCommand)
                .with_op("get_command")
                .with_command(name)
                .with_message(message),
            DiagError::RegistryNotInitialized => ExError::new(ExErrorKind::NotInitialized)
                .with_op("check_initialization")
                .with_message(message),
            DiagError::RegistryAlreadyInitialized => {
                ExError::new(ExErrorKind::AlreadyInitialized)
                    .with_op("initialize_allow_list")
                    .with_message(message)
            }
        }
    }
}

/// Accessor error for a command that only the raft leader can serve
pub fn not_leader(op: &str) -> ExError {
    ExError::new(ExErrorKind::NotLeader)
        .with_op(op.to_string())
        .with_message("This instance is not currently the leader")
}

/// Accessor error for a coordination service that cannot answer right now
pub fn unavailable(op: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Unavailable)
        .with_op(op.to_string())
        .with_message(reason)
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("load_config")
        .with_message(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_unique() {
        let kinds = [
            ExErrorKind::InvalidCommandName,
            ExErrorKind::UnknownCommand,
            ExErrorKind::DuplicateCommand,
            ExErrorKind::NotInitialized,
            ExErrorKind::AlreadyInitialized,
            ExErrorKind::NotLeader,
            ExErrorKind::Unavailable,
            ExErrorKind::InvalidConfig,
            ExErrorKind::Io,
            ExErrorKind::Internal,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_code_command_and_message() {
        let err = not_leader("dump").with_command("dump");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_NOT_LEADER]"));
        assert!(rendered.contains("command 'dump'"));
        assert!(rendered.contains("not currently the leader"));
    }

    #[test]
    fn test_duplicate_command_conversion() {
        let ex: ExError = DiagError::DuplicateCommand {
            name: "mntr".to_string(),
        }
        .into();
        assert_eq!(ex.kind(), ExErrorKind::DuplicateCommand);
        assert_eq!(ex.command(), Some("mntr"));
        assert_eq!(ex.op(), Some("register_command"));
    }

    #[test]
    fn test_not_initialized_conversion() {
        let ex: ExError = DiagError::RegistryNotInitialized.into();
        assert_eq!(ex.code(), "ERR_NOT_INITIALIZED");
        assert!(ex.message().contains("not initialized"));
    }
}
