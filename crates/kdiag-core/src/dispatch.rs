//! Token → reply resolution
//!
//! The dispatcher is the single entry point the admin listener calls with
//! the four bytes it read. Unknown and disabled tokens get the same
//! rejection text; a command that fails or panics is reported to the
//! client as one error line instead of taking the handler down.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::codec::{CommandCode, COMMAND_LEN};
use crate::command::{FourLetterCommand, NopCommand, Reply};
use crate::errors::{ExError, ExErrorKind};
use crate::registry::CommandRegistry;
use crate::service::KeeperService;
use crate::types::schema::{OP_DISPATCH, OUTCOME_EXECUTED, OUTCOME_REJECTED, OUTCOME_SILENT};
use crate::types::RequestContext;
use crate::{log_op_end, log_op_error, log_op_start};

/// Shared, read-only dispatch state
///
/// Cloning is cheap; every clone points at the same registry and service.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    keeper: Arc<dyn KeeperService>,
    nop: NopCommand,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, keeper: Arc<dyn KeeperService>) -> Self {
        Self {
            registry,
            keeper,
            nop: NopCommand,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn keeper(&self) -> &Arc<dyn KeeperService> {
        &self.keeper
    }

    /// Resolve a token read off the wire into the full reply
    pub fn dispatch(&self, token: [u8; COMMAND_LEN]) -> Reply {
        self.dispatch_with_context(token, &RequestContext::new())
    }

    /// Same as `dispatch`, tagging log events with the request context
    pub fn dispatch_with_context(&self, token: [u8; COMMAND_LEN], ctx: &RequestContext) -> Reply {
        let start = Instant::now();
        let code = CommandCode::from_bytes(token);
        let name = code.name();

        log_op_start!(
            OP_DISPATCH,
            command = %name,
            request_id = %ctx.request_id,
            peer = ctx.peer_or_dash()
        );

        let (command, outcome) = match self.resolve(code) {
            Ok(Some(command)) => (command, OUTCOME_EXECUTED),
            Ok(None) => {
                warn!(
                    op = OP_DISPATCH,
                    command = %name,
                    peer = ctx.peer_or_dash(),
                    "Rejected four letter command, unknown or not in the allow list"
                );
                (&self.nop as &dyn FourLetterCommand, OUTCOME_REJECTED)
            }
            Err(err) => {
                let err = err.with_command(name.clone());
                log_op_error!(
                    OP_DISPATCH,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    command = %name
                );
                return error_reply(&err);
            }
        };

        match run_guarded(command, self.keeper.as_ref()) {
            Ok(reply) => {
                let outcome = if reply.is_silence() {
                    OUTCOME_SILENT
                } else {
                    outcome
                };
                log_op_end!(
                    OP_DISPATCH,
                    duration_ms = start.elapsed().as_millis() as u64,
                    command = %name,
                    outcome = outcome,
                    request_id = %ctx.request_id
                );
                reply
            }
            Err(err) => {
                let err = err.with_command(name.clone());
                log_op_error!(
                    OP_DISPATCH,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    command = %name
                );
                error_reply(&err)
            }
        }
    }

    /// Registered and enabled command for `code`, `None` if rejected
    fn resolve(&self, code: CommandCode) -> Result<Option<&dyn FourLetterCommand>, ExError> {
        self.registry.check_initialization()?;
        if !self.registry.is_known(code) || !self.registry.is_enabled(code) {
            return Ok(None);
        }
        Ok(Some(self.registry.get(code)?))
    }
}

/// Run a command, turning a panic into an internal error
fn run_guarded(
    command: &dyn FourLetterCommand,
    keeper: &dyn KeeperService,
) -> Result<Reply, ExError> {
    catch_unwind(AssertUnwindSafe(|| command.run(keeper))).unwrap_or_else(|payload| {
        Err(ExError::new(ExErrorKind::Internal)
            .with_op(OP_DISPATCH)
            .with_message(format!(
                "command panicked: {}",
                panic_message(payload.as_ref())
            )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

fn error_reply(err: &ExError) -> Reply {
    Reply::Text(format!("{}\n", err))
}
