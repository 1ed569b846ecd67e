//! Canonical schema constants for structured logging and events
//!
//! These constants keep the dispatcher, the admin listener and the tests
//! agreeing on field names.

// Canonical field keys for structured logging
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Diagnostic command identity
pub const FIELD_COMMAND: &str = "command";
pub const FIELD_OUTCOME: &str = "outcome";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Dispatch outcomes
pub const OUTCOME_EXECUTED: &str = "executed";
pub const OUTCOME_REJECTED: &str = "rejected";
pub const OUTCOME_SILENT: &str = "silent";

// Operation names
pub const OP_DISPATCH: &str = "four_letter_command";
pub const OP_ALLOW_LIST_INIT: &str = "allow_list_init";
pub const OP_ADMIN_CONNECTION: &str = "admin_connection";
