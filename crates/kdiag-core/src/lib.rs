//! kdiag Core - Four letter word diagnostic commands for a coordination service
//!
//! This crate provides the diagnostic layer an operator talks to with a
//! single four byte token, including:
//! - The command codec (name bytes packed into a 32-bit code)
//! - The command contract and the standard command set
//! - The registry with its allow-list gate
//! - The dispatcher that resolves a token to a full reply
//! - The `KeeperService` accessor interface plus an in-memory implementation
//! - Configuration, error and logging facilities shared by the admin server

pub mod allow_list;
pub mod codec;
pub mod command;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod logging_facility;
pub mod memory;
pub mod process;
pub mod registry;
pub mod service;

pub use kdiag_core_types as types;

// Re-export commonly used types
pub use allow_list::AllowList;
pub use codec::{CommandCode, COMMAND_LEN};
pub use command::{FourLetterCommand, NopCommand, Reply, NOT_ALLOWED_MESSAGE};
pub use config::{AdminSettings, KdiagConfig, KeeperSettings};
pub use dispatch::Dispatcher;
pub use errors::{DiagError, ExError, ExErrorKind, Result};
pub use memory::MemoryKeeper;
pub use registry::CommandRegistry;
pub use service::{AllocatorControl, KeeperService, ServerRole};
