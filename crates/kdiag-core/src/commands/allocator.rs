//! Allocator introspection
//!
//! Registered only when built with `allocator-profiling` and the service
//! exposes an `AllocatorControl`.

use crate::command::{FourLetterCommand, Reply};
use crate::errors::{unavailable, ExError, Result as RegistryResult};
use crate::registry::CommandRegistry;
use crate::service::{AllocatorControl, KeeperService};

/// Register `jmst`, `jmfp`, `jmep` and `jmdp`
pub fn register_allocator_commands(registry: &mut CommandRegistry) -> RegistryResult<()> {
    registry.register(Box::new(AllocatorStatsCommand))?;
    registry.register(Box::new(AllocatorFlushProfileCommand))?;
    registry.register(Box::new(AllocatorEnableProfileCommand))?;
    registry.register(Box::new(AllocatorDisableProfileCommand))?;
    Ok(())
}

fn allocator<'a>(
    keeper: &'a dyn KeeperService,
    command: &str,
) -> Result<&'a dyn AllocatorControl, ExError> {
    keeper
        .allocator()
        .ok_or_else(|| unavailable(command, "Allocator introspection is not available"))
}

/// Allocator statistics dump
#[derive(Debug, Default, Clone, Copy)]
pub struct AllocatorStatsCommand;

impl FourLetterCommand for AllocatorStatsCommand {
    fn name(&self) -> &'static str {
        "jmst"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        allocator(keeper, self.name())?.stats().map(Reply::Text)
    }
}

/// Flushes the heap profile, replying with where it was written
#[derive(Debug, Default, Clone, Copy)]
pub struct AllocatorFlushProfileCommand;

impl FourLetterCommand for AllocatorFlushProfileCommand {
    fn name(&self) -> &'static str {
        "jmfp"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        allocator(keeper, self.name())?
            .flush_profile()
            .map(Reply::Text)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllocatorEnableProfileCommand;

impl FourLetterCommand for AllocatorEnableProfileCommand {
    fn name(&self) -> &'static str {
        "jmep"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        allocator(keeper, self.name())?.enable_profile()?;
        Ok(Reply::text("ok"))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllocatorDisableProfileCommand;

impl FourLetterCommand for AllocatorDisableProfileCommand {
    fn name(&self) -> &'static str {
        "jmdp"
    }

    fn run(&self, keeper: &dyn KeeperService) -> Result<Reply, ExError> {
        allocator(keeper, self.name())?.disable_profile()?;
        Ok(Reply::text("ok"))
    }
}
