//! Shell command execution for post-generation commands

pub mod command_executor;

pub use command_executor::{CommandExecutor, CommandResult, ShellCommandExecutor};

#[cfg(test)]
pub use command_executor::MockCommandExecutor;
