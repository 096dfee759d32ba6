// Exit command

use crate::shell::ast::SimpleCommand;
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::outcome::Outcome;
use anyhow::Result;
use log::debug;

/// Status used by `exit`/`quit` to signal a deliberate shell termination.
/// A waiting parent observes it as 156.
pub const SHELL_EXIT: i32 = -100;

pub struct ExitCommand;
impl Executable for ExitCommand {
    fn execute(&self, _cmd: &SimpleCommand, args: &[String], _ctx: &mut ShellContext) -> Result<Outcome> {
        debug!("{}: terminating with status {}", args[0], SHELL_EXIT);
        std::process::exit(SHELL_EXIT);
    }
}
