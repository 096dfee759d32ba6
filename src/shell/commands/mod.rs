pub mod builtins;
pub mod system;

use crate::shell::ast::SimpleCommand;
use crate::shell::context::ShellContext;
use crate::shell::outcome::Outcome;
use anyhow::Result;

/// A verb the interpreter knows how to run. `args[0]` is the verb itself and
/// every argument has already been expanded.
pub trait Executable: Send + Sync {
    fn execute(&self, cmd: &SimpleCommand, args: &[String], ctx: &mut ShellContext) -> Result<Outcome>;
}
