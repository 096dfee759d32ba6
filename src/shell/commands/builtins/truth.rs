use crate::shell::ast::SimpleCommand;
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::outcome::Outcome;
use anyhow::Result;

pub struct TrueCommand;
impl Executable for TrueCommand {
    fn execute(&self, _cmd: &SimpleCommand, _args: &[String], _ctx: &mut ShellContext) -> Result<Outcome> {
        Ok(Outcome::Success)
    }
}

pub struct FalseCommand;
impl Executable for FalseCommand {
    fn execute(&self, _cmd: &SimpleCommand, _args: &[String], _ctx: &mut ShellContext) -> Result<Outcome> {
        Ok(Outcome::failure())
    }
}
