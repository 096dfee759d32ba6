// Cd command

use crate::shell::ast::SimpleCommand;
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::fds::SavedStdio;
use crate::shell::outcome::Outcome;
use crate::shell::redirect::RedirectPlan;
use anyhow::{Context, Result, bail};
use std::env;

pub struct CdCommand;
impl Executable for CdCommand {
    fn execute(&self, cmd: &SimpleCommand, args: &[String], ctx: &mut ShellContext) -> Result<Outcome> {
        // args[0] is "cd". args[1] is path.
        if args.len() != 2 {
            bail!("cd: expected exactly one directory, got {}", args.len() - 1);
        }
        let path_str = &args[1];

        // Redirections name files relative to where we are before moving.
        let saved_cwd = env::current_dir().unwrap_or_else(|_| ctx.cwd.clone());
        if cmd.has_redirections() {
            let _restore = SavedStdio::save()?;
            RedirectPlan::for_command(cmd, ctx, true, &saved_cwd).apply()?;
        }

        env::set_current_dir(path_str)
            .with_context(|| format!("cd: cannot change directory to {}", path_str))?;
        ctx.cwd = env::current_dir().unwrap_or_else(|_| saved_cwd.join(path_str));
        Ok(Outcome::Success)
    }
}
