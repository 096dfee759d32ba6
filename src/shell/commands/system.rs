// System command
use crate::shell::ast::SimpleCommand;
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::outcome::Outcome;
use crate::shell::process::{spawn_child, wait_for};
use crate::shell::redirect::RedirectPlan;
use anyhow::Result;
use log::error;
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Status of a child whose program image could not be loaded.
pub const EXEC_FAILED: i32 = 127;

/// Anything that is not a builtin: fork, redirect in the child, replace the
/// child's image, and wait for it.
pub struct SystemCommand;

impl Executable for SystemCommand {
    fn execute(&self, cmd: &SimpleCommand, args: &[String], ctx: &mut ShellContext) -> Result<Outcome> {
        // Targets are resolved here so the child only opens and execs.
        let plan = RedirectPlan::for_command(cmd, ctx, false, &ctx.cwd);
        let pid = spawn_child(ctx, |ctx| exec_program(&plan, args, ctx))?;
        Ok(Outcome::from_wait_status(wait_for(pid)?))
    }
}

/// Runs in the forked child. Returns only when the program never started.
pub fn exec_program(plan: &RedirectPlan, args: &[String], ctx: &ShellContext) -> Outcome {
    if let Err(e) = plan.apply() {
        error!("{:#}", e);
        return Outcome::failure();
    }

    let Some((program, rest)) = args.split_first() else {
        return Outcome::Failure(EXEC_FAILED);
    };

    // Shadowing: the context's environment is the source of truth
    let err = Command::new(program)
        .args(rest)
        .env_clear()
        .envs(&ctx.env)
        .exec();
    error!("Execution failed for '{}': {}", program, err);
    Outcome::Failure(EXEC_FAILED)
}
