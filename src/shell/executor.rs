use crate::shell::ast::{CommandTree, Operator, SimpleCommand};
use crate::shell::commands::Executable;
use crate::shell::commands::system::SystemCommand;
use crate::shell::context::ShellContext;
use crate::shell::outcome::Outcome;
use crate::shell::process::{run_parallel, run_pipe};
use crate::shell::word::{expand_parts, expand_word, expand_words};
use log::{debug, warn};

/// Evaluate `tree` and everything below it.
///
/// `level` and `father` describe where the node sits in the whole tree and
/// only feed the log. `exit`/`quit` never return from here.
pub fn execute_tree(
    tree: &CommandTree,
    ctx: &mut ShellContext,
    level: usize,
    father: Option<Operator>,
) -> Outcome {
    let outcome = match tree {
        CommandTree::Simple(cmd) => execute_simple(cmd, ctx, level, father),
        CommandTree::Compound { op, cmd1, cmd2 } => {
            debug!("[{}] {:?} (under {:?})", level, op, father);
            let op = *op;
            let next = level + 1;
            match op {
                Operator::Sequential => {
                    execute_tree(cmd1, ctx, next, Some(op));
                    execute_tree(cmd2, ctx, next, Some(op))
                }
                Operator::CondNonZero => {
                    let first = execute_tree(cmd1, ctx, next, Some(op));
                    if first.is_success() {
                        first
                    } else {
                        execute_tree(cmd2, ctx, next, Some(op))
                    }
                }
                Operator::CondZero => {
                    let first = execute_tree(cmd1, ctx, next, Some(op));
                    if first.is_success() {
                        execute_tree(cmd2, ctx, next, Some(op))
                    } else {
                        first
                    }
                }
                Operator::Parallel => run_parallel(
                    ctx,
                    |ctx| execute_tree(cmd1, ctx, next, Some(op)),
                    |ctx| execute_tree(cmd2, ctx, next, Some(op)),
                ),
                Operator::Pipe => run_pipe(
                    ctx,
                    |ctx| execute_tree(cmd1, ctx, next, Some(op)),
                    |ctx| execute_tree(cmd2, ctx, next, Some(op)),
                ),
            }
        }
    };
    ctx.exit_code = outcome.exit_code();
    outcome
}

fn execute_simple(cmd: &SimpleCommand, ctx: &mut ShellContext, level: usize, father: Option<Operator>) -> Outcome {
    let mut full_args = vec![expand_word(&cmd.verb, ctx)];
    full_args.extend(expand_words(&cmd.params, ctx));
    debug!("[{}] {:?} (under {:?})", level, full_args, father);

    let registry = ctx.registry.clone();
    let result = if let Some(builtin) = registry.get(&full_args[0]) {
        builtin.execute(cmd, &full_args, ctx)
    } else if let Some((name, value)) = cmd.verb.as_assignment() {
        let value = expand_parts(&value, ctx);
        debug!("[{}] {}={}", level, name, value);
        ctx.set_var(&name, value);
        Ok(Outcome::Success)
    } else {
        SystemCommand.execute(cmd, &full_args, ctx)
    };

    result.unwrap_or_else(|e| {
        warn!("{:#}", e);
        Outcome::failure()
    })
}
