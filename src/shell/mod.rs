pub mod ast;
pub mod commands;
pub mod context;
pub mod executor;
pub mod fds;
pub mod outcome;
pub mod process;
pub mod redirect;
pub mod word;

use ast::CommandTree;
use context::ShellContext;
use executor::execute_tree;
use outcome::Outcome;


/// Evaluate one line's command tree from the top.
pub fn run_tree(tree: &CommandTree, ctx: &mut ShellContext) -> Outcome {
    execute_tree(tree, ctx, 0, None)
}
