pub mod shell;

pub use shell::ast::{CommandTree, IoFlags, Operator, SimpleCommand, Word, WordPart};
pub use shell::context::ShellContext;
pub use shell::outcome::Outcome;
pub use shell::run_tree;
