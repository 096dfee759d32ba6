pub mod cd;
pub mod exit;
pub mod truth;

use crate::shell::context::Registry;

/// Builtins run in the shell process without forking.
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    registry.insert("cd".to_string(), Box::new(cd::CdCommand));
    registry.insert("exit".to_string(), Box::new(exit::ExitCommand));
    registry.insert("quit".to_string(), Box::new(exit::ExitCommand));
    registry.insert("true".to_string(), Box::new(truth::TrueCommand));
    registry.insert("false".to_string(), Box::new(truth::FalseCommand));
    registry
}
