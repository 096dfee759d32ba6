use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use crate::shell::commands::{Executable, builtins};

pub type Registry = HashMap<String, Box<dyn Executable + Send + Sync>>;

/// Per-session interpreter state. A forked child works on its own copy.
#[derive(Clone)]
pub struct ShellContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub exit_code: i32,
    pub registry: Arc<Registry>,
}

impl ShellContext {
    pub fn new() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            cwd,
            env,
            exit_code: 0,
            registry: Arc::new(builtins::default_registry()),
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: &str, value: String) {
        self.env.insert(name.to_string(), value);
    }
}

impl Default for ShellContext {
    fn default() -> Self {
        Self::new()
    }
}
