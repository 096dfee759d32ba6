use anyhow::{Context, Result, bail};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use treesh::CommandTree;

/// A batch of already-parsed input lines sharing one shell session.
#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, rename = "line")]
    pub lines: Vec<CommandTree>,
}

pub fn load_session(path: &Path, env_file: Option<&Path>) -> Result<Session> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;

    // 1. Parse the document (Base Layer)
    let mut session: Session = toml::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))?;

    if session.lines.is_empty() {
        bail!("Session file {} contains no [[line]] entries", path.display());
    }

    // 2. Env file (Override Layer)
    if let Some(env_path) = env_file {
        info!("Loading environment from: {}", env_path.display());
        for item in dotenvy::from_path_iter(env_path)
            .with_context(|| format!("Failed to read env file {}", env_path.display()))?
        {
            let (key, val) = item?;
            session.env.insert(key, val);
        }
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesh::{Operator, SimpleCommand};

    #[test]
    fn test_load_session_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("session.toml");
        let env = dir.path().join(".env");
        fs::write(
            &doc,
            r#"
[env]
GREETING = "hello"
TARGET = "world"

[[line]]
verb = "FOO=bar"

[[line]]
op = "cond_zero"
cmd1 = { verb = "true" }
cmd2 = { verb = "echo", params = [[{ variable = "GREETING" }], "x"] }
"#,
        )
        .unwrap();
        fs::write(&env, "TARGET=override\n").unwrap();

        let session = load_session(&doc, Some(&env)).unwrap();
        assert_eq!(session.env.get("GREETING").map(String::as_str), Some("hello"));
        assert_eq!(session.env.get("TARGET").map(String::as_str), Some("override"));
        assert_eq!(session.lines.len(), 2);
        assert_eq!(session.lines[0], CommandTree::from(SimpleCommand::new("FOO=bar")));
        assert_eq!(
            session.lines[1],
            CommandTree::compound(
                Operator::CondZero,
                SimpleCommand::new("true").into(),
                SimpleCommand::new("echo").arg(treesh::Word::variable("GREETING")).arg("x").into(),
            )
        );
    }

    #[test]
    fn test_empty_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("empty.toml");
        fs::write(&doc, "[env]\nA = \"1\"\n").unwrap();
        assert!(load_session(&doc, None).is_err());
    }
}
