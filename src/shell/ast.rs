use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordPart {
    Literal(String),  // "out"
    Variable(String), // "$HOME"
}

/// A shell token made of literal text and variable references, concatenated
/// with no separator.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "WordRepr")]
pub struct Word(pub Vec<WordPart>);

// Session documents may spell a purely literal word as a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum WordRepr {
    Text(String),
    Parts(Vec<WordPart>),
}

impl From<WordRepr> for Word {
    fn from(repr: WordRepr) -> Self {
        match repr {
            WordRepr::Text(s) => Word::from(s.as_str()),
            WordRepr::Parts(parts) => Word(parts),
        }
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Word(vec![WordPart::Literal(s.to_string())])
    }
}

impl Word {
    pub fn literal(s: &str) -> Self {
        Word::from(s)
    }

    pub fn variable(name: &str) -> Self {
        Word(vec![WordPart::Variable(name.to_string())])
    }

    pub fn then_literal(mut self, s: &str) -> Self {
        self.0.push(WordPart::Literal(s.to_string()));
        self
    }

    pub fn then_variable(mut self, name: &str) -> Self {
        self.0.push(WordPart::Variable(name.to_string()));
        self
    }

    /// Splits `NAME=VALUE` into the variable name and the parts making up the
    /// value. Accepts both `[Literal("A=b")]` and `[Literal("A"), Literal("=b"), ..]`.
    pub fn as_assignment(&self) -> Option<(String, Vec<WordPart>)> {
        let WordPart::Literal(head) = self.0.first()? else {
            return None;
        };

        if let Some(idx) = head.find('=') {
            let name = &head[..idx];
            if !is_valid_name(name) {
                return None;
            }
            let mut value = Vec::new();
            if idx + 1 < head.len() {
                value.push(WordPart::Literal(head[idx + 1..].to_string()));
            }
            value.extend(self.0[1..].iter().cloned());
            return Some((name.to_string(), value));
        }

        match self.0.get(1) {
            Some(WordPart::Literal(eq)) if eq.starts_with('=') && is_valid_name(head) => {
                let mut value = Vec::new();
                if eq.len() > 1 {
                    value.push(WordPart::Literal(eq[1..].to_string()));
                }
                value.extend(self.0[2..].iter().cloned());
                Some((head.clone(), value))
            }
            _ => None,
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoFlags {
    #[default]
    Regular,   // > and 2>
    OutAppend, // >>
    ErrAppend, // 2>>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleCommand {
    pub verb: Word,
    #[serde(default)]
    pub params: Vec<Word>,
    #[serde(default, rename = "in")]
    pub input: Option<Word>,
    #[serde(default)]
    pub out: Option<Word>,
    #[serde(default)]
    pub err: Option<Word>,
    #[serde(default)]
    pub io_flags: IoFlags,
}

impl SimpleCommand {
    pub fn new(verb: impl Into<Word>) -> Self {
        Self {
            verb: verb.into(),
            params: Vec::new(),
            input: None,
            out: None,
            err: None,
            io_flags: IoFlags::Regular,
        }
    }

    pub fn arg(mut self, word: impl Into<Word>) -> Self {
        self.params.push(word.into());
        self
    }

    pub fn stdin(mut self, target: impl Into<Word>) -> Self {
        self.input = Some(target.into());
        self
    }

    pub fn stdout(mut self, target: impl Into<Word>) -> Self {
        self.out = Some(target.into());
        self
    }

    pub fn stderr(mut self, target: impl Into<Word>) -> Self {
        self.err = Some(target.into());
        self
    }

    pub fn append_out(mut self, target: impl Into<Word>) -> Self {
        self.out = Some(target.into());
        self.io_flags = IoFlags::OutAppend;
        self
    }

    pub fn append_err(mut self, target: impl Into<Word>) -> Self {
        self.err = Some(target.into());
        self.io_flags = IoFlags::ErrAppend;
        self
    }

    pub fn has_redirections(&self) -> bool {
        self.input.is_some() || self.out.is_some() || self.err.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Operator {
    #[serde(rename = "sequential")]
    Sequential, // ;
    #[serde(rename = "parallel")]
    Parallel, // &
    #[serde(rename = "cond_nonzero")]
    CondNonZero, // ||
    #[serde(rename = "cond_zero")]
    CondZero, // &&
    #[serde(rename = "pipe")]
    Pipe, // |
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CommandTree {
    Compound {
        op: Operator,
        cmd1: Box<CommandTree>,
        cmd2: Box<CommandTree>,
    },
    Simple(SimpleCommand),
}

impl CommandTree {
    pub fn compound(op: Operator, cmd1: CommandTree, cmd2: CommandTree) -> Self {
        CommandTree::Compound {
            op,
            cmd1: Box::new(cmd1),
            cmd2: Box::new(cmd2),
        }
    }
}

impl From<SimpleCommand> for CommandTree {
    fn from(cmd: SimpleCommand) -> Self {
        CommandTree::Simple(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> WordPart {
        WordPart::Literal(s.to_string())
    }

    #[test]
    fn test_assignment_single_segment() {
        let (name, value) = Word::literal("FOO=bar").as_assignment().unwrap();
        assert_eq!(name, "FOO");
        assert_eq!(value, vec![lit("bar")]);
    }

    #[test]
    fn test_assignment_split_segments() {
        let word = Word::literal("PATH").then_literal("=").then_variable("HOME").then_literal("/bin");
        let (name, value) = word.as_assignment().unwrap();
        assert_eq!(name, "PATH");
        assert_eq!(value, vec![WordPart::Variable("HOME".to_string()), lit("/bin")]);
    }

    #[test]
    fn test_assignment_empty_value() {
        let (name, value) = Word::literal("EMPTY=").as_assignment().unwrap();
        assert_eq!(name, "EMPTY");
        assert!(value.is_empty());
    }

    #[test]
    fn test_not_an_assignment() {
        assert!(Word::literal("echo").as_assignment().is_none());
        assert!(Word::literal("=oops").as_assignment().is_none());
        assert!(Word::literal("1A=b").as_assignment().is_none());
        assert!(Word::variable("X").then_literal("=y").as_assignment().is_none());
    }

    #[test]
    fn test_deserialize_pipeline() {
        let doc = r#"
            op = "pipe"
            [cmd1]
            verb = "printf"
            params = ["a\nb\n"]
            [cmd2]
            verb = "wc"
            params = ["-l"]
            out = [{ variable = "OUT_DIR" }, { literal = "/count.txt" }]
            io_flags = "out_append"
        "#;
        let tree: CommandTree = toml::from_str(doc).unwrap();
        let expected = CommandTree::compound(
            Operator::Pipe,
            SimpleCommand::new("printf").arg("a\nb\n").into(),
            SimpleCommand::new("wc")
                .arg("-l")
                .append_out(Word::variable("OUT_DIR").then_literal("/count.txt"))
                .into(),
        );
        assert_eq!(tree, expected);
    }
}
