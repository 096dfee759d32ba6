use crate::shell::ast::{Word, WordPart};
use crate::shell::context::ShellContext;

/// Concatenates the literal segments and the current values of referenced
/// variables. Unset variables expand to nothing.
pub fn expand_word(word: &Word, ctx: &ShellContext) -> String {
    expand_parts(&word.0, ctx)
}

pub fn expand_parts(parts: &[WordPart], ctx: &ShellContext) -> String {
    let mut res = String::new();
    for part in parts {
        match part {
            WordPart::Literal(s) => res.push_str(s),
            WordPart::Variable(name) => {
                if name == "?" {
                    res.push_str(&ctx.exit_code.to_string());
                } else if let Some(val) = ctx.var(name) {
                    res.push_str(val);
                }
            }
        }
    }
    res
}

pub fn expand_words(words: &[Word], ctx: &ShellContext) -> Vec<String> {
    words.iter().map(|w| expand_word(w, ctx)).collect()
}
