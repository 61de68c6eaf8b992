//! Invocation script parsing.
//!
//! One command per line:
//!
//! ```text
//! # comment
//! submit InitLedger
//! submit CreateOption "New York"
//! evaluate GetOption newyork
//! ```
//!
//! Arguments follow shell word rules: single or double quotes group an
//! argument that contains spaces, and backslash escapes a quote.

use std::fmt;
use thiserror::Error;

/// How a command reaches the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Simulate and commit.
    Submit,
    /// Simulate only.
    Evaluate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit => f.write_str("submit"),
            Self::Evaluate => f.write_str("evaluate"),
        }
    }
}

/// One parsed script line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// 1-based line number in the script.
    pub line: usize,
    pub mode: Mode,
    pub function: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown mode {mode:?}, expected submit or evaluate")]
    UnknownMode { line: usize, mode: String },

    #[error("line {line}: missing function name")]
    MissingFunction { line: usize },

    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },
}

/// Parse a whole script, skipping blank lines and comments.
pub fn parse_script(source: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (idx, text) in source.lines().enumerate() {
        if let Some(command) = parse_line(idx + 1, text)? {
            commands.push(command);
        }
    }
    Ok(commands)
}

fn parse_line(line: usize, text: &str) -> Result<Option<Command>, ScriptError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = tokenize(line, trimmed)?.into_iter();
    let mode = match tokens.next().as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("submit" | "invoke") => Mode::Submit,
        Some("evaluate" | "query") => Mode::Evaluate,
        Some(other) => {
            return Err(ScriptError::UnknownMode {
                line,
                mode: other.to_string(),
            })
        }
        None => return Ok(None),
    };
    let function = tokens.next().ok_or(ScriptError::MissingFunction { line })?;

    Ok(Some(Command {
        line,
        mode,
        function,
        args: tokens.collect(),
    }))
}

fn tokenize(line: usize, text: &str) -> Result<Vec<String>, ScriptError> {
    shell_words::split(text).map_err(|e| ScriptError::Syntax {
        line,
        reason: e.to_string(),
    })
}
