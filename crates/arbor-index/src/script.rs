//! Replay of line-oriented operation scripts.
//!
//! A script holds one operation per line:
//!
//! ```text
//! # comment
//! insert c 1
//! insert d 2
//! delete c
//! ```
//!
//! Keys are strings and values are `i64`. Blank lines and lines starting
//! with `#` are skipped.

use std::fmt;

use arbor_common::{ArborError, Result};
use tracing::{debug, warn};

use crate::btree::{BPlusTree, NodeLabels};

/// One parsed script operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert { key: String, value: i64 },
    Delete { key: String },
}

impl Command {
    /// Parses a single line. Returns None for blank lines and comments.
    pub fn parse_line(text: &str, line: usize) -> Result<Option<Command>> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let parse_error = |reason: String| ArborError::Parse { line, reason };
        let mut tokens = trimmed.split_whitespace();
        let op = tokens.next().unwrap_or_default();
        let key = tokens
            .next()
            .ok_or_else(|| parse_error(format!("'{op}' needs a key")))?
            .to_string();

        let command = match op {
            "insert" => {
                let raw = tokens
                    .next()
                    .ok_or_else(|| parse_error("'insert' needs a value".to_string()))?;
                let value = raw
                    .parse::<i64>()
                    .map_err(|e| parse_error(format!("bad value '{raw}': {e}")))?;
                Command::Insert { key, value }
            }
            "delete" => Command::Delete { key },
            other => return Err(parse_error(format!("unknown operation '{other}'"))),
        };

        if let Some(extra) = tokens.next() {
            return Err(parse_error(format!("unexpected token '{extra}'")));
        }
        Ok(Some(command))
    }

    /// Applies the command to `tree`.
    pub fn apply(&self, tree: &mut BPlusTree<String, i64>) -> Result<()> {
        match self {
            Command::Insert { key, value } => tree.insert(key.clone(), *value),
            Command::Delete { key } => tree.delete(key).map(|_| ()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Insert { key, value } => write!(f, "insert {key} {value}"),
            Command::Delete { key } => write!(f, "delete {key}"),
        }
    }
}

/// Parses a whole script into `(line number, command)` pairs.
///
/// Line numbers start at 1. The first malformed line fails the parse.
pub fn parse(text: &str) -> Result<Vec<(usize, Command)>> {
    let mut commands = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if let Some(command) = Command::parse_line(raw, i + 1)? {
            commands.push((i + 1, command));
        }
    }
    Ok(commands)
}

/// Result of applying one command.
#[derive(Debug)]
pub enum Outcome {
    Applied,
    /// The tree refused the command and was left unchanged.
    Rejected(ArborError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// One replayed command with the tree state right after it.
#[derive(Debug)]
pub struct Step {
    pub line: usize,
    pub command: Command,
    pub outcome: Outcome,
    pub dump: String,
}

/// Applies every command of `text` to `tree` and snapshots the tree after
/// each one.
///
/// Duplicate inserts and deletes of absent keys are recorded as rejected and
/// replay continues. Parse errors fail before anything is applied; any other
/// error aborts the replay.
pub fn replay(tree: &mut BPlusTree<String, i64>, text: &str) -> Result<Vec<Step>> {
    let commands = parse(text)?;
    let mut labels = NodeLabels::new();
    let mut steps = Vec::with_capacity(commands.len());

    for (line, command) in commands {
        let outcome = match command.apply(tree) {
            Ok(()) => Outcome::Applied,
            Err(e) if e.is_user_error() => {
                warn!(line, command = %command, error = %e, "command rejected");
                Outcome::Rejected(e)
            }
            Err(e) => return Err(e),
        };
        debug!(line, command = %command, len = tree.len(), "replayed command");
        let dump = tree.dump_with(&mut labels)?;
        steps.push(Step {
            line,
            command,
            outcome,
            dump,
        });
    }
    Ok(steps)
}
