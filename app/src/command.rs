//! Line commands accepted by the terminal front end.

use std::str::FromStr;

use task_core::{Filter, ParseFilterError};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  add [title]       submit the new-task input (setting it first if a title is given)
  type <text>       replace the new-task input without submitting
  toggle <n>        flip completion of row n
  delete <n>        delete row n
  edit <n>          start editing row n
  draft <text>      replace the edit draft
  save | cancel     finish editing
  filter <mode>     all, active or completed
  refresh           reload the list
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Option<String>),
    Type(String),
    Toggle(usize),
    Delete(usize),
    Edit(usize),
    Draft(String),
    Save,
    Cancel,
    Filter(Filter),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),
    #[error("`{0}` needs a row number")]
    MissingRow(&'static str),
    #[error("row numbers start at 1, got {0:?}")]
    BadRow(String),
    #[error(transparent)]
    Filter(#[from] ParseFilterError),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(ParseCommandError::Empty),
            "add" | "a" => Command::Add((!rest.is_empty()).then(|| rest.to_string())),
            "type" => Command::Type(rest.to_string()),
            "toggle" | "t" => Command::Toggle(row("toggle", rest)?),
            "delete" | "rm" => Command::Delete(row("delete", rest)?),
            "edit" | "e" => Command::Edit(row("edit", rest)?),
            "draft" => Command::Draft(rest.to_string()),
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "filter" | "f" => Command::Filter(rest.parse()?),
            "refresh" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn row(command: &'static str, rest: &str) -> Result<usize, ParseCommandError> {
    if rest.is_empty() {
        return Err(ParseCommandError::MissingRow(command));
    }
    match rest.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseCommandError::BadRow(rest.to_string())),
    }
}
