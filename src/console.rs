use std::str::FromStr;

use thiserror::Error;

use crate::engine::Action;

/// A line typed into the terminal farm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    Show,
    Catalog,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
commands:
  catalog          list creatures
  select <id>      choose a creature to place
  tap <index>      place, feed or harvest at a tile
  day              advance to the next day
  save             save the farm
  reset            start over (asks for confirmation)
  show             print the farm
  quit             leave";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        let arg = words.next();
        let command = match verb.to_ascii_lowercase().as_str() {
            "select" | "s" => {
                let id = arg.ok_or(CommandError::Usage("select <id>"))?;
                Command::Act(Action::Select { id: id.to_string() })
            }
            "tap" | "t" => {
                let index = arg
                    .and_then(|value| value.parse::<usize>().ok())
                    .ok_or(CommandError::Usage("tap <index>"))?;
                Command::Act(Action::Tap { index })
            }
            "day" | "d" => Command::Act(Action::AdvanceDay),
            "save" => Command::Act(Action::Save),
            "reset" => Command::Act(Action::Reset {
                confirmed: matches!(arg, Some("--yes") | Some("-y")),
            }),
            "show" | "ls" => Command::Show,
            "catalog" | "c" => Command::Catalog,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Answers to a yes/no prompt.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
