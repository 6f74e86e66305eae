//! Terminal command parsing

use std::str::FromStr;
use thiserror::Error;

/// A line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `scopes`: list known scopes
    Scopes,
    /// `clients`: list clients of the current scope
    Clients,
    /// `vars`: print variables of the current scope
    Variables,
    /// `funcs`: print functions of the current scope
    Functions,
    /// `pkgs`: print loaded packages
    Packages,
    /// `current`: show the current scope
    Current,
    /// `open <scope>`: make an entered scope current
    Open(String),
    /// `enter <scope>`: ask the server to let us in
    Enter(String),
    /// `leave <scope>`
    Leave(String),
    /// `msg <text>`: broadcast to the current scope
    Say(String),
    /// `reconnect`: dial the server again after a connection loss
    Reconnect,
    /// `quit`
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let arg = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match word {
            "" => Err(CommandError::Empty),
            "scopes" => Ok(Self::Scopes),
            "clients" => Ok(Self::Clients),
            "vars" | "variables" => Ok(Self::Variables),
            "funcs" | "functions" => Ok(Self::Functions),
            "pkgs" | "packages" | "modules" => Ok(Self::Packages),
            "current" => Ok(Self::Current),
            "open" => arg("open").map(Self::Open),
            "enter" => arg("enter").map(Self::Enter),
            "leave" => arg("leave").map(Self::Leave),
            "msg" => arg("msg").map(Self::Say),
            "reconnect" => Ok(Self::Reconnect),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
