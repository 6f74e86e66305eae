//! Structured records of replica changes and query results
//!
//! One `Observation` is produced per applied notification and per façade
//! command. `lines()` renders the human-readable form for a terminal or log.

use scopelink_core::{FunctionDef, ModulePackage, ScopeName, ScopeSnapshot};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    // -- notifications -------------------------------------------------------
    ScopeCreated {
        scope: ScopeName,
    },
    ScopeDeleted {
        scope: ScopeName,
        /// The deleted scope was the current one.
        cleared_current: bool,
    },
    ClientJoined {
        scope: ScopeName,
        name: String,
    },
    ClientLeft {
        scope: ScopeName,
        name: String,
    },
    VariableDefined {
        scope: ScopeName,
        id: String,
        definition: String,
    },
    FunctionDefined {
        scope: ScopeName,
        id: String,
        def: FunctionDef,
    },
    Message {
        scope: ScopeName,
        sender: String,
        text: String,
    },
    PackageLoaded {
        package: ModulePackage,
    },
    PackageUnloaded {
        name: String,
        removed: usize,
    },
    EnteredScope {
        scope: ScopeName,
        snapshot: ScopeSnapshot,
    },
    InitInfo {
        scopes: Vec<ScopeName>,
        packages: Vec<ModulePackage>,
    },
    TransportError {
        code: i32,
        message: String,
    },
    ConnectionLost {
        already_lost: bool,
    },
    /// A notification that arrived after the link was lost and was not applied.
    Discarded {
        event: &'static str,
    },

    // -- commands and queries ------------------------------------------------
    Focused {
        scope: ScopeName,
    },
    LeftScope {
        scope: ScopeName,
        cleared_current: bool,
    },
    MessageSent {
        scope: ScopeName,
        text: String,
    },
    EnterRequested {
        scope: ScopeName,
    },
    Variable {
        id: String,
        definition: String,
    },
    Function {
        id: String,
        def: FunctionDef,
    },
    Package {
        package: ModulePackage,
    },
}

impl Observation {
    /// Render as terminal lines.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::ScopeCreated { scope } => vec![format!("New Scope: {}", scope)],
            Self::ScopeDeleted { scope, .. } => vec![format!("Deleted scope {}", scope)],
            Self::ClientJoined { scope, name } => {
                vec![format!("New client (scope {}): {}", scope, name)]
            }
            Self::ClientLeft { scope, name } => {
                vec![format!("Client left (scope {}): {}", scope, name)]
            }
            Self::VariableDefined {
                scope,
                id,
                definition,
            } => vec![format!(
                "New variable definition (scope {}): {}={}",
                scope, id, definition
            )],
            Self::FunctionDefined { scope, id, def } => vec![format!(
                "New function definition (scope {}): {}",
                scope,
                def.signature(id)
            )],
            Self::Message {
                scope,
                sender,
                text,
            } => vec![format!("[{}] {}: {}", scope, sender, text)],
            Self::PackageLoaded { package } => {
                let mut lines = vec!["Package loaded:".to_string()];
                lines.extend(package_lines(package));
                lines
            }
            Self::PackageUnloaded { name, .. } => vec![format!("Package unloaded: {}", name)],
            Self::EnteredScope { scope, snapshot } => {
                let mut lines = vec![format!("Entered scope {}; Clients:", scope)];
                lines.extend(snapshot.clients.iter().cloned());
                lines.push("Variables:".to_string());
                lines.extend(snapshot.variables.iter().map(|(id, def)| format!("{}={}", id, def)));
                lines.push("Functions:".to_string());
                lines.extend(snapshot.functions.iter().map(|(id, f)| f.signature(id)));
                lines
            }
            Self::InitInfo { scopes, packages } => {
                let mut lines = vec!["InitInfo:".to_string(), "Scopes:".to_string()];
                lines.extend(scopes.iter().map(|s| s.to_string()));
                lines.push("Packages:".to_string());
                for package in packages {
                    lines.extend(package_lines(package));
                }
                lines
            }
            Self::TransportError { code, message } if message.is_empty() => {
                vec![format!("Client Error {}", code)]
            }
            Self::TransportError { code, message } => {
                vec![format!("Client Error {}: {}", code, message)]
            }
            Self::ConnectionLost { already_lost } if *already_lost => Vec::new(),
            Self::ConnectionLost { .. } => vec![
                "Server connection lost; showing last known state. Use `reconnect` to try again."
                    .to_string(),
            ],
            Self::Discarded { event } => {
                vec![format!("Ignored {} received while disconnected", event)]
            }
            Self::Focused { scope } => vec![format!("Current scope: {}", scope)],
            Self::LeftScope { scope, .. } => vec![format!("Left scope {}", scope)],
            Self::MessageSent { scope, text } => vec![format!("[{}] me: {}", scope, text)],
            Self::EnterRequested { scope } => vec![format!("Entering scope {}...", scope)],
            Self::Variable { id, definition } => vec![format!("{}={}", id, definition)],
            Self::Function { id, def } => vec![def.signature(id)],
            Self::Package { package } => package_lines(package),
        }
    }
}

fn package_lines(package: &ModulePackage) -> Vec<String> {
    let mut lines = vec![
        "Package Name Module Name Module Description".to_string(),
        package.name.clone(),
    ];
    let sections = [
        (" Terminals:", &package.terminals),
        (" Operators:", &package.operators),
        (" Functions:", &package.functions),
    ];
    for (header, modules) in sections {
        lines.push(header.to_string());
        lines.extend(
            modules
                .iter()
                .map(|m| format!("  {} {}", m.name, m.description)),
        );
    }
    lines
}
