//! Core types for Scopelink

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Scope identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScopeName(Arc<str>);

impl ScopeName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScopeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ScopeName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ScopeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ScopeName> for String {
    fn from(name: ScopeName) -> Self {
        name.0.to_string()
    }
}

impl std::borrow::Borrow<str> for ScopeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ScopeName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ScopeName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// A function definition: parameter names plus body text.
///
/// `params` always holds at least one name; decoding rejects an empty list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFunctionDef")]
pub struct FunctionDef {
    pub params: Vec<String>,
    pub body: String,
}

#[derive(Deserialize)]
struct RawFunctionDef {
    params: Vec<String>,
    body: String,
}

impl TryFrom<RawFunctionDef> for FunctionDef {
    type Error = String;

    fn try_from(raw: RawFunctionDef) -> std::result::Result<Self, Self::Error> {
        FunctionDef::new(raw.params, raw.body)
    }
}

impl FunctionDef {
    pub fn new(params: Vec<String>, body: impl Into<String>) -> std::result::Result<Self, String> {
        if params.is_empty() {
            return Err("function definition needs at least one parameter".to_string());
        }
        Ok(Self {
            params,
            body: body.into(),
        })
    }

    /// `name(a,b)=body`
    pub fn signature(&self, name: &str) -> String {
        format!("{}({})={}", name, self.params.join(","), self.body)
    }
}

/// Everything locally known about one entered scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSnapshot {
    /// Client names in join order.
    pub clients: Vec<String>,
    pub variables: BTreeMap<String, String>,
    pub functions: BTreeMap<String, FunctionDef>,
}

impl ScopeSnapshot {
    pub fn with_clients<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = Self::default();
        for client in clients {
            snapshot.add_client(client);
        }
        snapshot
    }

    /// Append a client unless already present. Returns false on a duplicate.
    pub fn add_client(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.clients.contains(&name) {
            return false;
        }
        self.clients.push(name);
        true
    }

    /// Remove the first occurrence of `name`. Returns false if absent.
    pub fn remove_client(&mut self, name: &str) -> bool {
        match self.clients.iter().position(|c| c == name) {
            Some(idx) => {
                self.clients.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop duplicate client names, keeping the first occurrence.
    pub fn dedup_clients(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.clients.retain(|c| seen.insert(c.clone()));
    }
}

/// One entry of a module package (terminal, operator or function).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Module {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A loaded module package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePackage {
    pub name: String,
    #[serde(default)]
    pub terminals: Vec<Module>,
    #[serde(default)]
    pub operators: Vec<Module>,
    #[serde(default)]
    pub functions: Vec<Module>,
}

impl ModulePackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terminals: Vec::new(),
            operators: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn with_terminal(mut self, name: &str, description: &str) -> Self {
        self.terminals.push(Module::new(name, description));
        self
    }

    pub fn with_operator(mut self, name: &str, description: &str) -> Self {
        self.operators.push(Module::new(name, description));
        self
    }

    pub fn with_function(mut self, name: &str, description: &str) -> Self {
        self.functions.push(Module::new(name, description));
        self
    }
}
