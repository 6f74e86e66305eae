//! Unknown-target conditions reported by façade commands

use scopelink_core::ScopeName;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicaError {
    #[error("scope {0} has not been entered; enter it before opening it")]
    NotEntered(ScopeName),

    #[error("not in a scope called {0}")]
    NotInScope(ScopeName),

    #[error("no current scope")]
    NoCurrentScope,
}
