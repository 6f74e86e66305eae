//! Query/command façade over the replica
//!
//! Queries read the store synchronously and never touch the network.
//! `leave_scope`, `send_message` and `request_enter` also hand a request to
//! the outbound transport without waiting on it.

use crate::error::ReplicaError;
use crate::observation::Observation;
use crate::Replica;
use scopelink_core::ScopeName;
use tracing::info;

impl Replica {
    pub fn list_known_scopes(&self) -> Vec<ScopeName> {
        self.store.known_scopes().to_vec()
    }

    /// Clients of the current scope, or empty if no scope is current.
    pub fn list_current_scope_clients(&self) -> Vec<String> {
        self.store
            .current_snapshot()
            .map(|s| s.clients.clone())
            .unwrap_or_default()
    }

    pub fn dump_current_scope_variables(&self) -> Vec<Observation> {
        let Some(snapshot) = self.store.current_snapshot() else {
            return Vec::new();
        };
        snapshot
            .variables
            .iter()
            .map(|(id, definition)| Observation::Variable {
                id: id.clone(),
                definition: definition.clone(),
            })
            .collect()
    }

    pub fn dump_current_scope_functions(&self) -> Vec<Observation> {
        let Some(snapshot) = self.store.current_snapshot() else {
            return Vec::new();
        };
        snapshot
            .functions
            .iter()
            .map(|(id, def)| Observation::Function {
                id: id.clone(),
                def: def.clone(),
            })
            .collect()
    }

    pub fn dump_all_packages(&self) -> Vec<Observation> {
        self.store
            .packages()
            .iter()
            .map(|p| Observation::Package { package: p.clone() })
            .collect()
    }

    pub fn current_scope(&self) -> Option<&ScopeName> {
        self.store.current()
    }

    /// Make `name` the current scope. The scope must already be entered.
    pub fn focus_scope(&mut self, name: &str) -> Result<Observation, ReplicaError> {
        if !self.store.set_current(name) {
            return Err(ReplicaError::NotEntered(ScopeName::new(name)));
        }
        info!("Current scope is now {}", name);
        Ok(Observation::Focused {
            scope: ScopeName::new(name),
        })
    }

    /// Drop the local snapshot for `name` and ask the authority to remove us.
    pub fn leave_scope(&mut self, name: &str) -> Result<Observation, ReplicaError> {
        let scope = ScopeName::new(name);
        let Some(cleared_current) = self.store.discard_snapshot(name) else {
            return Err(ReplicaError::NotInScope(scope));
        };
        self.outbound.leave_scope(&scope);
        info!("Left scope {}", scope);
        Ok(Observation::LeftScope {
            scope,
            cleared_current,
        })
    }

    /// Broadcast `text` to the current scope.
    pub fn send_message(&self, text: &str) -> Result<Observation, ReplicaError> {
        let scope = self.store.current().cloned().ok_or(ReplicaError::NoCurrentScope)?;
        self.outbound.send_message(&scope, text);
        Ok(Observation::MessageSent {
            scope,
            text: text.to_string(),
        })
    }

    /// Ask the authority to let us into `name`. The replica only changes
    /// once the matching `scope.entered` notification arrives.
    pub fn request_enter(&self, name: &str) -> Observation {
        let scope = ScopeName::new(name);
        self.outbound.enter_scope(&scope);
        Observation::EnterRequested { scope }
    }
}
