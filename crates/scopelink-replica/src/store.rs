//! In-memory replica of scopes, snapshots and loaded packages.
//!
//! Read accessors are public. Mutators are crate-private so that only the
//! notification sink and the façade commands can change state.

use scopelink_core::{ModulePackage, ScopeName, ScopeSnapshot};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct ReplicaStore {
    known: HashSet<ScopeName>,
    /// Announcement order of `known`.
    known_order: Vec<ScopeName>,
    snapshots: HashMap<ScopeName, ScopeSnapshot>,
    packages: Vec<ModulePackage>,
    current: Option<ScopeName>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- reads ---------------------------------------------------------------

    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Known scopes in announcement order.
    pub fn known_scopes(&self) -> &[ScopeName] {
        &self.known_order
    }

    pub fn snapshot(&self, name: &str) -> Option<&ScopeSnapshot> {
        self.snapshots.get(name)
    }

    pub fn has_snapshot(&self, name: &str) -> bool {
        self.snapshots.contains_key(name)
    }

    /// Scopes with a materialized snapshot, sorted by name.
    pub fn entered_scopes(&self) -> Vec<ScopeName> {
        let mut names: Vec<ScopeName> = self.snapshots.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn packages(&self) -> &[ModulePackage] {
        &self.packages
    }

    pub fn current(&self) -> Option<&ScopeName> {
        self.current.as_ref()
    }

    pub fn current_snapshot(&self) -> Option<&ScopeSnapshot> {
        self.current.as_ref().and_then(|c| self.snapshots.get(c.as_str()))
    }

    /// Verify the structural invariants. Returns a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.known.len() != self.known_order.len() {
            return Err(format!(
                "known set has {} names but order list has {}",
                self.known.len(),
                self.known_order.len()
            ));
        }
        if let Some(missing) = self.known_order.iter().find(|n| !self.known.contains(*n)) {
            return Err(format!("{} listed but not in known set", missing));
        }
        if let Some(current) = &self.current {
            if !self.snapshots.contains_key(current) {
                return Err(format!("current scope {} has no snapshot", current));
            }
        }
        for (name, snapshot) in &self.snapshots {
            let unique: HashSet<&String> = snapshot.clients.iter().collect();
            if unique.len() != snapshot.clients.len() {
                return Err(format!("scope {} has duplicate clients", name));
            }
            if let Some((id, _)) = snapshot.functions.iter().find(|(_, f)| f.params.is_empty()) {
                return Err(format!("function {} in {} has no parameters", id, name));
            }
        }
        Ok(())
    }

    // -- known set -----------------------------------------------------------

    /// Returns true if the name was not known before.
    pub(crate) fn mark_known(&mut self, name: &ScopeName) -> bool {
        if self.known.insert(name.clone()) {
            self.known_order.push(name.clone());
            true
        } else {
            false
        }
    }

    pub(crate) fn unmark_known(&mut self, name: &str) -> bool {
        if self.known.remove(name) {
            self.known_order.retain(|n| n.as_str() != name);
            true
        } else {
            false
        }
    }

    /// Replace the known set wholesale. Repeated names collapse.
    pub(crate) fn replace_known(&mut self, names: Vec<ScopeName>) {
        self.known.clear();
        self.known_order.clear();
        for name in &names {
            self.mark_known(name);
        }
    }

    // -- snapshots -----------------------------------------------------------

    pub(crate) fn snapshot_mut(&mut self, name: &str) -> Option<&mut ScopeSnapshot> {
        self.snapshots.get_mut(name)
    }

    /// Snapshot for `name`, materializing an empty one (and marking the scope
    /// known) if none exists yet.
    pub(crate) fn snapshot_or_insert(&mut self, name: &ScopeName) -> &mut ScopeSnapshot {
        self.mark_known(name);
        self.snapshots.entry(name.clone()).or_default()
    }

    /// Install a full snapshot, replacing any partial one. Returns true if a
    /// previous snapshot was overwritten.
    pub(crate) fn install_snapshot(
        &mut self,
        name: ScopeName,
        mut snapshot: ScopeSnapshot,
    ) -> bool {
        snapshot.dedup_clients();
        self.mark_known(&name);
        self.snapshots.insert(name, snapshot).is_some()
    }

    /// Drop the snapshot for `name`. Returns `None` if there was none,
    /// otherwise whether the current scope was cleared as a result.
    pub(crate) fn discard_snapshot(&mut self, name: &str) -> Option<bool> {
        self.snapshots.remove(name)?;
        Some(self.clear_current_if(name))
    }

    /// Drop every snapshot and the current scope. Returns how many
    /// snapshots were dropped.
    pub(crate) fn discard_all_snapshots(&mut self) -> usize {
        self.current = None;
        let dropped = self.snapshots.len();
        self.snapshots.clear();
        dropped
    }

    // -- current scope -------------------------------------------------------

    /// Only scopes with a snapshot can become current.
    pub(crate) fn set_current(&mut self, name: &str) -> bool {
        match self.snapshots.get_key_value(name) {
            Some((key, _)) => {
                self.current = Some(key.clone());
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_current_if(&mut self, name: &str) -> bool {
        if self.current.as_ref().is_some_and(|c| c.as_str() == name) {
            self.current = None;
            true
        } else {
            false
        }
    }

    // -- packages ------------------------------------------------------------

    pub(crate) fn push_package(&mut self, package: ModulePackage) {
        self.packages.push(package);
    }

    /// Remove every package called `name`. Returns how many were removed.
    pub(crate) fn remove_packages(&mut self, name: &str) -> usize {
        let before = self.packages.len();
        self.packages.retain(|p| p.name != name);
        before - self.packages.len()
    }

    pub(crate) fn replace_packages(&mut self, packages: Vec<ModulePackage>) {
        self.packages = packages;
    }
}
