//! Notification sink: applies authority notifications to the store
//!
//! Every notification is applied unconditionally and in arrival order; there
//! is no reconciliation. Each call yields exactly one `Observation`.
//!
//! After a connection loss only a fresh `init` is applied. Scope memberships
//! belong to the dead session, so that `init` also drops every snapshot and
//! the current scope.

use crate::observation::Observation;
use crate::{LinkState, Replica};
use scopelink_core::{FunctionDef, ModulePackage, Notification, ScopeName, ScopeSnapshot};
use tracing::{debug, info, warn};

impl Replica {
    /// Apply one notification to the replica.
    pub fn apply(&mut self, notification: Notification) -> Observation {
        if self.link == LinkState::Lost {
            match notification {
                Notification::InitInfo { .. } => {
                    let dropped = self.store.discard_all_snapshots();
                    info!(
                        "Fresh init received, link re-established ({} stale scopes dropped)",
                        dropped
                    );
                    self.link = LinkState::Connected;
                }
                Notification::ConnectionLost | Notification::TransportError { .. } => {}
                other => {
                    warn!("Discarding {} received after connection loss", other.kind());
                    return Observation::Discarded {
                        event: other.kind(),
                    };
                }
            }
        }

        debug!("Applying {}", notification.kind());

        match notification {
            Notification::ScopeCreated { scope } => self.on_scope_created(scope),
            Notification::ScopeDeleted { scope } => self.on_scope_deleted(scope),
            Notification::ClientJoined { scope, name } => self.on_client_joined(scope, name),
            Notification::ClientLeft { scope, name } => self.on_client_left(scope, name),
            Notification::VariableDefined {
                scope,
                id,
                definition,
            } => self.on_variable_defined(scope, id, definition),
            Notification::FunctionDefined { scope, id, def } => {
                self.on_function_defined(scope, id, def)
            }
            Notification::Message {
                scope,
                sender,
                text,
            } => Observation::Message {
                scope,
                sender,
                text,
            },
            Notification::PackageLoaded { package } => self.on_package_loaded(package),
            Notification::PackageUnloaded { name } => self.on_package_unloaded(name),
            Notification::EnteredScope { scope, snapshot } => {
                self.on_entered_scope(scope, snapshot)
            }
            Notification::InitInfo { scopes, packages } => self.on_init_info(scopes, packages),
            Notification::TransportError { code, message } => {
                warn!("Transport error {}: {}", code, message);
                Observation::TransportError { code, message }
            }
            Notification::ConnectionLost => self.on_connection_lost(),
        }
    }

    fn on_scope_created(&mut self, scope: ScopeName) -> Observation {
        if !self.store.mark_known(&scope) {
            debug!("Scope {} already known", scope);
        }
        Observation::ScopeCreated { scope }
    }

    fn on_scope_deleted(&mut self, scope: ScopeName) -> Observation {
        let cleared_current = self.store.discard_snapshot(scope.as_str()).unwrap_or(false);
        self.store.unmark_known(scope.as_str());
        if cleared_current {
            info!("Current scope {} was deleted", scope);
        }
        Observation::ScopeDeleted {
            scope,
            cleared_current,
        }
    }

    fn on_client_joined(&mut self, scope: ScopeName, name: String) -> Observation {
        if !self.store.has_snapshot(scope.as_str()) {
            debug!("Materializing snapshot for {} on client join", scope);
        }
        if !self.store.snapshot_or_insert(&scope).add_client(name.as_str()) {
            debug!("Client {} already in {}", name, scope);
        }
        Observation::ClientJoined { scope, name }
    }

    fn on_client_left(&mut self, scope: ScopeName, name: String) -> Observation {
        let removed = self
            .store
            .snapshot_mut(scope.as_str())
            .map(|s| s.remove_client(&name))
            .unwrap_or(false);
        if !removed {
            debug!("Client {} was not in {}", name, scope);
        }
        Observation::ClientLeft { scope, name }
    }

    fn on_variable_defined(
        &mut self,
        scope: ScopeName,
        id: String,
        definition: String,
    ) -> Observation {
        self.store
            .snapshot_or_insert(&scope)
            .variables
            .insert(id.clone(), definition.clone());
        Observation::VariableDefined {
            scope,
            id,
            definition,
        }
    }

    fn on_function_defined(
        &mut self,
        scope: ScopeName,
        id: String,
        def: FunctionDef,
    ) -> Observation {
        self.store
            .snapshot_or_insert(&scope)
            .functions
            .insert(id.clone(), def.clone());
        Observation::FunctionDefined { scope, id, def }
    }

    fn on_package_loaded(&mut self, package: ModulePackage) -> Observation {
        self.store.push_package(package.clone());
        Observation::PackageLoaded { package }
    }

    fn on_package_unloaded(&mut self, name: String) -> Observation {
        let removed = self.store.remove_packages(&name);
        if removed == 0 {
            debug!("Package {} was not loaded", name);
        }
        Observation::PackageUnloaded { name, removed }
    }

    fn on_entered_scope(&mut self, scope: ScopeName, snapshot: ScopeSnapshot) -> Observation {
        if self.store.install_snapshot(scope.clone(), snapshot) {
            debug!("Replaced partial snapshot for {}", scope);
        }
        let snapshot = self.store.snapshot(scope.as_str()).cloned().unwrap_or_default();
        info!("Entered scope {} ({} clients)", scope, snapshot.clients.len());
        Observation::EnteredScope { scope, snapshot }
    }

    fn on_init_info(
        &mut self,
        scopes: Vec<ScopeName>,
        packages: Vec<ModulePackage>,
    ) -> Observation {
        self.store.replace_known(scopes);
        self.store.replace_packages(packages.clone());
        info!(
            "Init: {} scopes, {} packages",
            self.store.known_scopes().len(),
            packages.len()
        );
        Observation::InitInfo {
            scopes: self.store.known_scopes().to_vec(),
            packages,
        }
    }

    fn on_connection_lost(&mut self) -> Observation {
        let already_lost = self.link == LinkState::Lost;
        if !already_lost {
            warn!("Connection to server lost; replica is now stale");
            self.link = LinkState::Lost;
        }
        Observation::ConnectionLost { already_lost }
    }
}
