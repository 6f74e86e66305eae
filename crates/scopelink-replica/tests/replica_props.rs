//! Property tests: store invariants under arbitrary notification sequences

use proptest::prelude::*;
use scopelink_core::*;
use scopelink_replica::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn scope_strategy() -> impl Strategy<Value = ScopeName> {
    prop::sample::select(vec!["lobby", "dev", "ops", "scratch"]).prop_map(|s| ScopeName::new(s))
}

fn client_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alice", "bob", "carol", "dave", "eve"]).prop_map(String::from)
}

fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,3}"
}

fn package_strategy() -> impl Strategy<Value = ModulePackage> {
    prop::sample::select(vec!["math", "text", "io"]).prop_map(|name| ModulePackage::new(name))
}

fn notification_strategy() -> impl Strategy<Value = Notification> {
    prop_oneof![
        scope_strategy().prop_map(|scope| Notification::ScopeCreated { scope }),
        scope_strategy().prop_map(|scope| Notification::ScopeDeleted { scope }),
        (scope_strategy(), client_strategy())
            .prop_map(|(scope, name)| Notification::ClientJoined { scope, name }),
        (scope_strategy(), client_strategy())
            .prop_map(|(scope, name)| Notification::ClientLeft { scope, name }),
        (scope_strategy(), ident_strategy(), ident_strategy()).prop_map(
            |(scope, id, definition)| Notification::VariableDefined {
                scope,
                id,
                definition,
            }
        ),
        (scope_strategy(), ident_strategy(), prop::collection::vec(ident_strategy(), 1..4))
            .prop_map(|(scope, id, params)| Notification::FunctionDefined {
                scope,
                id,
                def: FunctionDef {
                    params,
                    body: "0".into(),
                },
            }),
        package_strategy().prop_map(|package| Notification::PackageLoaded { package }),
        package_strategy().prop_map(|p| Notification::PackageUnloaded { name: p.name }),
        (scope_strategy(), prop::collection::vec(client_strategy(), 0..4)).prop_map(
            |(scope, clients)| Notification::EnteredScope {
                scope,
                snapshot: ScopeSnapshot {
                    clients,
                    ..Default::default()
                },
            }
        ),
        (
            prop::collection::vec(scope_strategy(), 0..4),
            prop::collection::vec(package_strategy(), 0..3)
        )
            .prop_map(|(scopes, packages)| Notification::InitInfo { scopes, packages }),
    ]
}

/// A notification or a focus attempt, interleaved the way a user would.
#[derive(Debug, Clone)]
enum Step {
    Apply(Notification),
    Focus(ScopeName),
    Leave(ScopeName),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => notification_strategy().prop_map(Step::Apply),
        1 => scope_strategy().prop_map(Step::Focus),
        1 => scope_strategy().prop_map(Step::Leave),
    ]
}

fn run(steps: &[Step]) -> Replica {
    let mut replica = Replica::detached();
    for step in steps {
        match step {
            Step::Apply(n) => {
                replica.apply(n.clone());
            }
            Step::Focus(s) => {
                let _ = replica.focus_scope(s.as_str());
            }
            Step::Leave(s) => {
                let _ = replica.leave_scope(s.as_str());
            }
        }
    }
    replica
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Whatever arrives, the store stays structurally sound.
    #[test]
    fn invariants_hold_for_any_sequence(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let replica = run(&steps);
        prop_assert_eq!(replica.store().check_invariants(), Ok(()));
        if let Some(current) = replica.current_scope() {
            prop_assert!(replica.store().has_snapshot(current.as_str()));
        }
    }

    /// Every materialized snapshot belongs to a known scope.
    #[test]
    fn entered_scopes_are_known(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let replica = run(&steps);
        for scope in replica.store().entered_scopes() {
            // init may legitimately forget a scope we are still in, so only
            // check when no init happened
            let had_init = steps
                .iter()
                .any(|s| matches!(s, Step::Apply(Notification::InitInfo { .. })));
            if !had_init {
                prop_assert!(replica.store().is_known(scope.as_str()), "{} not known", scope);
            }
        }
    }

    /// Creating a scope twice is the same as creating it once.
    #[test]
    fn creation_is_idempotent(
        steps in prop::collection::vec(step_strategy(), 0..30),
        scope in scope_strategy(),
    ) {
        let mut replica = run(&steps);
        replica.apply(Notification::ScopeCreated { scope: scope.clone() });
        let once = replica.list_known_scopes();
        replica.apply(Notification::ScopeCreated { scope });
        prop_assert_eq!(replica.list_known_scopes(), once);
    }

    /// Join followed by leave of a fresh client restores the client list.
    #[test]
    fn join_leave_is_inverse(
        steps in prop::collection::vec(step_strategy(), 0..30),
        scope in scope_strategy(),
    ) {
        let mut replica = run(&steps);
        replica.apply(Notification::EnteredScope {
            scope: scope.clone(),
            snapshot: ScopeSnapshot::with_clients(["alice", "bob"]),
        });
        let before = replica.store().snapshot(scope.as_str()).map(|s| s.clients.clone());
        replica.apply(Notification::ClientJoined { scope: scope.clone(), name: "newcomer".into() });
        replica.apply(Notification::ClientLeft { scope: scope.clone(), name: "newcomer".into() });
        let after = replica.store().snapshot(scope.as_str()).map(|s| s.clients.clone());
        prop_assert_eq!(before, after);
    }

    /// After unloading a name, no package by that name remains.
    #[test]
    fn unload_leaves_no_same_named_package(
        steps in prop::collection::vec(step_strategy(), 0..40),
        package in package_strategy(),
    ) {
        let mut replica = run(&steps);
        replica.apply(Notification::PackageUnloaded { name: package.name.clone() });
        prop_assert!(replica.store().packages().iter().all(|p| p.name != package.name));
    }

    /// Deleting the current scope always unsets it.
    #[test]
    fn deleting_current_unsets_it(steps in prop::collection::vec(step_strategy(), 0..40)) {
        let mut replica = run(&steps);
        if let Some(current) = replica.current_scope().cloned() {
            replica.apply(Notification::ScopeDeleted { scope: current });
            prop_assert!(replica.current_scope().is_none());
            prop_assert!(replica.list_current_scope_clients().is_empty());
        }
    }

    /// The init that follows a connection loss starts from an empty session.
    #[test]
    fn init_after_loss_forgets_entered_scopes(
        steps in prop::collection::vec(step_strategy(), 0..40),
        scopes in prop::collection::vec(scope_strategy(), 0..4),
    ) {
        let mut replica = run(&steps);
        replica.apply(Notification::ConnectionLost);
        replica.apply(Notification::InitInfo { scopes, packages: vec![] });
        prop_assert!(replica.current_scope().is_none());
        prop_assert!(replica.store().entered_scopes().is_empty());
        prop_assert_eq!(replica.store().check_invariants(), Ok(()));
    }
}
