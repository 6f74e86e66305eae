//! Scopelink Replica - local mirror of remote scopes and packages
//!
//! The `Replica` owns the store. Notifications go in through
//! [`Replica::apply`]; queries and the two scope commands live in `facade`.

pub mod error;
pub mod facade;
pub mod observation;
pub mod outbound;
pub mod sink;
pub mod store;

pub use error::ReplicaError;
pub use observation::Observation;
pub use outbound::{NullOutbound, Outbound, RecordingOutbound};
pub use store::ReplicaStore;

use std::sync::Arc;

/// Whether the authority is still feeding us notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Connected,
    /// Replica is frozen at its last known state until a fresh init arrives.
    Lost,
}

pub struct Replica {
    store: ReplicaStore,
    link: LinkState,
    outbound: Arc<dyn Outbound>,
}

impl Replica {
    pub fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self {
            store: ReplicaStore::new(),
            link: LinkState::Connected,
            outbound,
        }
    }

    /// A replica with no transport behind it.
    pub fn detached() -> Self {
        Self::new(Arc::new(NullOutbound))
    }

    pub fn store(&self) -> &ReplicaStore {
        &self.store
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }
}
