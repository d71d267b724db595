//! Connected client pages
//!
//! Each open page registers here and receives [`StatusMessage`]s over an
//! unbounded channel. Activation claims every registered page.

use crate::agent::messages::StatusMessage;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Identifier handed out to each registered client
pub type ClientId = u64;

struct ClientEntry {
    sender: UnboundedSender<StatusMessage>,
    controlled: bool,
}

#[derive(Default)]
struct Registry {
    next_id: ClientId,
    clients: BTreeMap<ClientId, ClientEntry>,
}

/// Registry of open pages
#[derive(Clone, Default)]
pub struct Clients {
    registry: Arc<Mutex<Registry>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page and returns its id and message receiver
    pub fn register(&self) -> (ClientId, UnboundedReceiver<StatusMessage>) {
        let (sender, receiver) = unbounded_channel();
        let mut registry = match self.registry.lock() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        };

        registry.next_id += 1;
        let id = registry.next_id;
        registry.clients.insert(
            id,
            ClientEntry {
                sender,
                controlled: false,
            },
        );
        (id, receiver)
    }

    /// Removes a page; returns whether it was registered
    pub fn unregister(&self, id: ClientId) -> bool {
        self.registry
            .lock()
            .map(|mut registry| registry.clients.remove(&id).is_some())
            .unwrap_or(false)
    }

    /// Takes control of every registered page without a reload
    ///
    /// Returns the number of pages now controlled.
    pub fn claim(&self) -> usize {
        match self.registry.lock() {
            Ok(mut registry) => {
                for entry in registry.clients.values_mut() {
                    entry.controlled = true;
                }
                registry.clients.len()
            }
            Err(_) => 0,
        }
    }

    pub fn is_controlled(&self, id: ClientId) -> bool {
        self.registry
            .lock()
            .ok()
            .and_then(|registry| registry.clients.get(&id).map(|c| c.controlled))
            .unwrap_or(false)
    }

    /// Sends `message` to every page, dropping pages whose receiver is gone
    ///
    /// Returns the number of pages the message was delivered to.
    pub fn post_all(&self, message: &StatusMessage) -> usize {
        let Ok(mut registry) = self.registry.lock() else {
            return 0;
        };

        let mut closed = Vec::new();
        let mut delivered = 0;
        for (id, entry) in &registry.clients {
            if entry.sender.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*id);
            }
        }

        for id in closed {
            tracing::debug!("Dropping closed client {}", id);
            registry.clients.remove(&id);
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .map(|registry| registry.clients.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
