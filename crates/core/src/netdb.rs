//! Network database lookups made while decoding a LeaseSet
//!
//! Decoding checks every lease gateway against the local netDb and asks for
//! the unknown ones. The request is fire-and-forget: [`QueuedNetDb`] only
//! pushes the hash onto a channel drained by whatever task does the lookups.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::IdentHash;

pub trait NetDb {
    type Router;

    /// Locally known router with this identity hash
    fn find_router(&self, ident: &IdentHash) -> Option<Self::Router>;

    /// Ask the network for `ident`. Must not block.
    fn request_destination(&self, ident: &IdentHash);
}

/// Set of known gateways plus an unbounded queue of outstanding requests
#[derive(Debug)]
pub struct QueuedNetDb {
    known: HashSet<IdentHash>,
    requests: mpsc::UnboundedSender<IdentHash>,
}

impl QueuedNetDb {
    /// Create the lookup side and the receiver the request task drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IdentHash>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (
            Self {
                known: HashSet::new(),
                requests,
            },
            rx,
        )
    }

    /// Record a router as locally known
    pub fn add_router(&mut self, ident: IdentHash) {
        self.known.insert(ident);
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl NetDb for QueuedNetDb {
    type Router = IdentHash;

    fn find_router(&self, ident: &IdentHash) -> Option<IdentHash> {
        self.known.get(ident).copied()
    }

    fn request_destination(&self, ident: &IdentHash) {
        if self.requests.send(*ident).is_err() {
            debug!(
                "netDb request queue closed, dropping lookup for {}",
                hex::encode(&ident[..8])
            );
        }
    }
}
