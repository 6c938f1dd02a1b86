//! FIFO work queue seeded in random order.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::registry::Server;

/// A server waiting to be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub server: Server,
    /// Dispatches so far that ended in a rate-limit signal.
    pub attempts: u32,
}

impl WorkItem {
    pub fn new(server: Server) -> Self {
        Self {
            server,
            attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    /// Shuffle `servers` so no alphabetic or TLD ordering is systematically
    /// favoured, then keep at most `limit` of them.
    pub fn seeded<R: Rng + ?Sized>(mut servers: Vec<Server>, rng: &mut R, limit: Option<usize>) -> Self {
        servers.shuffle(rng);
        if let Some(limit) = limit {
            servers.truncate(limit);
        }
        Self {
            items: servers.into_iter().map(WorkItem::new).collect(),
        }
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    /// Requeue at the tail.
    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
