//! A graph shared between engines running on different threads.
//!
//! Engines of different areas write into the same graph: segments live on the
//! owning area's cells while receptor back-references live on the cells of the
//! associated areas. Access is therefore serialized on the whole graph, and an
//! engine holds the lock for an entire compute cycle.

use super::connections::Connections;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SharedConnections {
    inner: Arc<Mutex<Connections>>,
}

impl SharedConnections {
    pub fn new(graph: Connections) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Blocks until the graph is exclusively available.
    pub fn lock(&self) -> MutexGuard<'_, Connections> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the graph.
    pub fn with<T>(&self, f: impl FnOnce(&mut Connections) -> T) -> T {
        let mut graph = self.inner.lock();
        f(&mut graph)
    }
}

impl From<Connections> for SharedConnections {
    fn from(graph: Connections) -> Self {
        Self::new(graph)
    }
}
