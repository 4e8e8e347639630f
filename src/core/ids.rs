//! Filepath: src/core/ids.rs
//! Monotonic id counters shared across worker threads.

use std::sync::atomic::{AtomicU32, Ordering};

/// Allocates node ids and graph ids for one batch run.
///
/// Both counters start at 0 and only move forward; `fetch_add` keeps
/// allocation lock-free when tasks run on a thread pool.
#[derive(Debug, Default)]
pub struct IdAllocator
{
    node: AtomicU32,
    graph: AtomicU32,
}

impl IdAllocator
{
    /// Fresh allocator with both counters at 0
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Next declaration-node id
    pub fn next_node_id(&self) -> u32
    {
        self.node
            .fetch_add(1, Ordering::Relaxed)
    }

    /// Next connected-component id
    pub fn next_graph_id(&self) -> u32
    {
        self.graph
            .fetch_add(1, Ordering::Relaxed)
    }

    /// Rewind both counters, for independent runs in one process
    pub fn reset(&self)
    {
        self.node
            .store(0, Ordering::Relaxed);
        self.graph
            .store(0, Ordering::Relaxed);
    }
}
