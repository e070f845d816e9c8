//! Tier-parallel block dispatch.
//!
//! The [`Dispatcher`] runs a [`Schedule`] for one tick: tiers execute in
//! order from the deepest leaves to the root, and the nodes of a tier are
//! prepared concurrently on a rayon pool. `par_iter().for_each()` returns only
//! once every node of the tier is done, which is the barrier before the next
//! tier starts. A node's `prepare` always runs to completion; there is no
//! cancellation inside a tick.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{GraphError, Result};

use super::processing::Graph;
use super::schedule::Schedule;

/// Executes schedules tier by tier.
pub struct Dispatcher {
    pool: Option<ThreadPool>,
}

impl Dispatcher {
    /// Creates a dispatcher backed by a pool of `workers` threads.
    ///
    /// `workers == 0` uses one thread per available hardware thread.
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sonance-dispatch-{i}"))
            .build()?;
        #[cfg(feature = "tracing")]
        tracing::debug!("dispatcher: {} workers", pool.current_num_threads());
        Ok(Self { pool: Some(pool) })
    }

    /// Creates a dispatcher that prepares every node on the calling thread.
    pub fn serial() -> Self {
        Self { pool: None }
    }

    /// Number of threads nodes may run on.
    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, ThreadPool::current_num_threads)
    }

    /// Prepares every node in `schedule` for `tick`.
    ///
    /// Fails without preparing anything if the schedule names a node the
    /// graph does not hold.
    pub fn dispatch(&self, graph: &Graph, schedule: &Schedule, tick: u64) -> Result<()> {
        if let Some(dep) = schedule
            .dependencies()
            .iter()
            .find(|dep| !graph.contains(dep.node))
        {
            return Err(GraphError::NodeNotFound(dep.node));
        }

        for tier in schedule.tiers() {
            match &self.pool {
                Some(pool) if tier.len() > 1 => pool.install(|| {
                    tier.par_iter()
                        .for_each(|dep| graph.prepare_node(dep.node, tick));
                }),
                _ => {
                    for dep in tier {
                        graph.prepare_node(dep.node, tick);
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::serial()
    }
}
