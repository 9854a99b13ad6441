//! Fixed-size worker pool for bin merge jobs.
//!
//! `pool_size` worker tasks share one bounded job queue. Each job carries
//! the bins of one merge group plus a oneshot channel for its result, so a
//! round is a fan-out of jobs followed by awaiting every reply in group
//! order. Concurrency never exceeds the pool size no matter how many groups
//! a round has.
//!
//! Merging is CPU work, so each worker hands its job to tokio's blocking
//! thread pool and waits for it. Jobs therefore run in parallel even on a
//! current-thread runtime.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;
use tracing::{trace, warn};

use super::kw::merge_group;
use super::ReductionError;
use crate::types::{Adjacency, NodeId};

/// Nodes sharing one color.
pub type Bin = Vec<NodeId>;

struct MergeJob {
    group: Vec<Bin>,
    reply: oneshot::Sender<Vec<Bin>>,
}

/// Worker pool bound to one reduction (fixed adjacency and core size).
pub struct MergePool {
    jobs: mpsc::Sender<MergeJob>,
    workers: JoinSet<()>,
}

impl MergePool {
    /// Start `size` workers (at least one).
    pub fn spawn(size: usize, adjacency: Arc<Adjacency>, core_len: usize) -> Self {
        let size = size.max(1);
        let (jobs, queue) = mpsc::channel::<MergeJob>(size.saturating_mul(2));
        let queue = Arc::new(Mutex::new(queue));
        let mut workers = JoinSet::new();

        for worker in 0..size {
            let queue = Arc::clone(&queue);
            let adjacency = Arc::clone(&adjacency);
            workers.spawn(async move {
                loop {
                    let job = { queue.lock().await.recv().await };
                    let Some(MergeJob { group, reply }) = job else { break };
                    let adjacency = Arc::clone(&adjacency);
                    let merge = tokio::task::spawn_blocking(move || {
                        merge_group(group, core_len, &adjacency)
                    });
                    match merge.await {
                        // A dropped receiver means the round was abandoned.
                        Ok(merged) => {
                            let _ = reply.send(merged);
                        }
                        // Dropping `reply` fails the round with a worker error.
                        Err(e) => warn!(worker, error = %e, "merge job failed"),
                    }
                }
                trace!(worker, "merge worker stopped");
            });
        }

        Self { jobs, workers }
    }

    /// Number of live workers.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Merge every group and concatenate the results in group order.
    pub async fn run_round(&mut self, groups: Vec<Vec<Bin>>) -> Result<Vec<Bin>, ReductionError> {
        let mut pending = Vec::with_capacity(groups.len());
        for group in groups {
            let (reply, done) = oneshot::channel();
            self.jobs
                .send(MergeJob { group, reply })
                .await
                .map_err(|_| ReductionError::PoolClosed)?;
            pending.push(done);
        }

        let mut bins = Vec::new();
        for done in pending {
            let merged = done
                .await
                .map_err(|_| ReductionError::Worker("merge job dropped without a result".into()))?;
            bins.extend(merged);
        }
        Ok(bins)
    }

    /// Close the queue and wait for every worker to exit.
    pub async fn shutdown(self) -> Result<(), ReductionError> {
        let Self { jobs, mut workers } = self;
        drop(jobs);
        while let Some(joined) = workers.join_next().await {
            joined?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Bin {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[tokio::test]
    async fn test_round_preserves_group_order() {
        // No edges: every later bin folds into core bin 0.
        let adjacency = Arc::new(vec![Vec::new(); 8]);
        let mut pool = MergePool::spawn(3, adjacency, 1);
        assert_eq!(pool.size(), 3);

        let groups = vec![
            vec![ids(&[0]), ids(&[1])],
            vec![ids(&[2]), ids(&[3])],
            vec![ids(&[4]), ids(&[5])],
            vec![ids(&[6]), ids(&[7])],
        ];
        let bins = pool.run_round(groups).await.unwrap();
        assert_eq!(
            bins,
            vec![ids(&[0, 1]), ids(&[2, 3]), ids(&[4, 5]), ids(&[6, 7])]
        );
        pool.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_current_thread_runtime_completes_round() {
        // Path 0-1-2 per group: node 2 joins core bin 0.
        let adjacency = Arc::new(vec![
            ids(&[1]),
            ids(&[0, 2]),
            ids(&[1]),
            ids(&[4]),
            ids(&[3, 5]),
            ids(&[4]),
        ]);
        let mut pool = MergePool::spawn(4, adjacency, 2);
        let groups = vec![
            vec![ids(&[0]), ids(&[1]), ids(&[2])],
            vec![ids(&[3]), ids(&[4]), ids(&[5])],
        ];
        let bins = pool.run_round(groups).await.unwrap();
        assert_eq!(bins, vec![ids(&[0, 2]), ids(&[1]), ids(&[3, 5]), ids(&[4])]);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_size_gets_one_worker() {
        let mut pool = MergePool::spawn(0, Arc::new(Vec::new()), 1);
        assert_eq!(pool.size(), 1);
        assert!(pool.run_round(Vec::new()).await.unwrap().is_empty());
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_more_groups_than_queue_capacity() {
        let n = 64;
        let adjacency = Arc::new(vec![Vec::new(); n]);
        let mut pool = MergePool::spawn(1, adjacency, 1);
        let groups: Vec<Vec<Bin>> = (0..n / 2)
            .map(|g| vec![ids(&[2 * g]), ids(&[2 * g + 1])])
            .collect();

        let bins = pool.run_round(groups).await.unwrap();
        assert_eq!(bins.len(), n / 2);
        pool.shutdown().await.unwrap();
    }
}
