use futures::stream::{self, StreamExt};
use std::future::Future;

/// Bounded-concurrency driver for a batch of independent probe futures.
///
/// At most `concurrency` probes run at once; every submitted probe runs to
/// completion and yields its output in completion order, which is arbitrary.
/// A probe that fails reports its failure through its own output type rather
/// than aborting the batch, so no result is ever dropped. `run` resolves only
/// once the whole batch has drained; no background work survives the call.
#[derive(Debug, Clone, Copy)]
pub struct ProbePool {
    concurrency: usize,
}

impl ProbePool {
    /// Concurrency bounds are a configuration concern; the pool only
    /// enforces a floor of one so `buffer_unordered` can make progress.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run<F>(&self, probes: Vec<F>) -> Vec<F::Output>
    where
        F: Future,
    {
        log::debug!("[pool] run: probes={} concurrency={}", probes.len(), self.concurrency);
        stream::iter(probes)
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_every_probe() {
        let pool = ProbePool::new(4);
        let probes: Vec<_> = (0..20u32).map(|i| async move { i * 2 }).collect();

        let mut results = pool.run(probes).await;
        results.sort_unstable();
        assert_eq!(results, (0..20u32).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_respects_concurrency_bound() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let pool = ProbePool::new(4);
        let probes: Vec<_> = (0..32)
            .map(|_| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        pool.run(probes).await;
        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_probes_yield_outcomes() {
        let pool = ProbePool::new(2);
        let probes: Vec<_> = (0..6u32)
            .map(|i| async move {
                if i % 2 == 0 {
                    Ok(i)
                } else {
                    Err(format!("probe {} failed", i))
                }
            })
            .collect();

        let results = pool.run(probes).await;
        assert_eq!(results.len(), 6);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 3);
    }

    #[test]
    fn test_zero_concurrency_clamped_to_one() {
        assert_eq!(ProbePool::new(0).concurrency(), 1);
        assert_eq!(ProbePool::new(10).concurrency(), 10);
    }
}
