//! Bounded-batch pagination with a fixed pause between requests.
//!
//! Both platform collectors drive the same loop: pull a batch, keep what a
//! predicate accepts, sleep, pull the next one, until enough items were
//! accepted, the source runs dry, a batch cap is hit, or the run is
//! cancelled. This fixed sleep (plus the 429 backoff in `trawl-http`) is
//! the whole rate-limiting story; there is no token-bucket service.

use async_trait::async_trait;
use futures::Stream;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A paged upstream: each call returns the next batch, `None` once drained.
///
/// Implementations own their cursor/token state; the pager never sees it.
#[async_trait]
pub trait BatchSource {
    type Item;

    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<Self::Item>>>;
}

/// Counters for one paging run, reported into saved metadata.
#[derive(Debug, Clone, Default)]
pub struct PagerStats {
    pub batches: usize,
    pub fetched: usize,
    pub accepted: usize,
    pub elapsed: Duration,
}

impl PagerStats {
    /// True when more than one request was needed.
    pub fn pagination_used(&self) -> bool {
        self.batches > 1
    }
}

#[derive(Debug, Clone)]
pub struct Pager {
    pub pause: Duration,
    pub max_batches: usize,
    cancel: CancellationToken,
}

impl Pager {
    pub fn new(pause: Duration, max_batches: usize) -> Self {
        Self {
            pause,
            max_batches,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie the loop to an external cancellation signal (Ctrl-C).
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Collect until `want` items pass `keep`.
    ///
    /// A batch failure after the first successful batch keeps the partial
    /// result instead of discarding work already paid for; only a failure
    /// with nothing collected propagates.
    pub async fn collect_n<S, F>(
        &self,
        source: &mut S,
        want: usize,
        mut keep: F,
    ) -> anyhow::Result<(Vec<S::Item>, PagerStats)>
    where
        S: BatchSource + Send,
        S::Item: Send,
        F: FnMut(&S::Item) -> bool + Send,
    {
        let mut out = Vec::new();
        let mut stats = PagerStats::default();
        let started = Instant::now();

        while out.len() < want && stats.batches < self.max_batches {
            if self.cancel.is_cancelled() {
                tracing::info!(accepted = out.len(), "pager.cancelled");
                break;
            }
            if stats.batches > 0 && !self.pause.is_zero() && !self.sleep_between().await {
                break;
            }

            let batch = match source.next_batch().await {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(err) => {
                    if out.is_empty() {
                        stats.elapsed = started.elapsed();
                        return Err(err);
                    }
                    tracing::warn!(
                        error = %err,
                        accepted = out.len(),
                        "pager.batch_failed_keeping_partial"
                    );
                    break;
                }
            };
            // An empty batch with no exhaustion signal would spin forever.
            if batch.is_empty() {
                break;
            }
            stats.batches += 1;
            stats.fetched += batch.len();

            for item in batch {
                if out.len() >= want {
                    break;
                }
                if keep(&item) {
                    out.push(item);
                }
            }
        }

        stats.accepted = out.len();
        stats.elapsed = started.elapsed();
        tracing::debug!(
            batches = stats.batches,
            fetched = stats.fetched,
            accepted = stats.accepted,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "pager.done"
        );
        Ok((out, stats))
    }

    /// Streaming form for consumers that enrich items asynchronously.
    ///
    /// Items are yielded as they arrive; acceptance counting belongs to the
    /// caller, so the loop here only bounds batches and honours the pause
    /// and cancellation. Dropping the stream stops the paging.
    pub fn stream<'a, S>(
        &'a self,
        source: &'a mut S,
    ) -> impl Stream<Item = anyhow::Result<S::Item>> + 'a
    where
        S: BatchSource + Send,
        S::Item: Send + 'a,
    {
        async_stream::try_stream! {
            let mut batches = 0usize;
            let mut yielded = 0usize;
            while batches < self.max_batches && !self.cancel.is_cancelled() {
                if batches > 0 && !self.pause.is_zero() && !self.sleep_between().await {
                    break;
                }
                let batch = if yielded == 0 {
                    source.next_batch().await?
                } else {
                    match source.next_batch().await {
                        Ok(batch) => batch,
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                yielded,
                                "pager.batch_failed_keeping_partial"
                            );
                            break;
                        }
                    }
                };
                let Some(batch) = batch else { break };
                if batch.is_empty() {
                    break;
                }
                batches += 1;
                for item in batch {
                    yielded += 1;
                    yield item;
                }
            }
        }
    }

    /// Sleep the inter-batch pause; false when cancelled mid-sleep.
    async fn sleep_between(&self) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.pause) => true,
            _ = self.cancel.cancelled() => {
                tracing::info!("pager.cancelled");
                false
            }
        }
    }
}
