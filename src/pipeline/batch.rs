// Parallel batch runner over work items

use crossbeam_channel::bounded;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use super::{ItemOutcome, Pipeline, WorkItem};
use crate::config::subsystems::ProcessorConfig;
use crate::error::{Error, Result};
use crate::storage::DocumentSource;
use crate::types::MatchTier;

/// A processed item on its way to the writer.
#[derive(Debug)]
pub struct ItemResult {
    /// Position of the item in the input.
    pub index: usize,
    pub item: WorkItem,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Items never started because the run was interrupted.
    pub skipped: usize,
    /// Highlighted sides per tier.
    pub by_tier: BTreeMap<MatchTier, usize>,
}

impl BatchStats {
    fn record(&mut self, outcome: &ItemOutcome) {
        self.processed += 1;
        if outcome.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        for side in [&outcome.claim, &outcome.evidence] {
            if side.is_highlighted() {
                if let Some(tier) = side.tier() {
                    *self.by_tier.entry(tier).or_insert(0) += 1;
                }
            }
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.successful as f64 / self.processed as f64
        }
    }
}

/// Processes `items` on a worker pool and hands every result to `sink` on
/// the calling thread. Results arrive in completion order.
pub fn run_batch<S, F>(
    pipeline: &Pipeline<S>,
    items: Vec<WorkItem>,
    config: &ProcessorConfig,
    sink: F,
) -> Result<BatchStats>
where
    S: DocumentSource,
    F: FnMut(ItemResult) -> Result<()>,
{
    run_batch_until(pipeline, items, config, &AtomicBool::new(false), sink)
}

/// As [`run_batch`], stopping early once `stop` is set. Items already
/// running finish and are delivered; the rest are counted as skipped.
pub fn run_batch_until<S, F>(
    pipeline: &Pipeline<S>,
    items: Vec<WorkItem>,
    config: &ProcessorConfig,
    stop: &AtomicBool,
    mut sink: F,
) -> Result<BatchStats>
where
    S: DocumentSource,
    F: FnMut(ItemResult) -> Result<()>,
{
    let start = Instant::now();
    let total = items.len();
    let threads = config.effective_threads();
    info!("Processing {} items on {} threads", total, threads);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("wikifix-worker-{}", i))
        .build()?;

    let (sender, receiver) = bounded::<ItemResult>(config.channel_capacity.max(1));
    let skipped = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);

    let (stats, sink_error) = thread::scope(|scope| {
        let pool = &pool;
        let skipped = &skipped;
        let abort = &abort;

        let producer = scope.spawn(move || {
            pool.install(|| {
                items
                    .into_par_iter()
                    .enumerate()
                    .for_each_with(sender, |sender, (index, item)| {
                        if stop.load(Ordering::Relaxed) || abort.load(Ordering::Relaxed) {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            return;
                        }
                        let outcome = pipeline.process_item(&item);
                        if sender.send(ItemResult { index, item, outcome }).is_err() {
                            debug!("Writer gone, dropping item {}", index);
                        }
                    });
            });
        });

        let mut stats = BatchStats::default();
        let mut sink_error = None;
        for result in receiver.iter() {
            stats.record(&result.outcome);
            if sink_error.is_some() {
                continue;
            }
            if let Err(e) = sink(result) {
                warn!("Stopping batch, result writer failed: {}", e);
                abort.store(true, Ordering::Relaxed);
                sink_error = Some(e);
            }
        }

        if producer.join().is_err() {
            sink_error.get_or_insert_with(|| Error::async_err("worker pool panicked"));
        }
        (stats, sink_error)
    });

    if let Some(e) = sink_error {
        return Err(e);
    }

    let mut stats = stats;
    stats.skipped = skipped.load(Ordering::Relaxed);
    if stats.skipped > 0 {
        warn!("Interrupted: {} of {} items were not processed", stats.skipped, total);
    }
    info!(
        "Processed {} items in {:.2?}: {} successful, {} failed",
        stats.processed,
        start.elapsed(),
        stats.successful,
        stats.failed
    );

    Ok(stats)
}
