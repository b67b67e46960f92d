//! Worklist edit-history scan and per-author scoring.
//!
//! # Pipeline
//!
//! ```text
//! Worklist (source -> pages)
//!        |  sources split across at most MAX_SCAN_THREADS scoped threads
//!        v
//! scan_source: sorted page IDs -> batches of `pages_per_batch`
//!        |  RevisionSource::revisions_since(batch, cutoff), drained in order
//!        v
//! SourceScan: per-author tallies (+ trace lines)
//!        |  merged in ascending source order
//!        v
//! edit counts -> final_score -> author -> Score
//! ```
//!
//! A revision qualifies when it is on a worklist page, not older than the
//! cutoff, and by a registered non-bot author.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use invitelist_core::config::ScoringConfig;
use invitelist_core::{Clock, Page, PageId, Score, SourceId, Worklist};
use tracing::{debug, info, instrument};

use crate::rank::rank;
use crate::revisions::RevisionSource;
use crate::score::{EngagementWeights, edit_weight, final_score};
use crate::trace::{DebugSink, Trace};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Upper bound on concurrent revision scans within one run.
pub const MAX_SCAN_THREADS: usize = 8;

/// Qualifying activity of one author.
#[derive(Debug, Clone, Default, PartialEq)]
struct AuthorTally {
    edits: u32,
    pages: BTreeSet<(SourceId, PageId)>,
    contribution: f64,
}

impl AuthorTally {
    fn merge(&mut self, other: Self) {
        self.edits = self.edits.saturating_add(other.edits);
        self.pages.extend(other.pages);
        self.contribution += other.contribution;
    }
}

/// Result of scanning one source.
#[derive(Debug, Default)]
struct SourceScan {
    tallies: BTreeMap<String, AuthorTally>,
    trace: Trace,
}

/// Inputs shared by every per-source scan of one run.
struct ScanWindow<'a> {
    revisions: &'a dyn RevisionSource,
    now: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    cutoff_days: f64,
    pages_per_batch: usize,
    weights: &'a EngagementWeights,
    tracing: bool,
}

pub struct InvitationScorer {
    revisions: Arc<dyn RevisionSource>,
    clock: Arc<dyn Clock>,
    config: ScoringConfig,
    weights: EngagementWeights,
    debug_sink: Option<DebugSink>,
}

impl InvitationScorer {
    #[must_use]
    pub fn new(
        revisions: Arc<dyn RevisionSource>,
        clock: Arc<dyn Clock>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            revisions,
            clock,
            config,
            weights: EngagementWeights::default(),
            debug_sink: None,
        }
    }

    /// Install a sink for the diagnostic trace.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    pub fn set_debug_sink(&mut self, sink: Option<DebugSink>) {
        self.debug_sink = sink;
    }

    /// Score every author with at least one qualifying edit on `worklist`.
    ///
    /// The returned map has no meaningful order; use [`rank`] to sort it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cutoff falls outside the representable date
    /// range, the revision source fails, or a scan thread panics.
    #[instrument(skip_all, fields(sources = worklist.pages_by_source().len(), pages = worklist.page_count()))]
    pub fn generate(&mut self, worklist: &Worklist) -> Result<HashMap<String, Score>> {
        let now = self.clock.now();
        let cutoff = cutoff_before(now, self.config.cutoff_days)?;
        let window = ScanWindow {
            revisions: self.revisions.as_ref(),
            now,
            cutoff,
            cutoff_days: f64::from(self.config.cutoff_days),
            pages_per_batch: self.config.pages_per_batch.max(1),
            weights: &self.weights,
            tracing: self.debug_sink.is_some(),
        };

        let scans = scan_all_sources(worklist, &window)?;

        let mut trace = Trace::default();
        let mut tallies: BTreeMap<String, AuthorTally> = BTreeMap::new();
        for scan in scans {
            for (author, tally) in scan.tallies {
                tallies.entry(author).or_default().merge(tally);
            }
            trace.absorb(scan.trace);
        }

        let authors: Vec<String> = tallies.keys().cloned().collect();
        let edit_counts = if authors.is_empty() {
            HashMap::new()
        } else {
            self.revisions
                .edit_counts(&authors)
                .context("look up author edit counts")?
        };

        let mut scores = HashMap::with_capacity(tallies.len());
        for (author, tally) in &tallies {
            let edit_count = edit_counts.get(author).copied().unwrap_or(0);
            scores.insert(
                author.clone(),
                final_score(tally.contribution, edit_count, &self.weights),
            );
        }

        if let Some(sink) = self.debug_sink.as_mut() {
            for (author, score) in rank(&scores) {
                if let Some(tally) = tallies.get(&author) {
                    trace.scores.push(format!(
                        "{author}: edits={} pages={} contribution={:.3} edit_count={} score={score}",
                        tally.edits,
                        tally.pages.len(),
                        tally.contribution,
                        edit_counts.get(&author).copied().unwrap_or(0),
                    ));
                }
            }
            trace.emit(&mut **sink);
        }

        info!(candidates = scores.len(), "scored worklist contributors");
        Ok(scores)
    }
}

/// `now` minus `days`, or an error when that instant is not representable.
fn cutoff_before(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| anyhow!("cutoff of {days} days before {now} is out of range"))
}

fn scan_thread_count(sources: usize) -> usize {
    thread::available_parallelism()
        .map_or(4, NonZeroUsize::get)
        .min(MAX_SCAN_THREADS)
        .min(sources)
        .max(1)
}

/// Split sources into contiguous chunks, one scoped thread per chunk.
/// Results come back in ascending source order.
fn scan_all_sources(worklist: &Worklist, window: &ScanWindow<'_>) -> Result<Vec<SourceScan>> {
    let sources: Vec<(&SourceId, &Vec<Page>)> = worklist.pages_by_source().iter().collect();
    if sources.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_len = sources.len().div_ceil(scan_thread_count(sources.len()));

    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(chunk_len)
            .map(|chunk| {
                let handle = scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|(source, pages)| {
                            scan_source(source, pages, window)
                                .with_context(|| format!("scan revisions on '{source}'"))
                        })
                        .collect::<Result<Vec<_>>>()
                });
                (chunk[0].0, handle)
            })
            .collect();

        let mut scans = Vec::with_capacity(sources.len());
        for (first, handle) in handles {
            let chunk = handle
                .join()
                .map_err(|_| anyhow!("revision scan starting at '{first}' panicked"))??;
            scans.extend(chunk);
        }
        Ok(scans)
    })
}

/// Walk one source's pages in ascending ID order, one batch at a time.
fn scan_source(source: &SourceId, pages: &[Page], window: &ScanWindow<'_>) -> Result<SourceScan> {
    let titles: BTreeMap<PageId, &str> = pages
        .iter()
        .map(|page| (page.id, page.title.as_str()))
        .collect();
    let ids: Vec<PageId> = titles.keys().copied().collect();
    let batch_count = ids.len().div_ceil(window.pages_per_batch);

    let mut scan = SourceScan::default();

    for (index, batch) in ids.chunks(window.pages_per_batch).enumerate() {
        let first = batch[0];
        debug!(
            source = %source,
            batch = index + 1,
            batches = batch_count,
            first_page = first.0,
            "fetching revision batch"
        );
        if window.tracing {
            scan.trace.progress.push(format!(
                "{source}: batch {} of {batch_count} starting at page ID {first}",
                index + 1
            ));
        }

        let mut revisions = window
            .revisions
            .revisions_since(source, batch, window.cutoff)?;
        revisions.sort_by(|a, b| {
            (a.page_id, a.timestamp, a.id).cmp(&(b.page_id, b.timestamp, b.id))
        });

        for revision in revisions {
            if revision.timestamp < window.cutoff || revision.author_is_bot {
                continue;
            }
            let Some(title) = titles.get(&revision.page_id) else {
                continue;
            };
            if batch.binary_search(&revision.page_id).is_err() {
                continue;
            }
            let Some(author) = revision.author else {
                continue;
            };

            #[allow(clippy::cast_precision_loss)]
            let age_days =
                (window.now - revision.timestamp).num_milliseconds() as f64 / MILLIS_PER_DAY;
            let weight = edit_weight(
                age_days,
                revision.size_delta,
                window.cutoff_days,
                window.weights,
            );

            if window.tracing {
                scan.trace.contributions.push(format!(
                    "{author} edited [[{source}:{title}]] (page {}, rev {}) weight={weight:.3}",
                    revision.page_id, revision.id
                ));
            }

            let tally = scan.tallies.entry(author).or_default();
            tally.edits = tally.edits.saturating_add(1);
            tally.pages.insert((source.clone(), revision.page_id));
            tally.contribution += weight;
        }
    }

    Ok(scan)
}
