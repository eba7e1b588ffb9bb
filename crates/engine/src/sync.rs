//! The synchronization orchestrator.
//!
//! One run pulls every record whose modification time falls in
//! `[cursor, started_at)` from the feed, applies each through the retry
//! policy, and checkpoints cursor and processed count into the run ledger
//! after every page. A killed run resumes from the last committed cursor
//! and reprocesses at most one partial page, which the upsert keeps safe.

use crate::error::{Error, ErrorKind, Result};
use crate::record::Upserter;
use exn::ResultExt;
use pkgsync_feed::{FeedWindow, PackageFeed};
use pkgsync_store::{Database, PackageRepository, RetryPolicy, RunLedger};
use time::UtcDateTime;
use tracing::{error, info, instrument, warn};

/// Feed page size. The window is fixed per run, so larger pages only
/// trade memory for round-trips.
pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// What a call to [`Syncer::run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run went to completion and the ledger row is closed.
    Completed(RunSummary),
    /// The most recent ledger row is still open, so no work was attempted
    /// and the ledger was not touched. Either another process is mid-run
    /// or a crashed run needs an operator.
    AlreadyRunning,
}

/// Counters for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Window total reported by the feed when the run opened.
    pub total: u64,
    /// Records actually pulled and applied.
    pub processed: u64,
    /// The cursor as committed by the final checkpoint; equals the
    /// window's lower bound when the window was empty.
    pub cursor: UtcDateTime,
}

/// Drives the batch loop: ledger guard, windowed paging, per-record
/// upsert under retry, per-page checkpointing.
pub struct Syncer<F> {
    db: Database,
    ledger: RunLedger,
    upserter: Upserter,
    feed: F,
    retry: RetryPolicy,
    batch_size: u32,
}

impl<F: PackageFeed> Syncer<F> {
    pub fn new(db: &Database, feed: F) -> Self {
        Self {
            db: db.clone(),
            ledger: RunLedger::from(db),
            upserter: Upserter::new(PackageRepository::from(db)),
            feed,
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Change the feed page size (clamped to at least 1).
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Change the retry policy wrapped around each record write.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Execute one synchronization run.
    ///
    /// Returns [`RunOutcome::AlreadyRunning`] without touching the ledger
    /// when the previous run never closed. Any fatal error is captured
    /// into the ledger row (error text + end time) before propagating.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunOutcome> {
        if let Some(last) = self.ledger.latest().await.or_raise(|| ErrorKind::Ledger)?
            && last.is_open()
        {
            warn!(run = last.id, started_at = %last.started_at, "previous run is still open, refusing to start");
            return Ok(RunOutcome::AlreadyRunning);
        }

        let since = self
            .ledger
            .latest_cursor()
            .await
            .or_raise(|| ErrorKind::Ledger)?
            .unwrap_or(UtcDateTime::UNIX_EPOCH);
        let started_at = UtcDateTime::now();
        let window = FeedWindow { since, until: started_at };

        // Feed failures before the ledger row exists are plain errors;
        // there is no run to annotate yet.
        let total = self.feed.count(window).await.or_raise(|| ErrorKind::Feed)?;
        let run_id = self.ledger.open(started_at, since, total).await.or_raise(|| ErrorKind::Ledger)?;
        info!(run = run_id, total, since = %since, "sync run started");

        let mut processed: u64 = 0;
        let mut cursor = since;
        loop {
            let page = match self.feed.page(window, processed, self.batch_size).await.or_raise(|| ErrorKind::Feed) {
                Ok(page) => page,
                Err(err) => return Err(self.fail(run_id, err).await),
            };
            let Some(last) = page.last() else { break };
            let page_cursor = last.last_edited;
            let page_len = page.len() as u64;

            for record in &page {
                if let Err(err) = self.retry.run(&self.db, || self.upserter.apply(record)).await {
                    return Err(self.fail(run_id, err).await);
                }
            }

            // The page is durable; only now may the cursor move.
            processed += page_len;
            cursor = page_cursor;
            if let Err(err) = self.ledger.checkpoint(run_id, cursor, processed).await.or_raise(|| ErrorKind::Ledger) {
                return Err(self.fail(run_id, err).await);
            }

            if page_len < u64::from(self.batch_size) {
                break;
            }
        }

        self.ledger.close(run_id).await.or_raise(|| ErrorKind::Ledger)?;
        info!(run = run_id, processed, "sync run completed");
        Ok(RunOutcome::Completed(RunSummary { total, processed, cursor }))
    }

    /// Capture a fatal error into the ledger row, then hand it back for
    /// propagation. A failing ledger write at this point can only be
    /// logged; the original error matters more.
    async fn fail(&self, run_id: i64, err: Error) -> Error {
        if let Err(ledger_err) = self.ledger.close_with_error(run_id, format!("{err:?}")).await {
            error!(run = run_id, "could not record run failure: {ledger_err:?}");
        }
        err
    }
}
