//! # Log Cleanup Module
//!
//! This module purges persisted log records. Every record that is not flagged
//! do-not-delete is removed; flagged records survive any number of runs.
//!
//! ## Batch Contract
//!
//! 1. **start**: select the ids of every deletable record
//! 2. **execute**: delete one chunk of ids inside its own transaction
//! 3. **finish**: report the outcome
//!
//! `LogCleanupBatch::run` drives the three steps, splitting the selection into
//! chunks of `batch_size`. A failing chunk is rolled back and counted; the other
//! chunks still run. The `scheduler` submodule triggers `run` on a cron cadence.

pub mod scheduler;

use tracing::{debug, error, info};

use crate::context::ExecutionContext;
use crate::database::queries;
use crate::logging::errors::LoggingError;

/// Records deleted per chunk unless configured otherwise
pub const DEFAULT_CLEANUP_BATCH_SIZE: usize = 200;
/// Largest chunk accepted, keeps the bound parameter count well under SQLite's limit
pub const MAX_CLEANUP_BATCH_SIZE: usize = 2000;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub selected: u64,
    pub deleted: u64,
    pub failed_chunks: usize,
}

#[derive(Debug, Clone)]
pub struct LogCleanupBatch {
    batch_size: usize,
}

impl LogCleanupBatch {
    /// Chunk size is clamped to `1..=MAX_CLEANUP_BATCH_SIZE`
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.clamp(1, MAX_CLEANUP_BATCH_SIZE),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Select the work items: ids of all records not flagged do-not-delete
    pub async fn start(&self, ctx: &ExecutionContext) -> Result<Vec<String>, LoggingError> {
        let ids = queries::fetch_deletable_log_record_ids(ctx.pool()).await?;
        ctx.usage().record_query(ids.len() as u64);
        debug!("Selected {} log records for cleanup", ids.len());
        Ok(ids)
    }

    /// Delete one chunk. Either the whole chunk is deleted or none of it is.
    pub async fn execute(&self, ctx: &ExecutionContext, chunk: &[String]) -> Result<u64, LoggingError> {
        if chunk.is_empty() {
            return Ok(0);
        }

        let mut tx = ctx.pool().begin().await?;
        let result = queries::delete_log_records_by_ids(&mut *tx, chunk).await?;
        tx.commit().await?;

        ctx.usage().record_dml(result.rows_affected());
        Ok(result.rows_affected())
    }

    pub fn finish(&self, summary: &CleanupSummary) {
        if summary.failed_chunks > 0 {
            error!(
                "Log cleanup finished with {} failed chunk(s): deleted {} of {} selected records",
                summary.failed_chunks, summary.deleted, summary.selected
            );
        } else {
            info!(
                "Log cleanup finished: deleted {} of {} selected records",
                summary.deleted, summary.selected
            );
        }
    }

    /// Run start, every chunk, then finish
    pub async fn run(&self, ctx: &ExecutionContext) -> Result<CleanupSummary, LoggingError> {
        info!("Starting log cleanup with batch size {}", self.batch_size);
        let ids = self.start(ctx).await?;

        let mut summary = CleanupSummary {
            selected: ids.len() as u64,
            ..CleanupSummary::default()
        };

        for (index, chunk) in ids.chunks(self.batch_size).enumerate() {
            match self.execute(ctx, chunk).await {
                Ok(deleted) => {
                    debug!("Cleanup chunk {} deleted {} records", index, deleted);
                    summary.deleted += deleted;
                }
                Err(e) => {
                    error!("Cleanup chunk {} failed: {}", index, e);
                    summary.failed_chunks += 1;
                }
            }
        }

        self.finish(&summary);
        Ok(summary)
    }
}

impl Default for LogCleanupBatch {
    fn default() -> Self {
        Self::new(DEFAULT_CLEANUP_BATCH_SIZE)
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
