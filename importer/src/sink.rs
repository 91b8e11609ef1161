//! Batched writes with per-row fallback

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ImportError;
use crate::fact::Fact;

/// Destination for mapped facts; one call is one statement
#[async_trait]
pub trait FactSink: Send + Sync {
    async fn upsert(&self, facts: &[Fact]) -> Result<(), ImportError>;
}

/// Counters for the write phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    pub rows_written: usize,
    pub rows_failed: usize,
    pub batches: usize,
    /// Batches that failed as a whole and were retried row by row
    pub fallback_batches: usize,
}

/// Upsert `facts` in chunks of `batch_size`.
///
/// A failed chunk is retried one row at a time; rows that fail again are
/// counted and skipped.
pub async fn write_batches<S>(sink: &S, facts: &[Fact], batch_size: usize) -> WriteStats
where
    S: FactSink + ?Sized,
{
    let mut stats = WriteStats::default();

    for (number, chunk) in facts.chunks(batch_size.max(1)).enumerate() {
        stats.batches += 1;

        match sink.upsert(chunk).await {
            Ok(()) => {
                stats.rows_written += chunk.len();
                tracing::debug!(batch = number + 1, rows = chunk.len(), "Batch written");
            }
            Err(e) => {
                stats.fallback_batches += 1;
                tracing::warn!(
                    batch = number + 1,
                    rows = chunk.len(),
                    error = %e,
                    "Batch failed, retrying rows individually"
                );

                for fact in chunk {
                    match sink.upsert(std::slice::from_ref(fact)).await {
                        Ok(()) => stats.rows_written += 1,
                        Err(e) => {
                            stats.rows_failed += 1;
                            tracing::error!(
                                store_id = %fact.key.store_id,
                                product_id = %fact.key.product_id,
                                date = %fact.key.date,
                                error = %e,
                                "Row failed"
                            );
                        }
                    }
                }
            }
        }
    }

    stats
}
