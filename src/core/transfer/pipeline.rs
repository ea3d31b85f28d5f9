//! Transfer pipeline
//!
//! Drives one run end to end:
//!
//! ```text
//! Idle -> Connected -> [Clearing] -> Streaming -> Draining -> Completed
//!   \__________\___________\____________\___________\______-> Failed
//! ```
//!
//! The loop is strictly sequential. Each flushed batch is written and awaited
//! before the next value is read from the source cursor, so at most one write
//! is in flight. Both connections are closed exactly once on every exit path.

use crate::adapters::store::traits::{
    AggregationOptions, Namespace, ProjectionQuery, StoreConnection, StoreConnector,
};
use crate::config::SiphonConfig;
use crate::core::normalize::normalize;
use crate::core::transfer::batch::{Batch, BatchAccumulator};
use crate::core::transfer::events::{EventSink, TransferEvent};
use crate::core::transfer::policy::WritePolicy;
use crate::core::transfer::summary::RunSummary;
use crate::domain::{Result, SiphonError};
use chrono::Utc;
use futures::stream::StreamExt;
use secrecy::ExposeSecret;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Connected,
    Clearing,
    Streaming,
    Draining,
    Completed,
    Failed,
}

impl PipelineState {
    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Connected => "connected",
            PipelineState::Clearing => "clearing",
            PipelineState::Streaming => "streaming",
            PipelineState::Draining => "draining",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counters owned by the pipeline for the duration of a run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Non-empty normalized values seen
    pub total_collected: u64,
    /// Non-empty batches flushed
    pub docs_written: u64,
    /// Set after the first non-empty flush
    pub first_chunk_written: bool,
    /// Monotonic start time
    pub started_at: Instant,
}

impl RunState {
    /// Fresh counters starting now
    pub fn new() -> Self {
        Self {
            total_collected: 0,
            docs_written: 0,
            first_chunk_written: false,
            started_at: Instant::now(),
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Source to target transfer of one field
pub struct TransferPipeline {
    config: SiphonConfig,
    connector: Arc<dyn StoreConnector>,
    events: EventSink,
    state: PipelineState,
}

impl TransferPipeline {
    /// Create a pipeline for a validated configuration
    pub fn new(config: SiphonConfig, connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            config,
            connector,
            events: EventSink::disabled(),
            state: PipelineState::Idle,
        }
    }

    /// Report progress to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run the transfer to completion
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: [`SiphonError::Connection`] if either
    /// store is unreachable, [`SiphonError::Store`] if a clear, read or write
    /// fails. Batches written before the failure are not rolled back.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let mut run = RunState::new();

        match self.connect_and_transfer(&mut run).await {
            Ok(removed) => {
                let summary = RunSummary {
                    total_collected: run.total_collected,
                    docs_written: run.docs_written,
                    removed,
                    elapsed: run.started_at.elapsed(),
                    started_at,
                    finished_at: Utc::now(),
                    dry_run: self.config.application.dry_run,
                };
                self.transition(PipelineState::Completed);
                summary.log_summary();
                self.events.emit(TransferEvent::Completed(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                crate::log_error_with_context!(&e, "Transfer failed");
                tracing::info!(
                    total_collected = run.total_collected,
                    docs_written = run.docs_written,
                    "Batches written before the failure are kept"
                );
                self.events.emit(TransferEvent::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn connect_and_transfer(&mut self, run: &mut RunState) -> Result<Option<u64>> {
        let source = self
            .connector
            .connect(self.config.source.uri.expose_secret().as_ref())
            .await?;

        let target = match self
            .connector
            .connect(self.config.target.uri.expose_secret().as_ref())
            .await
        {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        self.transition(PipelineState::Connected);
        let result = self.transfer(source.as_ref(), target.as_ref(), run).await;

        source.close().await;
        target.close().await;
        result
    }

    async fn transfer(
        &mut self,
        source: &dyn StoreConnection,
        target: &dyn StoreConnection,
        run: &mut RunState,
    ) -> Result<Option<u64>> {
        let batch_size = NonZeroUsize::new(self.config.aggregation.batch_size).ok_or_else(|| {
            SiphonError::Configuration("aggregation.batch_size must be > 0".to_string())
        })?;
        let cursor_batch_size = u32::try_from(batch_size.get()).map_err(|_| {
            SiphonError::Configuration(format!(
                "aggregation.batch_size must be <= {}",
                u32::MAX
            ))
        })?;
        let unwrap_identifiers = self.config.target.unwrap_object_id;
        let policy = WritePolicy::from_config(&self.config.target, self.config.application.dry_run);
        let query = ProjectionQuery {
            namespace: Namespace::new(&self.config.source.db, &self.config.source.collection),
            filter: self.config.source.filter.clone(),
            field: self.config.source.field.clone(),
            options: AggregationOptions {
                allow_disk_use: self.config.aggregation.allow_disk_use,
                batch_size: cursor_batch_size,
            },
        };

        crate::log_transfer_start!(
            query.namespace,
            query.field,
            policy.namespace(),
            policy.action(),
            batch_size.get()
        );

        let removed = if policy.clears_first() {
            self.transition(PipelineState::Clearing);
            let removed = policy.prepare(target).await?;
            if let Some(removed) = removed {
                self.events.emit(TransferEvent::Cleared { removed });
            }
            removed
        } else {
            None
        };

        self.transition(PipelineState::Streaming);
        let mut values = source.run_projection_aggregate(&query).await?;
        let mut accumulator = BatchAccumulator::new(batch_size);

        while let Some(value) = values.next().await {
            let Some(value) = normalize(value?, unwrap_identifiers) else {
                continue;
            };
            run.total_collected += 1;
            if let Some(batch) = accumulator.push(value) {
                self.flush(&policy, target, batch, run).await?;
            }
        }

        self.transition(PipelineState::Draining);
        if let Some(batch) = accumulator.drain() {
            self.flush(&policy, target, batch, run).await?;
        }

        Ok(removed)
    }

    async fn flush(
        &self,
        policy: &WritePolicy,
        target: &dyn StoreConnection,
        batch: Batch,
        run: &mut RunState,
    ) -> Result<()> {
        let batch_len = batch.len();
        policy.apply(target, batch, run).await?;

        crate::log_batch_flushed!(batch_len, run.total_collected, run.docs_written);
        self.events.emit(TransferEvent::BatchWritten {
            batch_len,
            total_collected: run.total_collected,
            docs_written: run.docs_written,
            elapsed: run.started_at.elapsed(),
        });
        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "Pipeline state changed");
        self.state = next;
        self.events.emit(TransferEvent::StateChanged(next));
    }
}
