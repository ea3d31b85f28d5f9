//! Write policy
//!
//! Decides which store operation a flushed batch turns into and issues it.
//! The decision depends only on target configuration and is fixed for the run:
//!
//! | `rewrite_documents` | document id | action |
//! |---|---|---|
//! | any | absent or `false` | insert `{ field: batch }` |
//! | `false` | `X` | merge into `X` |
//! | `true` | `X` | insert `{ field: batch }` |
//!
//! A merge either replaces the destination array (`rewrite_array`) or appends
//! to it, with or without duplicates. Replacing happens on every flush, so
//! with several batches the last one wins.

use crate::adapters::store::traits::{Namespace, StoreConnection};
use crate::config::TargetConfig;
use crate::core::transfer::batch::Batch;
use crate::core::transfer::pipeline::RunState;
use crate::domain::ids::TargetDocumentId;
use crate::domain::Result;
use std::fmt;

/// How a merge updates the destination array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Set the field to the batch contents
    Replace,
    /// Append the batch contents
    Append {
        /// `false` appends only values not already present
        allow_duplicates: bool,
    },
}

/// Store operation issued for each flushed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    /// Insert a brand-new document per batch
    Insert,
    /// Upsert into one target document
    Merge {
        /// Target `_id`
        id: TargetDocumentId,
        /// Replace or append
        mode: MergeMode,
    },
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAction::Insert => write!(f, "insert"),
            WriteAction::Merge {
                id,
                mode: MergeMode::Replace,
            } => write!(f, "set on {id}"),
            WriteAction::Merge {
                id,
                mode: MergeMode::Append { allow_duplicates: true },
            } => write!(f, "push on {id}"),
            WriteAction::Merge {
                id,
                mode: MergeMode::Append { allow_duplicates: false },
            } => write!(f, "add-to-set on {id}"),
        }
    }
}

/// Write policy for one run
#[derive(Debug, Clone)]
pub struct WritePolicy {
    namespace: Namespace,
    field: String,
    clear_first: bool,
    action: WriteAction,
    dry_run: bool,
}

impl WritePolicy {
    /// Build the policy from target configuration
    pub fn from_config(target: &TargetConfig, dry_run: bool) -> Self {
        let action = match target.merge_target() {
            None => WriteAction::Insert,
            Some(id) => WriteAction::Merge {
                id,
                mode: if target.rewrite_array {
                    MergeMode::Replace
                } else {
                    MergeMode::Append {
                        allow_duplicates: target.duplicates_in_array,
                    }
                },
            },
        };

        Self {
            namespace: Namespace::new(&target.db, &target.collection),
            field: target.field.clone(),
            clear_first: target.rewrite_documents,
            action,
            dry_run,
        }
    }

    /// Target namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Action issued for every non-empty batch
    pub fn action(&self) -> &WriteAction {
        &self.action
    }

    /// Whether the target collection is cleared before streaming
    pub fn clears_first(&self) -> bool {
        self.clear_first
    }

    /// Run pre-flush setup
    ///
    /// Clears the target collection when `rewrite_documents` is set and
    /// returns the removed count. Must be called once, before the source
    /// cursor is opened. Returns `None` when nothing was cleared.
    pub async fn prepare(&self, target: &dyn StoreConnection) -> Result<Option<u64>> {
        if !self.clear_first {
            return Ok(None);
        }

        if self.dry_run {
            tracing::info!(namespace = %self.namespace, "Dry run: skipping clear of target collection");
            return Ok(None);
        }

        let removed = target.clear_collection(&self.namespace).await?;
        tracing::info!(namespace = %self.namespace, removed, "Cleared target collection");
        Ok(Some(removed))
    }

    /// Write one batch
    ///
    /// Empty batches are ignored. Each non-empty batch counts as one written
    /// document, in dry run too.
    pub async fn apply(
        &self,
        target: &dyn StoreConnection,
        batch: Batch,
        state: &mut RunState,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let len = batch.len();
        if self.dry_run {
            tracing::debug!(
                namespace = %self.namespace,
                action = %self.action,
                batch_len = len,
                "Dry run: skipping write"
            );
        } else {
            self.write(target, batch).await?;
        }

        state.docs_written += 1;
        if matches!(self.action, WriteAction::Merge { .. }) && !state.first_chunk_written {
            tracing::debug!(namespace = %self.namespace, action = %self.action, "First merge written");
        }
        state.first_chunk_written = true;
        Ok(())
    }

    async fn write(&self, target: &dyn StoreConnection, batch: Batch) -> Result<()> {
        let values = batch.into_values();
        match &self.action {
            WriteAction::Insert => {
                target
                    .insert_document(&self.namespace, &self.field, values)
                    .await
            }
            WriteAction::Merge {
                id,
                mode: MergeMode::Replace,
            } => {
                target
                    .upsert_set(&self.namespace, id, &self.field, values)
                    .await
            }
            WriteAction::Merge {
                id,
                mode: MergeMode::Append { allow_duplicates },
            } => {
                target
                    .upsert_append(&self.namespace, id, &self.field, values, *allow_duplicates)
                    .await
            }
        }
    }
}
