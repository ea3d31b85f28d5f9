// Siphon - MongoDB single-field collector
// Copyright (c) 2025 Siphon Contributors
// Licensed under the MIT License

//! # Siphon - MongoDB single-field collector
//!
//! Siphon reads one field from every matching document of a source MongoDB
//! collection and writes the values, in fixed-size batches, as arrays into a
//! target collection.
//!
//! ## Overview
//!
//! - **Collecting** the projected field through a streaming aggregate cursor
//! - **Normalizing** values: empties dropped, ObjectIds optionally unwrapped to hex
//! - **Batching** into arrays of at most `batch_size` values
//! - **Writing** each batch as a new document, or merging it into one target
//!   document with set, push, or add-to-set semantics
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Normalization, batching, write policy, and the transfer pipeline
//! - [`adapters`] - Store implementations (MongoDB, in-memory)
//! - [`domain`] - Value model, identifiers, and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use siphon::adapters::store::create_connector;
//! use siphon::config::load_config;
//! use siphon::core::transfer::{format_elapsed, TransferPipeline};
//! use secrecy::ExposeSecret;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("siphon.toml")?;
//!     let connector = create_connector(config.source.uri.expose_secret().as_ref())?;
//!
//!     let summary = TransferPipeline::new(config, connector).run().await?;
//!
//!     println!(
//!         "Collected {} values into {} documents in {}",
//!         summary.total_collected,
//!         summary.docs_written,
//!         format_elapsed(summary.elapsed)
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Progress
//!
//! The pipeline never prints. Subscribe to its events instead:
//!
//! ```rust,no_run
//! use siphon::core::transfer::{EventSink, TransferEvent, TransferPipeline};
//! # use siphon::adapters::memory::MemoryStore;
//! # use std::sync::Arc;
//! # async fn example(config: siphon::config::SiphonConfig) {
//! let (events, mut receiver) = EventSink::channel();
//! tokio::spawn(async move {
//!     while let Some(event) = receiver.recv().await {
//!         if let TransferEvent::BatchWritten { total_collected, .. } = event {
//!             println!("{total_collected} values so far");
//!         }
//!     }
//! });
//!
//! let mut pipeline = TransferPipeline::new(config, Arc::new(MemoryStore::new())).with_events(events);
//! let _ = pipeline.run().await;
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`] with a [`domain::SiphonError`];
//! [`domain::SiphonError::exit_code`] maps each kind to the process exit code.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
