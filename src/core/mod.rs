//! Core transfer logic.
//!
//! # Modules
//!
//! - [`normalize`] - Turns a projected value into its stored form
//! - [`transfer`] - Batching, write policy, and the pipeline that drives a run
//!
//! # Example
//!
//! ```rust,no_run
//! use siphon::adapters::store::create_connector;
//! use siphon::config::load_config;
//! use siphon::core::transfer::TransferPipeline;
//! use secrecy::ExposeSecret;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("siphon.toml")?;
//! let connector = create_connector(config.source.uri.expose_secret().as_ref())?;
//!
//! let summary = TransferPipeline::new(config, connector).run().await?;
//! println!("Collected: {}", summary.total_collected);
//! println!("Written: {}", summary.docs_written);
//! # Ok(())
//! # }
//! ```

pub mod normalize;
pub mod transfer;
