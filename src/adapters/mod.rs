//! External system integrations for Siphon.
//!
//! - [`store`] - Store abstraction layer (trait-based)
//! - [`mongodb`] - MongoDB implementation
//! - [`memory`] - In-memory implementation for tests and rehearsals
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with the in-memory store:
//!
//! ```rust,no_run
//! use siphon::adapters::store::create_connector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = create_connector("mongodb://127.0.0.1:27017")?;
//! let connection = connector.connect("mongodb://127.0.0.1:27017").await?;
//! connection.close().await;
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod mongodb;
pub mod store;
