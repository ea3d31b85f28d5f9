//! Store abstraction layer
//!
//! This module provides the trait-based seam between the transfer pipeline
//! and concrete document stores.

pub mod factory;
pub mod traits;

pub use factory::create_connector;
pub use traits::{
    AggregationOptions, Namespace, ProjectionQuery, StoreConnection, StoreConnector, ValueStream,
};
