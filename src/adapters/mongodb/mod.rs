//! MongoDB integration
//!
//! This module provides the production store used for both the source and
//! the target side of a transfer.

pub mod client;

pub use client::{MongoConnection, MongoConnector, PROJECTION_ALIAS};
