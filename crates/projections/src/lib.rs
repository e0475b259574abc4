//! Read models and projections for the fulfillment query side.
//!
//! This crate provides the query side over the tracking ledger:
//! - [`Projection`] trait for processing ledger entries into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding entries from the ledger to projections
//! - Three views: active shipments, open returns, code directory

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{ActiveShipmentsView, CodeDirectoryView, OpenReturnsView};
