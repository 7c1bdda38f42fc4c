//! Sales and customer analytics over a flat table of order lines.
//!
//! The core is a set of pure report functions in [`reports`] built on the
//! [`grouping`] engine, plus the [`growth`] calculator. [`loader`] and
//! [`output`] are the CSV ingestion and export collaborators used by the
//! `order-analytics` binary.

pub mod config;
pub mod error;
pub mod growth;
pub mod grouping;
pub mod loader;
pub mod output;
pub mod reports;
pub mod select;
pub mod types;
pub mod util;
pub mod window;

pub use config::ReportConfig;
pub use error::{Error, Result};
pub use types::{Column, OrderLine, OrderSet, Schema};
pub use window::{DateWindow, Granularity};
