//! Per-key min / mean / max over large `key;value` files.
//!
//! The file is split into row-aligned byte ranges ([`plan`]), each range is
//! tokenized on its own thread into a local map ([`tokenize`]), and the maps
//! are merged by the [`coordinator`] into one result rendered by [`report`].
//! Readings are kept as integers scaled by ten throughout, so sums are exact.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod data;
pub mod error;
pub mod itoa;
pub mod parse;
pub mod plan;
pub mod report;
pub mod tokenize;

pub use config::{Config, Limits};
pub use coordinator::run;
pub use data::{AggregationMap, Data};
pub use error::{Error, Result};
pub use plan::ByteRange;
pub use report::{format_report, write_report};
pub use tokenize::aggregate_slice;
