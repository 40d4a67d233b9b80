//! Core models for gtrack.
//!
//! This crate holds the data types shared by the rest of the workspace:
//!
//! - [`Feature`](models::Feature): a displayable genomic interval with a row
//!   assignment and source-specific attributes
//! - [`GenomicInterval`](models::GenomicInterval): a bare `chr:start-end`
//!   range used both for queries and for recording what a cache covers
//!
//! It also provides small file helpers for reading BED-like text and
//! `chrom.sizes` files, gzipped or not.
//!
//! # Example
//!
//! ```
//! use gtrack_core::models::{Feature, GenomicInterval};
//!
//! let feature = Feature::new("chr1", 100, 200).with_name("BRCA1");
//! let view: GenomicInterval = "chr1:150-300".parse().unwrap();
//!
//! assert!(feature.overlaps(view.start, view.end));
//! ```

pub mod errors;
pub mod models;
pub mod utils;

// re-exports
pub use errors::{FeatureError, Result};
