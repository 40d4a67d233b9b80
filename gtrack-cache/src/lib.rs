//! Feature caching and row packing for genomic track display.
//!
//! This crate provides the two pure building blocks a track data source is
//! made of:
//!
//! - [`IntervalCache`]: an immutable, per-chromosome, start-sorted store of
//!   features plus the range it is known to cover. It answers "is this view
//!   already loaded?" and "which features overlap this range?".
//! - [`pack_features`]: greedy assignment of features to display rows so
//!   that features sharing a row never overlap.
//!
//! ## Quick Start
//!
//! ```rust
//! use gtrack_cache::{CoveredRange, IntervalCache, pack_features};
//! use gtrack_core::models::{Feature, GenomicInterval};
//!
//! let mut features = vec![
//!     Feature::new("1", 100, 200),
//!     Feature::new("1", 150, 250),
//!     Feature::new("1", 300, 400),
//! ];
//! pack_features(&mut features, 10);
//!
//! let covered = GenomicInterval::new("1", 0, 1000);
//! let cache = IntervalCache::new(features, CoveredRange::Interval(covered));
//!
//! assert!(cache.contains_range(&GenomicInterval::new("1", 100, 500)));
//!
//! let hits = cache.query_features("1", 160, 170);
//! assert_eq!(hits.len(), 2);
//! assert_eq!(hits[1].row, Some(1));
//! ```

/// Per-chromosome feature cache.
///
/// See [`IntervalCache`] for details.
pub mod interval_cache;

/// Greedy display row packing.
///
/// See [`pack_features`] for details.
pub mod packer;

// re-exports
pub use self::interval_cache::{CoveredRange, FeatureMap, IntervalCache};
pub use self::packer::{DEFAULT_MAX_ROWS, pack_features, pack_features_by};
