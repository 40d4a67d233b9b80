//! # Feature sources for genomic track display
//!
//! A [`FeatureSource`] answers "which features overlap `chr:start-end`?" for a
//! single track. It fetches raw features through a reader, keeps them in an
//! [`IntervalCache`](gtrack_cache::IntervalCache) covering a widened window
//! around the request, and assigns display rows so overlapping features do not
//! collide. Later queries inside the covered window are served without going
//! back to the reader.
//!
//! Sources can also be built from inline feature records, in which case they
//! never fetch at all.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gtrack_source::{FeatureSource, SourceConfig};
//!
//! # async fn run() -> gtrack_source::Result<()> {
//! let config = SourceConfig::for_file("tests/data/peaks.bed");
//! let source = FeatureSource::from_config(config, None);
//!
//! let features = source.get_features("chr1", 0, 10_000, Some(100_000)).await?;
//! for feature in features.iter() {
//!     println!("{}", feature);
//! }
//! # Ok(())
//! # }
//! ```
pub mod combiner;
pub mod config;
pub mod errors;
pub mod genome;
pub mod name_index;
pub mod planner;
pub mod popup;
pub mod reader;
pub mod source;
pub mod static_features;
pub mod whole_genome;

// re-exports
pub use self::combiner::FeatureCombiner;
pub use self::config::{Format, SourceConfig, SourceType};
pub use self::errors::{Result, SourceError};
pub use self::genome::{ChromSizesGenome, CoordinateMapper};
pub use self::name_index::NameIndex;
pub use self::planner::QueryPlanner;
pub use self::popup::{DefaultPopupFormatter, PopupEntry, PopupFormatter};
pub use self::reader::{BedReader, FeatureReader, Header, NoReader, TrackReader};
pub use self::source::FeatureSource;
pub use self::whole_genome::WholeGenomeProjector;
