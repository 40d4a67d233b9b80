//! Readers that supply raw features to a [`FeatureSource`](crate::FeatureSource).
//!
//! A reader is anything implementing [`FeatureReader`]. The set of readers a
//! source can be built with is closed: [`TrackReader`] is either the generic
//! [`BedReader`] or a single caller-supplied reader type. The choice is made
//! once, when the source is constructed.

use std::future::Future;

use gtrack_core::models::Feature;

use crate::errors::Result;

pub mod bed;

pub use self::bed::BedReader;

/// Header information a reader may expose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Format named by the header, if any. Overrides the configured format.
    pub format: Option<String>,
    /// Raw header lines.
    pub lines: Vec<String>,
}

pub trait FeatureReader: Send + Sync {
    ///
    /// Read the features overlapping `chr:[start, end)`. Readers that are not
    /// indexed may return more, up to everything they hold. `Ok(None)` means
    /// nothing was available, which is not an error.
    ///
    fn read_features(
        &self,
        chr: &str,
        start: u64,
        end: u64,
    ) -> impl Future<Output = Result<Option<Vec<Feature>>>> + Send;

    fn read_header(&self) -> impl Future<Output = Result<Option<Header>>> + Send {
        async { Ok(None) }
    }

    /// Whether the reader supports efficient arbitrary-range access.
    fn indexed(&self) -> bool;
}

///
/// Placeholder reader type for sources that only use the built-in readers.
/// It has no values, so a `TrackReader<NoReader>` is always a `Bed`.
///
#[derive(Debug)]
pub enum NoReader {}

impl FeatureReader for NoReader {
    async fn read_features(&self, _chr: &str, _start: u64, _end: u64) -> Result<Option<Vec<Feature>>> {
        match *self {}
    }

    fn indexed(&self) -> bool {
        match *self {}
    }
}

/// The reader backing a non-static source.
#[derive(Debug)]
pub enum TrackReader<R = NoReader> {
    /// Generic whole-file reader, also the fallback.
    Bed(BedReader),
    /// Reader supplied explicitly by the caller.
    Custom(R),
}

impl<R: FeatureReader> FeatureReader for TrackReader<R> {
    async fn read_features(&self, chr: &str, start: u64, end: u64) -> Result<Option<Vec<Feature>>> {
        match self {
            TrackReader::Bed(reader) => reader.read_features(chr, start, end).await,
            TrackReader::Custom(reader) => reader.read_features(chr, start, end).await,
        }
    }

    async fn read_header(&self) -> Result<Option<Header>> {
        match self {
            TrackReader::Bed(reader) => reader.read_header().await,
            TrackReader::Custom(reader) => reader.read_header().await,
        }
    }

    fn indexed(&self) -> bool {
        match self {
            TrackReader::Bed(reader) => reader.indexed(),
            TrackReader::Custom(reader) => reader.indexed(),
        }
    }
}
