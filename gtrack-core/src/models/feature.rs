use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///
/// A sub-interval of a feature, such as an exon or a BED12 block.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Exon {
    pub start: u64,
    pub end: u64,
}

///
/// The two ends of a paired-end record (BEDPE-like), kept alongside the
/// overall extent of the feature.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairedEnds {
    pub chr1: String,
    pub start1: u64,
    pub end1: u64,
    pub chr2: String,
    pub start2: u64,
    pub end2: u64,
}

impl PairedEnds {
    pub fn is_intra_chromosomal(&self) -> bool {
        self.chr1 == self.chr2
    }
}

///
/// A displayable genomic feature: `[start, end)` on `chr`, 0-based.
///
/// `row` is the display row assigned by row packing. It is `None` until the
/// feature is packed, and is owned by whichever cache generation packed it.
///
/// `origin` is only set on derived copies (whole-genome projections) and
/// points back at the feature they were made from.
///
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    pub row: Option<u32>,

    pub name: Option<String>,
    pub gene: Option<String>,
    pub feature_type: Option<String>,
    pub exons: Option<Vec<Exon>>,
    pub pair: Option<PairedEnds>,
    pub dup: bool,
    pub attributes: BTreeMap<String, String>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub origin: Option<Arc<Feature>>,
}

impl Feature {
    pub fn new(chr: impl Into<String>, start: u64, end: u64) -> Self {
        Feature {
            chr: chr.into(),
            start,
            end,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = Some(feature_type.into());
        self
    }

    pub fn with_exons(mut self, exons: Vec<Exon>) -> Self {
        self.exons = Some(exons);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Half-open overlap test: `self.start < end && self.end > start`.
    #[inline]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && self.end > start
    }

    ///
    /// The feature this one was derived from, or itself if it is not a
    /// derived copy.
    ///
    pub fn original(&self) -> &Feature {
        match &self.origin {
            Some(origin) => origin.original(),
            None => self,
        }
    }

    /// Location string in 1-based display form, e.g. `chr1:101-200`.
    pub fn locus_string(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start + 1, self.end)
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.chr,
            self.start,
            self.end,
            self.row.map_or(String::from("."), |r| r.to_string()),
            self.name.as_deref().unwrap_or(".")
        )
    }
}
