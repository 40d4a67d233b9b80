use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::FeatureError;

/// Name of the synthetic chromosome used for the whole-genome view.
pub const WHOLE_GENOME: &str = "all";

///
/// A genomic range `[start, end)` on a single chromosome. Used both as a
/// query argument and to mark the range a feature cache covers.
///
/// An `end` of [`GenomicInterval::TO_END`] means "to the end of the
/// chromosome".
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenomicInterval {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    /// Sentinel end position meaning "through the end of the chromosome".
    pub const TO_END: u64 = u64::MAX;

    pub fn new(chr: impl Into<String>, start: u64, end: u64) -> Self {
        GenomicInterval {
            chr: chr.into(),
            start,
            end,
        }
    }

    ///
    /// An interval spanning the whole chromosome.
    ///
    pub fn whole_chromosome(chr: impl Into<String>) -> Self {
        GenomicInterval::new(chr, 0, Self::TO_END)
    }

    pub fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Midpoint of the interval: `start + width / 2`.
    pub fn mid_point(&self) -> u64 {
        self.start + self.width() / 2
    }

    pub fn is_to_end(&self) -> bool {
        self.end == Self::TO_END
    }

    pub fn is_whole_genome(&self) -> bool {
        is_whole_genome(&self.chr)
    }

    ///
    /// True if `other` lies entirely inside this interval on the same
    /// chromosome.
    ///
    pub fn contains(&self, other: &GenomicInterval) -> bool {
        self.chr == other.chr && self.start <= other.start && other.end <= self.end
    }

    /// Half-open overlap test against `[start, end)`.
    #[inline]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && self.end > start
    }
}

/// True if `chr` names the synthetic whole-genome chromosome.
pub fn is_whole_genome(chr: &str) -> bool {
    chr.eq_ignore_ascii_case(WHOLE_GENOME)
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_to_end() {
            write!(f, "{}:{}-", self.chr, self.start)
        } else {
            write!(f, "{}:{}-{}", self.chr, self.start, self.end)
        }
    }
}

impl FromStr for GenomicInterval {
    type Err = FeatureError;

    ///
    /// Parse `chr:start-end`, `chr:start-` or a bare `chr` (whole chromosome).
    /// Commas in positions are ignored, so `chr1:1,000-2,000` is accepted.
    ///
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FeatureError::RegionParseError(s.to_string()));
        }

        let Some((chr, range)) = s.rsplit_once(':') else {
            return Ok(GenomicInterval::whole_chromosome(s));
        };

        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| FeatureError::RegionParseError(s.to_string()))?;

        let parse = |v: &str| -> Result<u64, FeatureError> {
            v.replace(',', "")
                .parse::<u64>()
                .map_err(|_| FeatureError::RegionParseError(s.to_string()))
        };

        let start = parse(start)?;
        let end = match end.trim() {
            "" => Self::TO_END,
            v => parse(v)?,
        };

        if end < start {
            return Err(FeatureError::RegionParseError(s.to_string()));
        }

        Ok(GenomicInterval::new(chr, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("chr1:100-200", GenomicInterval::new("chr1", 100, 200))]
    #[case("chr1:1,000-2,000", GenomicInterval::new("chr1", 1000, 2000))]
    #[case("chr2:50-", GenomicInterval::new("chr2", 50, GenomicInterval::TO_END))]
    #[case("chrX", GenomicInterval::whole_chromosome("chrX"))]
    #[case("all", GenomicInterval::whole_chromosome("all"))]
    fn test_parse_interval(#[case] input: &str, #[case] expected: GenomicInterval) {
        let parsed: GenomicInterval = input.parse().unwrap();
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case("")]
    #[case("chr1:abc-200")]
    #[case("chr1:300-200")]
    #[case("chr1:300")]
    fn test_parse_interval_errors(#[case] input: &str) {
        assert!(input.parse::<GenomicInterval>().is_err());
    }

    #[rstest]
    fn test_contains() {
        let outer = GenomicInterval::new("chr1", 100, 1000);

        assert!(outer.contains(&GenomicInterval::new("chr1", 100, 1000)));
        assert!(outer.contains(&GenomicInterval::new("chr1", 200, 300)));
        assert!(!outer.contains(&GenomicInterval::new("chr1", 50, 300)));
        assert!(!outer.contains(&GenomicInterval::new("chr1", 900, 1001)));
        assert!(!outer.contains(&GenomicInterval::new("chr2", 200, 300)));
    }

    #[rstest]
    fn test_mid_point_and_width() {
        let interval = GenomicInterval::new("chr1", 1000, 1100);
        assert_eq!(interval.width(), 100);
        assert_eq!(interval.mid_point(), 1050);
    }

    #[rstest]
    fn test_display_round_trip() {
        let interval = GenomicInterval::new("chr3", 5, 10);
        assert_eq!(interval.to_string(), "chr3:5-10");
        assert_eq!(GenomicInterval::whole_chromosome("chr3").to_string(), "chr3:0-");
    }

    #[rstest]
    fn test_is_whole_genome() {
        assert!(is_whole_genome("all"));
        assert!(is_whole_genome("ALL"));
        assert!(!is_whole_genome("chr1"));
    }
}
