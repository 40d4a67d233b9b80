//! An immutable, per-chromosome feature cache.
//!
//! An [`IntervalCache`] is built once from a list of features and never
//! mutated afterwards. A data source that needs different data builds a new
//! cache and swaps it in whole; nothing is ever merged into an existing cache.
//!
//! Features are grouped by chromosome and sorted by start. Overlap queries
//! binary-search the start-sorted list for the first feature starting at or
//! after the query end, then walk back from the query start far enough to
//! pick up wide features that begin earlier but still reach into the query.
//! The walk is bounded by the widest feature on the chromosome, in the same
//! way a BITS index bounds its lower search with the maximum interval length.

use std::sync::{Arc, OnceLock};

use fxhash::FxHashMap as HashMap;
use tracing::trace;

use gtrack_core::models::{Feature, GenomicInterval};

/// Chromosome name to start-sorted features.
pub type FeatureMap = HashMap<String, Vec<Arc<Feature>>>;

/// The genomic range a cache is known to hold every feature for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoveredRange {
    /// The cache holds everything the source has (static or whole-file
    /// sources). Any range is contained.
    Everything,
    /// The cache holds every feature overlapping this interval.
    Interval(GenomicInterval),
}

impl CoveredRange {
    pub fn contains(&self, interval: &GenomicInterval) -> bool {
        match self {
            CoveredRange::Everything => true,
            CoveredRange::Interval(covered) => covered.contains(interval),
        }
    }
}

#[derive(Debug)]
struct ChromFeatures {
    features: Vec<Arc<Feature>>,
    /// Width of the widest feature, bounds the backward scan in queries.
    max_len: u64,
}

///
/// Immutable store of features keyed by chromosome, sorted ascending by
/// start, together with the range it covers.
///
/// A cache also carries one lazily computed, memoized whole-genome view (see
/// [`IntervalCache::whole_genome_or_init`]). Because the memo lives on the
/// cache, it is discarded together with the cache generation that produced
/// it.
///
#[derive(Debug)]
pub struct IntervalCache {
    covered: CoveredRange,
    chroms: HashMap<String, ChromFeatures>,
    all_features: FeatureMap,
    len: usize,
    whole_genome: OnceLock<Arc<Vec<Arc<Feature>>>>,
}

impl IntervalCache {
    ///
    /// Build a cache keyed by each feature's own chromosome name.
    ///
    /// # Arguments
    /// - features: features to hold, in any order
    /// - covered: the range this cache answers for
    ///
    pub fn new(features: Vec<Feature>, covered: CoveredRange) -> Self {
        Self::build(features, covered, |chr| chr.to_string())
    }

    ///
    /// Build a cache keyed by `canonical(feature.chr)`. Used when chromosome
    /// names coming from a source need aliasing to the names used in queries.
    ///
    pub fn build<F>(features: Vec<Feature>, covered: CoveredRange, canonical: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let len = features.len();
        let mut grouped: HashMap<String, Vec<Arc<Feature>>> = HashMap::default();
        for feature in features {
            let key = canonical(&feature.chr);
            grouped.entry(key).or_default().push(Arc::new(feature));
        }

        let mut chroms: HashMap<String, ChromFeatures> = HashMap::default();
        let mut all_features: FeatureMap = HashMap::default();
        chroms.reserve(grouped.len());

        for (chr, mut chr_features) in grouped.into_iter() {
            // stable, so features with equal starts keep their input order
            chr_features.sort_by_key(|f| f.start);
            let max_len = chr_features.iter().map(|f| f.width()).max().unwrap_or(0);

            all_features.insert(chr.clone(), chr_features.clone());
            chroms.insert(
                chr,
                ChromFeatures {
                    features: chr_features,
                    max_len,
                },
            );
        }

        IntervalCache {
            covered,
            chroms,
            all_features,
            len,
            whole_genome: OnceLock::new(),
        }
    }

    /// An empty cache for a range that turned out to hold no features.
    pub fn empty(covered: CoveredRange) -> Self {
        Self::new(Vec::new(), covered)
    }

    pub fn covered(&self) -> &CoveredRange {
        &self.covered
    }

    /// True if this cache answers for every range.
    pub fn is_whole_source(&self) -> bool {
        matches!(self.covered, CoveredRange::Everything)
    }

    ///
    /// True if the cache covers everything, or if its covered interval is on
    /// the same chromosome and fully contains `interval`.
    ///
    pub fn contains_range(&self, interval: &GenomicInterval) -> bool {
        self.covered.contains(interval)
    }

    ///
    /// All features on `chr` overlapping the half-open range `[start, end)`,
    /// in ascending start order. A feature `f` is returned iff
    /// `f.start < end && f.end > start`.
    ///
    /// An unknown chromosome yields an empty result.
    ///
    pub fn query_features(&self, chr: &str, start: u64, end: u64) -> Vec<Arc<Feature>> {
        let Some(chrom) = self.chroms.get(chr) else {
            trace!(chr, "query on chromosome not in cache");
            return Vec::new();
        };
        let features = &chrom.features;

        // first feature that starts at or after the query end
        let upper = features.partition_point(|f| f.start < end);

        // first feature starting at or after the query start, then walk back
        // over anything that could still reach into the query
        let mut lower = features[..upper].partition_point(|f| f.start < start);
        let floor = start.saturating_sub(chrom.max_len);
        while lower > 0 && features[lower - 1].start >= floor {
            lower -= 1;
        }

        features[lower..upper]
            .iter()
            .filter(|f| f.overlaps(start, end))
            .cloned()
            .collect()
    }

    /// Read-only view of every cached feature, keyed by chromosome.
    pub fn get_all_features(&self) -> &FeatureMap {
        &self.all_features
    }

    /// Total number of features held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    ///
    /// Return the memoized whole-genome view of this cache, computing it with
    /// `init` on first use. Later calls return the same `Arc`.
    ///
    pub fn whole_genome_or_init<F>(&self, init: F) -> Arc<Vec<Arc<Feature>>>
    where
        F: FnOnce(&FeatureMap) -> Vec<Arc<Feature>>,
    {
        Arc::clone(
            self.whole_genome
                .get_or_init(|| Arc::new(init(&self.all_features))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn spans(features: &[Arc<Feature>]) -> Vec<(u64, u64)> {
        features.iter().map(|f| (f.start, f.end)).collect()
    }

    #[fixture]
    fn cache() -> IntervalCache {
        let features = vec![
            Feature::new("chr1", 300, 400),
            Feature::new("chr1", 100, 200),
            Feature::new("chr1", 0, 10_000),
            Feature::new("chr1", 150, 250),
            Feature::new("chr2", 100, 200),
        ];
        IntervalCache::new(
            features,
            CoveredRange::Interval(GenomicInterval::new("chr1", 0, 20_000)),
        )
    }

    #[rstest]
    fn test_query_sorted_by_start(cache: IntervalCache) {
        let hits = cache.query_features("chr1", 0, 1000);
        assert_eq!(spans(&hits), vec![(0, 10_000), (100, 200), (150, 250), (300, 400)]);
    }

    #[rstest]
    fn test_query_catches_wide_feature_starting_before(cache: IntervalCache) {
        let hits = cache.query_features("chr1", 5000, 6000);
        assert_eq!(spans(&hits), vec![(0, 10_000)]);
    }

    #[rstest]
    #[case(200, 300, vec![(0, 10_000), (150, 250)])]
    #[case(250, 300, vec![(0, 10_000)])]
    #[case(399, 400, vec![(0, 10_000), (300, 400)])]
    fn test_query_half_open_boundaries(
        cache: IntervalCache,
        #[case] start: u64,
        #[case] end: u64,
        #[case] expected: Vec<(u64, u64)>,
    ) {
        assert_eq!(spans(&cache.query_features("chr1", start, end)), expected);
    }

    #[rstest]
    fn test_query_unknown_chromosome_is_empty(cache: IntervalCache) {
        assert!(cache.query_features("chr99", 0, 1000).is_empty());
    }

    #[rstest]
    fn test_contains_range(cache: IntervalCache) {
        assert!(cache.contains_range(&GenomicInterval::new("chr1", 0, 20_000)));
        assert!(cache.contains_range(&GenomicInterval::new("chr1", 500, 600)));
        assert!(!cache.contains_range(&GenomicInterval::new("chr1", 19_000, 20_001)));
        assert!(!cache.contains_range(&GenomicInterval::new("chr2", 500, 600)));
    }

    #[rstest]
    fn test_whole_source_contains_everything() {
        let cache = IntervalCache::new(vec![Feature::new("chr1", 1, 2)], CoveredRange::Everything);
        assert!(cache.is_whole_source());
        assert!(cache.contains_range(&GenomicInterval::new("chrZ", 0, u64::MAX)));
    }

    #[rstest]
    fn test_empty_cache() {
        let cache = IntervalCache::empty(CoveredRange::Interval(GenomicInterval::new(
            "chr1", 0, 100,
        )));
        assert!(cache.is_empty());
        assert!(cache.query_features("chr1", 0, 100).is_empty());
        assert!(cache.contains_range(&GenomicInterval::new("chr1", 10, 20)));
    }

    #[rstest]
    fn test_canonical_keys() {
        let cache = IntervalCache::build(
            vec![Feature::new("1", 10, 20)],
            CoveredRange::Everything,
            |chr| format!("chr{}", chr),
        );
        assert_eq!(cache.query_features("chr1", 0, 100).len(), 1);
        assert!(cache.query_features("1", 0, 100).is_empty());
        // the feature itself keeps its source name
        assert_eq!(cache.query_features("chr1", 0, 100)[0].chr, "1");
    }

    #[rstest]
    fn test_get_all_features(cache: IntervalCache) {
        let all = cache.get_all_features();
        assert_eq!(all.len(), 2);
        assert_eq!(all["chr1"].len(), 4);
        assert_eq!(all["chr1"][0].start, 0);
        assert_eq!(cache.len(), 5);
    }

    #[rstest]
    fn test_whole_genome_memo_is_reference_stable(cache: IntervalCache) {
        let mut calls = 0;
        let first = cache.whole_genome_or_init(|all| {
            calls += 1;
            all.values().flatten().cloned().collect()
        });
        let second = cache.whole_genome_or_init(|_| unreachable!());

        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 5);
    }
}
