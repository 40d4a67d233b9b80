//! The feature source: cache lookup, fetch, combine, pack and swap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

use gtrack_cache::{CoveredRange, IntervalCache, pack_features_by};
use gtrack_core::models::genomic_interval::is_whole_genome;
use gtrack_core::models::{Feature, GenomicInterval};

use crate::combiner::FeatureCombiner;
use crate::config::{FeatureRecord, Format, SourceConfig, SourceType};
use crate::errors::{Result, SourceError};
use crate::genome::CoordinateMapper;
use crate::name_index::NameIndex;
use crate::planner::QueryPlanner;
use crate::reader::{BedReader, FeatureReader, Header, NoReader, TrackReader};
use crate::static_features::{apply_mappings, records_to_features};
use crate::whole_genome::WholeGenomeProjector;

///
/// A track's feature source.
///
/// Answers range queries from an [`IntervalCache`], fetching through its
/// reader only when the cache does not cover the requested range. Each fetch
/// builds a complete new cache (filtered, combined, row packed) and swaps it
/// in as one step, so concurrent readers see either the old cache or the new
/// one.
///
/// A source built from inline features is static: it has no reader and its
/// cache covers everything for the source's whole life.
///
/// Overlapping fetches are not serialized. If two misses are in flight, the
/// one that completes last installs its cache.
///
pub struct FeatureSource<R = NoReader> {
    config: SourceConfig,
    format: RwLock<Option<Format>>,
    reader: Option<TrackReader<R>>,
    genome: Option<Arc<dyn CoordinateMapper>>,
    combiner: Option<Box<dyn FeatureCombiner>>,
    planner: QueryPlanner,
    cache: RwLock<Option<Arc<IntervalCache>>>,
    queryable: OnceLock<bool>,
    header: OnceCell<Header>,
    generation: AtomicU64,
}

impl FeatureSource<NoReader> {
    ///
    /// Build a source from configuration alone. Inline `features` make a
    /// static source; anything else is read by the generic file reader.
    ///
    pub fn from_config(config: SourceConfig, genome: Option<Arc<dyn CoordinateMapper>>) -> Self {
        Self::select(config, None, genome)
    }
}

impl<R: FeatureReader> FeatureSource<R> {
    ///
    /// Build a source around an explicit reader. Inline `features` in the
    /// config still take precedence and make the source static.
    ///
    pub fn with_reader(
        config: SourceConfig,
        reader: R,
        genome: Option<Arc<dyn CoordinateMapper>>,
    ) -> Self {
        Self::select(config, Some(reader), genome)
    }

    /// Combiner for gene-model formats (GFF, GFF3, GTF).
    pub fn with_combiner<C: FeatureCombiner + 'static>(mut self, combiner: C) -> Self {
        self.combiner = Some(Box::new(combiner));
        self
    }

    // Precedence: inline features, explicit reader, source-type reader, then
    // the generic file reader. This is the only place a reader is chosen.
    fn select(
        mut config: SourceConfig,
        explicit: Option<R>,
        genome: Option<Arc<dyn CoordinateMapper>>,
    ) -> Self {
        let planner = QueryPlanner::new(config.expand_query).with_min_query_size(config.min_query_size);
        let format = RwLock::new(config.format.clone());

        let queryable = OnceLock::new();
        if let Some(q) = config.queryable {
            let _ = queryable.set(q);
        }

        let mut source = FeatureSource {
            config: SourceConfig::default(),
            format,
            reader: None,
            genome,
            combiner: None,
            planner,
            cache: RwLock::new(None),
            queryable,
            header: OnceCell::new(),
            generation: AtomicU64::new(0),
        };

        if let Some(records) = config.features.take() {
            debug!(records = records.len(), "building static feature source");
            let cache = source.build_static(&config, records);
            source.queryable = OnceLock::from(false);
            *source.cache.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(cache));
            source.config = config;
            return source;
        }

        let bed = |config: &SourceConfig| match &config.url {
            Some(url) => BedReader::new(url.clone()),
            None => BedReader::unconfigured(),
        };

        source.reader = Some(match (explicit, &config.source_type) {
            (Some(reader), _) => TrackReader::Custom(reader),
            (None, Some(SourceType::File)) | (None, None) => TrackReader::Bed(bed(&config)),
            (None, Some(other)) => {
                warn!(source_type = %other, "no reader for source type, using the file reader");
                TrackReader::Bed(bed(&config))
            }
        });
        source.config = config;
        source
    }

    fn build_static(&self, config: &SourceConfig, mut records: Vec<FeatureRecord>) -> IntervalCache {
        if let Some(mappings) = &config.mappings {
            apply_mappings(&mut records, mappings);
        }
        let features = records_to_features(&records);
        let features = prepare_features(features, config, config.format.as_ref(), None, |chr| {
            self.canonical_chr(chr)
        });
        IntervalCache::build(features, CoveredRange::Everything, |chr| self.canonical_chr(chr))
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// True for sources built from inline features.
    pub fn is_static(&self) -> bool {
        self.reader.is_none()
    }

    ///
    /// Whether the source supports arbitrary ranged access. `None` until it
    /// is configured or inferred from the reader on the first fetch.
    ///
    pub fn is_queryable(&self) -> Option<bool> {
        self.queryable.get().copied()
    }

    /// Whole-genome view is only offered for sources that load everything.
    pub fn supports_whole_genome(&self) -> bool {
        !self.is_queryable().unwrap_or(false)
    }

    /// Effective format: configured, or as named by the reader's header.
    pub fn format(&self) -> Option<Format> {
        self.format
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The cache currently in use, if any fetch has completed.
    pub fn current_cache(&self) -> Option<Arc<IntervalCache>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn canonical_chr(&self, chr: &str) -> String {
        match &self.genome {
            Some(genome) => genome.get_chromosome_name(chr),
            None => chr.to_string(),
        }
    }

    ///
    /// Read the reader's header once and keep it. A header naming a format
    /// overrides the configured one. Static sources have an empty header.
    ///
    pub async fn get_header(&self) -> Result<Header> {
        let header = self
            .header
            .get_or_try_init(|| async {
                let header = match &self.reader {
                    Some(reader) => reader.read_header().await?.unwrap_or_default(),
                    None => Header::default(),
                };
                if let Some(format) = &header.format {
                    *self.format.write().unwrap_or_else(PoisonError::into_inner) =
                        Some(Format::from(format.as_str()));
                }
                Ok::<_, SourceError>(header)
            })
            .await?;
        Ok(header.clone())
    }

    ///
    /// Features on `chr` overlapping `[start, end)`, in ascending start
    /// order.
    ///
    /// Served from the cache when it covers the range; otherwise fetched
    /// through the reader first. For the whole-genome chromosome (`all`) the
    /// memoized whole-genome projection is returned, or nothing for
    /// queryable sources. `visibility_window` falls back to the configured
    /// one.
    ///
    /// Reader failures are returned as-is; nothing is retried.
    ///
    pub async fn get_features(
        &self,
        chr: &str,
        start: u64,
        end: u64,
        visibility_window: Option<i64>,
    ) -> Result<Vec<Arc<Feature>>> {
        self.fetch_features(chr, start, end, visibility_window, None)
            .await
    }

    ///
    /// Like [`get_features`](Self::get_features), and if the source is
    /// searchable, features of any newly built cache are added to `index`.
    ///
    pub async fn get_features_with_index(
        &self,
        chr: &str,
        start: u64,
        end: u64,
        visibility_window: Option<i64>,
        index: &mut NameIndex,
    ) -> Result<Vec<Arc<Feature>>> {
        self.fetch_features(chr, start, end, visibility_window, Some(index))
            .await
    }

    /// Add every feature of a searchable static source to `index`.
    pub fn index_static(&self, index: &mut NameIndex) {
        if !(self.is_static() && self.config.searchable) {
            return;
        }
        if let Some(cache) = self.current_cache() {
            index.insert_features(cache.get_all_features().values().flatten());
        }
    }

    ///
    /// The whole-genome projection of the current cache, computed on first
    /// use and kept until the cache is replaced. `None` if nothing is loaded
    /// yet or the source does not support the whole-genome view.
    ///
    pub fn whole_genome_features(&self) -> Option<Arc<Vec<Arc<Feature>>>> {
        if !self.supports_whole_genome() {
            return None;
        }
        self.current_cache()
            .map(|cache| self.whole_genome_from(&cache))
    }

    fn whole_genome_from(&self, cache: &IntervalCache) -> Arc<Vec<Arc<Feature>>> {
        cache.whole_genome_or_init(|all| match &self.genome {
            Some(genome) => WholeGenomeProjector::new(genome.as_ref())
                .with_max_count(self.config.max_wg_count)
                .project(all),
            None => {
                warn!("whole genome view needs a genome to place features, returning nothing");
                Vec::new()
            }
        })
    }

    async fn fetch_features(
        &self,
        chr: &str,
        start: u64,
        end: u64,
        visibility_window: Option<i64>,
        index: Option<&mut NameIndex>,
    ) -> Result<Vec<Arc<Feature>>> {
        let query_chr = self.canonical_chr(chr);
        let whole_genome = is_whole_genome(&query_chr);

        if whole_genome && !self.supports_whole_genome() {
            trace!("whole genome view not supported by queryable source");
            return Ok(Vec::new());
        }

        let interval = GenomicInterval::new(query_chr.clone(), start, end);
        let cached = self.current_cache().filter(|cache| {
            self.is_static() || (!self.config.disable_cache && cache.contains_range(&interval))
        });

        let cache = match cached {
            Some(cache) => {
                trace!(%interval, "feature cache hit");
                cache
            }
            None => {
                let window = visibility_window.or(self.config.visibility_window);
                self.load_features(&interval, window, index).await?
            }
        };

        if whole_genome {
            // the fetch may have just revealed an indexed reader
            if !self.supports_whole_genome() {
                return Ok(Vec::new());
            }
            return Ok(self.whole_genome_from(&cache).as_ref().clone());
        }

        Ok(cache.query_features(&query_chr, start, end))
    }

    async fn load_features(
        &self,
        interval: &GenomicInterval,
        visibility_window: Option<i64>,
        index: Option<&mut NameIndex>,
    ) -> Result<Arc<IntervalCache>> {
        let Some(reader) = &self.reader else {
            // static sources always have a cache
            return Ok(self
                .current_cache()
                .unwrap_or_else(|| Arc::new(IntervalCache::empty(CoveredRange::Everything))));
        };

        let length = self
            .genome
            .as_ref()
            .and_then(|genome| genome.chromosome_length(&interval.chr));
        let fetch = self
            .planner
            .plan_with_length(interval, visibility_window, length);

        debug!(requested = %interval, fetch = %fetch, "feature cache miss, fetching");

        let started_at = self.generation.load(Ordering::Acquire);
        let raw = reader
            .read_features(&fetch.chr, fetch.start, fetch.end)
            .await?;

        let queryable = *self.queryable.get_or_init(|| reader.indexed());
        let covered = match queryable {
            true => CoveredRange::Interval(fetch),
            false => CoveredRange::Everything,
        };

        let cache = match raw {
            Some(features) => {
                let format = self.format();
                let features = prepare_features(
                    features,
                    &self.config,
                    format.as_ref(),
                    self.combiner.as_deref(),
                    |chr| self.canonical_chr(chr),
                );
                IntervalCache::build(features, covered, |chr| self.canonical_chr(chr))
            }
            None => IntervalCache::empty(covered),
        };
        let cache = Arc::new(cache);

        if self.config.searchable {
            if let Some(index) = index {
                index.insert_features(cache.get_all_features().values().flatten());
            }
        }

        self.install(Arc::clone(&cache), started_at);
        Ok(cache)
    }

    fn install(&self, cache: Arc<IntervalCache>, started_at: u64) {
        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let previous = self.generation.fetch_add(1, Ordering::AcqRel);
        if previous != started_at {
            debug!(
                started_at,
                previous, "a newer fetch finished first, replacing its cache anyway"
            );
        }
        debug!(features = cache.len(), covered = ?cache.covered(), "installed feature cache");
        *slot = Some(cache);
    }
}

///
/// Ingest steps between reading and caching: drop filtered feature types,
/// combine gene-model fragments, then row pack unless the track is a
/// continuous signal or junctions. Rows are assigned per `chromosome(chr)`,
/// the same key the cache groups by.
///
fn prepare_features<F>(
    mut features: Vec<Feature>,
    config: &SourceConfig,
    format: Option<&Format>,
    combiner: Option<&dyn FeatureCombiner>,
    chromosome: F,
) -> Vec<Feature>
where
    F: Fn(&str) -> String,
{
    if !config.filter_types.is_empty() {
        features.retain(|f| match &f.feature_type {
            Some(t) => !config.filter_types.iter().any(|ft| ft == t),
            None => true,
        });
    }

    if format.is_some_and(Format::is_gene_model) {
        match combiner {
            Some(combiner) => features = combiner.combine_features(features),
            None => warn!("gene model format without a combiner, features left uncombined"),
        }
    }

    let skip_packing = format.is_some_and(Format::is_continuous) || config.is_junctions();
    if !skip_packing {
        pack_features_by(&mut features, config.max_rows(), chromosome);
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn config_with(format: Option<Format>, track_type: Option<&str>) -> SourceConfig {
        SourceConfig {
            format,
            track_type: track_type.map(String::from),
            ..Default::default()
        }
    }

    fn overlapping() -> Vec<Feature> {
        vec![Feature::new("1", 0, 100), Feature::new("1", 50, 150)]
    }

    #[rstest]
    fn test_prepare_packs_by_default() {
        let features = prepare_features(overlapping(), &config_with(None, None), None, None, str::to_string);
        assert_eq!(features.iter().map(|f| f.row).collect::<Vec<_>>(), vec![Some(0), Some(1)]);
    }

    #[rstest]
    #[case(Some(Format::Wig), None)]
    #[case(Some(Format::BedGraph), None)]
    #[case(Some(Format::Bed), Some("junctions"))]
    fn test_prepare_skips_packing(#[case] format: Option<Format>, #[case] track_type: Option<&str>) {
        let config = config_with(format.clone(), track_type);
        let features = prepare_features(overlapping(), &config, format.as_ref(), None, str::to_string);
        assert!(features.iter().all(|f| f.row.is_none()));
    }

    #[rstest]
    fn test_prepare_filters_types() {
        let features = vec![
            Feature::new("1", 0, 1000).with_type("chromosome"),
            Feature::new("1", 10, 20).with_type("gene"),
            Feature::new("1", 30, 40),
        ];
        let prepared = prepare_features(features, &config_with(None, None), None, None, str::to_string);
        assert_eq!(prepared.len(), 2);
        assert!(prepared.iter().all(|f| f.feature_type.as_deref() != Some("chromosome")));
    }

    #[rstest]
    #[case(Format::Gff3, 1)]
    #[case(Format::Gtf, 1)]
    #[case(Format::Bed, 2)]
    fn test_prepare_combines_gene_models(#[case] format: Format, #[case] expected: usize) {
        let merge = |features: Vec<Feature>| -> Vec<Feature> {
            let start = features.iter().map(|f| f.start).min().unwrap_or(0);
            let end = features.iter().map(|f| f.end).max().unwrap_or(0);
            vec![Feature::new("1", start, end).with_name("transcript")]
        };
        let config = config_with(Some(format.clone()), None);
        let prepared = prepare_features(
            overlapping(),
            &config,
            Some(&format),
            Some(&merge as &dyn FeatureCombiner),
            str::to_string,
        );
        assert_eq!(prepared.len(), expected);
    }
}
