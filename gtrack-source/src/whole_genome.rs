use std::sync::Arc;

use fxhash::FxHashSet as HashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use gtrack_cache::FeatureMap;
use gtrack_core::models::Feature;
use gtrack_core::models::genomic_interval::WHOLE_GENOME;

use crate::config::DEFAULT_MAX_WG_COUNT;
use crate::genome::CoordinateMapper;

///
/// Projects per-chromosome features onto the single whole-genome axis for an
/// overview display.
///
/// Each projected feature is a copy of the original with chromosome `all`,
/// genome-wide start and end, no exons, and `origin` pointing back at the
/// original. Chromosomes outside the mapper's whole-genome set are left out.
/// When more than `max_count` features qualify, a uniform reservoir sample of
/// `max_count` is kept. The result is sorted by projected start.
///
pub struct WholeGenomeProjector<'a> {
    genome: &'a dyn CoordinateMapper,
    max_count: usize,
    seed: Option<u64>,
}

impl<'a> WholeGenomeProjector<'a> {
    pub fn new(genome: &'a dyn CoordinateMapper) -> Self {
        WholeGenomeProjector {
            genome,
            max_count: DEFAULT_MAX_WG_COUNT,
            seed: None,
        }
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count.max(1);
        self
    }

    /// Seed the sampler, for reproducible output past the cap.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn project(&self, all_features: &FeatureMap) -> Vec<Arc<Feature>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let wg_names = self.genome.wg_chromosome_names();
        let wg_set: HashSet<&str> = wg_names.iter().map(String::as_str).collect();

        let mut projected: Vec<Arc<Feature>> = Vec::new();
        let mut seen = 0usize;

        for chr in wg_names.iter() {
            let Some(features) = all_features.get(chr) else {
                continue;
            };
            for feature in features.iter() {
                let query_chr = self.genome.get_chromosome_name(&feature.chr);
                if !wg_set.contains(query_chr.as_str()) {
                    continue;
                }

                if projected.len() < self.max_count {
                    projected.push(Arc::new(self.project_feature(feature)));
                } else {
                    // reservoir sampling keeps every feature equally likely
                    let slot = rng.random_range(0..=seen);
                    if slot < self.max_count {
                        projected[slot] = Arc::new(self.project_feature(feature));
                    }
                }
                seen += 1;
            }
        }

        projected.sort_by_key(|f| f.start);

        debug!(
            considered = seen,
            projected = projected.len(),
            "computed whole genome features"
        );

        projected
    }

    fn project_feature(&self, feature: &Arc<Feature>) -> Feature {
        let mut wg = (**feature).clone();
        wg.chr = WHOLE_GENOME.to_string();
        wg.start = self.genome.get_genome_coordinate(&feature.chr, feature.start);
        wg.end = self.genome.get_genome_coordinate(&feature.chr, feature.end);
        wg.exons = None;
        wg.origin = Some(Arc::clone(feature));
        wg
    }
}
