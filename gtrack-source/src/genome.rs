//! Chromosome naming and whole-genome coordinates.
//!
//! A [`FeatureSource`](crate::FeatureSource) never interprets chromosome
//! names itself. It asks a [`CoordinateMapper`] to canonicalize names, to
//! place positions on the linear whole-genome axis, and to say which
//! chromosomes make up the whole-genome view. [`ChromSizesGenome`] is a
//! simple mapper built from a `chrom.sizes` listing.

use std::path::Path;

use fxhash::FxHashMap as HashMap;

use gtrack_core::models::genomic_interval::{WHOLE_GENOME, is_whole_genome};
use gtrack_core::utils::get_chrom_sizes;

use crate::errors::Result;

pub trait CoordinateMapper: Send + Sync {
    /// Canonical name for `name`, or `name` itself if it is unknown.
    fn get_chromosome_name(&self, name: &str) -> String;

    /// Position of `chr:position` on the whole-genome axis.
    fn get_genome_coordinate(&self, chr: &str, position: u64) -> u64;

    /// Chromosomes shown in the whole-genome view, in display order.
    fn wg_chromosome_names(&self) -> &[String];

    fn chromosome_length(&self, _chr: &str) -> Option<u64> {
        None
    }
}

///
/// A [`CoordinateMapper`] over an ordered list of chromosome sizes.
///
/// Names are matched case-insensitively and with or without a `chr` prefix,
/// and `M`/`MT` are treated as the same chromosome. The whole-genome axis
/// lays out the whole-genome chromosomes end to end in list order.
///
#[derive(Debug, Clone)]
pub struct ChromSizesGenome {
    lengths: HashMap<String, u64>,
    aliases: HashMap<String, String>,
    wg_names: Vec<String>,
    offsets: HashMap<String, u64>,
}

impl ChromSizesGenome {
    ///
    /// Build from `(name, length)` pairs. Unplaced and alternate contigs
    /// (names containing `_`) are left out of the whole-genome view.
    ///
    pub fn new(chromosomes: Vec<(String, u64)>) -> Self {
        let wg_names = chromosomes
            .iter()
            .filter(|(name, _)| !name.contains('_'))
            .map(|(name, _)| name.clone())
            .collect();
        Self::with_wg_chromosomes(chromosomes, wg_names)
    }

    /// Build with an explicit whole-genome chromosome list.
    pub fn with_wg_chromosomes(chromosomes: Vec<(String, u64)>, wg_names: Vec<String>) -> Self {
        let mut lengths: HashMap<String, u64> = HashMap::default();
        let mut aliases: HashMap<String, String> = HashMap::default();

        for (name, length) in chromosomes.iter() {
            lengths.insert(name.clone(), *length);
            for alias in name_aliases(name) {
                aliases.entry(alias).or_insert_with(|| name.clone());
            }
        }

        let mut offsets: HashMap<String, u64> = HashMap::default();
        let mut offset = 0u64;
        let wg_names: Vec<String> = wg_names
            .into_iter()
            .filter(|name| lengths.contains_key(name))
            .collect();
        for name in wg_names.iter() {
            offsets.insert(name.clone(), offset);
            offset = offset.saturating_add(lengths[name]);
        }

        ChromSizesGenome {
            lengths,
            aliases,
            wg_names,
            offsets,
        }
    }

    /// Read a `chrom.sizes` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(get_chrom_sizes(path)?))
    }

    /// Total length of the whole-genome axis.
    pub fn genome_length(&self) -> u64 {
        self.wg_names
            .iter()
            .map(|name| self.lengths[name])
            .fold(0, u64::saturating_add)
    }
}

fn name_aliases(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let bare = lower.strip_prefix("chr").unwrap_or(&lower).to_string();

    let mut aliases = vec![lower.clone(), bare.clone(), format!("chr{}", bare)];
    if bare == "m" || bare == "mt" {
        aliases.extend(["m", "mt", "chrm", "chrmt"].map(String::from));
    }
    aliases
}

impl CoordinateMapper for ChromSizesGenome {
    fn get_chromosome_name(&self, name: &str) -> String {
        if is_whole_genome(name) {
            return WHOLE_GENOME.to_string();
        }
        if self.lengths.contains_key(name) {
            return name.to_string();
        }
        self.aliases
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn get_genome_coordinate(&self, chr: &str, position: u64) -> u64 {
        let name = self.get_chromosome_name(chr);
        match self.offsets.get(&name) {
            Some(offset) => offset.saturating_add(position),
            None => position,
        }
    }

    fn wg_chromosome_names(&self) -> &[String] {
        &self.wg_names
    }

    fn chromosome_length(&self, chr: &str) -> Option<u64> {
        self.lengths.get(&self.get_chromosome_name(chr)).copied()
    }
}
