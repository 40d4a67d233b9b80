pub mod feature;
pub mod genomic_interval;

// re-export for cleaner imports
pub use self::feature::{Exon, Feature, PairedEnds};
pub use self::genomic_interval::GenomicInterval;
