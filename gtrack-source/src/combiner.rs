use gtrack_core::models::Feature;

///
/// Merges fragment records of gene-model formats (exon, CDS, UTR rows) into
/// composite transcript features. Only called for GFF, GFF3 and GTF sources.
///
/// Any `Fn(Vec<Feature>) -> Vec<Feature>` is a combiner.
///
pub trait FeatureCombiner: Send + Sync {
    fn combine_features(&self, features: Vec<Feature>) -> Vec<Feature>;
}

impl<F> FeatureCombiner for F
where
    F: Fn(Vec<Feature>) -> Vec<Feature> + Send + Sync,
{
    fn combine_features(&self, features: Vec<Feature>) -> Vec<Feature> {
        self(features)
    }
}
