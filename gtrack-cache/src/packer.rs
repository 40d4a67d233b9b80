use fxhash::FxHashMap as HashMap;
use tracing::debug;

use gtrack_core::models::Feature;

/// Row cap used when a source does not configure one.
pub const DEFAULT_MAX_ROWS: usize = 1000;

///
/// Assign each feature a display row so that features sharing a row on the
/// same chromosome never overlap.
///
/// Features are grouped by chromosome and each group is packed on its own,
/// so row numbering restarts at 0 on every chromosome. Within a chromosome,
/// features are visited in ascending start order and each goes into the
/// lowest row whose last feature ended at or before its start. A new row is
/// opened when none is free, up to `max_rows`. Past that cap, features are
/// put on the last row even though they overlap it.
///
/// With an unbounded cap this is the classic greedy interval partitioning and
/// uses the minimum possible number of rows.
///
/// The slice itself is not reordered; only `row` is written.
///
/// # Arguments
/// - features: features to pack, on any number of chromosomes, in any order
/// - max_rows: maximum number of rows per chromosome (values below 1 act as 1)
///
/// # Examples
///
/// ```
/// use gtrack_cache::pack_features;
/// use gtrack_core::models::Feature;
///
/// let mut features = vec![
///     Feature::new("chr1", 100, 200),
///     Feature::new("chr1", 150, 250),
///     Feature::new("chr2", 150, 250),
/// ];
/// pack_features(&mut features, 10);
///
/// assert_eq!(features[0].row, Some(0));
/// assert_eq!(features[1].row, Some(1));
/// assert_eq!(features[2].row, Some(0));
/// ```
pub fn pack_features(features: &mut [Feature], max_rows: usize) {
    pack_features_by(features, max_rows, str::to_string);
}

///
/// Like [`pack_features`], but features are grouped by `chromosome(chr)`
/// instead of the raw name. Use the same mapping the features will be cached
/// under, so that aliases of one chromosome (`1`, `chr1`) share their rows.
///
pub fn pack_features_by<F>(features: &mut [Feature], max_rows: usize, chromosome: F)
where
    F: Fn(&str) -> String,
{
    if features.is_empty() {
        return;
    }
    let max_rows = max_rows.max(1);

    // segregate by chromosome, remembering first-seen order
    let mut chr_order: Vec<String> = Vec::new();
    let mut by_chr: HashMap<String, Vec<usize>> = HashMap::default();
    for (idx, feature) in features.iter().enumerate() {
        let key = chromosome(&feature.chr);
        let entry = by_chr.entry(key).or_insert_with_key(|key| {
            chr_order.push(key.clone());
            Vec::new()
        });
        entry.push(idx);
    }

    for chr in chr_order.iter() {
        if let Some(indices) = by_chr.remove(chr) {
            pack_chromosome(features, indices, max_rows);
        }
    }
}

fn pack_chromosome(features: &mut [Feature], mut indices: Vec<usize>, max_rows: usize) {
    indices.sort_by_key(|&idx| features[idx].start);

    // end position of the last feature placed on each row
    let mut row_ends: Vec<u64> = Vec::new();
    let mut overflowed = 0usize;

    for idx in indices {
        let feature = &mut features[idx];

        let row = match row_ends.iter().position(|&row_end| row_end <= feature.start) {
            Some(row) => {
                row_ends[row] = feature.end;
                row
            }
            None if row_ends.len() < max_rows => {
                row_ends.push(feature.end);
                row_ends.len() - 1
            }
            None => {
                let last = row_ends.len() - 1;
                row_ends[last] = row_ends[last].max(feature.end);
                overflowed += 1;
                last
            }
        };

        feature.row = Some(row as u32);
    }

    if overflowed > 0 {
        debug!(
            rows = row_ends.len(),
            overflowed, "row cap reached, overlapping features share the last row"
        );
    }
}
