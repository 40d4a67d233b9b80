//! Construction-time handling of inline (static) feature records.
//!
//! Inline records arrive as loose JSON-like objects. Before they become
//! [`Feature`]s, configured property aliases are applied, and paired-end
//! records (those with `chr1`/`chr2` instead of `chr`) get an overall extent.
//! Paired-end records whose ends lie on different chromosomes are split into
//! one feature per end; the second copy is flagged `dup`.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use gtrack_core::models::{Exon, Feature, PairedEnds};

use crate::config::FeatureRecord;

/// Keys consumed into dedicated [`Feature`] fields rather than attributes.
const RESERVED_KEYS: &[&str] = &[
    "chr", "start", "end", "name", "gene", "type", "exons", "row", "chr1", "start1", "end1",
    "chr2", "start2", "end2",
];

///
/// Copy properties according to `mappings` (target key -> source key), in
/// place. Targets whose source key is absent are left alone.
///
pub fn apply_mappings(records: &mut [FeatureRecord], mappings: &BTreeMap<String, String>) {
    for record in records.iter_mut() {
        for (target, source) in mappings.iter() {
            if let Some(value) = record.get(source).cloned() {
                record.insert(target.clone(), value);
            }
        }
    }
}

/// True if the record describes a pair of intervals rather than one.
pub fn is_paired_record(record: &FeatureRecord) -> bool {
    record.contains_key("chr1") && record.contains_key("chr2")
}

///
/// Convert inline records to features. Records missing a chromosome or
/// coordinates, or with `end < start`, are skipped with a warning.
///
/// Inter-chromosomal paired records produce two features; the duplicates are
/// appended after all other features.
///
pub fn records_to_features(records: &[FeatureRecord]) -> Vec<Feature> {
    let mut features = Vec::with_capacity(records.len());
    let mut duplicates = Vec::new();

    for record in records.iter() {
        if is_paired_record(record) {
            match paired_to_features(record) {
                Some((feature, dup)) => {
                    features.push(feature);
                    duplicates.extend(dup);
                }
                None => warn!(?record, "skipping malformed paired-end feature record"),
            }
        } else {
            match record_to_feature(record) {
                Some(feature) => features.push(feature),
                None => warn!(?record, "skipping malformed feature record"),
            }
        }
    }

    features.extend(duplicates);
    features
}

fn record_to_feature(record: &FeatureRecord) -> Option<Feature> {
    let chr = get_string(record, "chr")?;
    let start = get_u64(record, "start")?;
    let end = get_u64(record, "end")?;
    if end < start {
        return None;
    }

    let mut feature = Feature::new(chr, start, end);
    fill_common(&mut feature, record);
    Some(feature)
}

fn paired_to_features(record: &FeatureRecord) -> Option<(Feature, Option<Feature>)> {
    let pair = PairedEnds {
        chr1: get_string(record, "chr1")?,
        start1: get_u64(record, "start1")?,
        end1: get_u64(record, "end1")?,
        chr2: get_string(record, "chr2")?,
        start2: get_u64(record, "start2")?,
        end2: get_u64(record, "end2")?,
    };
    if pair.end1 < pair.start1 || pair.end2 < pair.start2 {
        return None;
    }

    if pair.is_intra_chromosomal() {
        let mut feature = Feature::new(
            pair.chr1.clone(),
            pair.start1.min(pair.start2),
            pair.end1.max(pair.end2),
        );
        fill_common(&mut feature, record);
        feature.pair = Some(pair);
        return Some((feature, None));
    }

    let mut first = Feature::new(pair.chr1.clone(), pair.start1, pair.end1);
    fill_common(&mut first, record);

    let mut second = first.clone();
    second.chr = pair.chr2.clone();
    second.start = pair.start2;
    second.end = pair.end2;
    second.dup = true;

    first.pair = Some(pair.clone());
    second.pair = Some(pair);

    Some((first, Some(second)))
}

fn fill_common(feature: &mut Feature, record: &FeatureRecord) {
    feature.name = get_string(record, "name");
    feature.gene = get_string(record, "gene");
    feature.feature_type = get_string(record, "type");
    feature.exons = record.get("exons").and_then(parse_exons);

    for (key, value) in record.iter() {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(value) = value_to_string(value) {
            feature.attributes.insert(key.clone(), value);
        }
    }
}

fn parse_exons(value: &Value) -> Option<Vec<Exon>> {
    value
        .as_array()?
        .iter()
        .map(|exon| {
            let exon = exon.as_object()?;
            Some(Exon {
                start: get_u64(exon, "start")?,
                end: get_u64(exon, "end")?,
            })
        })
        .collect()
}

fn get_string(record: &FeatureRecord, key: &str) -> Option<String> {
    record.get(key).and_then(value_to_string)
}

fn get_u64(record: &FeatureRecord, key: &str) -> Option<u64> {
    match record.get(key)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    fn record(value: Value) -> FeatureRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    #[rstest]
    fn test_plain_record() {
        let records = vec![record(json!({
            "chr": "1", "start": 100, "end": "200", "name": "a",
            "type": "gene", "score": 5, "exons": [{"start": 100, "end": 120}]
        }))];
        let features = records_to_features(&records);

        assert_eq!(features.len(), 1);
        let f = &features[0];
        assert_eq!((f.chr.as_str(), f.start, f.end), ("1", 100, 200));
        assert_eq!(f.name.as_deref(), Some("a"));
        assert_eq!(f.feature_type.as_deref(), Some("gene"));
        assert_eq!(f.attributes.get("score").map(String::as_str), Some("5"));
        assert_eq!(f.exons, Some(vec![Exon { start: 100, end: 120 }]));
        assert_eq!(f.dup, false);
    }

    #[rstest]
    fn test_malformed_records_are_skipped() {
        let records = vec![
            record(json!({"chr": "1", "start": 100})),
            record(json!({"start": 1, "end": 2})),
            record(json!({"chr": "1", "start": 300, "end": 200})),
            record(json!({"chr": "1", "start": 1, "end": 2})),
        ];
        assert_eq!(records_to_features(&records).len(), 1);
    }

    #[rstest]
    fn test_intra_chromosomal_pair_gets_overall_extent() {
        let records = vec![record(json!({
            "chr1": "1", "start1": 500, "end1": 600,
            "chr2": "1", "start2": 100, "end2": 200
        }))];
        let features = records_to_features(&records);

        assert_eq!(features.len(), 1);
        assert_eq!((features[0].chr.as_str(), features[0].start, features[0].end), ("1", 100, 600));
        assert!(features[0].pair.is_some());
    }

    #[rstest]
    fn test_inter_chromosomal_pair_is_split() {
        let records = vec![
            record(json!({
                "chr1": "1", "start1": 100, "end1": 200,
                "chr2": "2", "start2": 300, "end2": 400, "name": "fusion"
            })),
            record(json!({"chr": "3", "start": 1, "end": 2})),
        ];
        let features = records_to_features(&records);

        assert_eq!(features.len(), 3);

        let first = &features[0];
        assert_eq!((first.chr.as_str(), first.start, first.end), ("1", 100, 200));
        assert_eq!(first.dup, false);

        // duplicates come last
        let second = &features[2];
        assert_eq!((second.chr.as_str(), second.start, second.end), ("2", 300, 400));
        assert_eq!(second.dup, true);
        assert_eq!(second.name.as_deref(), Some("fusion"));
        assert_eq!(first.pair, second.pair);
    }

    #[rstest]
    fn test_apply_mappings() {
        let mut records = vec![record(json!({"chrom": "chr5", "chromStart": 1, "chromEnd": 9}))];
        let mappings: BTreeMap<String, String> = [
            ("chr", "chrom"),
            ("start", "chromStart"),
            ("end", "chromEnd"),
            ("name", "missing"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        apply_mappings(&mut records, &mappings);
        assert!(!records[0].contains_key("name"));

        let features = records_to_features(&records);
        assert_eq!(features.len(), 1);
        assert_eq!((features[0].chr.as_str(), features[0].start, features[0].end), ("chr5", 1, 9));
        // the original keys stay on as attributes
        assert_eq!(features[0].attributes.get("chrom").map(String::as_str), Some("chr5"));
    }
}
