use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::{FeatureError, Result};
use crate::models::{Exon, Feature};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path)
        .map_err(|e| FeatureError::FileReadError(format!("{}: {}", path.display(), e)))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    let reader = BufReader::new(file);

    Ok(reader)
}

///
/// Read a `chrom.sizes` file into an ordered list of `(name, length)` pairs.
/// File order is kept since it defines the whole-genome layout.
///
pub fn get_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<Vec<(String, u64)>> {
    let reader = get_dynamic_reader(path.as_ref())?;
    let mut chrom_sizes = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| FeatureError::ChromSizesParseError(line.clone()))?;
        let size = parts
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| FeatureError::ChromSizesParseError(line.clone()))?;

        chrom_sizes.push((name.to_string(), size));
    }

    Ok(chrom_sizes)
}

/// True for BED header lines (`track`, `browser`, `#` comments).
pub fn is_header_line(line: &str) -> bool {
    line.starts_with("track") || line.starts_with("browser") || line.starts_with('#')
}

///
/// Parse one line of a BED-like file into a [`Feature`].
///
/// Recognized columns: chr, start, end, name, score, strand, thickStart,
/// thickEnd, itemRgb, blockCount, blockSizes, blockStarts. Blocks become
/// exons. Score and strand are kept as attributes.
///
/// Returns `Ok(None)` for header and blank lines.
///
pub fn parse_bed_line(line: &str) -> Result<Option<Feature>> {
    if line.trim().is_empty() || is_header_line(line) {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 3 {
        return Err(FeatureError::FeatureParseError(line.to_string()));
    }

    let parse_pos = |v: &str| -> Result<u64> {
        v.trim()
            .parse::<u64>()
            .map_err(|_| FeatureError::FeatureParseError(line.to_string()))
    };

    let start = parse_pos(parts[1])?;
    let end = parse_pos(parts[2])?;
    if end < start {
        return Err(FeatureError::FeatureParseError(line.to_string()));
    }

    let mut feature = Feature::new(parts[0], start, end);

    if let Some(name) = parts.get(3).filter(|s| !s.is_empty() && **s != ".") {
        feature.name = Some(name.to_string());
    }
    if let Some(score) = parts.get(4).filter(|s| !s.is_empty()) {
        feature.attributes.insert("score".to_string(), score.to_string());
    }
    if let Some(strand) = parts.get(5).filter(|s| **s == "+" || **s == "-") {
        feature.attributes.insert("strand".to_string(), strand.to_string());
    }

    if parts.len() >= 12 {
        feature.exons = Some(parse_blocks(start, parts[10], parts[11], line)?);
    }

    Ok(Some(feature))
}

fn parse_blocks(start: u64, sizes: &str, starts: &str, line: &str) -> Result<Vec<Exon>> {
    let split = |v: &str| -> Result<Vec<u64>> {
        v.split(',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| FeatureError::FeatureParseError(line.to_string()))
            })
            .collect()
    };

    let sizes = split(sizes)?;
    let starts = split(starts)?;
    if sizes.len() != starts.len() {
        return Err(FeatureError::FeatureParseError(line.to_string()));
    }

    starts
        .iter()
        .zip(sizes.iter())
        .map(|(offset, size)| {
            let exon_start = start.checked_add(*offset);
            let exon_end = exon_start.and_then(|s| s.checked_add(*size));
            match (exon_start, exon_end) {
                (Some(start), Some(end)) => Ok(Exon { start, end }),
                _ => Err(FeatureError::FeatureParseError(line.to_string())),
            }
        })
        .collect()
}
