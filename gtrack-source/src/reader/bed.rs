use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use gtrack_core::models::Feature;
use gtrack_core::utils::{get_dynamic_reader, is_header_line, parse_bed_line};

use super::{FeatureReader, Header};
use crate::errors::{Result, SourceError};

#[derive(Debug)]
struct BedData {
    header: Header,
    features: Vec<Feature>,
}

///
/// Generic, non-indexed reader over a BED-like file (gzipped or not).
///
/// The file is parsed once, on first use, and kept in memory. Every read
/// returns the whole file, so a source backed by this reader loads once and
/// then serves all queries from its cache.
///
#[derive(Debug, Default)]
pub struct BedReader {
    path: Option<PathBuf>,
    data: OnceCell<Arc<BedData>>,
}

impl BedReader {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        BedReader {
            path: Some(path.into()),
            data: OnceCell::new(),
        }
    }

    ///
    /// A reader with no file. Construction never fails; the missing path is
    /// reported on the first read.
    ///
    pub fn unconfigured() -> Self {
        BedReader::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn data(&self) -> Result<Arc<BedData>> {
        let data = self
            .data
            .get_or_try_init(|| async {
                let path = self.path.clone().ok_or(SourceError::MissingUrl)?;
                tokio::task::spawn_blocking(move || load_bed(&path))
                    .await
                    .map_err(|e| SourceError::TaskError(e.to_string()))?
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(data))
    }
}

fn load_bed(path: &Path) -> Result<BedData> {
    let reader = get_dynamic_reader(path)?;

    let mut header = Header::default();
    let mut features = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) {
            header.lines.push(line);
            continue;
        }
        if let Some(feature) = parse_bed_line(&line)? {
            features.push(feature);
        }
    }

    debug!(path = %path.display(), features = features.len(), "loaded feature file");

    Ok(BedData { header, features })
}

impl FeatureReader for BedReader {
    async fn read_features(&self, _chr: &str, _start: u64, _end: u64) -> Result<Option<Vec<Feature>>> {
        let data = self.data().await?;
        if data.features.is_empty() {
            return Ok(None);
        }
        Ok(Some(data.features.clone()))
    }

    async fn read_header(&self) -> Result<Option<Header>> {
        let data = self.data().await?;
        if data.header.lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(data.header.clone()))
    }

    fn indexed(&self) -> bool {
        false
    }
}
