use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use gtrack_cache::DEFAULT_MAX_ROWS;

/// Whole-genome projections are sampled down to this many features by default.
pub const DEFAULT_MAX_WG_COUNT: usize = 10_000;

/// A raw inline feature record, as given in the `features` config key.
pub type FeatureRecord = Map<String, Value>;

///
/// Which kind of reader backs a source. Unknown values are kept and fall back
/// to the generic file reader.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    File,
    Custom,
    Other(String),
}

impl From<String> for SourceType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "file" => SourceType::File,
            "custom" => SourceType::Custom,
            _ => SourceType::Other(value),
        }
    }
}

impl From<SourceType> for String {
    fn from(value: SourceType) -> Self {
        value.to_string()
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::File => write!(f, "file"),
            SourceType::Custom => write!(f, "custom"),
            SourceType::Other(other) => write!(f, "{}", other),
        }
    }
}

///
/// Feature file format. Decides whether raw features go through the
/// gene-model combiner and whether they are row packed.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
#[allow(clippy::upper_case_acronyms)]
pub enum Format {
    Bed,
    BedPe,
    Interact,
    Gff,
    Gff3,
    Gtf,
    Wig,
    BedGraph,
    Other(String),
}

impl Format {
    /// Formats whose rows are fragments (exons, CDS) of composite transcripts.
    pub fn is_gene_model(&self) -> bool {
        matches!(self, Format::Gff | Format::Gff3 | Format::Gtf)
    }

    /// Step / continuous-signal formats, which are never row packed.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Format::Wig | Format::BedGraph)
    }
}

impl From<&str> for Format {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "bed" => Format::Bed,
            "bedpe" => Format::BedPe,
            "interact" => Format::Interact,
            "gff" => Format::Gff,
            "gff3" => Format::Gff3,
            "gtf" => Format::Gtf,
            "wig" => Format::Wig,
            "bedgraph" => Format::BedGraph,
            _ => Format::Other(value.to_string()),
        }
    }
}

impl From<String> for Format {
    fn from(value: String) -> Self {
        Format::from(value.as_str())
    }
}

impl From<Format> for String {
    fn from(value: Format) -> Self {
        value.to_string()
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Bed => "bed",
            Format::BedPe => "bedpe",
            Format::Interact => "interact",
            Format::Gff => "gff",
            Format::Gff3 => "gff3",
            Format::Gtf => "gtf",
            Format::Wig => "wig",
            Format::BedGraph => "bedgraph",
            Format::Other(other) => other.as_str(),
        };
        write!(f, "{}", s)
    }
}

///
/// Flat key/value configuration for a feature source. Keys are camelCase in
/// config files (`maxRows`, `disableCache`, `visibilityWindow`, ...).
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    pub name: Option<String>,
    pub source_type: Option<SourceType>,
    pub format: Option<Format>,
    /// Feature type of the whole track, e.g. `junctions`.
    #[serde(rename = "type")]
    pub track_type: Option<String>,
    /// Path of the file read by the generic file reader.
    pub url: Option<PathBuf>,
    /// Feature types dropped on ingest.
    pub filter_types: Vec<String>,
    pub max_rows: Option<usize>,
    pub searchable: bool,
    pub disable_cache: bool,
    /// Overrides whether the reader is treated as supporting ranged access.
    pub queryable: Option<bool>,
    pub expand_query: bool,
    pub visibility_window: Option<i64>,
    pub min_query_size: Option<u64>,
    #[serde(rename = "maxWGCount")]
    pub max_wg_count: usize,
    /// Property aliases applied to inline `features`: target key -> source key.
    pub mappings: Option<BTreeMap<String, String>>,
    /// Inline static features. Takes precedence over any reader.
    pub features: Option<Vec<FeatureRecord>>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            name: None,
            source_type: None,
            format: None,
            track_type: None,
            url: None,
            filter_types: vec!["chromosome".to_string()],
            max_rows: None,
            searchable: false,
            disable_cache: false,
            queryable: None,
            expand_query: true,
            visibility_window: None,
            min_query_size: None,
            max_wg_count: DEFAULT_MAX_WG_COUNT,
            mappings: None,
            features: None,
        }
    }
}

impl SourceConfig {
    ///
    /// A config for the generic file reader over `path`. The format is taken
    /// from the file extension (ignoring a trailing `.gz`).
    ///
    pub fn for_file<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let format = format_from_path(&path);
        SourceConfig {
            source_type: Some(SourceType::File),
            format,
            url: Some(path),
            ..Default::default()
        }
    }

    /// A config for a fixed, in-memory feature list.
    pub fn for_features(features: Vec<FeatureRecord>) -> Self {
        SourceConfig {
            features: Some(features),
            ..Default::default()
        }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows.unwrap_or(DEFAULT_MAX_ROWS)
    }

    pub fn is_junctions(&self) -> bool {
        self.track_type.as_deref() == Some("junctions")
    }
}

fn format_from_path(path: &Path) -> Option<Format> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let ext = Path::new(name).extension()?.to_str()?;
    Some(Format::from(ext))
}

#[derive(Debug)]
pub enum SourceConfigFileType {
    Toml,
    Json,
    Yaml,
}

#[derive(Error, Debug)]
pub enum SourceConfigError {
    #[error(
        "Missing or invalid file extension in source config file. It must be `toml`, `json`, `yaml` or `yml`"
    )]
    InvalidFileType,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type SourceConfigResult<T> = std::result::Result<T, SourceConfigError>;

impl SourceConfigFileType {
    ///
    /// Determine the type of a config file based on its extension.
    ///
    pub fn from_path(path: &Path) -> SourceConfigResult<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => Ok(SourceConfigFileType::Toml),
            Some("json") => Ok(SourceConfigFileType::Json),
            Some("yaml") | Some("yml") => Ok(SourceConfigFileType::Yaml),
            _ => Err(SourceConfigError::InvalidFileType),
        }
    }
}

impl TryFrom<&Path> for SourceConfig {
    type Error = SourceConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let file_type = SourceConfigFileType::from_path(path)?;
        let contents = read_to_string(path)?;
        let config = match file_type {
            SourceConfigFileType::Toml => toml::from_str(&contents)?,
            SourceConfigFileType::Json => serde_json::from_str(&contents)?,
            SourceConfigFileType::Yaml => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::Builder;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[rstest]
    fn test_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.filter_types, vec!["chromosome".to_string()]);
        assert_eq!(config.expand_query, true);
        assert_eq!(config.max_rows(), DEFAULT_MAX_ROWS);
        assert_eq!(config.max_wg_count, DEFAULT_MAX_WG_COUNT);
    }

    #[rstest]
    fn test_try_from_toml() {
        let file = write_config(
            ".toml",
            r#"
            sourceType = "file"
            format = "bed"
            url = "peaks.bed"
            maxRows = 10
            visibilityWindow = 1000
            searchable = true
            "#,
        );
        let config = SourceConfig::try_from(file.path()).unwrap();

        assert_eq!(config.source_type, Some(SourceType::File));
        assert_eq!(config.format, Some(Format::Bed));
        assert_eq!(config.url, Some(PathBuf::from("peaks.bed")));
        assert_eq!(config.max_rows(), 10);
        assert_eq!(config.visibility_window, Some(1000));
        assert_eq!(config.searchable, true);
        // untouched keys keep their defaults
        assert_eq!(config.expand_query, true);
        assert_eq!(config.filter_types, vec!["chromosome".to_string()]);
    }

    #[rstest]
    fn test_try_from_json_with_inline_features() {
        let file = write_config(
            ".json",
            r#"{
                "type": "junctions",
                "expandQuery": false,
                "maxWGCount": 5,
                "mappings": {"name": "gene_name"},
                "features": [{"chr": "1", "start": 100, "end": 200, "gene_name": "A"}]
            }"#,
        );
        let config = SourceConfig::try_from(file.path()).unwrap();

        assert!(config.is_junctions());
        assert_eq!(config.expand_query, false);
        assert_eq!(config.max_wg_count, 5);
        assert_eq!(config.features.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            config.mappings.unwrap().get("name").map(String::as_str),
            Some("gene_name")
        );
    }

    #[rstest]
    fn test_try_from_yaml() {
        let file = write_config(
            ".yaml",
            "format: gff3\nqueryable: true\ndisableCache: true\nfilterTypes: [chromosome, region]\n",
        );
        let config = SourceConfig::try_from(file.path()).unwrap();

        assert_eq!(config.format, Some(Format::Gff3));
        assert_eq!(config.queryable, Some(true));
        assert_eq!(config.disable_cache, true);
        assert_eq!(config.filter_types.len(), 2);
    }

    #[rstest]
    fn test_unknown_source_type_is_kept() {
        let config: SourceConfig = serde_json::from_str(r#"{"sourceType": "ga4gh"}"#).unwrap();
        assert_eq!(config.source_type, Some(SourceType::Other("ga4gh".to_string())));
    }

    #[rstest]
    fn test_invalid_extension() {
        let path = PathBuf::from("config.xyz");
        assert!(matches!(
            SourceConfig::try_from(path.as_path()),
            Err(SourceConfigError::InvalidFileType)
        ));
    }

    #[rstest]
    #[case("peaks.bed", Some(Format::Bed))]
    #[case("genes.gff3.gz", Some(Format::Gff3))]
    #[case("signal.bedgraph", Some(Format::BedGraph))]
    #[case("noext", None)]
    fn test_for_file_infers_format(#[case] path: &str, #[case] expected: Option<Format>) {
        assert_eq!(SourceConfig::for_file(path).format, expected);
    }

    #[rstest]
    #[case("gtf", true, false)]
    #[case("GFF", true, false)]
    #[case("wig", false, true)]
    #[case("bed", false, false)]
    fn test_format_classes(#[case] s: &str, #[case] gene_model: bool, #[case] continuous: bool) {
        let format = Format::from(s);
        assert_eq!(format.is_gene_model(), gene_model);
        assert_eq!(format.is_continuous(), continuous);
    }
}
