use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use gtrack_core::models::GenomicInterval;
use gtrack_source::{ChromSizesGenome, CoordinateMapper, FeatureSource, SourceConfig, SourceType};

pub fn run_query(matches: &ArgMatches) -> Result<()> {
    let bed = matches
        .get_one::<String>("bed")
        .context("A path to a BED file is required.")?;

    let regions = matches
        .get_many::<String>("region")
        .context("At least one region is required.")?
        .map(|r| GenomicInterval::from_str(r).with_context(|| format!("Invalid region: {}", r)))
        .collect::<Result<Vec<_>>>()?;

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SourceConfig::try_from(PathBuf::from(path).as_path())
            .with_context(|| format!("Failed to load source config: {}", path))?,
        None => SourceConfig::for_file(bed),
    };

    // the command line wins over the config file
    config.source_type = Some(SourceType::File);
    config.url = Some(PathBuf::from(bed));
    if let Some(max_rows) = matches.get_one::<usize>("max-rows") {
        config.max_rows = Some(*max_rows);
    }
    if let Some(window) = matches.get_one::<i64>("visibility-window") {
        config.visibility_window = Some(*window);
    }

    let genome: Option<Arc<dyn CoordinateMapper>> = match matches.get_one::<String>("chrom-sizes") {
        Some(path) => {
            let genome = ChromSizesGenome::from_path(path)
                .with_context(|| format!("Failed to read chrom sizes: {}", path))?;
            Some(Arc::new(genome))
        }
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(query_regions(config, genome, &regions))
}

async fn query_regions(
    config: SourceConfig,
    genome: Option<Arc<dyn CoordinateMapper>>,
    regions: &[GenomicInterval],
) -> Result<()> {
    let source = FeatureSource::from_config(config, genome);

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    for region in regions.iter() {
        let features = source
            .get_features(&region.chr, region.start, region.end, None)
            .await
            .with_context(|| format!("Failed to fetch features for {}", region))?;

        info!(region = %region, features = features.len(), "queried region");

        for feature in features.iter() {
            writeln!(writer, "{}", feature)?;
        }
    }

    writer.flush()?;
    Ok(())
}
