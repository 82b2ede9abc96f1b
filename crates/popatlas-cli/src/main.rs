//! popatlas-cli: command-line interface for popatlas-core
//!
//! Loads one year of UNHCR refugee statistics together with the world
//! geography and prints what the map would show: top-N tables, the bucket and
//! tooltip of a region, the legend thresholds, and age/sex pyramids.
//!
//! Usage examples
//! --------------
//!
//! - List the selectable years
//!   $ popatlas years
//!
//! - Top 10 host countries in 2023
//!   $ popatlas --year 2023 top asylum
//!
//! - Bucket and tooltip of a region (ISO3 code or map name)
//!   $ popatlas region TUR
//!   $ popatlas region "Germany"
//!
//! - Age/sex breakdown of refugees from Syria
//!   $ popatlas pyramid SYR
//!
//! Data source
//! -----------
//!
//! Statistics and demographics come from the UNHCR population API. Geography
//! is fetched from the configured URL unless `--geography <path>` (or
//! `geography_path` in the config) points to a local `.geo.json[.gz]` file.
//! Set `RUST_LOG` or pass `-v`/`-vv` for request and state logs.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::{anyhow, Context};
use clap::Parser;
use popatlas_core::text::{equals_folded, group_thousands};
use popatlas_core::{
    Assembler, AtlasConfig, Classification, FeatureId, HttpSource, LoadState, Orchestrator,
    Scope, ViewModel,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &CliArgs) -> anyhow::Result<AtlasConfig> {
    let mut config = match &args.config {
        Some(path) => AtlasConfig::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AtlasConfig::default(),
    };
    if let Some(path) = &args.geography {
        config.geography_path = Some(path.clone());
    }
    Ok(config)
}

/// Finds a feature by ISO3 code, then by folded display name.
fn find_feature(view: &ViewModel, query: &str) -> Option<FeatureId> {
    view.feature_by_code(query)
        .or_else(|| view.features().iter().find(|f| equals_folded(f.name(), query)))
        .map(|f| f.id)
}

fn describe(class: Classification) -> String {
    match class {
        Classification::Bucket(b) => format!("bucket {b}"),
        Classification::NoData => "no data".to_string(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let year = args.year.unwrap_or(config.default_year);

    if let Commands::Years = args.command {
        for y in &config.years {
            let marker = if *y == year { " *" } else { "" };
            println!("{y}{marker}");
        }
        return Ok(());
    }

    let mut orch = Orchestrator::new(HttpSource::new(&config), &config);
    let state = orch.load_year(year).await;
    info!(year, %state, "load finished");
    if state != LoadState::Ready {
        let session = orch.session();
        let message = session.error_message().unwrap_or(popatlas_core::error::LOADING);
        return Err(match session.error() {
            Some(err) => anyhow!(err.clone()).context(message),
            None => anyhow!(message),
        });
    }

    let mut assembler = Assembler::new(config.alias_table(), config.bucket_count);

    match args.command {
        // printed before loading
        Commands::Years => {}

        Commands::Top { scope, limit } => {
            let scope = Scope::from(scope);
            let view = assembler.assemble(orch.session())?;
            println!("Top {scope} countries, {year}:");
            for entry in view.top_n(scope, limit.unwrap_or(config.top_n)) {
                let code = entry.record.code().unwrap_or("-");
                println!(
                    "{:>3}. {} ({code}) {}",
                    entry.rank,
                    entry.record.name(),
                    group_thousands(entry.record.count)
                );
            }
        }

        Commands::Region { query } => {
            let view = assembler.assemble(orch.session())?;
            let id = find_feature(view, &query)
                .ok_or_else(|| anyhow!("no map region matches {query:?}"))?;
            for scope in Scope::ALL {
                println!("[{scope}] {}", describe(view.style_for(scope, id)));
                if let Some(tooltip) = view.tooltip_for(scope, id) {
                    println!("{}", tooltip.label(scope));
                }
            }
        }

        Commands::Pyramid { origin } => {
            let pyramid = orch.load_demographics(&origin).await?;
            if pyramid.is_empty() {
                println!("No demographic data for {origin} in {year}");
                return Ok(());
            }
            println!("{:>6} {:>12} {:>12}", "age", "female", "male");
            for band in pyramid.bands.iter().rev() {
                println!(
                    "{:>6} {:>12} {:>12}",
                    band.age_band.label(),
                    group_thousands(band.female_count),
                    group_thousands(band.male_count)
                );
            }
            println!("total {}", group_thousands(pyramid.total()));
        }

        Commands::Legend => {
            let view = assembler.assemble(orch.session())?;
            let q = view.quantizer();
            println!("{} buckets over 0..={}", q.buckets(), group_thousands(q.domain_max()));
            for i in 0..q.buckets() {
                if let Some((lo, hi)) = q.bucket_range(i) {
                    println!("  {i:>2}: {} - {}", group_thousands(lo as u64), group_thousands(hi as u64));
                }
            }
        }
    }

    Ok(())
}
