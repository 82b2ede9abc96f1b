use clap::{Parser, Subcommand, ValueEnum};
use popatlas_core::Scope;
use std::path::PathBuf;

/// CLI arguments for popatlas-cli
#[derive(Debug, Parser)]
#[command(
    name = "popatlas",
    version,
    about = "Inspect UNHCR refugee statistics joined onto world geography"
)]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Local geography file (.geo.json or .geo.json.gz), overrides the config
    #[arg(short = 'g', long = "geography", global = true)]
    pub geography: Option<PathBuf>,

    /// Year to load (default: from config)
    #[arg(short = 'y', long = "year", global = true)]
    pub year: Option<i32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    /// Countries hosting refugees
    Asylum,
    /// Countries refugees originate from
    Origin,
}

impl From<ScopeArg> for Scope {
    fn from(s: ScopeArg) -> Self {
        match s {
            ScopeArg::Asylum => Scope::Asylum,
            ScopeArg::Origin => Scope::Origin,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the selectable years
    Years,

    /// Show the countries with the largest counts
    Top {
        #[arg(value_enum, default_value = "asylum")]
        scope: ScopeArg,

        /// Number of rows (default: from config)
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,
    },

    /// Show bucket and tooltip of one map region in both scopes
    Region {
        /// ISO3 code or name as it appears on the map (e.g. TUR, "Germany")
        query: String,
    },

    /// Show the age/sex breakdown of refugees from one origin country
    Pyramid {
        /// ISO3 code of the origin country (e.g. SYR)
        origin: String,
    },

    /// Print the bucket thresholds of the current year
    Legend,
}
