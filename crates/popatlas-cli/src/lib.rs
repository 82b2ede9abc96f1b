//! popatlas-cli
//! ============
//!
//! Command-line interface for the `popatlas-core` refugee population atlas.
//!
//! This crate primarily provides a binary (`popatlas-cli`). The library
//! target only exists so docs.rs renders this overview.
//!
//! Quick start
//! -----------
//!
//! ```text
//! cargo install popatlas-cli
//! popatlas-cli --help
//! popatlas-cli --year 2023 top origin -n 5
//! popatlas-cli region Türkiye
//! popatlas-cli -vv pyramid SYR
//! ```
//!
//! A TOML file passed with `--config` overrides endpoints, the request
//! timeout, bucket count and adds alias classes:
//!
//! ```toml
//! timeout_ms = 8000
//! bucket_count = 7
//! geography_path = "data/countries.geo.json.gz"
//! aliases = [["Kosovo", "Kosovo (S/RES/1244 (1999))"]]
//! ```
//!
//! For programmatic access use the [`popatlas-core`] crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]
