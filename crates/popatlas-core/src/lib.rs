// crates/popatlas-core/src/lib.rs

//! Core of the refugee population atlas: normalizes UNHCR statistics and
//! world geography, joins them per country, classifies counts into choropleth
//! buckets and keeps the whole pipeline consistent across year changes.
//!
//! ```
//! use popatlas_core::{rank, PopulationRecord};
//!
//! let rec = |name: &str, count| PopulationRecord {
//!     identifier_code: None,
//!     display_name: name.into(),
//!     year: 2024,
//!     count,
//! };
//! let top = rank(&[rec("A", 5), rec("B", 9)], 1);
//! assert_eq!(top[0].record.display_name, "B");
//! ```

pub mod alias;
pub mod classify;
pub mod config;
pub mod demographics;
pub mod error;
pub mod fetch; // Async orchestration + HTTP source
pub mod loader; // Local files (plain or gzip)
pub mod model;
pub mod normalize;
pub mod rank;
pub mod resolve;
pub mod session;
pub mod text;
pub mod view;
// Wire shapes of the upstream JSON
#[doc(hidden)]
pub mod raw;

// Re-exports
pub use crate::error::{AtlasError, Result};
pub use model::{
    AgeBand, Channel, Classification, DemographicPyramid, FeatureId, GeoFeature, LoadState,
    PopulationRecord, PyramidBand, RankingEntry, Scope, Sex,
};

pub use crate::alias::AliasTable;
pub use crate::classify::{classify, Quantizer};
pub use crate::config::AtlasConfig;
pub use crate::demographics::{reshape, DemographicRow};
pub use crate::fetch::{DataSource, Orchestrator};
pub use crate::rank::rank;
pub use crate::resolve::{MatchTier, Resolver};
pub use crate::session::{Applied, Session};
pub use crate::view::{Assembler, Tooltip, TooltipCount, ViewModel};

#[cfg(feature = "http")]
pub use crate::fetch::HttpSource;
