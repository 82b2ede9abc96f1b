//! popatlas-rs: workspace facade over [`popatlas_core`].
//!
//! Re-exports the core crate and a prelude for the demos.

pub use popatlas_core::*;

pub mod prelude {
    pub use popatlas_core::fetch::DataSource;
    pub use popatlas_core::{
        AliasTable, Assembler, AtlasConfig, AtlasError, Classification, FeatureId, LoadState,
        Orchestrator, Result, Scope,
    };
}
