// crates/popatlas-core/src/view.rs

//! # View-Model Assembler
//!
//! Composes resolver, classifier and ranker output into what the rendering
//! boundary consumes: per-feature style and tooltip, top-N tables.
//!
//! A view is only produced from a `Ready` session (fail-closed). The
//! per-feature work is memoized on [`ViewKey`] and redone only when the
//! dataset generation, the geography, the domain maximum or the bucket count
//! changes.

use crate::alias::AliasTable;
use crate::classify::Quantizer;
use crate::error::{AtlasError, Result};
use crate::model::{Classification, FeatureId, GeoFeature, LoadState, PopulationRecord, RankingEntry, Scope};
use crate::rank::rank;
use crate::resolve::Resolver;
use crate::session::{ReadySnapshot, Session};
use crate::text::group_thousands;
use serde::{Serialize, Serializer};
use tracing::debug;

/// Inputs the memoized view depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub generation: u64,
    pub geography_epoch: u64,
    pub domain_max: u64,
    pub buckets: usize,
}

/// `count` half of a tooltip: a number, or `"no data"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipCount {
    Count(u64),
    NoData,
}

impl Serialize for TooltipCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TooltipCount::Count(n) => serializer.serialize_u64(*n),
            TooltipCount::NoData => serializer.serialize_str("no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub display_name: String,
    pub count: TooltipCount,
}

impl Tooltip {
    /// Two-line text: the name, then the count with its scope noun.
    pub fn label(&self, scope: Scope) -> String {
        match self.count {
            TooltipCount::Count(n) => {
                format!("{}\n{} {}", self.display_name, group_thousands(n), scope.noun())
            }
            TooltipCount::NoData => format!("{}\nNo data available", self.display_name),
        }
    }
}

/// Per-scope results, aligned with the feature list.
#[derive(Debug, Clone)]
struct ScopeView {
    matches: Vec<Option<usize>>,
    classes: Vec<Classification>,
    /// Full descending ranking; `top_n` slices it.
    ranking: Vec<RankingEntry>,
}

impl ScopeView {
    fn build(
        features: &[GeoFeature],
        records: &[PopulationRecord],
        resolver: &Resolver<'_>,
        quantizer: &Quantizer,
    ) -> Self {
        let matches: Vec<Option<usize>> = features
            .iter()
            .map(|f| resolver.resolve_index(f, records).map(|(i, _)| i))
            .collect();
        let classes = matches
            .iter()
            .map(|m| quantizer.classify(m.map(|i| &records[i])))
            .collect();
        Self {
            matches,
            classes,
            ranking: rank(records, records.len()),
        }
    }
}

/// Display-ready view of one `Ready` generation.
#[derive(Debug, Clone)]
pub struct ViewModel {
    key: ViewKey,
    snapshot: ReadySnapshot,
    quantizer: Quantizer,
    host: ScopeView,
    origin: ScopeView,
}

impl ViewModel {
    fn build(snapshot: ReadySnapshot, key: ViewKey, aliases: &AliasTable) -> Self {
        let resolver = Resolver::new(aliases);
        let quantizer = Quantizer::new(key.domain_max, key.buckets);
        let host = ScopeView::build(&snapshot.geography, &snapshot.host, &resolver, &quantizer);
        let origin = ScopeView::build(&snapshot.geography, &snapshot.origin, &resolver, &quantizer);
        Self {
            key,
            snapshot,
            quantizer,
            host,
            origin,
        }
    }

    fn scope(&self, scope: Scope) -> &ScopeView {
        match scope {
            Scope::Asylum => &self.host,
            Scope::Origin => &self.origin,
        }
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    pub fn year(&self) -> i32 {
        self.snapshot.year
    }

    pub fn quantizer(&self) -> Quantizer {
        self.quantizer
    }

    pub fn features(&self) -> &[GeoFeature] {
        &self.snapshot.geography
    }

    pub fn feature(&self, id: FeatureId) -> Option<&GeoFeature> {
        self.snapshot.geography.get(id.0)
    }

    /// First feature whose code equals `code` (case-insensitive).
    pub fn feature_by_code(&self, code: &str) -> Option<&GeoFeature> {
        self.snapshot
            .geography
            .iter()
            .find(|f| f.code().eq_ignore_ascii_case(code))
    }

    /// The record matched to `feature` in `scope`.
    pub fn matched_record(&self, scope: Scope, feature: FeatureId) -> Option<&PopulationRecord> {
        let idx = (*self.scope(scope).matches.get(feature.0)?)?;
        self.snapshot.records(scope).get(idx)
    }

    /// Bucket of `feature`, or `NoData` when unmatched or unknown.
    pub fn style_for(&self, scope: Scope, feature: FeatureId) -> Classification {
        self.scope(scope)
            .classes
            .get(feature.0)
            .copied()
            .unwrap_or(Classification::NoData)
    }

    pub fn tooltip_for(&self, scope: Scope, feature: FeatureId) -> Option<Tooltip> {
        let f = self.feature(feature)?;
        let count = match self.matched_record(scope, feature) {
            Some(r) => TooltipCount::Count(r.count),
            None => TooltipCount::NoData,
        };
        Some(Tooltip {
            display_name: f.display_name.clone(),
            count,
        })
    }

    /// Top `limit` records of `scope`, ranked from 1.
    pub fn top_n(&self, scope: Scope, limit: usize) -> Vec<RankingEntry> {
        let ranking = &self.scope(scope).ranking;
        ranking[..limit.min(ranking.len())].to_vec()
    }

    /// Number of features with a match in `scope`.
    pub fn matched_count(&self, scope: Scope) -> usize {
        self.scope(scope)
            .classes
            .iter()
            .filter(|c| c.is_matched())
            .count()
    }
}

/// Builds and caches the [`ViewModel`] of a session.
pub struct Assembler {
    aliases: AliasTable,
    buckets: usize,
    cached: Option<ViewModel>,
    builds: usize,
}

impl Assembler {
    pub fn new(aliases: AliasTable, buckets: usize) -> Self {
        Self {
            aliases,
            buckets: buckets.max(1),
            cached: None,
            builds: 0,
        }
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Changes the bucket count; the next `assemble` rebuilds.
    pub fn set_buckets(&mut self, buckets: usize) {
        self.buckets = buckets.max(1);
    }

    /// How many times a view was actually computed.
    pub fn builds(&self) -> usize {
        self.builds
    }

    /// The view of `session`, rebuilt only if its [`ViewKey`] changed.
    ///
    /// Fails with the session's error when it is `Error`, and with
    /// [`AtlasError::NotReady`] while `Idle`/`Loading`.
    pub fn assemble(&mut self, session: &Session) -> Result<&ViewModel> {
        let snapshot = match session.ready_snapshot() {
            Some(s) => s,
            None => {
                let state = session.load_state();
                return Err(match (state, session.error()) {
                    (LoadState::Error, Some(err)) => err.clone(),
                    _ => AtlasError::NotReady(state),
                });
            }
        };

        let key = ViewKey {
            generation: snapshot.generation,
            geography_epoch: snapshot.geography_epoch,
            domain_max: snapshot.domain_max(),
            buckets: self.buckets,
        };

        let stale = self.cached.as_ref().map_or(true, |v| v.key != key);
        if stale {
            debug!(?key, "assembling view");
            self.cached = Some(ViewModel::build(snapshot, key, &self.aliases));
            self.builds += 1;
        }

        self.cached
            .as_ref()
            .ok_or(AtlasError::NotReady(LoadState::Ready))
    }
}
