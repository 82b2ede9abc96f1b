// crates/popatlas-core/src/session.rs

//! # Session state machine
//!
//! Tracks one [`LoadState`] per channel plus the immutable dataset snapshot of
//! the current *generation*. Selecting a year bumps the generation; responses
//! carry the [`Ticket`] they were issued under and are dropped on arrival if
//! the generation has moved on, whatever order they complete in.
//!
//! The composite state is fail-closed: `Ready` needs geography, host and
//! origin all loaded for the current generation, and any failed required
//! channel makes the whole session `Error`. One statistics scope may come
//! back empty (its regions show as no data); both empty is `EmptyResult`.
//!
//! All mutation happens in the `select_*` / `apply_*` methods.

use crate::error::{AtlasError, Result, MAP_LOAD_FAILED};
use crate::model::{Channel, DemographicPyramid, GeoFeature, LoadState, PopulationRecord, Scope};
use std::sync::Arc;
use tracing::{info, warn};

/// Identifies the selection a statistics request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub generation: u64,
    pub year: i32,
}

/// Identifies a demographics request (year generation + region selection).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DemographicsTicket {
    pub generation: u64,
    pub selection: u64,
    pub year: i32,
    pub origin_code: String,
}

/// Outcome of applying a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The response belonged to the active selection and updated state.
    Current,
    /// The response was stale and discarded.
    Stale,
}

#[derive(Debug, Clone, Default)]
struct ChannelSlot {
    state: LoadState,
    error: Option<AtlasError>,
}

impl ChannelSlot {
    fn loading(&mut self) {
        self.state = LoadState::Loading;
        self.error = None;
    }

    fn ready(&mut self) {
        self.state = LoadState::Ready;
        self.error = None;
    }

    fn fail(&mut self, err: AtlasError) {
        self.state = LoadState::Error;
        self.error = Some(err);
    }

    fn reset(&mut self) {
        self.state = LoadState::Idle;
        self.error = None;
    }
}

/// Records of one generation. Replaced wholesale, never merged.
#[derive(Debug, Clone, Default)]
struct DatasetGeneration {
    generation: u64,
    year: Option<i32>,
    host: Option<Arc<[PopulationRecord]>>,
    origin: Option<Arc<[PopulationRecord]>>,
}

impl DatasetGeneration {
    fn slot_mut(&mut self, scope: Scope) -> &mut Option<Arc<[PopulationRecord]>> {
        match scope {
            Scope::Asylum => &mut self.host,
            Scope::Origin => &mut self.origin,
        }
    }

    fn slot(&self, scope: Scope) -> Option<&Arc<[PopulationRecord]>> {
        match scope {
            Scope::Asylum => self.host.as_ref(),
            Scope::Origin => self.origin.as_ref(),
        }
    }
}

/// Everything the view layer may read, handed out only when `Ready`.
#[derive(Debug, Clone)]
pub struct ReadySnapshot {
    pub generation: u64,
    pub geography_epoch: u64,
    pub year: i32,
    pub geography: Arc<[GeoFeature]>,
    pub host: Arc<[PopulationRecord]>,
    pub origin: Arc<[PopulationRecord]>,
}

impl ReadySnapshot {
    pub fn records(&self, scope: Scope) -> &[PopulationRecord] {
        match scope {
            Scope::Asylum => &self.host,
            Scope::Origin => &self.origin,
        }
    }

    /// Largest count over both scopes; the shared classification domain.
    pub fn domain_max(&self) -> u64 {
        self.host
            .iter()
            .chain(self.origin.iter())
            .map(|r| r.count)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    selection: u64,

    host: ChannelSlot,
    origin: ChannelSlot,
    geography: ChannelSlot,
    demographics: ChannelSlot,

    dataset: DatasetGeneration,
    features: Option<Arc<[GeoFeature]>>,
    geography_epoch: u64,

    pending_demographics: Option<DemographicsTicket>,
    pyramid: Option<(String, DemographicPyramid)>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The selected year, if any.
    pub fn year(&self) -> Option<i32> {
        self.dataset.year
    }

    fn slot(&self, channel: Channel) -> &ChannelSlot {
        match channel {
            Channel::Host => &self.host,
            Channel::Origin => &self.origin,
            Channel::Geography => &self.geography,
            Channel::Demographics => &self.demographics,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut ChannelSlot {
        match channel {
            Channel::Host => &mut self.host,
            Channel::Origin => &mut self.origin,
            Channel::Geography => &mut self.geography,
            Channel::Demographics => &mut self.demographics,
        }
    }

    pub fn channel_state(&self, channel: Channel) -> LoadState {
        self.slot(channel).state
    }

    pub fn channel_error(&self, channel: Channel) -> Option<&AtlasError> {
        self.slot(channel).error.as_ref()
    }

    const REQUIRED: [Channel; 3] = [Channel::Geography, Channel::Host, Channel::Origin];

    /// Composite state over the required channels.
    pub fn load_state(&self) -> LoadState {
        let states = Self::REQUIRED.map(|c| self.channel_state(c));
        if states.contains(&LoadState::Error) {
            LoadState::Error
        } else if states.iter().all(|s| *s == LoadState::Ready) {
            LoadState::Ready
        } else if states.contains(&LoadState::Loading) {
            LoadState::Loading
        } else {
            LoadState::Idle
        }
    }

    /// First error among the required channels.
    pub fn error(&self) -> Option<&AtlasError> {
        Self::REQUIRED
            .iter()
            .find_map(|c| self.channel_error(*c))
    }

    /// What to tell the user about the composite failure, if any.
    /// A geography failure always reads as a map failure.
    pub fn error_message(&self) -> Option<&'static str> {
        if self.geography.state == LoadState::Error {
            return Some(MAP_LOAD_FAILED);
        }
        self.error().map(AtlasError::user_message)
    }

    // -----------------------------------------------------------------------
    // GEOGRAPHY (loaded once per session)
    // -----------------------------------------------------------------------

    pub fn begin_geography(&mut self) {
        self.geography.loading();
    }

    pub fn apply_geography(&mut self, result: Result<Vec<GeoFeature>>) {
        match result {
            Ok(features) if !features.is_empty() => {
                info!(features = features.len(), "geography ready");
                self.features = Some(features.into());
                self.geography_epoch += 1;
                self.geography.ready();
            }
            Ok(_) => self.fail_geography(AtlasError::EmptyResult {
                channel: Channel::Geography,
            }),
            Err(e) => self.fail_geography(e),
        }
    }

    fn fail_geography(&mut self, err: AtlasError) {
        warn!(error = %err, "geography failed");
        self.features = None;
        self.geography.fail(err);
    }

    pub fn features(&self) -> Option<&Arc<[GeoFeature]>> {
        self.features.as_ref()
    }

    // -----------------------------------------------------------------------
    // STATISTICS (one generation per selected year)
    // -----------------------------------------------------------------------

    /// Starts a new generation for `year`.
    ///
    /// The previous generation's records are dropped at once and any request
    /// still in flight for it becomes stale. The demographics selection is
    /// cleared as well since it is tied to the year.
    pub fn select_year(&mut self, year: i32) -> Ticket {
        self.generation += 1;
        self.dataset = DatasetGeneration {
            generation: self.generation,
            year: Some(year),
            host: None,
            origin: None,
        };
        self.host.loading();
        self.origin.loading();

        self.pending_demographics = None;
        self.pyramid = None;
        self.demographics.reset();

        info!(year, generation = self.generation, "selected year");
        Ticket {
            generation: self.generation,
            year,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && Some(ticket.year) == self.dataset.year
    }

    /// Applies one scope's normalized result for `ticket`.
    pub fn apply_statistics(
        &mut self,
        ticket: Ticket,
        scope: Scope,
        result: Result<Vec<PopulationRecord>>,
    ) -> Applied {
        if !self.is_current(&ticket) {
            warn!(
                %scope,
                year = ticket.year,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            return Applied::Stale;
        }

        let channel = scope.channel();
        match result {
            Ok(records) if records.is_empty() && self.other_scope_empty(scope) => {
                warn!(%scope, year = ticket.year, "both statistics scopes empty");
                *self.dataset.slot_mut(scope) = None;
                self.slot_mut(channel)
                    .fail(AtlasError::EmptyResult { channel });
            }
            Ok(records) => {
                if records.is_empty() {
                    warn!(%scope, year = ticket.year, "statistics empty, scope renders as no data");
                } else {
                    info!(%scope, year = ticket.year, records = records.len(), "statistics ready");
                }
                *self.dataset.slot_mut(scope) = Some(records.into());
                self.slot_mut(channel).ready();
            }
            Err(err) => {
                warn!(%scope, year = ticket.year, error = %err, "statistics failed");
                *self.dataset.slot_mut(scope) = None;
                self.slot_mut(channel).fail(err);
            }
        }
        Applied::Current
    }

    /// Whether the opposite scope already loaded with zero records.
    fn other_scope_empty(&self, scope: Scope) -> bool {
        let other = match scope {
            Scope::Asylum => Scope::Origin,
            Scope::Origin => Scope::Asylum,
        };
        self.channel_state(other.channel()) == LoadState::Ready
            && self.dataset.slot(other).is_some_and(|r| r.is_empty())
    }

    /// Records currently held for `scope`, regardless of composite state.
    pub fn records(&self, scope: Scope) -> Option<&[PopulationRecord]> {
        self.dataset.slot(scope).map(|r| &**r)
    }

    /// The data the view may render; `None` unless the composite is `Ready`.
    pub fn ready_snapshot(&self) -> Option<ReadySnapshot> {
        if self.load_state() != LoadState::Ready {
            return None;
        }
        Some(ReadySnapshot {
            generation: self.dataset.generation,
            geography_epoch: self.geography_epoch,
            year: self.dataset.year?,
            geography: self.features.clone()?,
            host: self.dataset.host.clone()?,
            origin: self.dataset.origin.clone()?,
        })
    }

    // -----------------------------------------------------------------------
    // DEMOGRAPHICS (on demand, per selected origin)
    // -----------------------------------------------------------------------

    /// Starts loading demographics for `origin_code` in the selected year.
    ///
    /// Returns `None` when no year is selected. A newer selection makes any
    /// earlier one stale.
    pub fn select_region(&mut self, origin_code: &str) -> Option<DemographicsTicket> {
        let year = self.dataset.year?;
        self.selection += 1;
        let ticket = DemographicsTicket {
            generation: self.generation,
            selection: self.selection,
            year,
            origin_code: origin_code.to_string(),
        };
        self.pending_demographics = Some(ticket.clone());
        self.pyramid = None;
        self.demographics.loading();
        info!(origin = origin_code, year, "selected region");
        Some(ticket)
    }

    pub fn apply_demographics(
        &mut self,
        ticket: &DemographicsTicket,
        result: Result<DemographicPyramid>,
    ) -> Applied {
        if self.pending_demographics.as_ref() != Some(ticket) || ticket.generation != self.generation
        {
            warn!(origin = %ticket.origin_code, year = ticket.year, "discarding stale demographics");
            return Applied::Stale;
        }
        self.pending_demographics = None;

        match result {
            Ok(pyramid) => {
                self.pyramid = Some((ticket.origin_code.clone(), pyramid));
                self.demographics.ready();
            }
            Err(err) => {
                warn!(origin = %ticket.origin_code, error = %err, "demographics failed");
                self.demographics.fail(err);
            }
        }
        Applied::Current
    }

    /// The pyramid for `origin_code`, or why it is not available.
    pub fn pyramid_for(&self, origin_code: &str) -> Result<&DemographicPyramid> {
        match self.demographics.state {
            LoadState::Ready => match &self.pyramid {
                Some((code, pyramid)) if code == origin_code => Ok(pyramid),
                _ => Err(AtlasError::NotFound(format!(
                    "no demographics loaded for {origin_code}"
                ))),
            },
            LoadState::Error => Err(self
                .demographics
                .error
                .clone()
                .unwrap_or(AtlasError::NotReady(LoadState::Error))),
            state => Err(AtlasError::NotReady(state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureId;

    fn features() -> Vec<GeoFeature> {
        vec![GeoFeature {
            id: FeatureId(0),
            identifier_code: "DEU".into(),
            display_name: "Germany".into(),
            geometry: serde_json::Value::Null,
        }]
    }

    fn records(year: i32, count: u64) -> Vec<PopulationRecord> {
        vec![PopulationRecord {
            identifier_code: Some("DEU".into()),
            display_name: "Germany".into(),
            year,
            count,
        }]
    }

    #[test]
    fn idle_until_something_loads() {
        let s = Session::new();
        assert_eq!(s.load_state(), LoadState::Idle);
        assert!(s.ready_snapshot().is_none());
    }

    #[test]
    fn ready_requires_all_channels() {
        let mut s = Session::new();
        s.begin_geography();
        let t = s.select_year(2024);
        assert_eq!(s.load_state(), LoadState::Loading);

        s.apply_statistics(t, Scope::Asylum, Ok(records(2024, 10)));
        s.apply_geography(Ok(features()));
        assert_eq!(s.load_state(), LoadState::Loading);

        s.apply_statistics(t, Scope::Origin, Ok(records(2024, 20)));
        assert_eq!(s.load_state(), LoadState::Ready);

        let snap = s.ready_snapshot().unwrap();
        assert_eq!(snap.year, 2024);
        assert_eq!(snap.domain_max(), 20);
    }

    #[test]
    fn one_failure_fails_the_composite() {
        let mut s = Session::new();
        s.apply_geography(Ok(features()));
        let t = s.select_year(2024);
        s.apply_statistics(t, Scope::Asylum, Ok(records(2024, 10)));
        s.apply_statistics(t, Scope::Origin, Err(AtlasError::Network("refused".into())));

        assert_eq!(s.load_state(), LoadState::Error);
        assert!(s.ready_snapshot().is_none());
        assert!(matches!(s.error(), Some(AtlasError::Network(_))));
        // the successful channel's data is kept internally but not exposed
        assert!(s.records(Scope::Asylum).is_some());
    }

    #[test]
    fn one_empty_scope_is_still_ready() {
        let mut s = Session::new();
        s.apply_geography(Ok(features()));
        let t = s.select_year(2024);
        s.apply_statistics(t, Scope::Asylum, Ok(records(2024, 10)));
        s.apply_statistics(t, Scope::Origin, Ok(Vec::new()));

        assert_eq!(s.load_state(), LoadState::Ready);
        let snap = s.ready_snapshot().unwrap();
        assert!(snap.origin.is_empty());
        assert_eq!(snap.domain_max(), 10);
    }

    #[test]
    fn both_scopes_empty_is_empty_result() {
        for first in Scope::ALL {
            let mut s = Session::new();
            s.apply_geography(Ok(features()));
            let t = s.select_year(2024);
            let second = if first == Scope::Asylum { Scope::Origin } else { Scope::Asylum };
            s.apply_statistics(t, first, Ok(Vec::new()));
            assert_eq!(s.load_state(), LoadState::Loading);
            s.apply_statistics(t, second, Ok(Vec::new()));

            assert_eq!(s.load_state(), LoadState::Error);
            assert!(matches!(s.error(), Some(AtlasError::EmptyResult { .. })));
            assert!(s.ready_snapshot().is_none());
        }
    }

    #[test]
    fn empty_scope_with_failed_other_scope_is_error() {
        let mut s = Session::new();
        s.apply_geography(Ok(features()));
        let t = s.select_year(2024);
        s.apply_statistics(t, Scope::Asylum, Ok(Vec::new()));
        s.apply_statistics(t, Scope::Origin, Err(AtlasError::Network("refused".into())));
        assert_eq!(s.load_state(), LoadState::Error);
        assert!(matches!(s.error(), Some(AtlasError::Network(_))));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut s = Session::new();
        s.apply_geography(Ok(features()));
        let old = s.select_year(2023);
        let new = s.select_year(2024);

        assert_eq!(
            s.apply_statistics(old, Scope::Asylum, Ok(records(2023, 1))),
            Applied::Stale
        );
        assert!(s.records(Scope::Asylum).is_none());

        s.apply_statistics(new, Scope::Asylum, Ok(records(2024, 2)));
        s.apply_statistics(new, Scope::Origin, Ok(records(2024, 3)));
        // late failure from the old year must not flip the state
        assert_eq!(
            s.apply_statistics(old, Scope::Origin, Err(AtlasError::Network("late".into()))),
            Applied::Stale
        );
        assert_eq!(s.load_state(), LoadState::Ready);
        assert_eq!(s.records(Scope::Asylum).unwrap()[0].year, 2024);
    }

    #[test]
    fn reselecting_replaces_instead_of_merging() {
        let mut s = Session::new();
        let t = s.select_year(2023);
        s.apply_statistics(t, Scope::Asylum, Ok(records(2023, 5)));
        s.select_year(2023);
        assert!(s.records(Scope::Asylum).is_none());
        assert_eq!(s.channel_state(Channel::Host), LoadState::Loading);
    }

    #[test]
    fn demographics_follow_latest_selection() {
        let mut s = Session::new();
        assert!(s.select_region("SYR").is_none());

        s.select_year(2024);
        let first = s.select_region("SYR").unwrap();
        let second = s.select_region("AFG").unwrap();

        let pyramid = DemographicPyramid::default();
        assert_eq!(s.apply_demographics(&first, Ok(pyramid.clone())), Applied::Stale);
        assert!(matches!(
            s.pyramid_for("AFG"),
            Err(AtlasError::NotReady(LoadState::Loading))
        ));

        assert_eq!(s.apply_demographics(&second, Ok(pyramid)), Applied::Current);
        assert!(s.pyramid_for("AFG").is_ok());
        assert!(matches!(s.pyramid_for("SYR"), Err(AtlasError::NotFound(_))));
    }

    #[test]
    fn demographics_failure_does_not_touch_composite() {
        let mut s = Session::new();
        s.apply_geography(Ok(features()));
        let t = s.select_year(2024);
        s.apply_statistics(t, Scope::Asylum, Ok(records(2024, 1)));
        s.apply_statistics(t, Scope::Origin, Ok(records(2024, 1)));

        let d = s.select_region("DEU").unwrap();
        s.apply_demographics(&d, Err(AtlasError::Schema("bad".into())));
        assert_eq!(s.load_state(), LoadState::Ready);
        assert!(matches!(s.pyramid_for("DEU"), Err(AtlasError::Schema(_))));
    }

    #[test]
    fn year_change_makes_demographics_stale() {
        let mut s = Session::new();
        s.select_year(2023);
        let d = s.select_region("SYR").unwrap();
        s.select_year(2024);
        assert_eq!(
            s.apply_demographics(&d, Ok(DemographicPyramid::default())),
            Applied::Stale
        );
        assert_eq!(s.channel_state(Channel::Demographics), LoadState::Idle);
    }
}
