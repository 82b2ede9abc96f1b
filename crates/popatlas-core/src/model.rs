// crates/popatlas-core/src/model.rs

//! Domain types shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of displacement a statistics dataset describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Country of asylum (`coa_*` fields): refugees hosted.
    Asylum,
    /// Country of origin (`coo_*` fields): refugees originating.
    Origin,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Asylum, Scope::Origin];

    pub fn channel(self) -> Channel {
        match self {
            Scope::Asylum => Channel::Host,
            Scope::Origin => Channel::Origin,
        }
    }

    /// Suffix used after a count in tooltips.
    pub fn noun(self) -> &'static str {
        match self {
            Scope::Asylum => "refugees hosted",
            Scope::Origin => "refugees originating",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Asylum => f.write_str("asylum"),
            Scope::Origin => f.write_str("origin"),
        }
    }
}

/// A fetch channel tracked independently by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Host,
    Origin,
    Geography,
    Demographics,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel::Host => "host",
            Channel::Origin => "origin",
            Channel::Geography => "geography",
            Channel::Demographics => "demographics",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
            LoadState::Error => "error",
        };
        f.write_str(s)
    }
}

/// One normalized statistic entry. Invariant: `count > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub identifier_code: Option<String>,
    pub display_name: String,
    pub year: i32,
    pub count: u64,
}

impl PopulationRecord {
    pub fn code(&self) -> Option<&str> {
        self.identifier_code.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }
}

/// Position of a feature inside the loaded geography dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

/// A region of the geography dataset. The geometry is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    pub id: FeatureId,
    pub identifier_code: String,
    pub display_name: String,
    pub geometry: serde_json::Value,
}

impl GeoFeature {
    pub fn code(&self) -> &str {
        &self.identifier_code
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }
}

/// Per-feature choropleth outcome. `NoData` is distinct from bucket 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Bucket(usize),
    NoData,
}

impl Classification {
    pub fn bucket(self) -> Option<usize> {
        match self {
            Classification::Bucket(i) => Some(i),
            Classification::NoData => None,
        }
    }

    pub fn is_matched(self) -> bool {
        matches!(self, Classification::Bucket(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub record: PopulationRecord,
    /// 1-based.
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

impl Sex {
    pub fn prefix(self) -> &'static str {
        match self {
            Sex::Female => "f",
            Sex::Male => "m",
        }
    }
}

/// The five canonical age bands, youngest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "0-4")]
    Age0To4,
    #[serde(rename = "5-11")]
    Age5To11,
    #[serde(rename = "12-17")]
    Age12To17,
    #[serde(rename = "18-59")]
    Age18To59,
    #[serde(rename = "60+")]
    Age60Plus,
}

impl AgeBand {
    pub const ALL: [AgeBand; 5] = [
        AgeBand::Age0To4,
        AgeBand::Age5To11,
        AgeBand::Age12To17,
        AgeBand::Age18To59,
        AgeBand::Age60Plus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Age0To4 => "0-4",
            AgeBand::Age5To11 => "5-11",
            AgeBand::Age12To17 => "12-17",
            AgeBand::Age18To59 => "18-59",
            AgeBand::Age60Plus => "60+",
        }
    }

    /// Field suffix in the demographics API (`f_0_4`, `m_60`, ...).
    pub fn field_suffix(self) -> &'static str {
        match self {
            AgeBand::Age0To4 => "0_4",
            AgeBand::Age5To11 => "5_11",
            AgeBand::Age12To17 => "12_17",
            AgeBand::Age18To59 => "18_59",
            AgeBand::Age60Plus => "60",
        }
    }

    pub fn field_name(self, sex: Sex) -> String {
        format!("{}_{}", sex.prefix(), self.field_suffix())
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyramidBand {
    pub age_band: AgeBand,
    pub female_count: u64,
    pub male_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemographicPyramid {
    pub bands: Vec<PyramidBand>,
    /// Largest single count over all bands and both sexes; for bar sizing only.
    pub scale_max: u64,
}

impl DemographicPyramid {
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.bands
            .iter()
            .map(|b| b.female_count + b.male_count)
            .sum()
    }

    /// Share of `scale_max` in `[0, 1]`; zero when the pyramid has no data.
    pub fn proportion(&self, count: u64) -> f64 {
        if self.scale_max == 0 {
            0.0
        } else {
            count as f64 / self.scale_max as f64
        }
    }
}
