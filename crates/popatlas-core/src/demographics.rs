// crates/popatlas-core/src/demographics.rs

//! # Demographic Reshaper
//!
//! Sex-tagged rows of age-band counts -> a two-sided [`DemographicPyramid`].

use crate::model::{AgeBand, DemographicPyramid, PyramidBand, Sex};
use serde::{Deserialize, Serialize};

/// Counts for one sex. `None` means the field was absent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicRow {
    pub sex: Sex,
    pub bands: [Option<u64>; 5],
}

impl DemographicRow {
    pub fn new(sex: Sex) -> Self {
        Self {
            sex,
            bands: [None; 5],
        }
    }

    pub fn with(mut self, band: AgeBand, count: u64) -> Self {
        self.bands[band.index()] = Some(count);
        self
    }

    pub fn get(&self, band: AgeBand) -> Option<u64> {
        self.bands[band.index()]
    }

    /// Adds `count` to a band, materializing it if it was absent.
    pub fn add(&mut self, band: AgeBand, count: u64) {
        let slot = &mut self.bands[band.index()];
        *slot = Some(slot.unwrap_or(0).saturating_add(count));
    }
}

/// Builds the pyramid.
///
/// The first row tagged `F` and the first tagged `M` are read; a missing row
/// or band counts as 0. Empty input gives an empty pyramid with
/// `scale_max == 0`; otherwise there are always exactly five bands.
pub fn reshape(rows: &[DemographicRow]) -> DemographicPyramid {
    if rows.is_empty() {
        return DemographicPyramid::default();
    }

    let female = rows.iter().find(|r| r.sex == Sex::Female);
    let male = rows.iter().find(|r| r.sex == Sex::Male);
    let read = |row: Option<&DemographicRow>, band: AgeBand| -> u64 {
        row.and_then(|r| r.get(band)).unwrap_or(0)
    };

    let bands: Vec<PyramidBand> = AgeBand::ALL
        .iter()
        .map(|&band| PyramidBand {
            age_band: band,
            female_count: read(female, band),
            male_count: read(male, band),
        })
        .collect();

    let scale_max = bands
        .iter()
        .map(|b| b.female_count.max(b.male_count))
        .max()
        .unwrap_or(0);

    DemographicPyramid { bands, scale_max }
}
