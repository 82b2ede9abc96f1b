// crates/popatlas-core/src/normalize.rs

//! # Normalizers
//!
//! Turn raw API responses into the uniform domain shapes:
//! - statistics `items` -> [`PopulationRecord`]s (zero/negative counts dropped)
//! - GeoJSON `features` -> [`GeoFeature`]s
//! - demographics `items` -> one female and one male [`DemographicRow`]
//!
//! Shape violations are reported as [`AtlasError::Schema`]; the session turns
//! them into an empty dataset with an error flag.

use crate::demographics::DemographicRow;
use crate::error::{AtlasError, Result};
use crate::model::{AgeBand, FeatureId, GeoFeature, PopulationRecord, Scope, Sex};
use crate::raw::{count_from_value, DemographicItemRaw, FeatureRaw, StatisticItemRaw};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Extracts the array stored under `key`, or fails with a schema error.
fn list_field<'a>(raw: &'a Value, key: &str) -> Result<&'a [Value]> {
    match raw.get(key) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(AtlasError::Schema(format!(
            "`{key}` must be a list, got {}",
            json_kind(other)
        ))),
        None => Err(AtlasError::Schema(format!("response has no `{key}` field"))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Codes like `""` or `"-"` mean "no code".
fn normalize_code(s: Option<String>) -> Option<String> {
    non_blank(s).filter(|s| s != "-")
}

/// **Record Normalizer:** raw statistics response -> records for `year`.
///
/// Items whose count is zero or negative are dropped. An item's own `year`
/// wins over the requested one when present.
pub fn normalize_statistics(raw: &Value, scope: Scope, year: i32) -> Result<Vec<PopulationRecord>> {
    let items = list_field(raw, "items")?;

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item = StatisticItemRaw::deserialize(item)
            .map_err(|e| AtlasError::Schema(format!("item {i}: {e}")))?;

        let (code, name, name_field) = match scope {
            Scope::Asylum => (item.coa_iso, item.coa_name, "coa_name"),
            Scope::Origin => (item.coo_iso, item.coo_name, "coo_name"),
        };
        let display_name = non_blank(name)
            .ok_or_else(|| AtlasError::Schema(format!("item {i}: missing `{name_field}`")))?;

        let count = count_from_value(item.refugees.as_ref()).ok_or_else(|| {
            AtlasError::Schema(format!("item {i}: `refugees` is not a count"))
        })?;
        if count <= 0 {
            continue;
        }

        let record_year = item
            .year
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(year);

        out.push(PopulationRecord {
            identifier_code: normalize_code(code),
            display_name,
            year: record_year,
            count: count as u64,
        });
    }

    debug!(
        %scope,
        year,
        kept = out.len(),
        dropped = items.len() - out.len(),
        "normalized statistics"
    );
    Ok(out)
}

/// Geography FeatureCollection -> features, in dataset order.
///
/// The code comes from `properties.iso_a3`, falling back to the feature's
/// top-level string `id`. A feature without a name is a schema error.
pub fn normalize_geography(raw: &Value) -> Result<Vec<GeoFeature>> {
    let features = list_field(raw, "features")?;

    let mut out = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let feature = FeatureRaw::deserialize(feature)
            .map_err(|e| AtlasError::Schema(format!("feature {i}: {e}")))?;
        let props = feature.properties.unwrap_or_default();

        let display_name = non_blank(props.name).ok_or_else(|| {
            AtlasError::Schema(format!("feature {i}: missing `properties.name`"))
        })?;

        let fallback_id = match feature.id {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let identifier_code = non_blank(props.iso_a3)
            .or_else(|| non_blank(fallback_id))
            .unwrap_or_default();

        out.push(GeoFeature {
            id: FeatureId(i),
            identifier_code,
            display_name,
            geometry: feature.geometry,
        });
    }

    debug!(features = out.len(), "normalized geography");
    Ok(out)
}

/// Demographics response -> one `F` row and one `M` row.
///
/// Multiple items (e.g. one per asylum country) are summed per field. A
/// field absent from every item stays absent so the Reshaper defaults it.
/// An empty `items` list yields no rows.
pub fn demographic_rows(raw: &Value) -> Result<Vec<DemographicRow>> {
    let items = list_field(raw, "items")?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut female = DemographicRow::new(Sex::Female);
    let mut male = DemographicRow::new(Sex::Male);

    for (i, item) in items.iter().enumerate() {
        let item = DemographicItemRaw::deserialize(item)
            .map_err(|e| AtlasError::Schema(format!("demographics item {i}: {e}")))?;

        let fields = [
            (Sex::Female, AgeBand::Age0To4, &item.f_0_4),
            (Sex::Female, AgeBand::Age5To11, &item.f_5_11),
            (Sex::Female, AgeBand::Age12To17, &item.f_12_17),
            (Sex::Female, AgeBand::Age18To59, &item.f_18_59),
            (Sex::Female, AgeBand::Age60Plus, &item.f_60),
            (Sex::Male, AgeBand::Age0To4, &item.m_0_4),
            (Sex::Male, AgeBand::Age5To11, &item.m_5_11),
            (Sex::Male, AgeBand::Age12To17, &item.m_12_17),
            (Sex::Male, AgeBand::Age18To59, &item.m_18_59),
            (Sex::Male, AgeBand::Age60Plus, &item.m_60),
        ];

        for (sex, band, value) in fields {
            let Some(value) = value else { continue };
            let count = count_from_value(Some(value)).ok_or_else(|| {
                AtlasError::Schema(format!(
                    "demographics item {i}: `{}` is not a count",
                    band.field_name(sex)
                ))
            })?;
            let row = match sex {
                Sex::Female => &mut female,
                Sex::Male => &mut male,
            };
            row.add(band, count.max(0) as u64);
        }
    }

    Ok(vec![female, male])
}
