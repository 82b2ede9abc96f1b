// crates/popatlas-core/src/raw.rs

//! Raw shapes of the external datasets, as they come from JSON.
//!
//! NOTE: These types mirror the upstream APIs. They are deliberately lax
//! (every field optional) so the normalizers can report a precise
//! `SchemaError` instead of a generic serde message.

use serde::Deserialize;
use serde_json::Value;

/// One entry of the statistics API `items` list.
///
/// Asylum queries fill the `coa_*` fields, origin queries the `coo_*` ones.
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticItemRaw {
    #[serde(default)]
    pub coa_iso: Option<String>,
    #[serde(default)]
    pub coa_name: Option<String>,
    #[serde(default)]
    pub coo_iso: Option<String>,
    #[serde(default)]
    pub coo_name: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    /// Usually a number; tolerated as a numeric string or null.
    #[serde(default)]
    pub refugees: Option<Value>,
}

/// One entry of the demographics API `items` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemographicItemRaw {
    #[serde(default)]
    pub f_0_4: Option<Value>,
    #[serde(default)]
    pub f_5_11: Option<Value>,
    #[serde(default)]
    pub f_12_17: Option<Value>,
    #[serde(default)]
    pub f_18_59: Option<Value>,
    #[serde(default)]
    pub f_60: Option<Value>,
    #[serde(default)]
    pub m_0_4: Option<Value>,
    #[serde(default)]
    pub m_5_11: Option<Value>,
    #[serde(default)]
    pub m_12_17: Option<Value>,
    #[serde(default)]
    pub m_18_59: Option<Value>,
    #[serde(default)]
    pub m_60: Option<Value>,
}

/// Properties block of a GeoJSON feature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeaturePropertiesRaw {
    #[serde(default)]
    pub iso_a3: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A GeoJSON feature. `id` is a fallback identifier in some datasets.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureRaw {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<FeaturePropertiesRaw>,
    #[serde(default)]
    pub geometry: Value,
}

/// Reads a count-like JSON value.
///
/// `null`/absent read as 0, integers and integral floats as themselves,
/// numeric strings are parsed. Anything else is `None` (a schema problem).
pub fn count_from_value(v: Option<&Value>) -> Option<i64> {
    match v {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() || s == "-" {
                Some(0)
            } else {
                s.replace(',', "").parse::<i64>().ok()
            }
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_counts_leniently() {
        assert_eq!(count_from_value(None), Some(0));
        assert_eq!(count_from_value(Some(&json!(null))), Some(0));
        assert_eq!(count_from_value(Some(&json!(42))), Some(42));
        assert_eq!(count_from_value(Some(&json!(-3))), Some(-3));
        assert_eq!(count_from_value(Some(&json!(12.9))), Some(12));
        assert_eq!(count_from_value(Some(&json!("1,250"))), Some(1250));
        assert_eq!(count_from_value(Some(&json!("-"))), Some(0));
        assert_eq!(count_from_value(Some(&json!("n/a"))), None);
        assert_eq!(count_from_value(Some(&json!([1]))), None);
    }
}
