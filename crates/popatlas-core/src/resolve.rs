// crates/popatlas-core/src/resolve.rs

//! # Identity Resolver
//!
//! Matches a [`GeoFeature`] to at most one [`PopulationRecord`].
//!
//! Tiers are tried in order and the first tier with any hit wins; inside a
//! tier the first record in input order is returned:
//! 1. exact identifier code (case-sensitive)
//! 2. exact display name
//! 3. containment, either direction
//! 4. alias equivalence class
//!
//! "No match" is a normal outcome.

use crate::alias::AliasTable;
use crate::model::{GeoFeature, PopulationRecord};

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    Code,
    Name,
    Containment,
    Alias,
}

impl MatchTier {
    /// Precedence order.
    pub const ALL: [MatchTier; 4] = [
        MatchTier::Code,
        MatchTier::Name,
        MatchTier::Containment,
        MatchTier::Alias,
    ];
}

/// Resolver bound to an alias table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    aliases: &'a AliasTable,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Resolver::new(AliasTable::builtin())
    }
}

impl<'a> Resolver<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    /// Returns the matched record, if any.
    pub fn resolve<'r>(
        &self,
        feature: &GeoFeature,
        records: &'r [PopulationRecord],
    ) -> Option<&'r PopulationRecord> {
        self.resolve_index(feature, records).map(|(i, _)| &records[i])
    }

    /// Index of the matched record in `records`, with the tier that matched.
    pub fn resolve_index(
        &self,
        feature: &GeoFeature,
        records: &[PopulationRecord],
    ) -> Option<(usize, MatchTier)> {
        MatchTier::ALL.iter().find_map(|&tier| {
            records
                .iter()
                .position(|r| self.matches(tier, feature, r))
                .map(|i| (i, tier))
        })
    }

    fn matches(&self, tier: MatchTier, feature: &GeoFeature, record: &PopulationRecord) -> bool {
        match tier {
            MatchTier::Code => {
                !feature.code().is_empty() && record.code() == Some(feature.code())
            }
            MatchTier::Name => record.name() == feature.name(),
            MatchTier::Containment => contains_either(record.name(), feature.name()),
            MatchTier::Alias => self.aliases.are_equivalent(feature.name(), record.name()),
        }
    }
}

/// Substring containment in either direction; empty names never contain.
fn contains_either(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

/// Convenience wrapper using the built-in alias table.
pub fn resolve<'r>(
    feature: &GeoFeature,
    records: &'r [PopulationRecord],
) -> Option<&'r PopulationRecord> {
    Resolver::default().resolve(feature, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureId;

    fn feature(code: &str, name: &str) -> GeoFeature {
        GeoFeature {
            id: FeatureId(0),
            identifier_code: code.into(),
            display_name: name.into(),
            geometry: serde_json::Value::Null,
        }
    }

    fn record(code: Option<&str>, name: &str, count: u64) -> PopulationRecord {
        PopulationRecord {
            identifier_code: code.map(Into::into),
            display_name: name.into(),
            year: 2024,
            count,
        }
    }

    #[test]
    fn exact_code_beats_containment() {
        let records = vec![
            record(Some("NER"), "Nigeria and Niger border", 1),
            record(Some("NGA"), "Nigeria", 2),
        ];
        let f = feature("NGA", "Niger");
        // "Nigeria and Niger border" contains "Niger" but NGA matches by code.
        let (idx, tier) = Resolver::default().resolve_index(&f, &records).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(tier, MatchTier::Code);
    }

    #[test]
    fn code_comparison_is_case_sensitive() {
        let records = vec![record(Some("usa"), "Somewhere", 1)];
        assert!(resolve(&feature("USA", "United States"), &records).is_none());
    }

    #[test]
    fn exact_name_beats_containment() {
        let records = vec![
            record(None, "Guinea-Bissau", 1),
            record(None, "Guinea", 2),
        ];
        let hit = resolve(&feature("", "Guinea"), &records).unwrap();
        assert_eq!(hit.count, 2);
    }

    #[test]
    fn containment_works_both_ways() {
        let records = vec![record(Some("SYR"), "Syrian Arab Rep.", 7)];
        assert_eq!(resolve(&feature("-99", "Syria"), &records).unwrap().count, 7);

        let records = vec![record(None, "Russia", 9)];
        let hit = resolve(&feature("", "Russian Federation"), &records).unwrap();
        assert_eq!(hit.count, 9);
    }

    #[test]
    fn first_record_in_a_tier_wins() {
        let records = vec![
            record(None, "Sudan (North)", 1),
            record(None, "South Sudan", 2),
        ];
        let (idx, tier) = Resolver::default()
            .resolve_index(&feature("", "Sudan"), &records)
            .unwrap();
        assert_eq!((idx, tier), (0, MatchTier::Containment));
    }

    #[test]
    fn alias_tier_matches_turkiye() {
        let records = vec![record(None, "Türkiye", 3_000_000)];
        let (_, tier) = Resolver::default()
            .resolve_index(&feature("", "Turkey"), &records)
            .unwrap();
        assert_eq!(tier, MatchTier::Alias);
    }

    #[test]
    fn repeated_calls_agree() {
        let records = vec![
            record(None, "Sudan (North)", 1),
            record(Some("SDN"), "Sudan", 2),
            record(None, "South Sudan", 3),
        ];
        let resolver = Resolver::default();
        for f in [feature("SDN", "Sudan"), feature("", "Sudan"), feature("", "Sud")] {
            let first = resolver.resolve_index(&f, &records);
            for _ in 0..5 {
                assert_eq!(resolver.resolve_index(&f, &records), first);
            }
        }
    }

    #[test]
    fn alias_class_resolves_in_every_direction() {
        let names = ["Turkey", "Türkiye", "Turkiye"];
        let resolver = Resolver::default();
        let mut pairs = 0;
        for a in names {
            for b in names {
                if a == b {
                    continue;
                }
                let records = vec![record(None, b, 10)];
                let hit = resolver.resolve_index(&feature("", a), &records);
                assert_eq!(hit, Some((0, MatchTier::Alias)), "{a} -> {b}");
                pairs += 1;
            }
        }
        assert_eq!(pairs, 6);
    }

    #[test]
    fn empty_names_do_not_contain_everything() {
        let records = vec![record(None, "Chad", 1)];
        assert!(resolve(&feature("", ""), &records).is_none());
    }

    #[test]
    fn no_match_is_none() {
        let records = vec![record(Some("DEU"), "Germany", 1)];
        assert!(resolve(&feature("FRA", "France"), &records).is_none());
        assert!(resolve(&feature("FRA", "France"), &[]).is_none());
    }
}
