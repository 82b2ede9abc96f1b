// crates/popatlas-core/src/alias.rs

//! # Alias Table
//!
//! Fixed set of equivalence classes of region names that denote the same
//! place (`Turkey` / `Türkiye` / `Turkiye`, ...). Lookups are done on the
//! folded form (see [`fold_key`]), so spelling variants that only differ in
//! accents or case fall into the same class automatically.
//!
//! The table is data: extra classes come from configuration or a JSON file
//! (`[["Czechia", "Czech Republic"], ...]`) without touching code.

use crate::error::{AtlasError, Result};
use crate::text::fold_key;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Built-in equivalence classes.
///
/// Only pairs the earlier resolver tiers (exact code, exact name, containment)
/// cannot reconcile need to be listed here.
const DEFAULT_CLASSES: &[&[&str]] = &[
    &["Turkey", "Türkiye", "Turkiye"],
    &["Czechia", "Czech Republic"],
    &["Côte d'Ivoire", "Ivory Coast"],
    &["Eswatini", "Swaziland"],
    &["Myanmar", "Burma"],
    &["Cabo Verde", "Cape Verde"],
    &["Viet Nam", "Vietnam"],
    &["Rep. of Korea", "Republic of Korea", "South Korea"],
    &["Dem. People's Rep. of Korea", "North Korea"],
    &["Dem. Rep. of the Congo", "Democratic Republic of the Congo"],
    &["Congo", "Republic of the Congo"],
    &["United Rep. of Tanzania", "United Republic of Tanzania", "Tanzania"],
    &["Lao People's Dem. Rep.", "Laos"],
    &["Rep. of Moldova", "Moldova"],
    &["Brunei Darussalam", "Brunei"],
    &["Timor-Leste", "East Timor"],
];

static DEFAULT_TABLE: Lazy<AliasTable> = Lazy::new(|| {
    let mut table = AliasTable::new();
    for class in DEFAULT_CLASSES {
        table.add_class(class.iter().copied());
    }
    table
});

/// A set of name equivalence classes, indexed by folded name.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Members as given, per class. Merged classes leave an empty slot.
    classes: Vec<Vec<String>>,
    /// Folded name -> class index.
    index: HashMap<String, usize>,
}

impl AliasTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared built-in table.
    pub fn builtin() -> &'static AliasTable {
        &DEFAULT_TABLE
    }

    /// A copy of the built-in table extended with `extra` classes.
    pub fn builtin_with<I, C, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = DEFAULT_TABLE.clone();
        for class in extra {
            table.add_class(class);
        }
        table
    }

    /// Adds an equivalence class.
    ///
    /// If any member already belongs to a class, the classes are merged so
    /// the table stays a partition.
    pub fn add_class<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            return;
        }

        let mut touched: Vec<usize> = names
            .iter()
            .filter_map(|n| self.index.get(&fold_key(n)).copied())
            .collect();
        touched.sort_unstable();
        touched.dedup();

        let target = match touched.first() {
            Some(&id) => id,
            None => {
                self.classes.push(Vec::new());
                self.classes.len() - 1
            }
        };

        // Fold the other touched classes into `target`.
        for &other in touched.iter().skip(1) {
            let moved = std::mem::take(&mut self.classes[other]);
            for member in moved {
                self.index.insert(fold_key(&member), target);
                self.classes[target].push(member);
            }
        }

        for name in names {
            let key = fold_key(&name);
            if self.index.insert(key, target) != Some(target) {
                self.classes[target].push(name);
            }
        }
    }

    /// Class index of `name`, if it has any known alias.
    pub fn class_of(&self, name: &str) -> Option<usize> {
        self.index.get(&fold_key(name)).copied()
    }

    /// True if both names are listed, after folding, in the same class.
    pub fn are_equivalent(&self, a: &str, b: &str) -> bool {
        match (self.class_of(a), self.class_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Members of the class containing `name` (including `name`'s listed form).
    pub fn aliases_of(&self, name: &str) -> &[String] {
        match self.class_of(name) {
            Some(id) => &self.classes[id],
            None => &[],
        }
    }

    /// Number of non-empty classes.
    pub fn len(&self) -> usize {
        self.classes.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads extra classes from a JSON file holding an array of string arrays.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AtlasError::NotFound(format!("Alias file not found at {}: {}", path.display(), e))
        })?;
        let classes: Vec<Vec<String>> = serde_json::from_reader(BufReader::new(file))?;
        let mut table = Self::new();
        for class in classes {
            table.add_class(class);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkey_class_is_symmetric() {
        let table = AliasTable::builtin();
        let names = ["Turkey", "Türkiye", "Turkiye"];
        for a in names {
            for b in names {
                if a != b {
                    assert!(table.are_equivalent(a, b), "{a} <-> {b}");
                }
            }
        }
    }

    #[test]
    fn unrelated_names_are_not_equivalent() {
        let table = AliasTable::builtin();
        assert!(!table.are_equivalent("Turkey", "Greece"));
        assert!(!table.are_equivalent("Atlantis", "Lemuria"));
    }

    #[test]
    fn overlapping_classes_merge() {
        let mut table = AliasTable::new();
        table.add_class(["A", "B"]);
        table.add_class(["C", "D"]);
        table.add_class(["B", "C"]);
        assert_eq!(table.len(), 1);
        assert!(table.are_equivalent("A", "D"));
        assert_eq!(table.aliases_of("a").len(), 4);
    }

    #[test]
    fn builtin_with_extends_without_touching_builtin() {
        let table = AliasTable::builtin_with([["Kosovo", "Kosovo (S/RES/1244 (1999))"]]);
        assert!(table.are_equivalent("Kosovo", "Kosovo (S/RES/1244 (1999))"));
        assert!(table.are_equivalent("Turkey", "Türkiye"));
        assert!(AliasTable::builtin().class_of("Kosovo").is_none());
    }
}
