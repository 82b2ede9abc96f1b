// crates/popatlas-core/src/text.rs

/// Convert a string into a folded key suitable for indexing and comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Türkiye` -> `Turkiye`)
/// 2\) Normalize to lowercase
/// 3\) Trim surrounding whitespace
///
/// # Examples
///
/// ```rust
/// use popatlas_core::text::fold_key;
///
/// assert_eq!(fold_key("Türkiye"), "turkiye");
/// assert_eq!(fold_key(" Côte d'Ivoire "), "cote d'ivoire");
/// ```
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s.trim()).to_lowercase()
}

/// Compares two strings for equality after Unicode folding and normalization.
///
/// ```rust
/// use popatlas_core::text::equals_folded;
///
/// assert!(equals_folded("TÜRKIYE", "turkiye"));
/// assert!(!equals_folded("Turkey", "Turkiye"));
/// ```
pub fn equals_folded(a: &str, b: &str) -> bool {
    fold_key(a) == fold_key(b)
}

/// Renders a count with `,` thousands separators (`3000000` -> `3,000,000`).
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
