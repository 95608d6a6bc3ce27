//! Key type for cached query results.

use std::fmt;

/// Deterministic string key naming one cached result.
///
/// Keys are only built through [`CacheKey::scoped`], so every key is a
/// known prefix optionally followed by `_` and a trimmed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a fixed prefix and an identifier, e.g.
    /// `doctor_stats_D01`.
    ///
    /// Identifiers are trimmed; a blank identifier yields the bare prefix.
    pub(crate) fn scoped(prefix: &str, id: &str) -> Self {
        match id.trim() {
            "" => Self(prefix.to_owned()),
            trimmed => Self(format!("{prefix}_{trimmed}")),
        }
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::CacheKey;
    use rstest::rstest;

    #[rstest]
    #[case("doctor_stats", "D01", "doctor_stats_D01")]
    #[case("doctor_stats", " D01 ", "doctor_stats_D01")]
    #[case("all_subjects", "", "all_subjects")]
    #[case("all_subjects", "   ", "all_subjects")]
    fn scoped_keys_join_prefix_and_id(
        #[case] prefix: &str,
        #[case] id: &str,
        #[case] expected: &str,
    ) {
        let key = CacheKey::scoped(prefix, id);
        assert_eq!(key.as_str(), expected);
        assert_eq!(key.to_string(), expected);
    }
}
