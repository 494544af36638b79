//! Compile-time registry of design-pattern reference parameters.
//!
//! Each pattern is defined in a TOML file under `patterns/`. The registry
//! embeds these at compile time, parses them once on first use, and
//! exposes them via [`all_patterns`] and [`pattern`].

use std::sync::LazyLock;

use pattern_discovery_patterns_models::PatternDefinition;

use crate::PatternError;

// ── Compile-time embedded TOML files ────────────────────────────────

const PATTERN_TOMLS: &[(&str, &str)] = &[
    (
        "mosaic_of_subcultures",
        include_str!("../patterns/mosaic_of_subcultures.toml"),
    ),
    (
        "community_of_7000",
        include_str!("../patterns/community_of_7000.toml"),
    ),
    (
        "identifiable_neighborhood",
        include_str!("../patterns/identifiable_neighborhood.toml"),
    ),
    ("activity_nodes", include_str!("../patterns/activity_nodes.toml")),
    ("house_cluster", include_str!("../patterns/house_cluster.toml")),
    (
        "small_public_squares",
        include_str!("../patterns/small_public_squares.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_PATTERN_COUNT: usize = 6;

/// Parses one pattern definition.
///
/// # Errors
///
/// Returns [`PatternError::Registry`] if the TOML is malformed.
pub fn parse_pattern(name: &str, toml_str: &str) -> Result<PatternDefinition, PatternError> {
    toml::de::from_str(toml_str).map_err(|e| PatternError::Registry {
        name: name.to_string(),
        message: e.to_string(),
    })
}

static PATTERNS: LazyLock<Vec<PatternDefinition>> = LazyLock::new(|| {
    let mut patterns: Vec<PatternDefinition> = PATTERN_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            parse_pattern(name, toml_str).unwrap_or_else(|e| panic!("{e}"))
        })
        .collect();
    patterns.sort_by_key(|p| p.number);
    log::debug!("Loaded {} design patterns", patterns.len());
    patterns
});

/// Returns all registered patterns, sorted by number.
///
/// # Panics
///
/// Panics if any TOML definition is malformed (this is a compile-time
/// guarantee since the definitions are embedded).
#[must_use]
pub fn all_patterns() -> Vec<PatternDefinition> {
    PATTERNS.clone()
}

/// Looks up a pattern by number.
///
/// # Errors
///
/// Returns [`PatternError::UnknownPattern`] if no pattern has that number.
pub fn pattern(number: u32) -> Result<PatternDefinition, PatternError> {
    PATTERNS
        .iter()
        .find(|p| p.number == number)
        .cloned()
        .ok_or(PatternError::UnknownPattern { number })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_patterns() {
        assert_eq!(all_patterns().len(), EXPECTED_PATTERN_COUNT);
    }

    #[test]
    fn pattern_numbers_are_unique() {
        let mut seen = BTreeSet::new();
        for p in &all_patterns() {
            assert!(seen.insert(p.number), "Duplicate pattern number: {}", p.number);
        }
    }

    #[test]
    fn ranges_are_well_formed() {
        for p in &all_patterns() {
            for (label, range) in [
                ("population", p.population_range),
                ("density", p.density_range),
                ("area", p.area_range),
            ] {
                assert!(
                    range.min > 0.0 && range.min <= range.max,
                    "Pattern {} has bad {label} range {range}",
                    p.number
                );
            }
            assert!(!p.name.is_empty(), "Pattern {} has empty name", p.number);
            assert!(!p.keywords.is_empty(), "Pattern {} has no keywords", p.number);
        }
    }

    #[test]
    fn lookup_by_number() {
        let community = pattern(12).unwrap();
        assert_eq!(community.name, "Community of 7000");
        assert!((community.population_range.min - 5000.0).abs() < f64::EPSILON);
        assert!(matches!(
            pattern(999),
            Err(PatternError::UnknownPattern { number: 999 })
        ));
    }

    #[test]
    fn registry_is_parsed_once() {
        let first = PATTERNS.as_ptr();
        assert_eq!(all_patterns(), *PATTERNS);
        pattern(37).unwrap();
        assert_eq!(PATTERNS.as_ptr(), first);
    }

    #[test]
    fn malformed_definition_is_an_error() {
        let err = parse_pattern("broken", "number = \"twelve\"").unwrap_err();
        assert!(matches!(err, PatternError::Registry { ref name, .. } if name == "broken"));
    }
}
