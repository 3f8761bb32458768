//! Editions `FeatureSet` inheritance (spec §4.6, "Editions features inheritance").
//!
//! Each element in a file compiled under the editions dialect carries a
//! resolved `FeatureSet`: for every feature field, the value comes from
//! (in order) the element itself, its enclosing element, or the edition's
//! published default. Edition defaults are looked up by the latest
//! registered edition that is lexically `<=` the file's edition — spec
//! directs implementers to keep that comparison lexical (by component
//! length, then by value) rather than "fixing" it to a real semver compare,
//! since that is what the original matches byte-for-byte.

use prost_types::FeatureSet;

/// One feature field's per-edition default table, keyed by edition string
/// (e.g. `"2023"`, `"2024"`). Entries must be sorted ascending by edition for
/// [`resolve_default`] to find the latest applicable one with a linear scan.
#[derive(Debug, Clone)]
pub struct FeatureDefaults {
    pub field_presence: Vec<(&'static str, i32)>,
    pub enum_type: Vec<(&'static str, i32)>,
    pub repeated_field_encoding: Vec<(&'static str, i32)>,
    pub utf8_validation: Vec<(&'static str, i32)>,
    pub message_encoding: Vec<(&'static str, i32)>,
    pub json_format: Vec<(&'static str, i32)>,
}

/// Compares two edition strings the way the original lexically does: shorter
/// strings sort first regardless of numeric value, and same-length strings
/// compare byte-for-byte. `"99"` therefore sorts before `"2023"`, matching
/// upstream's documented (if surprising) behavior rather than a numeric or
/// semver-style compare.
pub fn edition_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn resolve_default(table: &[(&'static str, i32)], edition: &str) -> Option<i32> {
    let mut best: Option<(&'static str, i32)> = None;
    for entry in table {
        let (candidate_edition, value) = *entry;
        if edition_cmp(candidate_edition, edition) == std::cmp::Ordering::Greater {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_edition, _)) => edition_cmp(candidate_edition, best_edition) == std::cmp::Ordering::Greater,
        };
        if better {
            best = Some((candidate_edition, value));
        }
    }
    best.map(|(_, value)| value)
}

/// Resolves one element's effective `FeatureSet`: an explicitly-set field
/// wins, otherwise the parent's resolved feature set is consulted, otherwise
/// the edition default table supplies it.
pub fn resolve_features(explicit: Option<&FeatureSet>, parent: &FeatureSet, edition: &str, defaults: &FeatureDefaults) -> FeatureSet {
    FeatureSet {
        field_presence: explicit
            .and_then(|f| f.field_presence)
            .or(parent.field_presence)
            .or_else(|| resolve_default(&defaults.field_presence, edition)),
        enum_type: explicit.and_then(|f| f.enum_type).or(parent.enum_type).or_else(|| resolve_default(&defaults.enum_type, edition)),
        repeated_field_encoding: explicit
            .and_then(|f| f.repeated_field_encoding)
            .or(parent.repeated_field_encoding)
            .or_else(|| resolve_default(&defaults.repeated_field_encoding, edition)),
        utf8_validation: explicit
            .and_then(|f| f.utf8_validation)
            .or(parent.utf8_validation)
            .or_else(|| resolve_default(&defaults.utf8_validation, edition)),
        message_encoding: explicit
            .and_then(|f| f.message_encoding)
            .or(parent.message_encoding)
            .or_else(|| resolve_default(&defaults.message_encoding, edition)),
        json_format: explicit.and_then(|f| f.json_format).or(parent.json_format).or_else(|| resolve_default(&defaults.json_format, edition)),
        ..FeatureSet::default()
    }
}

/// The `FeatureSet` message descriptor itself must be "well-formed" before
/// any of this runs: no oneofs, no required fields, no repeated/map fields.
/// `prost_types::FeatureSet` is generated straight from upstream
/// `descriptor.proto` and already satisfies this (every feature is a
/// singular optional enum), so this is a compile-time invariant here rather
/// than a runtime check — documented as the Open Question's resolution for
/// this crate, since there is no separate user-suppliable `FeatureSet`
/// descriptor to validate against.
pub const _FEATURE_SET_SHAPE_INVARIANT: &str =
    "prost_types::FeatureSet fields are all singular optional enums; validated by construction, not at runtime";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edition_cmp_is_lexical_not_numeric() {
        assert_eq!(edition_cmp("99", "2023"), std::cmp::Ordering::Less);
    }

    #[test]
    fn explicit_value_wins_over_parent_and_default() {
        let defaults = FeatureDefaults {
            field_presence: vec![("2023", 1)],
            enum_type: vec![],
            repeated_field_encoding: vec![],
            utf8_validation: vec![],
            message_encoding: vec![],
            json_format: vec![],
        };
        let parent = FeatureSet { field_presence: Some(2), ..FeatureSet::default() };
        let explicit = FeatureSet { field_presence: Some(3), ..FeatureSet::default() };
        let resolved = resolve_features(Some(&explicit), &parent, "2023", &defaults);
        assert_eq!(resolved.field_presence, Some(3));
    }

    #[test]
    fn falls_back_to_parent_then_edition_default() {
        let defaults = FeatureDefaults {
            field_presence: vec![("2023", 7)],
            enum_type: vec![],
            repeated_field_encoding: vec![],
            utf8_validation: vec![],
            message_encoding: vec![],
            json_format: vec![],
        };
        let parent = FeatureSet { field_presence: Some(2), ..FeatureSet::default() };
        let resolved = resolve_features(None, &parent, "2023", &defaults);
        assert_eq!(resolved.field_presence, Some(2));

        let empty_parent = FeatureSet::default();
        let resolved = resolve_features(None, &empty_parent, "2023", &defaults);
        assert_eq!(resolved.field_presence, Some(7));
    }

    #[test]
    fn picks_latest_default_not_exceeding_edition() {
        let defaults = FeatureDefaults {
            field_presence: vec![("2023", 1), ("2024", 2)],
            enum_type: vec![],
            repeated_field_encoding: vec![],
            utf8_validation: vec![],
            message_encoding: vec![],
            json_format: vec![],
        };
        let empty_parent = FeatureSet::default();
        let resolved = resolve_features(None, &empty_parent, "2023", &defaults);
        assert_eq!(resolved.field_presence, Some(1));
    }
}
