//! Attribute merging across input cubes.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::cube::{AttrValue, Attributes};
use crate::error::{CubeRef, Result, TotalError};

/// Attribute key reserved for provenance.
pub const SOURCE_KEY: &str = "source";

/// What to do when two inputs carry different values under the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictRule {
    /// Keep the value from the earliest input in caller order.
    #[default]
    FirstWins,
    /// Fail with [`TotalError::AttributeConflict`].
    Strict,
}

impl fmt::Display for ConflictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstWins => write!(f, "first-wins"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for ConflictRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "first-wins" => Ok(Self::FirstWins),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown conflict rule '{}' (expected first-wins or strict)",
                other
            )),
        }
    }
}

/// Merge every input mapping into a new one.
///
/// The result holds every key found in any input except [`SOURCE_KEY`],
/// which is left for the provenance recorder. Inputs are only read.
pub fn merge_attributes<'a, I>(inputs: I, rule: ConflictRule) -> Result<Attributes>
where
    I: IntoIterator<Item = &'a Attributes>,
{
    // key -> (index of the cube that supplied the value, value)
    let mut merged: BTreeMap<String, (usize, AttrValue)> = BTreeMap::new();

    for (index, attributes) in inputs.into_iter().enumerate() {
        for (key, value) in attributes.iter() {
            if key == SOURCE_KEY {
                continue;
            }

            match merged.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert((index, value.clone()));
                }
                Entry::Occupied(slot) => {
                    let (first_index, first) = slot.get();
                    if first == value {
                        continue;
                    }
                    match rule {
                        ConflictRule::FirstWins => {
                            debug!(
                                key = %key,
                                kept = %first,
                                dropped = %value,
                                kept_from = first_index,
                                dropped_from = index,
                                "Attribute conflict resolved by first-wins"
                            );
                        }
                        ConflictRule::Strict => {
                            return Err(TotalError::AttributeConflict {
                                key: key.clone(),
                                first: first.clone(),
                                second: value.clone(),
                                cubes: vec![CubeRef::new(*first_index), CubeRef::new(index)],
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(merged.into_iter().map(|(k, (_, v))| (k, v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_union_of_keys() {
        let a = attrs(&[("units", "mm")]);
        let b = attrs(&[("long_name", "ice sheet contribution")]);

        let merged = merge_attributes([&a, &b], ConflictRule::FirstWins).unwrap();
        assert_eq!(merged.len(), 2);
        assert!(merged.contains_key("units"));
        assert!(merged.contains_key("long_name"));
    }

    #[test]
    fn test_equal_values_collapse() {
        let a = attrs(&[("units", "mm")]);
        let b = attrs(&[("units", "mm")]);

        let merged = merge_attributes([&a, &b], ConflictRule::Strict).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("units"), Some(&AttrValue::from("mm")));
    }

    #[test]
    fn test_first_wins_is_repeatable() {
        let a = attrs(&[("units", "mm")]);
        let b = attrs(&[("units", "cm")]);

        for _ in 0..3 {
            let merged = merge_attributes([&a, &b], ConflictRule::FirstWins).unwrap();
            assert_eq!(merged.get("units"), Some(&AttrValue::from("mm")));
        }
        let reversed = merge_attributes([&b, &a], ConflictRule::FirstWins).unwrap();
        assert_eq!(reversed.get("units"), Some(&AttrValue::from("cm")));
    }

    #[test]
    fn test_strict_reports_conflict() {
        let a = attrs(&[("units", "mm")]);
        let b = attrs(&[("title", "x")]);
        let c = attrs(&[("units", "cm")]);

        match merge_attributes([&a, &b, &c], ConflictRule::Strict) {
            Err(TotalError::AttributeConflict {
                key,
                first,
                second,
                cubes,
            }) => {
                assert_eq!(key, "units");
                assert_eq!(first, AttrValue::from("mm"));
                assert_eq!(second, AttrValue::from("cm"));
                assert_eq!(cubes, vec![CubeRef::new(0), CubeRef::new(2)]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_source_key_is_not_merged() {
        let a = attrs(&[("source", "old/provenance"), ("units", "mm")]);

        let merged = merge_attributes([&a], ConflictRule::Strict).unwrap();
        assert!(!merged.contains_key(SOURCE_KEY));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_inputs_are_left_untouched() {
        let a = attrs(&[("units", "mm")]);
        let b = attrs(&[("title", "total")]);

        let _ = merge_attributes([&a, &b], ConflictRule::FirstWins).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }
}
