//! Mapping of variable axes to coordinate roles.
//!
//! Roles come from two sources, applied in order:
//!
//! 1. Coordinate variables: a variable in the group named after one of the
//!    data variable's dimensions maps that single axis.
//! 2. The `coordinates` attribute: each listed auxiliary variable maps the
//!    axes of its own dimensions, overriding entries from step 1.
//!
//! The role is the canonical name for the coordinate variable's `units`
//! (latitude, longitude or time), falling back to the variable's name.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use cdm_common::canonical_role;
use cdm_model::{Group, Variable};

/// One mapped coordinate role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinateEntry {
    /// Name of the coordinate variable in the owning group.
    pub variable: String,

    /// Axes of the data variable spanned by the coordinate variable, in the
    /// coordinate variable's own dimension order.
    pub axes: Vec<usize>,

    /// Full `coordinates` attribute list when the entry came from it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<Vec<String>>,
}

impl CoordinateEntry {
    pub fn is_auxiliary(&self) -> bool {
        self.auxiliary.is_some()
    }

    pub fn spans(&self, axis: usize) -> bool {
        self.axes.contains(&axis)
    }
}

/// Role to coordinate entry mapping for one variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoordinatesMapping {
    entries: BTreeMap<String, CoordinateEntry>,
}

/// Role for a coordinate variable: canonical units role or the fallback name.
fn role_for(coordinate: &Variable, fallback: &str) -> String {
    coordinate
        .units()
        .and_then(canonical_role)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

impl CoordinatesMapping {
    /// Build the mapping for `variable` from the variables of `group`.
    pub fn build(group: &Group, variable: &Variable) -> Self {
        let mut mapping = Self::default();

        for (axis, dimension) in variable.dimensions().iter().enumerate() {
            if let Some(coordinate) = group.variable(&dimension.name) {
                let role = role_for(coordinate, &dimension.name);
                debug!(variable = %variable.name, axis, role = %role, "Mapped coordinate variable");
                mapping.entries.insert(
                    role,
                    CoordinateEntry {
                        variable: dimension.name.clone(),
                        axes: vec![axis],
                        auxiliary: None,
                    },
                );
            }
        }

        if let Some(attribute) = variable.attributes.get_str("coordinates") {
            let names: Vec<String> = attribute.split_whitespace().map(str::to_string).collect();
            for name in &names {
                let coordinate = match group.variable(name) {
                    Some(coordinate) => coordinate,
                    None => continue,
                };
                let axes: Option<Vec<usize>> = coordinate
                    .dimensions()
                    .iter()
                    .map(|d| variable.axis_of(&d.name))
                    .collect();
                let axes = match axes {
                    Some(axes) => axes,
                    None => {
                        debug!(
                            variable = %variable.name,
                            coordinate = %name,
                            "Skipping auxiliary coordinate with dimensions outside the variable"
                        );
                        continue;
                    }
                };
                let role = role_for(coordinate, name);
                debug!(variable = %variable.name, role = %role, axes = ?axes, "Mapped auxiliary coordinate");
                mapping.entries.insert(
                    role,
                    CoordinateEntry {
                        variable: name.clone(),
                        axes,
                        auxiliary: Some(names.clone()),
                    },
                );
            }
        }

        mapping
    }

    pub fn get(&self, role: &str) -> Option<&CoordinateEntry> {
        self.entries.get(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.entries.contains_key(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoordinateEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Roles whose entries span `axis`.
    pub fn roles_for_axis(&self, axis: usize) -> Vec<&str> {
        self.iter()
            .filter(|(_, entry)| entry.spans(axis))
            .map(|(role, _)| role)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
