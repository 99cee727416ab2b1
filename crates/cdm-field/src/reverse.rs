//! Reverse lookup from coordinate values to axis indices, and the forward
//! lookup from indices to coordinate values.
//!
//! Nearest match builds an n-dimensional squared-distance array over the
//! coordinate variables that span an axis and takes its minimum. There is no
//! tolerance check: a target outside the covered extent still resolves to the
//! nearest index.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use cdm_common::{roles, Calendar, CalendarDate, CdmError, TimeUnits};
use cdm_model::{AxisSelection, DataArray, ScalarValue, Variable};

use crate::error::{FieldError, FieldResult};
use crate::field::Field;
use crate::mapping::CoordinateEntry;

/// Coordinate entry, its variable and the target constraining it.
type Constraint<'v> = (&'v CoordinateEntry, &'v Variable, &'v CoordinateTarget);

/// A value to search for along a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateTarget {
    Number(f64),
    Time(CalendarDate),
    Text(String),
}

impl From<f64> for CoordinateTarget {
    fn from(v: f64) -> Self {
        CoordinateTarget::Number(v)
    }
}

impl From<i32> for CoordinateTarget {
    fn from(v: i32) -> Self {
        CoordinateTarget::Number(v as f64)
    }
}

impl From<&str> for CoordinateTarget {
    fn from(s: &str) -> Self {
        match s.trim().parse::<f64>() {
            Ok(v) => CoordinateTarget::Number(v),
            Err(_) => CoordinateTarget::Text(s.to_string()),
        }
    }
}

impl From<String> for CoordinateTarget {
    fn from(s: String) -> Self {
        CoordinateTarget::from(s.as_str())
    }
}

impl From<CalendarDate> for CoordinateTarget {
    fn from(date: CalendarDate) -> Self {
        CoordinateTarget::Time(date)
    }
}

impl From<NaiveDateTime> for CoordinateTarget {
    fn from(dt: NaiveDateTime) -> Self {
        CoordinateTarget::Time(dt.into())
    }
}

impl From<DateTime<Utc>> for CoordinateTarget {
    fn from(dt: DateTime<Utc>) -> Self {
        CoordinateTarget::Time(dt.into())
    }
}

/// Result of a reverse lookup for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisIndex {
    /// Nearest (or matching) index along the axis.
    Index(usize),
    /// No target constrained this axis.
    Unspecified,
    /// An exact-match search found nothing.
    NotFound,
}

impl AxisIndex {
    pub fn index(&self) -> Option<usize> {
        match self {
            AxisIndex::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Selection for reading the located data: the index, the whole axis
    /// when unspecified, `None` when nothing matched.
    pub fn selection(&self) -> Option<AxisSelection> {
        match self {
            AxisIndex::Index(i) => Some(AxisSelection::Index(*i)),
            AxisIndex::Unspecified => Some(AxisSelection::All),
            AxisIndex::NotFound => None,
        }
    }
}

/// Coordinate value at a set of indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number { value: f64, units: Option<String> },
    Text(String),
    Time(CalendarDate),
}

/// A target resolved against one coordinate variable.
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Number(f64),
    Text(String),
}

fn resolve_target(target: &CoordinateTarget, coordinate: &Variable) -> FieldResult<Resolved> {
    Ok(match target {
        CoordinateTarget::Number(v) => Resolved::Number(*v),
        CoordinateTarget::Text(s) => Resolved::Text(s.clone()),
        CoordinateTarget::Time(date) => {
            let (units, calendar) = time_encoding(coordinate)?;
            Resolved::Number(units.encode(date, calendar)?)
        }
    })
}

/// Units and calendar of a time coordinate variable.
pub(crate) fn time_encoding(variable: &Variable) -> FieldResult<(TimeUnits, Calendar)> {
    let units = TimeUnits::parse(variable.units().unwrap_or_default())?;
    let calendar = Calendar::from_attribute(variable.attributes.get_str("calendar"))?;
    Ok((units, calendar))
}

fn flat_values(data: DataArray) -> Vec<ScalarValue> {
    match data {
        DataArray::Numeric(a) => a.iter().map(|v| ScalarValue::Number(*v)).collect(),
        DataArray::Text(a) => a.iter().map(|v| ScalarValue::Text(v.clone())).collect(),
    }
}

fn exact_match(value: &ScalarValue, target: &Resolved) -> bool {
    match (value, target) {
        (ScalarValue::Number(v), Resolved::Number(t)) => v == t,
        (ScalarValue::Text(v), Resolved::Text(t)) => v == t,
        (ScalarValue::Text(v), Resolved::Number(t)) => v.trim().parse::<f64>() == Ok(*t),
        (ScalarValue::Number(v), Resolved::Text(t)) => t.trim().parse::<f64>() == Ok(*v),
    }
}

/// Row-major multi-index of a flat index.
fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (i, len) in shape.iter().enumerate().rev() {
        if *len > 0 {
            index[i] = flat % len;
            flat /= len;
        }
    }
    index
}

impl<'a> Field<'a> {
    /// Locate the index along every axis of the field's variable that is
    /// closest to the given role targets.
    ///
    /// Targets are `(role, value)` pairs. An axis is resolved only when at
    /// least as many targets constrain it as its coordinate variables have
    /// dimensions.
    pub fn reversemap(&self, targets: &[(&str, CoordinateTarget)]) -> FieldResult<Vec<AxisIndex>> {
        (0..self.variable().ndim())
            .map(|axis| self.locate_axis(axis, targets))
            .collect()
    }

    fn locate_axis(&self, axis: usize, targets: &[(&str, CoordinateTarget)]) -> FieldResult<AxisIndex> {
        let mut collected: Vec<Constraint<'_>> = Vec::new();
        for (role, entry) in self.mapping().iter() {
            if !entry.spans(axis) {
                continue;
            }
            if let Some((_, target)) = targets.iter().find(|(r, _)| *r == role) {
                let coordinate = self
                    .group()
                    .variable(&entry.variable)
                    .ok_or_else(|| CdmError::variable_not_found(&entry.variable))?;
                collected.push((entry, coordinate, target));
            }
        }
        let (first_entry, first, _) = match collected.first() {
            Some(c) => *c,
            None => return Ok(AxisIndex::Unspecified),
        };

        let shape = first.shape();
        for (_, other, _) in &collected[1..] {
            let other_shape = other.shape();
            if other_shape != shape {
                return Err(FieldError::CoordinateShapeMismatch {
                    axis,
                    first: first.name.clone(),
                    first_shape: shape,
                    other: other.name.clone(),
                    other_shape,
                });
            }
        }

        if collected.len() < shape.len() {
            return Ok(AxisIndex::Unspecified);
        }

        let resolved = collected
            .iter()
            .map(|(_, coordinate, target)| resolve_target(target, coordinate))
            .collect::<FieldResult<Vec<_>>>()?;

        let numeric = resolved.iter().all(|t| matches!(t, Resolved::Number(_)))
            && collected.iter().all(|(_, c, _)| c.is_numeric());

        let found = if numeric {
            self.nearest(&collected, &resolved)?
        } else {
            self.first_exact(&collected, &resolved)?
        };

        let position = first_entry.axes.iter().position(|a| *a == axis).unwrap_or(0);
        Ok(match found {
            Some(flat) => {
                let index = unravel(flat, &shape)[position];
                debug!(field = %self.name(), axis, index, "Located axis index");
                AxisIndex::Index(index)
            }
            None => AxisIndex::NotFound,
        })
    }

    /// Flat index of the smallest summed squared distance, ignoring NaN.
    /// Ties resolve to the lowest row-major index.
    fn nearest(
        &self,
        collected: &[Constraint<'_>],
        resolved: &[Resolved],
    ) -> FieldResult<Option<usize>> {
        let mut distance: Option<ndarray::ArrayD<f64>> = None;
        for ((_, coordinate, _), target) in collected.iter().zip(resolved) {
            let t = match target {
                Resolved::Number(t) => *t,
                Resolved::Text(_) => continue,
            };
            let values = coordinate.numeric_values()?;
            let squared = values.mapv(|v| (v - t) * (v - t));
            distance = Some(match distance {
                Some(d) => d + squared,
                None => squared,
            });
        }

        let mut best: Option<(usize, f64)> = None;
        if let Some(distance) = distance {
            for (i, d) in distance.iter().enumerate() {
                if d.is_nan() {
                    continue;
                }
                if best.map_or(true, |(_, b)| *d < b) {
                    best = Some((i, *d));
                }
            }
        }
        Ok(best.map(|(i, _)| i))
    }

    /// Flat index of the first entry matching every target exactly.
    fn first_exact(
        &self,
        collected: &[Constraint<'_>],
        resolved: &[Resolved],
    ) -> FieldResult<Option<usize>> {
        let columns = collected
            .iter()
            .map(|(_, coordinate, _)| coordinate.values().map(flat_values))
            .collect::<Result<Vec<_>, _>>()?;
        let len = columns.first().map_or(0, Vec::len);
        Ok((0..len).find(|&i| {
            columns
                .iter()
                .zip(resolved)
                .all(|(column, target)| exact_match(&column[i], target))
        }))
    }

    /// Coordinate values at the given per-axis indices.
    ///
    /// A role is included only when every axis it spans has an index. The
    /// time role is decoded to a calendar date when its units allow.
    pub fn coordinates(&self, indices: &[Option<usize>]) -> FieldResult<BTreeMap<String, CoordinateValue>> {
        let mut result = BTreeMap::new();
        for (role, entry) in self.mapping().iter() {
            let selection: Option<Vec<AxisSelection>> = entry
                .axes
                .iter()
                .map(|axis| indices.get(*axis).copied().flatten().map(AxisSelection::Index))
                .collect();
            let selection = match selection {
                Some(s) => s,
                None => continue,
            };
            let coordinate = self
                .group()
                .variable(&entry.variable)
                .ok_or_else(|| CdmError::variable_not_found(&entry.variable))?;

            let value = match coordinate.read(&selection)?.get_flat(0) {
                Some(v) => v,
                None => continue,
            };
            let value = match value {
                ScalarValue::Text(s) => CoordinateValue::Text(s),
                ScalarValue::Number(v) if role == roles::TIME => {
                    match time_encoding(coordinate).and_then(|(u, c)| Ok(u.decode(v, c)?)) {
                        Ok(date) => CoordinateValue::Time(date),
                        Err(_) => CoordinateValue::Number {
                            value: v,
                            units: coordinate.units().map(str::to_string),
                        },
                    }
                }
                ScalarValue::Number(v) => CoordinateValue::Number {
                    value: v,
                    units: coordinate.units().map(str::to_string),
                },
            };
            result.insert(role.to_string(), value);
        }
        Ok(result)
    }
}
