//! Classification of a field's sampling geometry.

use std::fmt;

use serde::Serialize;

use cdm_common::roles;

use crate::mapping::CoordinatesMapping;

/// Topology of the points a field is sampled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FeatureType {
    /// Discrete points at a single time.
    Point,
    /// Discrete points over a number of time steps.
    PointSeries,
    /// A rectangular or curvilinear grid at a single time.
    Grid,
    /// A rectangular or curvilinear grid over a number of time steps.
    GridSeries,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Point => "Point",
            FeatureType::PointSeries => "PointSeries",
            FeatureType::Grid => "Grid",
            FeatureType::GridSeries => "GridSeries",
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, FeatureType::PointSeries | FeatureType::GridSeries)
    }

    pub fn is_grid(&self) -> bool {
        matches!(self, FeatureType::Grid | FeatureType::GridSeries)
    }

    pub fn is_point(&self) -> bool {
        matches!(self, FeatureType::Point | FeatureType::PointSeries)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a coordinates mapping. `None` means the field is unmapped.
pub fn classify(mapping: &CoordinatesMapping) -> Option<FeatureType> {
    let lat = mapping.get(roles::LATITUDE)?;
    let lon = mapping.get(roles::LONGITUDE)?;
    let series = mapping.contains(roles::TIME);

    let grid = if lat.axes.len() == 1 && lon.axes.len() == 1 {
        // points must be declared through the coordinates attribute
        !(lat.is_auxiliary() && lon.is_auxiliary())
    } else if lat.axes.len() >= 2 && lon.axes.len() >= 2 {
        true
    } else {
        return None;
    };

    Some(match (grid, series) {
        (true, true) => FeatureType::GridSeries,
        (true, false) => FeatureType::Grid,
        (false, true) => FeatureType::PointSeries,
        (false, false) => FeatureType::Point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdm_model::{AttributeList, Dataset, Dimension, DimensionRef, MemoryArray};

    fn mapping_for(coordinates: Option<&str>, with_time: bool) -> CoordinatesMapping {
        let mut ds = Dataset::new(Some("t"), None);
        let root = ds.root_id();
        ds.root_mut().add_dimension(Dimension::new("time", 1)).unwrap();
        ds.root_mut().add_dimension(Dimension::new("lat", 2)).unwrap();
        ds.root_mut().add_dimension(Dimension::new("lon", 2)).unwrap();
        for (name, units) in [("lat", "degrees_north"), ("lon", "degrees_east")] {
            ds.create_variable(
                root,
                name,
                vec![DimensionRef::from(name)],
                AttributeList::new().with("units", units),
                MemoryArray::from_vec(vec![0.0, 1.0]),
            )
            .unwrap();
        }
        if with_time {
            ds.create_variable(
                root,
                "time",
                vec!["time".into()],
                AttributeList::new().with("units", "days since 2000-01-01"),
                MemoryArray::from_vec(vec![0.0]),
            )
            .unwrap();
        }
        let mut attrs = AttributeList::new();
        if let Some(names) = coordinates {
            attrs.insert("coordinates", names);
        }
        ds.create_variable(
            root,
            "v",
            vec!["time".into(), "lat".into(), "lon".into()],
            attrs,
            MemoryArray::from_shape_vec(&[1, 2, 2], vec![0.0; 4]).unwrap(),
        )
        .unwrap();
        CoordinatesMapping::build(ds.root(), ds.root().variable("v").unwrap())
    }

    #[test]
    fn test_rectilinear_grid() {
        assert_eq!(classify(&mapping_for(None, false)), Some(FeatureType::Grid));
        assert_eq!(classify(&mapping_for(None, true)), Some(FeatureType::GridSeries));
    }

    #[test]
    fn test_points_from_coordinates_attribute() {
        let ft = classify(&mapping_for(Some("lat lon"), true)).unwrap();
        assert_eq!(ft, FeatureType::PointSeries);
        assert!(ft.is_point() && ft.is_series());
        assert_eq!(classify(&mapping_for(Some("lat lon"), false)), Some(FeatureType::Point));
    }

    #[test]
    fn test_one_auxiliary_is_still_grid() {
        assert_eq!(classify(&mapping_for(Some("lat"), false)), Some(FeatureType::Grid));
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(classify(&CoordinatesMapping::default()), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FeatureType::GridSeries.to_string(), "GridSeries");
    }
}
