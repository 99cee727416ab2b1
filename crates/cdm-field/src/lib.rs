//! Fields over CDM variables.
//!
//! A [`Field`] wraps one or more variables of a group that share a
//! [`CoordinatesMapping`] from coordinate roles (`latitude`, `longitude`,
//! `time`, ...) to the variable's axes. From the mapping a field can:
//!
//! - classify itself as a [`FeatureType`]
//! - map coordinate values back to axis indices ([`Field::reversemap`])
//! - partition its time axis into calendar-aligned windows and aggregate
//!   over them ([`Field::time_slices`], [`Field::time_aggregation`])
//! - render itself as a GeoJSON [`FeatureCollection`] ([`Field::features`])
//!
//! # Example
//!
//! ```rust
//! use cdm_field::{Field, FeatureType};
//! use cdm_model::{AttributeList, Dataset, Dimension, MemoryArray};
//!
//! let mut ds = Dataset::new(Some("demo"), None);
//! let root = ds.root_id();
//! ds.root_mut().add_dimension(Dimension::new("lat", 2)).unwrap();
//! ds.root_mut().add_dimension(Dimension::new("lon", 2)).unwrap();
//! ds.create_variable(root, "lat", vec!["lat".into()],
//!     AttributeList::new().with("units", "degrees_north"),
//!     MemoryArray::from_vec(vec![0.0, 1.0])).unwrap();
//! ds.create_variable(root, "lon", vec!["lon".into()],
//!     AttributeList::new().with("units", "degrees_east"),
//!     MemoryArray::from_vec(vec![10.0, 11.0])).unwrap();
//! ds.create_variable(root, "tas", vec!["lat".into(), "lon".into()],
//!     AttributeList::new(),
//!     MemoryArray::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap()).unwrap();
//!
//! let field = Field::for_variable(ds.root(), "tas").unwrap();
//! assert_eq!(field.feature_type(), Some(FeatureType::Grid));
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod feature_type;
pub mod field;
pub mod geojson;
pub mod mapping;
pub mod reverse;
pub mod temporal;

pub use config::ExportConfig;
pub use error::{FieldError, FieldResult};
pub use export::{cell_corners, ExportOptions};
pub use feature_type::{classify, FeatureType};
pub use field::{fields_for_group, merge_fields, Field};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use mapping::{CoordinateEntry, CoordinatesMapping};
pub use reverse::{AxisIndex, CoordinateTarget, CoordinateValue};
pub use temporal::{
    time_slices, Aggregation, LengthUnit, OriginSpec, Reduction, TimeBounds, TimeWindow,
    WindowLength,
};
