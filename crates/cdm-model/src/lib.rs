//! Common Data Model: datasets, groups, dimensions, variables and attributes.
//!
//! A [`Dataset`] owns an arena of [`Group`]s linked by [`GroupId`]. Each group
//! declares shared [`Dimension`]s and holds [`Variable`]s whose data is read
//! through an [`ArraySource`]. Format readers are plugged in through the
//! ordered [`DatasetRegistry`].
//!
//! # Example
//!
//! ```rust
//! use cdm_model::{AttributeList, Dataset, Dimension, DimensionRef, MemoryArray};
//!
//! let mut ds = Dataset::new(Some("demo"), None);
//! let root = ds.root_id();
//! ds.group_mut(root).add_dimension(Dimension::new("lat", 3)).unwrap();
//! ds.create_variable(
//!     root,
//!     "lat",
//!     vec![DimensionRef::from("lat")],
//!     AttributeList::new().with("units", "degrees_north"),
//!     MemoryArray::from_vec(vec![-10.0, 0.0, 10.0]),
//! )
//! .unwrap();
//! assert_eq!(ds.root().variable("lat").unwrap().shape(), vec![3]);
//! ```

pub mod array;
pub mod attribute;
pub mod dataset;
pub mod descriptor;
pub mod dimension;
pub mod group;
pub mod registry;
pub mod variable;

pub use array::{ArraySource, AxisSelection, DataArray, MemoryArray, ScalarValue};
pub use attribute::{AttributeList, AttributeValue};
pub use dataset::Dataset;
pub use descriptor::{open_descriptor, DatasetDescriptor};
pub use dimension::{Dimension, DimensionRef};
pub use group::{Group, GroupId};
pub use registry::DatasetRegistry;
pub use variable::Variable;

pub use cdm_common::{CdmError, CdmResult};
