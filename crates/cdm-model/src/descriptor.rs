//! Dataset descriptor documents (JSON or YAML).
//!
//! A descriptor lists dimensions, variables with flat row-major data, and
//! nested groups:
//!
//! ```yaml
//! name: stations
//! dimensions:
//!   - { name: station, length: 2 }
//! variables:
//!   - name: lat
//!     dimensions: [station]
//!     attributes: { units: degrees_north }
//!     data: [-33.9, -26.2]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cdm_common::{CdmError, CdmResult};

use crate::array::{DataArray, MemoryArray};
use crate::attribute::AttributeList;
use crate::dataset::Dataset;
use crate::dimension::{Dimension, DimensionRef};
use crate::group::GroupId;

const EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Whether a URI names a descriptor file by its extension.
pub fn is_descriptor_uri(uri: &str) -> bool {
    Path::new(uri)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    pub name: String,
    pub length: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unlimited: bool,
}

/// Flat row-major variable data. `null` entries in numeric data become NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: String,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default, skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
    pub data: VariableData,
}

/// Contents shared by the root and nested groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupContents {
    #[serde(default, skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<DimensionDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub contents: GroupContents,
}

/// Serializable description of a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub root: GroupContents,
}

impl DatasetDescriptor {
    pub fn from_json(text: &str) -> CdmResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> CdmResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_json(&self) -> CdmResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the in-memory dataset described by this document.
    pub fn into_dataset(self, uri: Option<&str>) -> CdmResult<Dataset> {
        let mut dataset = Dataset::new(self.name.as_deref(), uri);
        let root = dataset.root_id();
        build_group(&mut dataset, root, self.root)?;
        Ok(dataset)
    }

    /// Describe an existing dataset. Variable data is read in full.
    pub fn from_dataset(dataset: &Dataset) -> CdmResult<Self> {
        Ok(Self {
            name: Some(dataset.name.clone()),
            root: describe_group(dataset, dataset.root_id())?,
        })
    }
}

fn build_group(dataset: &mut Dataset, id: GroupId, contents: GroupContents) -> CdmResult<()> {
    dataset.group_mut(id).attributes = contents.attributes;
    for dim in contents.dimensions {
        let dimension = if dim.unlimited {
            Dimension::unlimited(dim.name, dim.length)
        } else {
            Dimension::new(dim.name, dim.length)
        };
        dataset.group_mut(id).add_dimension(dimension)?;
    }

    for var in contents.variables {
        let shape = var
            .dimensions
            .iter()
            .map(|name| dataset.resolve_dimension(id, name).map(|d| d.len()))
            .collect::<CdmResult<Vec<_>>>()?;
        let data = match var.data {
            VariableData::Numeric(values) => MemoryArray::from_shape_vec(
                &shape,
                values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            ),
            VariableData::Text(values) => MemoryArray::from_strings(&shape, values),
        }
        .map_err(|e| match e {
            CdmError::ShapeMismatch {
                expected, actual, ..
            } => CdmError::ShapeMismatch {
                name: var.name.clone(),
                expected,
                actual,
            },
            other => other,
        })?;
        let dims = var.dimensions.into_iter().map(DimensionRef::from).collect();
        dataset.create_variable(id, &var.name, dims, var.attributes, data)?;
    }

    for child in contents.groups {
        let child_id = dataset.add_group(id, &child.name)?;
        build_group(dataset, child_id, child.contents)?;
    }
    Ok(())
}

fn describe_group(dataset: &Dataset, id: GroupId) -> CdmResult<GroupContents> {
    let group = dataset.group(id);
    let mut dimensions: Vec<DimensionDescriptor> = group
        .dimensions()
        .iter()
        .map(|d| DimensionDescriptor {
            name: d.name.clone(),
            length: d.len(),
            unlimited: d.is_unlimited(),
        })
        .collect();

    let mut variables = Vec::new();
    for var in group.variables() {
        // private dimensions have no declaration to reference, so declare them here
        for dim in var.dimensions().iter().filter(|d| !d.is_shared()) {
            if !dimensions.iter().any(|d| d.name == dim.name) {
                dimensions.push(DimensionDescriptor {
                    name: dim.name.clone(),
                    length: dim.len(),
                    unlimited: dim.is_unlimited(),
                });
            }
        }
        let data = match var.values()? {
            DataArray::Numeric(a) => VariableData::Numeric(
                a.iter().map(|v| if v.is_nan() { None } else { Some(*v) }).collect(),
            ),
            DataArray::Text(a) => VariableData::Text(a.iter().cloned().collect()),
        };
        variables.push(VariableDescriptor {
            name: var.name.clone(),
            dimensions: var.dimension_names().into_iter().map(String::from).collect(),
            attributes: var.attributes.clone(),
            data,
        });
    }

    let groups = group
        .children()
        .iter()
        .map(|child| -> CdmResult<GroupDescriptor> {
            Ok(GroupDescriptor {
                name: dataset.group(*child).name.clone(),
                contents: describe_group(dataset, *child)?,
            })
        })
        .collect::<CdmResult<Vec<_>>>()?;

    Ok(GroupContents {
        attributes: group.attributes.clone(),
        dimensions,
        variables,
        groups,
    })
}

/// Open a descriptor file, choosing the parser from the extension.
pub fn open_descriptor(uri: &str) -> CdmResult<Dataset> {
    let path = Path::new(uri);
    let text = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let descriptor = match extension.as_str() {
        "json" => DatasetDescriptor::from_json(&text)?,
        "yaml" | "yml" => DatasetDescriptor::from_yaml(&text)?,
        other => {
            return Err(CdmError::invalid_descriptor(format!(
                "unsupported extension '{}'",
                other
            )))
        }
    };
    debug!(uri = %uri, "Parsed dataset descriptor");
    descriptor.into_dataset(Some(uri))
}
