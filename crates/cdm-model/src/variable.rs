//! Variables: named arrays with ordered axes and attributes.

use ndarray::ArrayD;

use cdm_common::{CdmError, CdmResult};

use crate::array::{ArraySource, AxisSelection, DataArray};
use crate::attribute::{AttributeList, AttributeValue};
use crate::dimension::Dimension;

/// Attributes whose values mark missing data.
const MISSING_VALUE_ATTRIBUTES: &[&str] = &["_FillValue", "missing_value"];

/// A named array. The order of `dimensions` is fixed at construction and
/// defines the indexing order of every read.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    dimensions: Vec<Dimension>,
    pub attributes: AttributeList,
    data: Box<dyn ArraySource>,
}

impl Variable {
    /// Create a variable from resolved dimensions. The data shape must match
    /// the dimension lengths axis for axis.
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<Dimension>,
        attributes: AttributeList,
        data: Box<dyn ArraySource>,
    ) -> CdmResult<Self> {
        let name = name.into();
        let expected: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
        let actual = data.shape();
        if expected != actual {
            return Err(CdmError::ShapeMismatch {
                name,
                expected,
                actual,
            });
        }
        Ok(Self {
            name,
            dimensions,
            attributes,
            data,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Position of a dimension in this variable's axis list.
    pub fn axis_of(&self, dimension: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name == dimension)
    }

    pub fn shape(&self) -> Vec<usize> {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn units(&self) -> Option<&str> {
        self.attributes.get_str("units")
    }

    /// Read a selection as stored.
    pub fn read(&self, selection: &[AxisSelection]) -> CdmResult<DataArray> {
        self.data.read(selection)
    }

    /// Read the whole array.
    pub fn values(&self) -> CdmResult<DataArray> {
        self.data.read(&[])
    }

    pub fn is_numeric(&self) -> bool {
        self.data
            .read(&vec![AxisSelection::range(0, 0); self.ndim()])
            .map(|d| d.as_numeric().is_some())
            .unwrap_or(false)
    }

    /// Read a numeric selection with `_FillValue` and `missing_value` entries
    /// replaced by NaN.
    pub fn read_numeric(&self, selection: &[AxisSelection]) -> CdmResult<ArrayD<f64>> {
        let mut array = self
            .data
            .read(selection)?
            .into_numeric()
            .ok_or_else(|| CdmError::NotNumeric(self.name.clone()))?;

        let missing: Vec<f64> = MISSING_VALUE_ATTRIBUTES
            .iter()
            .filter_map(|key| self.attributes.get_f64(key))
            .collect();
        if !missing.is_empty() {
            array.mapv_inplace(|v| if missing.contains(&v) { f64::NAN } else { v });
        }
        Ok(array)
    }

    /// Whole array as numbers with missing values as NaN.
    pub fn numeric_values(&self) -> CdmResult<ArrayD<f64>> {
        self.read_numeric(&[])
    }

    pub(crate) fn update_dimension(&mut self, dimension: &Dimension) {
        for dim in self.dimensions.iter_mut().filter(|d| d.name == dimension.name) {
            *dim = dimension.clone();
        }
    }
}
