//! Array access for variable data.

use std::fmt;

use ndarray::{ArrayD, IxDyn, Slice};
use serde::Serialize;

use cdm_common::{CdmError, CdmResult};

/// Selection along one axis. Every selection keeps its axis, so `Index(i)`
/// yields a length-1 axis rather than dropping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSelection {
    All,
    Index(usize),
    Range { start: usize, stop: usize },
}

impl AxisSelection {
    pub fn range(start: usize, stop: usize) -> Self {
        AxisSelection::Range { start, stop }
    }

    /// Resolve to a half-open `(start, stop)` pair for an axis of length `len`.
    pub fn resolve(&self, len: usize) -> CdmResult<(usize, usize)> {
        let (start, stop) = match *self {
            AxisSelection::All => (0, len),
            AxisSelection::Index(i) => (i, i + 1),
            AxisSelection::Range { start, stop } => (start, stop),
        };
        if start > stop || stop > len {
            return Err(CdmError::invalid_selection(format!(
                "{:?} is out of bounds for axis of length {}",
                self, len
            )));
        }
        Ok((start, stop))
    }
}

/// A single value read from an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            ScalarValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

/// Dense array data: numbers (missing values as NaN) or strings.
#[derive(Debug, Clone, PartialEq)]
pub enum DataArray {
    Numeric(ArrayD<f64>),
    Text(ArrayD<String>),
}

impl DataArray {
    pub fn shape(&self) -> &[usize] {
        match self {
            DataArray::Numeric(a) => a.shape(),
            DataArray::Text(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&ArrayD<f64>> {
        match self {
            DataArray::Numeric(a) => Some(a),
            DataArray::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&ArrayD<String>> {
        match self {
            DataArray::Text(a) => Some(a),
            DataArray::Numeric(_) => None,
        }
    }

    pub fn into_numeric(self) -> Option<ArrayD<f64>> {
        match self {
            DataArray::Numeric(a) => Some(a),
            DataArray::Text(_) => None,
        }
    }

    /// Value at a multi-axis index.
    pub fn get(&self, index: &[usize]) -> Option<ScalarValue> {
        match self {
            DataArray::Numeric(a) => a.get(IxDyn(index)).map(|v| ScalarValue::Number(*v)),
            DataArray::Text(a) => a.get(IxDyn(index)).map(|v| ScalarValue::Text(v.clone())),
        }
    }

    /// Value at a row-major flat index.
    ///
    /// Constant time for standard-layout arrays; other layouts walk the
    /// elements in logical order.
    pub fn get_flat(&self, index: usize) -> Option<ScalarValue> {
        match self {
            DataArray::Numeric(a) => {
                let value = match a.as_slice() {
                    Some(values) => values.get(index),
                    None => a.iter().nth(index),
                };
                value.map(|v| ScalarValue::Number(*v))
            }
            DataArray::Text(a) => {
                let value = match a.as_slice() {
                    Some(values) => values.get(index),
                    None => a.iter().nth(index),
                };
                value.map(|v| ScalarValue::Text(v.clone()))
            }
        }
    }

    /// Copy out a sub-array. An empty selection selects everything.
    pub fn select(&self, selection: &[AxisSelection]) -> CdmResult<DataArray> {
        if selection.is_empty() {
            return Ok(self.clone());
        }
        let shape = self.shape();
        if selection.len() != shape.len() {
            return Err(CdmError::invalid_selection(format!(
                "{} selections given for {} axes",
                selection.len(),
                shape.len()
            )));
        }
        let bounds = selection
            .iter()
            .zip(shape)
            .map(|(sel, len)| sel.resolve(*len))
            .collect::<CdmResult<Vec<_>>>()?;

        let slicer = |ax: ndarray::AxisDescription| {
            let (start, stop) = bounds[ax.axis.index()];
            Slice::from(start..stop)
        };
        Ok(match self {
            DataArray::Numeric(a) => DataArray::Numeric(a.slice_each_axis(slicer).to_owned()),
            DataArray::Text(a) => DataArray::Text(a.slice_each_axis(slicer).to_owned()),
        })
    }
}

/// Read access to a variable's data, implemented by format readers.
pub trait ArraySource: fmt::Debug {
    /// Current shape of the array.
    fn shape(&self) -> Vec<usize>;

    /// Read a selection, one entry per axis (or empty for everything).
    fn read(&self, selection: &[AxisSelection]) -> CdmResult<DataArray>;
}

/// Array data held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryArray {
    data: DataArray,
}

impl MemoryArray {
    pub fn new(data: DataArray) -> Self {
        Self { data }
    }

    /// One-dimensional numeric data.
    pub fn from_vec(values: Vec<f64>) -> Self {
        let len = values.len();
        // a 1-d shape always matches the vector length
        let array = ArrayD::from_shape_vec(IxDyn(&[len]), values)
            .unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[0])));
        Self::new(DataArray::Numeric(array))
    }

    /// Row-major numeric data with an explicit shape.
    pub fn from_shape_vec(shape: &[usize], values: Vec<f64>) -> CdmResult<Self> {
        let actual = values.len();
        let array = ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| {
            CdmError::ShapeMismatch {
                name: "memory array".to_string(),
                expected: shape.to_vec(),
                actual: vec![actual],
            }
        })?;
        Ok(Self::new(DataArray::Numeric(array)))
    }

    /// Row-major string data with an explicit shape.
    pub fn from_strings(shape: &[usize], values: Vec<String>) -> CdmResult<Self> {
        let actual = values.len();
        let array = ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| {
            CdmError::ShapeMismatch {
                name: "memory array".to_string(),
                expected: shape.to_vec(),
                actual: vec![actual],
            }
        })?;
        Ok(Self::new(DataArray::Text(array)))
    }

    pub fn data(&self) -> &DataArray {
        &self.data
    }
}

impl From<ArrayD<f64>> for MemoryArray {
    fn from(array: ArrayD<f64>) -> Self {
        Self::new(DataArray::Numeric(array))
    }
}

impl ArraySource for MemoryArray {
    fn shape(&self) -> Vec<usize> {
        self.data.shape().to_vec()
    }

    fn read(&self, selection: &[AxisSelection]) -> CdmResult<DataArray> {
        self.data.select(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> MemoryArray {
        MemoryArray::from_shape_vec(&[2, 3], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap()
    }

    #[test]
    fn test_read_all() {
        let data = grid().read(&[]).unwrap();
        assert_eq!(data.shape(), &[2, 3]);
        assert_eq!(data.len(), 6);
    }

    #[test]
    fn test_index_keeps_axis() {
        let data = grid()
            .read(&[AxisSelection::Index(1), AxisSelection::All])
            .unwrap();
        assert_eq!(data.shape(), &[1, 3]);
        let values: Vec<f64> = data.as_numeric().unwrap().iter().copied().collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_range_selection() {
        let data = grid()
            .read(&[AxisSelection::All, AxisSelection::range(1, 3)])
            .unwrap();
        assert_eq!(data.shape(), &[2, 2]);
        assert_eq!(data.get(&[1, 0]), Some(ScalarValue::Number(4.0)));
        assert_eq!(data.get_flat(3), Some(ScalarValue::Number(5.0)));
    }

    #[test]
    fn test_flat_index_follows_logical_order() {
        // [[0, 3], [1, 4], [2, 5]] stored column-major
        let transposed = ndarray::Array2::from_shape_vec((2, 3), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .reversed_axes()
            .into_dyn();
        let data = DataArray::Numeric(transposed);
        assert_eq!(data.get_flat(1), Some(ScalarValue::Number(3.0)));
        assert_eq!(data.get_flat(4), Some(ScalarValue::Number(2.0)));
        assert_eq!(data.get_flat(6), None);

        let names = DataArray::Text(
            ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&[2]), vec!["a".to_string(), "b".to_string()])
                .unwrap(),
        );
        assert_eq!(names.get_flat(1), Some(ScalarValue::Text("b".to_string())));
    }

    #[test]
    fn test_out_of_bounds_selection() {
        let err = grid()
            .read(&[AxisSelection::Index(2), AxisSelection::All])
            .unwrap_err();
        assert!(matches!(err, CdmError::InvalidSelection(_)));

        let err = grid().read(&[AxisSelection::All]).unwrap_err();
        assert!(matches!(err, CdmError::InvalidSelection(_)));
    }

    #[test]
    fn test_text_array() {
        let names = MemoryArray::from_strings(
            &[3],
            vec!["CPT".to_string(), "JNB".to_string(), "DUR".to_string()],
        )
        .unwrap();
        let data = names.read(&[AxisSelection::Index(1)]).unwrap();
        assert_eq!(data.get(&[0]), Some(ScalarValue::Text("JNB".to_string())));
        assert!(data.as_numeric().is_none());
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(MemoryArray::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0]).is_err());
    }
}
