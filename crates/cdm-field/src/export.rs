//! Rendering fields as GeoJSON feature collections.
//!
//! Point fields become one point per station. Grid fields become one polygon
//! per cell, with corners derived from the cell centres: interior corners
//! average the four surrounding centres, and edge and outer corners are
//! reflected through the nearest edge midpoint or centre (`2 * reference -
//! interior`).

use ndarray::{Array2, ArrayD, Axis, IxDyn};
use serde_json::Value;
use tracing::debug;

use cdm_common::{roles, CdmError};
use cdm_model::DataArray;

use crate::error::{FieldError, FieldResult};
use crate::feature_type::FeatureType;
use crate::field::Field;
use crate::geojson::{number_value, Feature, FeatureCollection};

/// Options for a feature export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    /// Per-cell mask for grid fields; cells below the configured threshold
    /// are left out.
    pub mask: Option<Array2<f64>>,

    /// Property names for successive sampled values of each cell.
    pub property_names: Option<Vec<String>>,
}

impl ExportOptions {
    pub fn with_mask(mut self, mask: Array2<f64>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_property_names(mut self, names: Vec<String>) -> Self {
        self.property_names = Some(names);
        self
    }
}

/// Reduce an array to two dimensions by taking index 0 of leading axes.
fn leading_slice(mut array: ArrayD<f64>) -> FieldResult<Array2<f64>> {
    while array.ndim() > 2 {
        array = array.index_axis_move(Axis(0), 0);
    }
    array
        .into_dimensionality()
        .map_err(|e| FieldError::Model(CdmError::invalid_selection(e.to_string())))
}

/// Corner coordinates for a grid of cell centres, shaped `(ny + 1, nx + 1)`.
pub fn cell_corners(centres: &Array2<f64>) -> FieldResult<Array2<f64>> {
    let (ny, nx) = centres.dim();
    if ny < 2 || nx < 2 {
        return Err(FieldError::DegenerateGrid { rows: ny, cols: nx });
    }
    let c = centres;
    let mut k = Array2::<f64>::zeros((ny + 1, nx + 1));

    for y in 1..ny {
        for x in 1..nx {
            k[[y, x]] = (c[[y, x - 1]] + c[[y, x]] + c[[y - 1, x - 1]] + c[[y - 1, x]]) / 4.0;
        }
    }

    for y in 1..ny {
        let left = (c[[y, 0]] + c[[y - 1, 0]]) / 2.0;
        k[[y, 0]] = 2.0 * left - k[[y, 1]];
        let right = (c[[y, nx - 1]] + c[[y - 1, nx - 1]]) / 2.0;
        k[[y, nx]] = 2.0 * right - k[[y, nx - 1]];
    }

    for x in 1..nx {
        let bottom = (c[[0, x]] + c[[0, x - 1]]) / 2.0;
        k[[0, x]] = 2.0 * bottom - k[[1, x]];
        let top = (c[[ny - 1, x]] + c[[ny - 1, x - 1]]) / 2.0;
        k[[ny, x]] = 2.0 * top - k[[ny - 1, x]];
    }

    k[[0, 0]] = 2.0 * c[[0, 0]] - k[[1, 1]];
    k[[0, nx]] = 2.0 * c[[0, nx - 1]] - k[[1, nx - 1]];
    k[[ny, 0]] = 2.0 * c[[ny - 1, 0]] - k[[ny - 1, 1]];
    k[[ny, nx]] = 2.0 * c[[ny - 1, nx - 1]] - k[[ny - 1, nx - 1]];

    Ok(k)
}

/// JSON values of a variable in row-major order.
fn samples(data: &DataArray) -> Vec<Value> {
    match data {
        DataArray::Numeric(a) => a.iter().map(|v| number_value(*v)).collect(),
        DataArray::Text(a) => a.iter().map(|s| Value::String(s.clone())).collect(),
    }
}

impl<'a> Field<'a> {
    /// Centre latitudes and longitudes.
    ///
    /// Grid fields give 2-D arrays: 1-D coordinates are expanded and 3-D
    /// coordinates use their first leading slice. Point fields give the
    /// station coordinates as `(n, 1)` columns. `None` for unmapped fields.
    pub fn latlons(&self) -> FieldResult<Option<(Array2<f64>, Array2<f64>)>> {
        let feature_type = match self.feature_type() {
            Some(ft) => ft,
            None => return Ok(None),
        };
        let (lat_var, lon_var) = match (self.latitude_variable(), self.longitude_variable()) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Ok(None),
        };
        let lat = lat_var.numeric_values()?;
        let lon = lon_var.numeric_values()?;

        if feature_type.is_point() {
            let column = |values: ArrayD<f64>| {
                let n = values.len();
                Array2::from_shape_vec((n, 1), values.iter().copied().collect())
                    .map_err(|e| CdmError::invalid_selection(e.to_string()))
            };
            return Ok(Some((column(lat)?, column(lon)?)));
        }

        if lat.ndim() == 1 && lon.ndim() == 1 {
            let (ny, nx) = (lat.len(), lon.len());
            let lat2 = Array2::from_shape_fn((ny, nx), |(y, _)| lat[[y]]);
            let lon2 = Array2::from_shape_fn((ny, nx), |(_, x)| lon[[x]]);
            return Ok(Some((lat2, lon2)));
        }

        Ok(Some((leading_slice(lat)?, leading_slice(lon)?)))
    }

    /// Render the field as a feature collection.
    ///
    /// Returns `None` for unmapped fields. The result is cached per options
    /// until the field's variable list changes.
    pub fn features(&mut self, options: &ExportOptions) -> FieldResult<Option<&FeatureCollection>> {
        let feature_type = match self.feature_type() {
            Some(ft) => ft,
            None => return Ok(None),
        };

        let cached = matches!(&self.cache, Some((cached, _)) if cached == options);
        if cached {
            debug!(field = %self.name(), "Using cached features");
        } else {
            let collection = if feature_type.is_grid() {
                self.grid_features(feature_type, options)?
            } else {
                self.point_features()?
            };
            debug!(
                field = %self.name(),
                feature_type = %feature_type,
                features = collection.len(),
                "Rendered features"
            );
            self.cache = Some((options.clone(), collection));
        }
        Ok(self.cache.as_ref().map(|(_, collection)| collection))
    }

    fn point_features(&self) -> FieldResult<FeatureCollection> {
        let (lat, lon) = match self.latlons()? {
            Some(latlon) => latlon,
            None => return Ok(FeatureCollection::new()),
        };
        let lat_axes = self
            .mapping()
            .get(roles::LATITUDE)
            .map(|e| e.axes.clone())
            .unwrap_or_default();

        // other coordinates sharing the station axes become properties
        let mut related = Vec::new();
        for (role, entry) in self.mapping().iter() {
            if role == roles::LATITUDE || role == roles::LONGITUDE || entry.axes != lat_axes {
                continue;
            }
            if let Some(var) = self.group().variable(&entry.variable) {
                related.push((role.to_string(), samples(&var.read(&[])?)));
            }
        }

        let id_property = &self.config().id_property;
        let features = (0..lat.len().min(lon.len()))
            .map(|i| {
                let mut feature = Feature::point(lon[[i, 0]], lat[[i, 0]])
                    .with_property(id_property.clone(), i);
                for (role, values) in &related {
                    let value = values.get(i).cloned().unwrap_or(Value::Null);
                    feature = feature.with_property(role.clone(), value);
                }
                feature
            })
            .collect();
        Ok(FeatureCollection::new().with_features(features))
    }

    fn grid_features(&self, feature_type: FeatureType, options: &ExportOptions) -> FieldResult<FeatureCollection> {
        let (lat, lon) = match self.latlons()? {
            Some(latlon) => latlon,
            None => return Ok(FeatureCollection::new()),
        };
        let (ny, nx) = lat.dim();
        if let Some(mask) = &options.mask {
            if mask.dim() != (ny, nx) {
                return Err(FieldError::MaskShapeMismatch {
                    expected: vec![ny, nx],
                    actual: mask.shape().to_vec(),
                });
            }
        }
        let corner_lat = cell_corners(&lat)?;
        let corner_lon = cell_corners(&lon)?;

        let (y_axis, x_axis) = self.grid_axes();
        let time_axis = if feature_type.is_series() {
            self.time_axis().ok()
        } else {
            None
        };
        let values = self.variable().numeric_values()?;
        let shape = values.shape().to_vec();
        let steps = time_axis.map_or(1, |t| shape[t]);

        let config = self.config();
        let mut features = Vec::with_capacity(ny * nx);
        for y in 0..ny {
            for x in 0..nx {
                // NaN mask values suppress the cell too
                let visible = options
                    .mask
                    .as_ref()
                    .map_or(true, |mask| mask[[y, x]] >= config.mask_threshold);
                if !visible {
                    continue;
                }

                let ring = vec![
                    [corner_lon[[y, x]], corner_lat[[y, x]]],
                    [corner_lon[[y + 1, x]], corner_lat[[y + 1, x]]],
                    [corner_lon[[y + 1, x + 1]], corner_lat[[y + 1, x + 1]]],
                    [corner_lon[[y, x + 1]], corner_lat[[y, x + 1]]],
                    [corner_lon[[y, x]], corner_lat[[y, x]]],
                ];
                let mut feature =
                    Feature::polygon(ring).with_property(config.id_property.clone(), x + y * nx);

                let mut index = vec![0; shape.len()];
                let cell_values: Vec<f64> = (0..steps)
                    .map(|step| {
                        if let Some(a) = y_axis {
                            index[a] = y;
                        }
                        if let Some(a) = x_axis {
                            index[a] = x;
                        }
                        if let Some(t) = time_axis {
                            index[t] = step;
                        }
                        values.get(IxDyn(&index)).copied().unwrap_or(f64::NAN)
                    })
                    .collect();

                match &options.property_names {
                    Some(names) => {
                        for (i, name) in names.iter().enumerate() {
                            let value = cell_values.get(i).copied().unwrap_or(f64::NAN);
                            feature = feature.with_property(name.clone(), number_value(value));
                        }
                    }
                    None => {
                        let value = cell_values.first().copied().unwrap_or(f64::NAN);
                        feature = feature.with_property(config.value_property.clone(), number_value(value));
                    }
                }
                features.push(feature);
            }
        }
        Ok(FeatureCollection::new().with_features(features))
    }

    /// Axes of the variable running along grid rows and columns.
    fn grid_axes(&self) -> (Option<usize>, Option<usize>) {
        let lat = self.mapping().get(roles::LATITUDE);
        let lon = self.mapping().get(roles::LONGITUDE);
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat.axes.len() == 1 && lon.axes.len() == 1 => {
                (Some(lat.axes[0]), Some(lon.axes[0]))
            }
            (Some(lat), _) if lat.axes.len() >= 2 => {
                let n = lat.axes.len();
                (Some(lat.axes[n - 2]), Some(lat.axes[n - 1]))
            }
            _ => (None, None),
        }
    }
}
