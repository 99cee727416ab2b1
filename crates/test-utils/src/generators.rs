//! Synthetic datasets with predictable values.
//!
//! Grid cells hold `t * 10000 + row * 100 + col`, so a value read back
//! identifies the time step, row and column it came from.

use cdm_common::CdmResult;
use cdm_model::{AttributeList, Dataset, Dimension, MemoryArray};

/// Evenly spaced axis values.
///
/// ```
/// use test_utils::regular_axis;
///
/// assert_eq!(regular_axis(-10.0, 10.0, 4), vec![-10.0, 0.0, 10.0, 20.0]);
/// ```
pub fn regular_axis(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Predictable cell value for a time step, row and column.
pub fn cell_value(t: usize, row: usize, col: usize) -> f64 {
    (t * 10_000 + row * 100 + col) as f64
}

/// Time offsets in hours for `count` samples spaced `step_hours` apart.
pub fn hourly_offsets(count: usize, step_hours: f64) -> Vec<f64> {
    regular_axis(0.0, step_hours, count)
}

/// Grid values shaped `(times, lats, lons)` in row-major order.
pub fn create_grid_values(times: usize, lats: usize, lons: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(times * lats * lons);
    for t in 0..times {
        for row in 0..lats {
            for col in 0..lons {
                data.push(cell_value(t, row, col));
            }
        }
    }
    data
}

fn latitude_attributes() -> AttributeList {
    AttributeList::new()
        .with("units", "degrees_north")
        .with("standard_name", "latitude")
}

fn longitude_attributes() -> AttributeList {
    AttributeList::new()
        .with("units", "degrees_east")
        .with("standard_name", "longitude")
}

/// A rectilinear grid with 1-D `lat` and `lon` coordinate variables and a
/// `tas(lat, lon)` data variable.
pub fn rectilinear_dataset(lats: &[f64], lons: &[f64]) -> CdmResult<Dataset> {
    let mut ds = Dataset::new(Some("rectilinear"), None);
    let root = ds.root_id();
    ds.root_mut().add_dimension(Dimension::new("lat", lats.len()))?;
    ds.root_mut().add_dimension(Dimension::new("lon", lons.len()))?;
    ds.create_variable(
        root,
        "lat",
        vec!["lat".into()],
        latitude_attributes(),
        MemoryArray::from_vec(lats.to_vec()),
    )?;
    ds.create_variable(
        root,
        "lon",
        vec!["lon".into()],
        longitude_attributes(),
        MemoryArray::from_vec(lons.to_vec()),
    )?;
    ds.create_variable(
        root,
        "tas",
        vec!["lat".into(), "lon".into()],
        AttributeList::new().with("units", "K"),
        MemoryArray::from_shape_vec(
            &[lats.len(), lons.len()],
            create_grid_values(1, lats.len(), lons.len()),
        )?,
    )?;
    Ok(ds)
}

/// A rectilinear grid over time: `time`, `lat` and `lon` coordinates and a
/// `tas(time, lat, lon)` data variable.
pub fn grid_series_dataset(
    times: &[f64],
    time_units: &str,
    calendar: &str,
    lats: &[f64],
    lons: &[f64],
) -> CdmResult<Dataset> {
    let values = create_grid_values(times.len(), lats.len(), lons.len());
    grid_series_with_values(times, time_units, calendar, lats, lons, values)
}

/// Like [`grid_series_dataset`] with explicit `tas` values.
pub fn grid_series_with_values(
    times: &[f64],
    time_units: &str,
    calendar: &str,
    lats: &[f64],
    lons: &[f64],
    values: Vec<f64>,
) -> CdmResult<Dataset> {
    let mut ds = Dataset::new(Some("grid-series"), None);
    let root = ds.root_id();
    ds.root_mut()
        .add_dimension(Dimension::unlimited("time", times.len()))?;
    ds.root_mut().add_dimension(Dimension::new("lat", lats.len()))?;
    ds.root_mut().add_dimension(Dimension::new("lon", lons.len()))?;
    ds.create_variable(
        root,
        "time",
        vec!["time".into()],
        AttributeList::new()
            .with("units", time_units)
            .with("calendar", calendar),
        MemoryArray::from_vec(times.to_vec()),
    )?;
    ds.create_variable(
        root,
        "lat",
        vec!["lat".into()],
        latitude_attributes(),
        MemoryArray::from_vec(lats.to_vec()),
    )?;
    ds.create_variable(
        root,
        "lon",
        vec!["lon".into()],
        longitude_attributes(),
        MemoryArray::from_vec(lons.to_vec()),
    )?;
    ds.create_variable(
        root,
        "tas",
        vec!["time".into(), "lat".into(), "lon".into()],
        AttributeList::new().with("units", "K"),
        MemoryArray::from_shape_vec(&[times.len(), lats.len(), lons.len()], values)?,
    )?;
    Ok(ds)
}

/// A curvilinear grid: 2-D `lat(y, x)` and `lon(y, x)` linked to
/// `tas(y, x)` through its `coordinates` attribute.
///
/// Centres are a regular grid rotated by `rotation` degrees around the
/// origin.
pub fn curvilinear_dataset(ny: usize, nx: usize, rotation: f64) -> CdmResult<Dataset> {
    let (sin, cos) = rotation.to_radians().sin_cos();
    let mut lats = Vec::with_capacity(ny * nx);
    let mut lons = Vec::with_capacity(ny * nx);
    for row in 0..ny {
        for col in 0..nx {
            let (x, y) = (col as f64, row as f64);
            lons.push(x * cos - y * sin);
            lats.push(x * sin + y * cos);
        }
    }

    let mut ds = Dataset::new(Some("curvilinear"), None);
    let root = ds.root_id();
    ds.root_mut().add_dimension(Dimension::new("y", ny))?;
    ds.root_mut().add_dimension(Dimension::new("x", nx))?;
    ds.create_variable(
        root,
        "lat",
        vec!["y".into(), "x".into()],
        latitude_attributes(),
        MemoryArray::from_shape_vec(&[ny, nx], lats)?,
    )?;
    ds.create_variable(
        root,
        "lon",
        vec!["y".into(), "x".into()],
        longitude_attributes(),
        MemoryArray::from_shape_vec(&[ny, nx], lons)?,
    )?;
    ds.create_variable(
        root,
        "tas",
        vec!["y".into(), "x".into()],
        AttributeList::new()
            .with("units", "K")
            .with("coordinates", "lat lon"),
        MemoryArray::from_shape_vec(&[ny, nx], create_grid_values(1, ny, nx))?,
    )?;
    Ok(ds)
}

/// Stations along a `station` dimension with auxiliary `lat`, `lon` and
/// `name` coordinates and a `pr(station)` data variable.
pub fn station_dataset(stations: &[(&str, f64, f64)]) -> CdmResult<Dataset> {
    let n = stations.len();
    let mut ds = Dataset::new(Some("stations"), None);
    let root = ds.root_id();
    ds.root_mut().add_dimension(Dimension::new("station", n))?;
    ds.create_variable(
        root,
        "lat",
        vec!["station".into()],
        latitude_attributes(),
        MemoryArray::from_vec(stations.iter().map(|s| s.1).collect()),
    )?;
    ds.create_variable(
        root,
        "lon",
        vec!["station".into()],
        longitude_attributes(),
        MemoryArray::from_vec(stations.iter().map(|s| s.2).collect()),
    )?;
    ds.create_variable(
        root,
        "name",
        vec!["station".into()],
        AttributeList::new(),
        MemoryArray::from_strings(&[n], stations.iter().map(|s| s.0.to_string()).collect())?,
    )?;
    ds.create_variable(
        root,
        "pr",
        vec!["station".into()],
        AttributeList::new()
            .with("units", "mm")
            .with("coordinates", "lat lon name"),
        MemoryArray::from_vec((0..n).map(|i| i as f64).collect()),
    )?;
    Ok(ds)
}
