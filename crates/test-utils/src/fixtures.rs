//! Common fixtures: time unit strings, station lists and descriptor documents.

use std::io::Write;

use tempfile::{Builder, NamedTempFile};

/// CF time unit strings.
pub mod units {
    pub const HOURS_SINCE_2012: &str = "hours since 2012-01-01 00:00:00";
    pub const DAYS_SINCE_2000: &str = "days since 2000-01-01";
    pub const DAYS_SINCE_2012: &str = "days since 2012-01-01";
    pub const DAYS_SINCE_1990: &str = "days since 1990-01-01 00:00";
}

/// Calendar attribute values.
pub mod calendars {
    pub const STANDARD: &str = "standard";
    pub const DAY_360: &str = "360_day";
    pub const NO_LEAP: &str = "noleap";
}

/// A handful of named stations as `(name, lat, lon)`.
pub const STATIONS: &[(&str, f64, f64)] = &[
    ("cape_town", -33.9, 18.5),
    ("johannesburg", -26.2, 28.0),
    ("durban", -29.9, 31.0),
];

/// JSON descriptor for a small station dataset.
pub const STATION_DESCRIPTOR_JSON: &str = r#"{
  "name": "stations",
  "dimensions": [{ "name": "station", "length": 2 }],
  "variables": [
    { "name": "lat", "dimensions": ["station"],
      "attributes": { "units": "degrees_north" }, "data": [-33.9, -26.2] },
    { "name": "lon", "dimensions": ["station"],
      "attributes": { "units": "degrees_east" }, "data": [18.5, 28.0] },
    { "name": "pr", "dimensions": ["station"],
      "attributes": { "coordinates": "lat lon", "units": "mm" }, "data": [1.5, null] }
  ]
}"#;

/// YAML descriptor for a 2x2 grid with two time steps.
pub const GRID_DESCRIPTOR_YAML: &str = "\
name: grid
dimensions:
  - { name: time, length: 2, unlimited: true }
  - { name: lat, length: 2 }
  - { name: lon, length: 2 }
variables:
  - name: time
    dimensions: [time]
    attributes: { units: days since 2000-01-01, calendar: standard }
    data: [0, 1]
  - name: lat
    dimensions: [lat]
    attributes: { units: degrees_north }
    data: [10, 20]
  - name: lon
    dimensions: [lon]
    attributes: { units: degrees_east }
    data: [100, 110]
  - name: tas
    dimensions: [time, lat, lon]
    attributes: { units: K }
    data: [1, 2, 3, 4, 5, 6, 7, 8]
";

/// Write `contents` to a temporary file ending in `.{extension}`.
///
/// The file is removed when the returned handle is dropped.
pub fn write_descriptor(contents: &str, extension: &str) -> std::io::Result<NamedTempFile> {
    let mut file = Builder::new()
        .prefix("descriptor-")
        .suffix(&format!(".{}", extension))
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}
