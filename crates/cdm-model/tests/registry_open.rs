//! Opening descriptor files through the registry.

use std::io::Write;

use cdm_model::{
    AttributeList, CdmError, Dataset, DatasetDescriptor, DatasetRegistry, Dimension, DimensionRef,
    MemoryArray,
};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_open_json_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_file(
        &dir,
        "grid.json",
        r#"{
            "name": "grid",
            "dimensions": [{"name": "lat", "length": 2}, {"name": "lon", "length": 3}],
            "variables": [
                {"name": "lat", "dimensions": ["lat"], "attributes": {"units": "degrees_north"}, "data": [10, 20]},
                {"name": "lon", "dimensions": ["lon"], "attributes": {"units": "degrees_east"}, "data": [0, 1, 2]},
                {"name": "tas", "dimensions": ["lat", "lon"], "data": [1, 2, 3, 4, 5, 6]}
            ]
        }"#,
    );

    let ds = DatasetRegistry::with_defaults().open(&uri).unwrap();
    assert_eq!(ds.name, "grid");
    assert_eq!(ds.uri.as_deref(), Some(uri.as_str()));
    let tas = ds.root().variable("tas").unwrap();
    assert_eq!(tas.shape(), vec![2, 3]);
    assert_eq!(tas.dimension_names(), vec!["lat", "lon"]);
}

#[test]
fn test_open_yaml_descriptor_without_name() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_file(
        &dir,
        "obs.yml",
        "dimensions:\n  - {name: station, length: 1}\nvariables:\n  - {name: id, dimensions: [station], data: [A1]}\n",
    );
    let ds = DatasetRegistry::with_defaults().open(&uri).unwrap();
    assert_eq!(ds.name, uri);
}

#[test]
fn test_unknown_extension_has_no_opener() {
    let registry = DatasetRegistry::with_defaults();
    assert!(matches!(registry.open("model.grib2"), Err(CdmError::NoOpener(_))));
    // matching extension but missing file also falls through
    assert!(matches!(registry.open("missing.json"), Err(CdmError::NoOpener(_))));
}

#[test]
fn test_descriptor_file_roundtrip() {
    let mut ds = Dataset::new(Some("roundtrip"), None);
    let root = ds.root_id();
    ds.root_mut().add_dimension(Dimension::new("x", 2)).unwrap();
    ds.create_variable(
        root,
        "x",
        vec![DimensionRef::from("x")],
        AttributeList::new().with("units", "m"),
        MemoryArray::from_vec(vec![0.5, f64::NAN]),
    )
    .unwrap();

    let json = DatasetDescriptor::from_dataset(&ds).unwrap().to_json().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let uri = write_file(&dir, "roundtrip.json", &json);

    let reopened = DatasetRegistry::with_defaults().open(&uri).unwrap();
    let x = reopened.root().variable("x").unwrap();
    assert_eq!(x.units(), Some("m"));
    let values = x.numeric_values().unwrap();
    assert_eq!(values[[0]], 0.5);
    assert!(values[[1]].is_nan());
}
