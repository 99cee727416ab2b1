//! Subcommand implementations. Each returns the JSON document to print.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use tracing::{debug, info};

use cdm_common::CalendarDate;
use cdm_field::geojson::number_value;
use cdm_field::{
    merge_fields, CoordinateTarget, ExportConfig, ExportOptions, Field, OriginSpec, Reduction,
    WindowLength,
};
use cdm_model::{Dataset, Group};

/// Look up a group by its `/`-separated path.
pub fn find_group<'d>(dataset: &'d Dataset, path: &str) -> Result<&'d Group> {
    let id = dataset
        .find_group(path)
        .ok_or_else(|| anyhow!("group '{}' not found in {}", path, dataset.name))?;
    Ok(dataset.group(id))
}

/// Parse a `role=value` lookup target. Values that read as dates become
/// time targets.
pub fn parse_target(s: &str) -> Result<(String, CoordinateTarget)> {
    let (role, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("target '{}' must look like role=value", s))?;
    let role = role.trim();
    if role.is_empty() {
        bail!("target '{}' has an empty role", s);
    }
    let target = match CalendarDate::parse(value) {
        Ok(date) => CoordinateTarget::Time(date),
        Err(_) => CoordinateTarget::from(value),
    };
    Ok((role.to_string(), target))
}

/// Groups, dimensions and fields of a dataset.
pub fn summary(dataset: &Dataset) -> Value {
    let groups: Vec<Value> = dataset
        .groups()
        .map(|(id, group)| {
            let dimensions: Vec<Value> = group
                .dimensions()
                .iter()
                .map(|d| json!({ "name": d.name, "length": d.len(), "unlimited": d.is_unlimited() }))
                .collect();
            let fields: Vec<Value> = merge_fields(group)
                .iter()
                .map(|field| {
                    json!({
                        "variables": field.variables().iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
                        "shape": field.shape(),
                        "feature_type": field.feature_type().map(|ft| ft.as_str()),
                    })
                })
                .collect();
            json!({
                "path": dataset.path(id),
                "dimensions": dimensions,
                "fields": fields,
            })
        })
        .collect();

    json!({
        "name": dataset.name,
        "uri": dataset.uri,
        "groups": groups,
    })
}

/// Coordinates mapping and feature type of a variable.
pub fn mapping(group: &Group, variable: &str) -> Result<Value> {
    let field = Field::for_variable(group, variable)?;
    Ok(json!({
        "variable": variable,
        "feature_type": field.feature_type().map(|ft| ft.as_str()),
        "mapping": field.mapping(),
    }))
}

/// The variable rendered as a GeoJSON feature collection.
pub fn features(
    group: &Group,
    variable: &str,
    config: ExportConfig,
    property_names: Option<Vec<String>>,
) -> Result<Value> {
    let mut field = Field::for_variable(group, variable)?.with_config(config)?;
    let options = ExportOptions {
        mask: None,
        property_names,
    };
    let collection = field
        .features(&options)?
        .ok_or_else(|| anyhow!("variable '{}' has no latitude/longitude mapping", variable))?;
    info!(variable, features = collection.len(), "Exported features");
    Ok(serde_json::to_value(collection)?)
}

/// Axis indices nearest to the targets, and the coordinates found there.
pub fn locate(group: &Group, variable: &str, targets: &[(String, CoordinateTarget)]) -> Result<Value> {
    let field = Field::for_variable(group, variable)?;
    let pairs: Vec<(&str, CoordinateTarget)> = targets
        .iter()
        .map(|(role, target)| (role.as_str(), target.clone()))
        .collect();
    let indices = field.reversemap(&pairs)?;
    debug!(variable, indices = ?indices, "Located targets");

    let resolved: Vec<Option<usize>> = indices.iter().map(|i| i.index()).collect();
    let coordinates = field.coordinates(&resolved)?;
    Ok(json!({
        "variable": variable,
        "indices": indices,
        "coordinates": coordinates,
    }))
}

/// Time windows of a variable, optionally reduced.
pub fn slices(
    group: &Group,
    variable: &str,
    origins: &[OriginSpec],
    length: &WindowLength,
    reduction: Option<Reduction>,
    mask_below: Option<f64>,
    mask_above: Option<f64>,
) -> Result<Value> {
    let field = Field::for_variable(group, variable)?;
    let reduction = match reduction {
        Some(reduction) => reduction,
        None => {
            let windows = field.time_slices(origins, length)?;
            return Ok(json!({ "variable": variable, "length": length.to_string(), "windows": windows }));
        }
    };

    let aggregation = field
        .time_aggregation(reduction, origins, length, mask_below, mask_above)
        .with_context(|| format!("aggregating '{}' over {}", variable, length))?;
    let values: Vec<Value> = aggregation
        .values
        .iter()
        .map(|v| number_value(*v))
        .collect();
    Ok(json!({
        "variable": variable,
        "length": length.to_string(),
        "windows": aggregation.windows,
        "times": aggregation.times,
        "shape": aggregation.values.shape(),
        "values": values,
    }))
}
