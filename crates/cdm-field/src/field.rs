//! The Field: one or more variables sharing a coordinates mapping.

use tracing::{debug, info};

use cdm_common::{roles, CdmError};
use cdm_model::{Group, Variable};

use crate::config::ExportConfig;
use crate::error::{FieldError, FieldResult};
use crate::export::ExportOptions;
use crate::feature_type::{classify, FeatureType};
use crate::geojson::FeatureCollection;
use crate::mapping::CoordinatesMapping;

/// Variables of one group that share a coordinate system.
///
/// A field starts from a single variable whose mapping is computed from the
/// group. More variables can be added as long as their own mapping is
/// identical. The rendered feature collection is cached until the variable
/// list changes.
#[derive(Debug)]
pub struct Field<'a> {
    group: &'a Group,
    variables: Vec<&'a Variable>,
    mapping: CoordinatesMapping,
    config: ExportConfig,
    pub(crate) cache: Option<(ExportOptions, FeatureCollection)>,
}

impl<'a> Field<'a> {
    /// Build a field for `variable`, which must belong to `group`.
    pub fn new(group: &'a Group, variable: &'a Variable) -> Self {
        let mapping = CoordinatesMapping::build(group, variable);
        debug!(variable = %variable.name, roles = mapping.len(), "Built field");
        Self {
            group,
            variables: vec![variable],
            mapping,
            config: ExportConfig::default(),
            cache: None,
        }
    }

    /// Build a field for the variable called `name` in `group`.
    pub fn for_variable(group: &'a Group, name: &str) -> FieldResult<Self> {
        let variable = group
            .variable(name)
            .ok_or_else(|| CdmError::variable_not_found(name))?;
        Ok(Self::new(group, variable))
    }

    /// Replace the export configuration, rejecting an invalid one.
    pub fn with_config(mut self, config: ExportConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::Config)?;
        self.config = config;
        self.cache = None;
        Ok(self)
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn group(&self) -> &'a Group {
        self.group
    }

    /// The variable the field was built from.
    pub fn variable(&self) -> &'a Variable {
        self.variables[0]
    }

    pub fn variables(&self) -> &[&'a Variable] {
        &self.variables
    }

    pub fn name(&self) -> &str {
        &self.variable().name
    }

    pub fn mapping(&self) -> &CoordinatesMapping {
        &self.mapping
    }

    pub fn shape(&self) -> Vec<usize> {
        self.variable().shape()
    }

    pub fn feature_type(&self) -> Option<FeatureType> {
        classify(&self.mapping)
    }

    /// Add a variable whose own mapping equals this field's mapping.
    ///
    /// On mismatch the field is left unchanged.
    pub fn add_variable(&mut self, variable: &'a Variable) -> FieldResult<()> {
        let mapping = CoordinatesMapping::build(self.group, variable);
        if mapping != self.mapping {
            return Err(FieldError::IncompatibleMapping {
                field: self.name().to_string(),
                variable: variable.name.clone(),
            });
        }
        self.variables.push(variable);
        if self.cache.take().is_some() {
            debug!(field = %self.name(), "Invalidated cached features");
        }
        Ok(())
    }

    /// Coordinate variable mapped to `role`.
    pub fn coordinate_variable(&self, role: &str) -> Option<&'a Variable> {
        let entry = self.mapping.get(role)?;
        self.group.variable(&entry.variable)
    }

    pub fn time_variable(&self) -> Option<&'a Variable> {
        self.coordinate_variable(roles::TIME)
    }

    pub fn latitude_variable(&self) -> Option<&'a Variable> {
        self.coordinate_variable(roles::LATITUDE)
    }

    pub fn longitude_variable(&self) -> Option<&'a Variable> {
        self.coordinate_variable(roles::LONGITUDE)
    }

    /// Distinct coordinate variables of the mapping, in role order.
    pub fn coordinate_variables(&self) -> Vec<&'a Variable> {
        let mut found: Vec<&'a Variable> = Vec::new();
        for (_, entry) in self.mapping.iter() {
            if let Some(var) = self.group.variable(&entry.variable) {
                if !found.iter().any(|v| v.name == var.name) {
                    found.push(var);
                }
            }
        }
        found
    }
}

/// One field per variable in the group.
pub fn fields_for_group(group: &Group) -> Vec<Field<'_>> {
    group
        .variables()
        .iter()
        .map(|variable| Field::new(group, variable))
        .collect()
}

/// Fields for the group with variables of identical mappings collated.
///
/// Variables are visited in group order; each joins the first field that
/// accepts it.
pub fn merge_fields(group: &Group) -> Vec<Field<'_>> {
    let mut fields: Vec<Field<'_>> = Vec::new();
    for variable in group.variables() {
        let joined = fields
            .iter_mut()
            .any(|field| field.add_variable(variable).is_ok());
        if !joined {
            fields.push(Field::new(group, variable));
        }
    }
    info!(
        variables = group.variables().len(),
        fields = fields.len(),
        "Collated group fields"
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdm_model::{AttributeList, Dataset, Dimension, DimensionRef, MemoryArray};

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(Some("grid"), None);
        let root = ds.root_id();
        ds.root_mut().add_dimension(Dimension::new("lat", 2)).unwrap();
        ds.root_mut().add_dimension(Dimension::new("lon", 3)).unwrap();
        ds.create_variable(
            root,
            "lat",
            vec![DimensionRef::from("lat")],
            AttributeList::new().with("units", "degrees_north"),
            MemoryArray::from_vec(vec![0.0, 1.0]),
        )
        .unwrap();
        ds.create_variable(
            root,
            "lon",
            vec![DimensionRef::from("lon")],
            AttributeList::new().with("units", "degrees_east"),
            MemoryArray::from_vec(vec![0.0, 1.0, 2.0]),
        )
        .unwrap();
        for name in ["tas", "pr"] {
            ds.create_variable(
                root,
                name,
                vec!["lat".into(), "lon".into()],
                AttributeList::new(),
                MemoryArray::from_shape_vec(&[2, 3], vec![0.0; 6]).unwrap(),
            )
            .unwrap();
        }
        ds.create_variable(
            root,
            "transposed",
            vec!["lon".into(), "lat".into()],
            AttributeList::new(),
            MemoryArray::from_shape_vec(&[3, 2], vec![0.0; 6]).unwrap(),
        )
        .unwrap();
        ds
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let ds = dataset();
        let config = ExportConfig {
            mask_threshold: f64::INFINITY,
            ..Default::default()
        };
        let err = Field::for_variable(ds.root(), "tas")
            .unwrap()
            .with_config(config)
            .unwrap_err();
        assert!(matches!(err, FieldError::Config(_)));
        assert!(err.is_configuration_error());

        let config = ExportConfig {
            value_property: "tas".to_string(),
            ..Default::default()
        };
        let field = Field::for_variable(ds.root(), "tas")
            .unwrap()
            .with_config(config)
            .unwrap();
        assert_eq!(field.config().value_property, "tas");
    }

    #[test]
    fn test_add_compatible_variable() {
        let ds = dataset();
        let mut field = Field::for_variable(ds.root(), "tas").unwrap();
        field.add_variable(ds.root().variable("pr").unwrap()).unwrap();
        assert_eq!(field.variables().len(), 2);
        assert_eq!(field.name(), "tas");
        assert_eq!(field.feature_type(), Some(FeatureType::Grid));
    }

    #[test]
    fn test_add_incompatible_variable_leaves_field_unchanged() {
        let ds = dataset();
        let mut field = Field::for_variable(ds.root(), "tas").unwrap();
        let before = field.mapping().clone();
        let err = field
            .add_variable(ds.root().variable("transposed").unwrap())
            .unwrap_err();
        assert!(matches!(err, FieldError::IncompatibleMapping { .. }));
        assert_eq!(field.variables().len(), 1);
        assert_eq!(field.mapping(), &before);
    }

    #[test]
    fn test_added_variable_clears_cached_features() {
        let ds = dataset();
        let mut field = Field::for_variable(ds.root(), "tas").unwrap();
        let options = ExportOptions::default();
        assert_eq!(field.features(&options).unwrap().unwrap().len(), 6);
        assert!(field.cache.is_some());
        field.add_variable(ds.root().variable("pr").unwrap()).unwrap();
        assert!(field.cache.is_none());
    }

    #[test]
    fn test_coordinate_accessors() {
        let ds = dataset();
        let field = Field::for_variable(ds.root(), "tas").unwrap();
        assert_eq!(field.latitude_variable().unwrap().name, "lat");
        assert_eq!(field.longitude_variable().unwrap().name, "lon");
        assert!(field.time_variable().is_none());
        assert_eq!(field.coordinate_variables().len(), 2);
    }

    #[test]
    fn test_unknown_variable() {
        let ds = dataset();
        assert!(matches!(
            Field::for_variable(ds.root(), "nope"),
            Err(FieldError::Model(CdmError::VariableNotFound(_)))
        ));
    }

    #[test]
    fn test_merge_fields() {
        let ds = dataset();
        assert_eq!(fields_for_group(ds.root()).len(), 5);
        let merged = merge_fields(ds.root());
        // lat and lon each map only themselves; tas and pr share a field
        let names: Vec<Vec<&str>> = merged
            .iter()
            .map(|f| f.variables().iter().map(|v| v.name.as_str()).collect())
            .collect();
        assert_eq!(
            names,
            vec![vec!["lat"], vec!["lon"], vec!["tas", "pr"], vec!["transposed"]]
        );
    }
}
