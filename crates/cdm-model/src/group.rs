//! Group tree nodes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cdm_common::{CdmError, CdmResult};

use crate::attribute::AttributeList;
use crate::dimension::Dimension;
use crate::variable::Variable;

/// Index of a group inside its dataset's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node in the group tree. Children are owned by the dataset arena and
/// linked by id; `parent` is `None` only for the root.
#[derive(Debug)]
pub struct Group {
    pub name: String,
    parent: Option<GroupId>,
    children: Vec<GroupId>,
    dimensions: Vec<Dimension>,
    variables: Vec<Variable>,
    pub attributes: AttributeList,
}

impl Group {
    pub(crate) fn new(name: impl Into<String>, parent: Option<GroupId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            dimensions: Vec::new(),
            variables: Vec::new(),
            attributes: AttributeList::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    pub(crate) fn push_child(&mut self, id: GroupId) {
        self.children.push(id);
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Declare a shared dimension. Names are unique within a group.
    pub fn add_dimension(&mut self, mut dimension: Dimension) -> CdmResult<()> {
        if self.dimension(&dimension.name).is_some() {
            return Err(CdmError::DuplicateDimension(dimension.name));
        }
        dimension.set_shared(true);
        self.dimensions.push(dimension);
        Ok(())
    }

    /// Grow an unlimited dimension and refresh the variables that use it.
    pub fn grow_dimension(&mut self, name: &str, length: usize) -> CdmResult<()> {
        let dimension = self
            .dimensions
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| CdmError::dimension_not_found(name))?;
        dimension.grow(length)?;
        let updated = dimension.clone();
        for variable in &mut self.variables {
            variable.update_dimension(&updated);
        }
        debug!(dimension = %name, length, "Grew unlimited dimension");
        Ok(())
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    pub(crate) fn push_variable(&mut self, variable: Variable) -> CdmResult<&Variable> {
        if self.variable(&variable.name).is_some() {
            return Err(CdmError::DuplicateVariable(variable.name));
        }
        self.variables.push(variable);
        let last = self.variables.len() - 1;
        Ok(&self.variables[last])
    }
}
