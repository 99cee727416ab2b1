//! Top-level dataset handle owning the group arena.

use tracing::debug;

use cdm_common::{CdmError, CdmResult};

use crate::array::ArraySource;
use crate::attribute::AttributeList;
use crate::dimension::{Dimension, DimensionRef};
use crate::group::{Group, GroupId};
use crate::variable::Variable;

/// A dataset: a name, an optional source URI and a tree of groups stored in
/// an arena. The root group has an empty name and id 0.
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub uri: Option<String>,
    groups: Vec<Group>,
}

impl Dataset {
    /// Create an empty dataset. Without a name the URI is used as one.
    pub fn new(name: Option<&str>, uri: Option<&str>) -> Self {
        let name = name.or(uri).unwrap_or_default().to_string();
        Self {
            name,
            uri: uri.map(str::to_string),
            groups: vec![Group::new("", None)],
        }
    }

    pub fn root_id(&self) -> GroupId {
        GroupId(0)
    }

    pub fn root(&self) -> &Group {
        &self.groups[0]
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.groups[0]
    }

    /// Group by id. Ids are only handed out by this dataset.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.0]
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    /// Add a child group under `parent`.
    pub fn add_group(&mut self, parent: GroupId, name: &str) -> CdmResult<GroupId> {
        if parent.0 >= self.groups.len() {
            return Err(CdmError::GroupNotFound(format!("#{}", parent.0)));
        }
        if self.child(parent, name).is_some() {
            return Err(CdmError::DuplicateGroup(format!(
                "{}/{}",
                self.path(parent).trim_end_matches('/'),
                name
            )));
        }
        let id = GroupId(self.groups.len());
        self.groups.push(Group::new(name, Some(parent)));
        self.groups[parent.0].push_child(id);
        debug!(group = %name, parent = parent.0, "Added group");
        Ok(id)
    }

    fn child(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.group(parent)
            .children()
            .iter()
            .copied()
            .find(|id| self.group(*id).name == name)
    }

    /// Look up a group by slash-separated path, e.g. `/forecast/surface`.
    pub fn find_group(&self, path: &str) -> Option<GroupId> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self.root_id(), |id, part| self.child(id, part))
    }

    /// Absolute path of a group; the root is `/`.
    pub fn path(&self, id: GroupId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(gid) = current {
            let group = self.group(gid);
            if !group.is_root() {
                parts.push(group.name.as_str());
            }
            current = group.parent();
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// Resolve a shared dimension by name, searching `group` then its ancestors.
    pub fn resolve_dimension(&self, group: GroupId, name: &str) -> CdmResult<Dimension> {
        let mut current = Some(group);
        while let Some(gid) = current {
            let g = self.group(gid);
            if let Some(dim) = g.dimension(name) {
                return Ok(dim.clone());
            }
            current = g.parent();
        }
        Err(CdmError::dimension_not_found(name))
    }

    /// Create a variable in `group`. Dimension references are resolved once
    /// here; handles become private dimensions of the variable.
    pub fn create_variable(
        &mut self,
        group: GroupId,
        name: &str,
        dimensions: Vec<DimensionRef>,
        attributes: AttributeList,
        data: impl ArraySource + 'static,
    ) -> CdmResult<&Variable> {
        let resolved = dimensions
            .into_iter()
            .map(|dim| match dim {
                DimensionRef::Reference(dim_name) => self.resolve_dimension(group, &dim_name),
                DimensionRef::Handle(dim) => Ok(dim),
            })
            .collect::<CdmResult<Vec<_>>>()?;

        let variable = Variable::new(name, resolved, attributes, Box::new(data))?;
        debug!(variable = %name, group = %self.path(group), "Created variable");
        self.group_mut(group).push_variable(variable)
    }
}
