//! Named axis declarations.

use std::fmt;

use serde::{Deserialize, Serialize};

use cdm_common::{CdmError, CdmResult};

/// A named axis length. Shared dimensions are declared on a group and have a
/// unique name there; unlimited dimensions may grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    length: usize,
    #[serde(default)]
    unlimited: bool,
    #[serde(default)]
    shared: bool,
}

impl Dimension {
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            unlimited: false,
            shared: false,
        }
    }

    /// An unlimited dimension with its current length.
    pub fn unlimited(name: impl Into<String>, length: usize) -> Self {
        Self {
            unlimited: true,
            ..Self::new(name, length)
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub(crate) fn set_shared(&mut self, shared: bool) {
        self.shared = shared;
    }

    /// Grow an unlimited dimension. Lengths never shrink.
    pub fn grow(&mut self, length: usize) -> CdmResult<()> {
        if !self.unlimited {
            return Err(CdmError::NotUnlimited {
                name: self.name.clone(),
                requested: length,
            });
        }
        if length < self.length {
            return Err(CdmError::DimensionShrink {
                name: self.name.clone(),
                current: self.length,
                requested: length,
            });
        }
        self.length = length;
        Ok(())
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.length == other.length
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unlimited {
            write!(f, "{} (unlimited, currently {})", self.name, self.length)
        } else {
            write!(f, "{} ({})", self.name, self.length)
        }
    }
}

/// How a variable names one of its axes: by reference to a shared dimension
/// declared on a group, or by carrying its own dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionRef {
    Reference(String),
    Handle(Dimension),
}

impl DimensionRef {
    pub fn name(&self) -> &str {
        match self {
            DimensionRef::Reference(name) => name,
            DimensionRef::Handle(dim) => &dim.name,
        }
    }
}

impl From<&str> for DimensionRef {
    fn from(name: &str) -> Self {
        DimensionRef::Reference(name.to_string())
    }
}

impl From<String> for DimensionRef {
    fn from(name: String) -> Self {
        DimensionRef::Reference(name)
    }
}

impl From<Dimension> for DimensionRef {
    fn from(dim: Dimension) -> Self {
        DimensionRef::Handle(dim)
    }
}
