//! Ordered registry of dataset openers.

use std::fmt;

use tracing::{debug, info, warn};

use cdm_common::{CdmError, CdmResult};

use crate::dataset::Dataset;
use crate::descriptor::{is_descriptor_uri, open_descriptor};

type Predicate = Box<dyn Fn(&str) -> bool>;
type Constructor = Box<dyn Fn(&str) -> CdmResult<Dataset>>;

struct Opener {
    name: String,
    predicate: Predicate,
    constructor: Constructor,
}

/// Dataset openers tried in registration order.
///
/// Each entry pairs a predicate on the URI with a constructor. `open` runs
/// the constructor of every entry whose predicate accepts the URI until one
/// succeeds.
#[derive(Default)]
pub struct DatasetRegistry {
    openers: Vec<Opener>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in descriptor opener (`.json`, `.yaml`, `.yml`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("descriptor", is_descriptor_uri, open_descriptor);
        registry
    }

    pub fn register<P, C>(&mut self, name: &str, predicate: P, constructor: C) -> &mut Self
    where
        P: Fn(&str) -> bool + 'static,
        C: Fn(&str) -> CdmResult<Dataset> + 'static,
    {
        self.openers.push(Opener {
            name: name.to_string(),
            predicate: Box::new(predicate),
            constructor: Box::new(constructor),
        });
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.openers.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.openers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.openers.is_empty()
    }

    /// Open a dataset with the first matching opener that succeeds.
    pub fn open(&self, uri: &str) -> CdmResult<Dataset> {
        for opener in self.openers.iter().filter(|o| (o.predicate)(uri)) {
            debug!(opener = %opener.name, uri = %uri, "Trying opener");
            match (opener.constructor)(uri) {
                Ok(dataset) => {
                    info!(opener = %opener.name, uri = %uri, "Opened dataset");
                    return Ok(dataset);
                }
                Err(e) => {
                    warn!(opener = %opener.name, uri = %uri, error = %e, "Opener failed");
                }
            }
        }
        Err(CdmError::NoOpener(uri.to_string()))
    }
}

impl fmt::Debug for DatasetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetRegistry")
            .field("openers", &self.names())
            .finish()
    }
}
