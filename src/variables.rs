//! Directory-scoped variable registry
//!
//! Variables defined by a file belong to that file's directory and are
//! inherited by every file below it. A lookup walks from the requesting
//! directory up to the root; the closest definition wins.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;

use crate::parsers::{Variable, Variables};

#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    scopes: HashMap<PathBuf, Variables>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closest definition of `key` from `dir` upwards
    pub fn resolve(&self, dir: &Path, key: &str) -> Option<&Variable> {
        dir.ancestors()
            .find_map(|scope| self.scopes.get(scope).and_then(|vars| vars.get(key)))
    }

    /// Every variable visible from `dir`, inner scopes shadowing outer ones
    pub fn visible(&self, dir: &Path) -> Variables {
        let scopes: Vec<&Path> = dir.ancestors().collect();
        let mut visible = Variables::new();
        for scope in scopes.into_iter().rev() {
            if let Some(vars) = self.scopes.get(scope) {
                visible.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        visible
    }

    /// Record variables for `dir`, replacing earlier definitions of the same keys
    pub fn merge(&mut self, dir: &Path, variables: impl IntoIterator<Item = Variable>) {
        let scope = self.scopes.entry(dir.to_path_buf()).or_default();
        for variable in variables {
            scope.insert(variable.key.clone(), variable);
        }
    }
}
