/*
 * This file is part of CycloneDX Rust Cargo.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, PipelineResult};

/// The parsed `package.json` subset `PackageResolver` and `WriteEngine` need: name,
/// version, dependency sections, and the declared entry point. Unknown top-level fields
/// are preserved in `rest` so a rewritten manifest round-trips everything else untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "optionalDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl ProjectManifest {
    pub fn read(path: &Path) -> PipelineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            action: format!("reading manifest {}", path.display()),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| PipelineError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| PipelineError::ProbeOutputInvalid { source })?;
        std::fs::write(path, json).map_err(|source| PipelineError::Io {
            action: format!("writing manifest {}", path.display()),
            source,
        })
    }

    /// The manifest's declared entry point, defaulting to `index.js` when unset.
    pub fn default_entry_point(&self) -> PathBuf {
        PathBuf::from(self.main.clone().unwrap_or_else(|| "index.js".to_string()))
    }

    /// Moves every bundled dependency's manifest entry to `devDependencies` and keeps only
    /// external packages in `dependencies` / `optionalDependencies`.
    pub fn rewrite_for_bundle(&self, bundled_names: &HashSet<String>) -> ProjectManifest {
        let mut rewritten = self.clone();

        for (name, version) in std::mem::take(&mut rewritten.dependencies) {
            if bundled_names.contains(&name) {
                rewritten.dev_dependencies.insert(name, version);
            } else {
                rewritten.dependencies.insert(name, version);
            }
        }
        for (name, version) in std::mem::take(&mut rewritten.optional_dependencies) {
            if bundled_names.contains(&name) {
                rewritten.dev_dependencies.insert(name, version);
            } else {
                rewritten.optional_dependencies.insert(name, version);
            }
        }

        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bundled_dependencies_move_to_dev_dependencies() {
        let manifest = ProjectManifest {
            name: "consumer".to_string(),
            version: "1.0.0".to_string(),
            main: Some("index.js".to_string()),
            dependencies: BTreeMap::from([
                ("dep1".to_string(), "1.0.0".to_string()),
                ("ext1".to_string(), "2.0.0".to_string()),
            ]),
            optional_dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            rest: serde_json::Map::new(),
        };
        let mut bundled = HashSet::new();
        bundled.insert("dep1".to_string());

        let rewritten = manifest.rewrite_for_bundle(&bundled);
        assert_eq!(rewritten.dependencies.len(), 1);
        assert!(rewritten.dependencies.contains_key("ext1"));
        assert_eq!(rewritten.dev_dependencies.get("dep1"), Some(&"1.0.0".to_string()));
    }
}
