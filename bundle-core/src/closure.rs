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

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use crate::errors::{PipelineError, PipelineResult};
use crate::package::Package;

/// The transitive set of dependencies reachable from the root package, excluding the root,
/// with no duplicates by `(name, version, root_dir)`.
#[derive(Debug, Clone, Default)]
pub struct DependencyClosure(pub Vec<Package>);

impl DependencyClosure {
    pub fn from_root(root: &Package) -> Self {
        DependencyClosure(traverse(root, |_| false))
    }
}

/// Breadth-first from `root`'s direct dependencies, deduped by `(name, version, root_dir)`.
/// `stop` is consulted on each visited package; when it returns `true` that package's own
/// dependencies are not enqueued, though the package itself is still included in the result.
fn traverse(root: &Package, mut stop: impl FnMut(&Package) -> bool) -> Vec<Package> {
    let mut seen: HashSet<(String, String, PathBuf)> = HashSet::new();
    let mut out = Vec::new();
    let mut queue: VecDeque<&Package> = root.dependencies.iter().collect();
    while let Some(pkg) = queue.pop_front() {
        let key = (pkg.name.clone(), pkg.version.clone(), pkg.root_dir.clone());
        if !seen.insert(key) {
            continue;
        }
        if !stop(pkg) {
            queue.extend(pkg.dependencies.iter());
        }
        out.push(pkg.clone());
    }
    out
}

/// `{ runtime: set<name>, optional: set<name> }`. Invariant: disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalsConfig {
    pub runtime: HashSet<String>,
    pub optional: HashSet<String>,
}

impl ExternalsConfig {
    fn check_disjoint(&self) -> PipelineResult<()> {
        let mut overlap: Vec<&String> = self.runtime.intersection(&self.optional).collect();
        if overlap.is_empty() {
            return Ok(());
        }
        overlap.sort();
        let names = overlap
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        Err(PipelineError::InvalidConfig(format!(
            "the following names are declared as both runtime and optional externals: {names}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Runtime,
    Optional,
}

/// Partitions a closure into `{bundled, runtime_external, optional_external}`.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub bundled: Vec<Package>,
    pub runtime_external: Vec<Package>,
    pub optional_external: Vec<Package>,
}

impl Classification {
    /// All externalized package names, regardless of kind.
    pub fn external_names(&self) -> Vec<&str> {
        self.runtime_external
            .iter()
            .chain(self.optional_external.iter())
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Splits the closure into bundled / runtime-external / optional-external sets using
/// configuration.
pub struct DependencyClassifier;

impl DependencyClassifier {
    /// Breadth-first from `root`'s direct dependencies; stops descending at any node whose
    /// `name` is in either externals set, placing that node into the matching partition.
    /// Everything else visited (excluding root) is bundled.
    pub fn classify(root: &Package, externals: &ExternalsConfig) -> PipelineResult<Classification> {
        externals.check_disjoint()?;

        let closure = DependencyClosure(traverse(root, |pkg| {
            externals.runtime.contains(&pkg.name) || externals.optional.contains(&pkg.name)
        }));

        let mut classification = Classification::default();
        for pkg in closure.0 {
            let kind = if externals.runtime.contains(&pkg.name) {
                Some(ExternalKind::Runtime)
            } else if externals.optional.contains(&pkg.name) {
                Some(ExternalKind::Optional)
            } else {
                None
            };

            match kind {
                Some(ExternalKind::Runtime) => classification.runtime_external.push(pkg),
                Some(ExternalKind::Optional) => classification.optional_external.push(pkg),
                None => classification.bundled.push(pkg),
            }
        }

        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn pkg(name: &str, version: &str, deps: Vec<Package>) -> Package {
        Package {
            name: name.to_string(),
            version: version.to_string(),
            root_dir: PathBuf::from(format!("/pkgs/{name}")),
            manifest_path: PathBuf::from(format!("/pkgs/{name}/package.json")),
            dependencies: deps,
        }
    }

    #[test]
    fn externals_are_not_traversed_further() {
        let grandchild = pkg("grandchild-of-external", "1.0.0", vec![]);
        let external_dep = pkg("ext", "1.0.0", vec![grandchild]);
        let bundled_dep = pkg("bundled", "1.0.0", vec![]);
        let root = pkg("root", "1.0.0", vec![external_dep, bundled_dep]);

        let mut externals = ExternalsConfig::default();
        externals.runtime.insert("ext".to_string());

        let classification = DependencyClassifier::classify(&root, &externals).unwrap();
        assert_eq!(classification.runtime_external.len(), 1);
        assert_eq!(classification.runtime_external[0].name, "ext");
        assert_eq!(classification.bundled.len(), 1);
        assert_eq!(classification.bundled[0].name, "bundled");
    }

    #[test]
    fn closure_from_root_is_unconditional_and_deduped() {
        let shared = pkg("shared", "1.0.0", vec![]);
        let left = pkg("left", "1.0.0", vec![shared.clone()]);
        let right = pkg("right", "1.0.0", vec![shared]);
        let root = pkg("root", "1.0.0", vec![left, right]);

        let closure = DependencyClosure::from_root(&root);
        let names: Vec<&str> = closure.0.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names.iter().filter(|&&n| n == "shared").count(), 1);
    }

    #[test]
    fn overlapping_externals_is_invalid_config() {
        let root = pkg("root", "1.0.0", vec![pkg("dup", "1.0.0", vec![])]);
        let mut externals = ExternalsConfig::default();
        externals.runtime.insert("dup".to_string());
        externals.optional.insert("dup".to_string());

        let err = DependencyClassifier::classify(&root, &externals).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
}
