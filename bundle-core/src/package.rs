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

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::errors::{PipelineError, PipelineResult};
use crate::manifest::ProjectManifest;

/// A resolved package: identity is `(name, version, root_dir)`.
///
/// Immutable once constructed by [`PackageResolver::resolve`]; a fresh tree is built for
/// every pipeline run, so there is no shared mutable state across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub root_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub dependencies: Vec<Package>,
}

impl Package {
    pub fn fqn(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Reads a package's manifest and walks the installed nested `node_modules` layout on disk
/// to produce the transitive closure rooted at the package.
pub struct PackageResolver;

impl PackageResolver {
    /// Resolves the full dependency tree rooted at `package_dir`.
    ///
    /// `devDependencies` are never traversed. A package already fully resolved at a given
    /// absolute install path is reused rather than walked again, so ordinary diamonds are
    /// cheap; a path still being resolved higher up the call stack (a symlinked cycle) is
    /// terminated with an empty-dependency stub instead of recursing forever. Two distinct
    /// install locations that happen to share `(name, version)` are still modeled as two
    /// separate packages, since their license metadata can differ.
    pub fn resolve(package_dir: &Path) -> PipelineResult<Package> {
        let mut in_progress = HashSet::new();
        let mut cache = HashMap::new();
        Self::resolve_at(package_dir, &mut in_progress, &mut cache)
    }

    fn resolve_at(
        dir: &Path,
        in_progress: &mut HashSet<PathBuf>,
        cache: &mut HashMap<PathBuf, Package>,
    ) -> PipelineResult<Package> {
        let abs = Self::canonicalize_best_effort(dir);
        if let Some(cached) = cache.get(&abs) {
            return Ok(cached.clone());
        }
        if in_progress.contains(&abs) {
            // Symlinked install cycle: terminate rather than recurse forever.
            let manifest_path = dir.join("package.json");
            let manifest = Self::read_manifest(&manifest_path)?;
            return Ok(Package {
                name: manifest.name,
                version: manifest.version,
                root_dir: dir.to_path_buf(),
                manifest_path,
                dependencies: Vec::new(),
            });
        }

        let manifest_path = dir.join("package.json");
        let manifest = Self::read_manifest(&manifest_path)?;
        in_progress.insert(abs.clone());

        let mut dep_names: Vec<&String> = manifest.dependencies.keys().collect();
        dep_names.extend(manifest.optional_dependencies.keys());
        dep_names.sort();
        dep_names.dedup();

        let mut dependencies = Vec::new();
        for name in dep_names {
            let found = Self::locate_installed(dir, name).ok_or_else(|| {
                PipelineError::ResolutionFailed {
                    name: name.clone(),
                    searched_from: dir.to_path_buf(),
                }
            })?;
            dependencies.push(Self::resolve_at(&found, in_progress, cache)?);
        }

        in_progress.remove(&abs);
        let package = Package {
            name: manifest.name,
            version: manifest.version,
            root_dir: dir.to_path_buf(),
            manifest_path,
            dependencies,
        };
        cache.insert(abs, package.clone());
        Ok(package)
    }

    /// Walks upward from `from`, inspecting `node_modules/<name>` at each level until found
    /// or the filesystem root is reached.
    fn locate_installed(from: &Path, name: &str) -> Option<PathBuf> {
        let mut current = from;
        loop {
            let candidate = current.join("node_modules").join(name);
            if candidate.join("package.json").is_file() {
                return Some(candidate);
            }
            current = current.parent()?;
        }
    }

    fn read_manifest(path: &Path) -> PipelineResult<ProjectManifest> {
        ProjectManifest::read(path)
    }

    fn canonicalize_best_effort(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::write(dir.join("package.json"), json).unwrap();
    }

    fn install(root: &Path, name: &str, version: &str, deps: &[(&str, &str)]) -> PathBuf {
        let dir = root.join("node_modules").join(name);
        fs::create_dir_all(&dir).unwrap();
        let deps_json: String = deps
            .iter()
            .map(|(n, v)| format!("\"{n}\": \"{v}\""))
            .collect::<Vec<_>>()
            .join(",");
        write_manifest(
            &dir,
            &format!(r#"{{"name": "{name}", "version": "{version}", "dependencies": {{{deps_json}}}}}"#),
        );
        dir
    }

    #[test]
    fn resolves_transitive_dependencies() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(
            root,
            r#"{"name": "consumer", "version": "1.0.0", "dependencies": {"dep1": "1.0.0"}}"#,
        );
        install(root, "dep1", "1.0.0", &[("dep2", "2.0.0")]);
        install(root, "dep2", "2.0.0", &[]);

        let resolved = PackageResolver::resolve(root).unwrap();
        assert_eq!(resolved.name, "consumer");
        assert_eq!(resolved.dependencies.len(), 1);
        assert_eq!(resolved.dependencies[0].name, "dep1");
        assert_eq!(resolved.dependencies[0].dependencies[0].name, "dep2");
    }

    #[test]
    fn dev_dependencies_are_never_traversed() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(
            root,
            r#"{"name": "consumer", "version": "1.0.0", "devDependencies": {"only-dev": "1.0.0"}}"#,
        );

        let resolved = PackageResolver::resolve(root).unwrap();
        assert!(resolved.dependencies.is_empty());
    }

    #[test]
    fn missing_dependency_fails_resolution() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(
            root,
            r#"{"name": "consumer", "version": "1.0.0", "dependencies": {"missing-dep": "1.0.0"}}"#,
        );

        let err = PackageResolver::resolve(root).unwrap_err();
        assert!(matches!(err, PipelineError::ResolutionFailed { name, .. } if name == "missing-dep"));
    }

    #[test]
    fn diamond_dependency_resolves_once_per_install_location() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(
            root,
            r#"{"name": "consumer", "version": "1.0.0", "dependencies": {"dep1": "1.0.0", "dep2": "1.0.0"}}"#,
        );
        install(root, "dep1", "1.0.0", &[("shared", "1.0.0")]);
        install(root, "dep2", "1.0.0", &[("shared", "1.0.0")]);
        install(root, "shared", "1.0.0", &[]);

        let resolved = PackageResolver::resolve(root).unwrap();
        let dep1 = resolved.dependencies.iter().find(|p| p.name == "dep1").unwrap();
        let dep2 = resolved.dependencies.iter().find(|p| p.name == "dep2").unwrap();
        assert_eq!(dep1.dependencies[0].name, "shared");
        assert_eq!(dep2.dependencies[0].name, "shared");
    }
}
