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

use regex::Regex;

use crate::closure::ExternalsConfig;

/// Where `pack` writes the produced tarball: the original package directory, or an
/// explicitly configured destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackDestination {
    Default,
    Custom(PathBuf),
}

impl PackDestination {
    pub fn resolve(&self, package_dir: &Path) -> PathBuf {
        match self {
            PackDestination::Default => package_dir.to_path_buf(),
            PackDestination::Custom(dir) => dir.clone(),
        }
    }
}

/// Immutable inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    pub package_dir: PathBuf,
    pub entry_points: Vec<PathBuf>,
    pub externals: ExternalsConfig,
    /// Already lowercased; allow-list comparisons are case-insensitive.
    pub allowed_licenses: HashSet<String>,
    pub resources: BTreeMap<String, String>,
    pub dont_attribute: Option<Regex>,
    pub test_command: Option<String>,
    pub minify_whitespace: bool,
    pub metafile: Option<PathBuf>,
    pub sourcemap: bool,
    /// When set, the versions index is emitted as a separate file and attribution titles
    /// omit versions.
    pub versions_file: Option<PathBuf>,
    /// Resolves the "does flush write `<licensesPath>.versions.json` unconditionally"
    /// open question; see DESIGN.md. Default `false`.
    pub write_versions_sidecar_unconditionally: bool,
    pub licenses_path: PathBuf,
    pub pack_destination: PackDestination,
}

impl BundleConfig {
    /// A config with every optional knob at its compiled-in default, for `package_dir`.
    pub fn defaults_for(package_dir: PathBuf) -> Self {
        let licenses_path = package_dir.join("THIRD_PARTY_LICENSES");
        BundleConfig {
            package_dir,
            entry_points: Vec::new(),
            externals: ExternalsConfig::default(),
            allowed_licenses: HashSet::new(),
            resources: BTreeMap::new(),
            dont_attribute: None,
            test_command: None,
            minify_whitespace: false,
            metafile: None,
            sourcemap: false,
            versions_file: None,
            write_versions_sidecar_unconditionally: false,
            licenses_path,
            pack_destination: PackDestination::Default,
        }
    }
}
