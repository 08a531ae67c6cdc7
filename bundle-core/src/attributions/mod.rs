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

//! Computes a deterministic canonical attributions document and versions index for a
//! bundled closure, compares against on-disk state, and flushes corrections. Split into
//! `collect` (probe orchestration), `render` (canonical document text), and `validate`
//! (staleness detection + writeback) — one conceptual unit, single-responsibility files.

mod collect;
mod render;
mod validate;

use std::collections::HashSet;
use std::path::PathBuf;

use regex::Regex;
use serde_json::Map;

use crate::errors::PipelineResult;
use crate::license_probe::LicenseProbe;
use crate::package::Package;

/// `{ packageFqn, name, version, url, licenses, licenseText?, noticeText? }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub package_fqn: String,
    pub name: String,
    pub version: String,
    pub url: String,
    pub licenses: Vec<String>,
    pub license_text: Option<String>,
    pub notice_text: Option<String>,
}

/// A canonical UTF-8 string derived deterministically from a sorted list of Attributions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributionsDocument(pub String);

impl AttributionsDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttributionsDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mapping `name -> versions present in closure`, in the order packages were encountered
/// (not engine-sorted — the upstream traversal already provides a stable order).
#[derive(Debug, Clone, Default)]
pub struct VersionsIndex {
    entries: Vec<(String, Vec<String>)>,
}

impl VersionsIndex {
    pub fn new() -> Self {
        VersionsIndex::default()
    }

    pub fn record(&mut self, name: &str, version: &str) {
        if let Some((_, versions)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            versions.push(version.to_string());
        } else {
            self.entries.push((name.to_string(), vec![version.to_string()]));
        }
    }

    pub fn to_json_string(&self) -> PipelineResult<String> {
        let mut map = Map::new();
        for (name, versions) in &self.entries {
            map.insert(
                name.clone(),
                serde_json::Value::Array(
                    versions.iter().cloned().map(serde_json::Value::String).collect(),
                ),
            );
        }
        serde_json::to_string_pretty(&serde_json::Value::Object(map))
            .map_err(|source| crate::errors::PipelineError::ProbeOutputInvalid { source })
    }
}

/// Construction inputs for one [`AttributionsEngine`] run.
#[derive(Clone)]
pub struct AttributionsConfig {
    pub package_dir: PathBuf,
    pub package_name: String,
    /// The bundled closure (externals already removed by the classifier).
    pub dependencies: Vec<Package>,
    pub dependencies_root: PathBuf,
    pub licenses_path: PathBuf,
    /// Lowercased allow-list; comparisons against declared licenses are case-insensitive.
    pub allowed_licenses: HashSet<String>,
    pub exclude: Option<Regex>,
    pub versions_path: Option<PathBuf>,
    /// Resolves the "versions sidecar on flush" open question: when `versions_path` is
    /// unset, write `<licenses_path>.versions.json` unconditionally anyway. Off by default;
    /// see DESIGN.md.
    pub write_versions_sidecar_unconditionally: bool,
}

pub struct AttributionsEngine<'a> {
    config: AttributionsConfig,
    probe: &'a dyn LicenseProbe,
}

impl<'a> AttributionsEngine<'a> {
    pub fn new(config: AttributionsConfig, probe: &'a dyn LicenseProbe) -> Self {
        AttributionsEngine { config, probe }
    }

    pub fn config(&self) -> &AttributionsConfig {
        &self.config
    }

    pub fn probe(&self) -> &'a dyn LicenseProbe {
        self.probe
    }

    pub fn collect(&self) -> PipelineResult<Vec<Attribution>> {
        collect::collect(&self.config, self.probe, filtered_dependencies(&self.config))
    }

    pub fn versions_index(&self) -> VersionsIndex {
        versions_index(&self.config)
    }

    pub fn render(&self, attributions: &[Attribution]) -> AttributionsDocument {
        render_document(&self.config, attributions)
    }

    pub fn validate(
        &self,
        attributions: &[Attribution],
    ) -> PipelineResult<Vec<crate::violation::Violation>> {
        validate::validate(&self.config, attributions)
    }

    pub fn flush(&self, attributions: &[Attribution]) -> PipelineResult<()> {
        validate::flush(&self.config, attributions)
    }
}

/// Dependencies after the `dontAttribute` exclude filter. The same filtered set feeds both
/// rendering and versioning, per the preserved open-question behavior.
pub(crate) fn filtered_dependencies(config: &AttributionsConfig) -> Vec<&Package> {
    config
        .dependencies
        .iter()
        .filter(|pkg| match &config.exclude {
            Some(re) => !re.is_match(&pkg.name),
            None => true,
        })
        .collect()
}

pub(crate) fn versions_index(config: &AttributionsConfig) -> VersionsIndex {
    let mut index = VersionsIndex::new();
    for pkg in filtered_dependencies(config) {
        index.record(&pkg.name, &pkg.version);
    }
    index
}

pub(crate) fn render_document(config: &AttributionsConfig, attributions: &[Attribution]) -> AttributionsDocument {
    render::render(&config.package_name, attributions, config.versions_path.is_some())
}

/// Flushes the canonical attributions document (and, depending on configuration, a
/// versions-index sidecar) for an already-collected attribution set, without requiring a
/// [`LicenseProbe`] — used by `WriteEngine` to re-flush attributions into a bundle
/// directory from attributions collected earlier in the run.
pub fn flush_standalone(config: &AttributionsConfig, attributions: &[Attribution]) -> PipelineResult<()> {
    validate::flush(config, attributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attribution(fqn: &str, url: &str, licenses: Vec<&str>) -> Attribution {
        let (name, version) = fqn.split_once('@').unwrap();
        Attribution {
            package_fqn: fqn.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            licenses: licenses.into_iter().map(str::to_string).collect(),
            license_text: None,
            notice_text: None,
        }
    }

    #[test]
    fn empty_closure_renders_empty_document_and_empty_versions_index() {
        let doc = render::render("consumer", &[], false);
        assert_eq!(doc.as_str(), "");

        let index = VersionsIndex::new();
        assert_eq!(index.to_json_string().unwrap(), "{}");
    }

    #[test]
    fn versions_index_preserves_encounter_order_not_sorted() {
        let mut index = VersionsIndex::new();
        index.record("zeta", "1.0.0");
        index.record("alpha", "2.0.0");
        let json = index.to_json_string().unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());
    }

    #[test]
    fn attribution_blocks_sort_ascending_by_fqn() {
        let attributions = vec![
            attribution("zeta@1.0.0", "https://example.com/zeta", vec!["MIT"]),
            attribution("alpha@1.0.0", "https://example.com/alpha", vec!["MIT"]),
        ];
        let doc = render::render("consumer", &attributions, false);
        let alpha_pos = doc.as_str().find("alpha@1.0.0").unwrap();
        let zeta_pos = doc.as_str().find("zeta@1.0.0").unwrap();
        assert!(alpha_pos < zeta_pos);
    }
}
