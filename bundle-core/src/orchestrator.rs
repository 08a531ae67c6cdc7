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

use crate::attributions::{Attribution, AttributionsConfig, AttributionsEngine};
use crate::circularity::CircularityAnalyzer;
use crate::closure::Classification;
use crate::config::BundleConfig;
use crate::errors::PipelineResult;
use crate::license_probe::LicenseProbe;
use crate::package::Package;
use crate::resources::ResourceResolver;
use crate::violation::{Violation, ViolationKind};

/// Fuses circularity analysis, resource resolution, and attribution/license checks into a
/// single fix-capable report.
///
/// Order of composition matches §4.7: circular imports, then missing resources, then
/// attribution/license violations.
pub struct ValidationOrchestrator<'a> {
    config: &'a BundleConfig,
    root: &'a Package,
    classification: &'a Classification,
    circularity: &'a dyn CircularityAnalyzer,
    probe: &'a dyn LicenseProbe,
}

impl<'a> ValidationOrchestrator<'a> {
    pub fn new(
        config: &'a BundleConfig,
        root: &'a Package,
        classification: &'a Classification,
        circularity: &'a dyn CircularityAnalyzer,
        probe: &'a dyn LicenseProbe,
    ) -> Self {
        ValidationOrchestrator {
            config,
            root,
            classification,
            circularity,
            probe,
        }
    }

    fn attributions_config(&self) -> AttributionsConfig {
        AttributionsConfig {
            package_dir: self.config.package_dir.clone(),
            package_name: self.root.name.clone(),
            dependencies: self.classification.bundled.clone(),
            dependencies_root: self.config.package_dir.join("node_modules"),
            licenses_path: self.config.licenses_path.clone(),
            allowed_licenses: self.config.allowed_licenses.clone(),
            exclude: self.config.dont_attribute.clone(),
            versions_path: self.config.versions_file.clone(),
            write_versions_sidecar_unconditionally: self.config.write_versions_sidecar_unconditionally,
        }
    }

    pub fn attributions_engine(&self) -> AttributionsEngine<'a> {
        AttributionsEngine::new(self.attributions_config(), self.probe)
    }

    /// Runs every validator once and returns the fused report. With `fix=true`, each
    /// fixable violation's fixer is invoked exactly once, in the order the violations were
    /// produced above; the returned report still lists the violations that were detected,
    /// marked `success=true` once every one of them was fixable.
    pub fn validate(&self, fix: bool) -> PipelineResult<(crate::violation::ValidationReport, Vec<Attribution>)> {
        let mut violations = Vec::new();

        let cycles = self
            .circularity
            .find_cycles(&self.config.package_dir, &self.config.entry_points)?;
        violations.extend(
            cycles
                .into_iter()
                .map(|cycle| Violation::new(ViolationKind::CircularImport, cycle)),
        );

        violations.extend(ResourceResolver::resolve(&self.config.package_dir, &self.config.resources));

        let engine = self.attributions_engine();
        let attributions = engine.collect()?;
        violations.extend(engine.validate(&attributions)?);

        let report = crate::violation::ValidationReport::new(violations);
        let report = if fix { report.with_fix_applied()? } else { report };
        Ok((report, attributions))
    }
}
