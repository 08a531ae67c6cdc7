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

use crate::errors::{PipelineError, PipelineResult};
use crate::license_probe::{LicenseProbe, ProbeEntry};
use crate::package::Package;

use super::{Attribution, AttributionsConfig};

/// Invokes the probe once across `dependencies_root` for every filtered dependency, then
/// falls back to a per-package probe invocation (handles multiple major versions of the
/// same package coexisting at different install locations).
pub(super) fn collect(
    config: &AttributionsConfig,
    probe: &dyn LicenseProbe,
    filtered: Vec<&Package>,
) -> PipelineResult<Vec<Attribution>> {
    if filtered.is_empty() {
        return Ok(Vec::new());
    }

    let fqns: Vec<String> = filtered.iter().map(|pkg| pkg.fqn()).collect();
    let mut probed = probe.probe(&config.dependencies_root, &fqns)?;

    let mut attributions = Vec::with_capacity(filtered.len());
    for pkg in filtered {
        let fqn = pkg.fqn();
        let entry = match probed.remove(&fqn) {
            Some(entry) => entry,
            None => {
                let fallback = probe.probe(&pkg.root_dir, std::slice::from_ref(&fqn))?;
                fallback
                    .into_iter()
                    .next()
                    .map(|(_, entry)| entry)
                    .ok_or(PipelineError::AttributionFailed { package_fqn: fqn.clone() })?
            }
        };
        attributions.push(build_attribution(config, pkg, entry));
    }

    Ok(attributions)
}

fn build_attribution(config: &AttributionsConfig, pkg: &Package, entry: ProbeEntry) -> Attribution {
    let license_text = entry.license_file.as_ref().and_then(read_license_file);
    let notice_text = entry
        .notice_file
        .as_ref()
        .and_then(|path| std::fs::read_to_string(path).ok());

    let url = if config.versions_path.is_some() {
        format!("https://www.npmjs.com/package/{}", pkg.name)
    } else {
        format!("https://www.npmjs.com/package/{}/v/{}", pkg.name, pkg.version)
    };

    Attribution {
        package_fqn: pkg.fqn(),
        name: pkg.name.clone(),
        version: pkg.version.clone(),
        url,
        licenses: entry.licenses,
        license_text,
        notice_text,
    }
}

/// A `.md` license file is discarded as unreliable (likely a formatted README excerpt
/// rather than the raw license grant).
fn read_license_file(path: &std::path::PathBuf) -> Option<String> {
    let is_markdown = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false);
    if is_markdown {
        return None;
    }
    std::fs::read_to_string(path).ok()
}
