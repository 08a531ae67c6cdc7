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

use std::path::{Path, PathBuf};

use crate::errors::{PipelineError, PipelineResult};
use crate::violation::{Fixer, Violation, ViolationKind};

use super::render::normalize_line_endings;
use super::{render_document, versions_index as compute_versions_index, Attribution, AttributionsConfig};

pub(super) fn validate(config: &AttributionsConfig, attributions: &[Attribution]) -> PipelineResult<Vec<Violation>> {
    let mut violations = Vec::new();

    for attribution in attributions {
        if let Some(violation) = license_violation(attribution, config) {
            violations.push(violation);
        }
    }

    let canonical_doc = render_document(config, attributions);
    violations.extend(licenses_artifact_violations(config, canonical_doc.as_str())?);

    let versions_index = compute_versions_index(config);
    let canonical_versions_json = versions_index.to_json_string()?;
    violations.extend(versions_artifact_violations(config, &canonical_versions_json));

    Ok(violations)
}

pub(super) fn flush(config: &AttributionsConfig, attributions: &[Attribution]) -> PipelineResult<()> {
    let doc = render_document(config, attributions);
    write_text_file(&config.licenses_path, doc.as_str())?;

    match &config.versions_path {
        Some(versions_path) => {
            let json = compute_versions_index(config).to_json_string()?;
            write_text_file(versions_path, &json)?;
        }
        None if config.write_versions_sidecar_unconditionally => {
            let sidecar = sidecar_path(&config.licenses_path);
            let json = compute_versions_index(config).to_json_string()?;
            write_text_file(&sidecar, &json)?;
        }
        None => {}
    }

    Ok(())
}

/// `invalid-license` (one declared license outside the allow-list), `no-license` (zero
/// declared), or `multiple-license` (two or more) — at most one violation per dependency.
fn license_violation(attribution: &Attribution, config: &AttributionsConfig) -> Option<Violation> {
    match attribution.licenses.len() {
        0 => Some(Violation::new(
            ViolationKind::NoLicense,
            format!("Dependency {} has no license", attribution.package_fqn),
        )),
        1 => {
            let license = &attribution.licenses[0];
            if config.allowed_licenses.contains(&license.to_lowercase()) {
                None
            } else {
                Some(Violation::new(
                    ViolationKind::InvalidLicense,
                    format!(
                        "Dependency {} has an invalid license: {license}",
                        attribution.package_fqn
                    ),
                ))
            }
        }
        _ => Some(Violation::new(
            ViolationKind::MultipleLicense,
            format!(
                "Dependency {} has multiple licenses: {}",
                attribution.package_fqn,
                attribution.licenses.join(",")
            ),
        )),
    }
}

fn licenses_artifact_violations(
    config: &AttributionsConfig,
    canonical_doc: &str,
) -> PipelineResult<Vec<Violation>> {
    let label = file_label(&config.licenses_path);
    let path = config.licenses_path.clone();
    let contents = canonical_doc.to_string();

    let violation = match std::fs::read_to_string(&path) {
        Err(_) => Some(
            Violation::new(ViolationKind::MissingLicenses, format!("{label} is missing"))
                .with_fixer(write_fixer(path, contents)),
        ),
        Ok(existing) => {
            if normalize_line_endings(&existing) != canonical_doc {
                Some(
                    Violation::new(ViolationKind::OutdatedLicenses, format!("{label} is outdated"))
                        .with_fixer(write_fixer(path, contents)),
                )
            } else {
                None
            }
        }
    };

    Ok(violation.into_iter().collect())
}

fn versions_artifact_violations(config: &AttributionsConfig, canonical_json: &str) -> Vec<Violation> {
    let Some(versions_path) = &config.versions_path else {
        return Vec::new();
    };
    let label = file_label(versions_path);
    let path = versions_path.clone();
    let contents = canonical_json.to_string();

    let violation = match std::fs::read_to_string(&path) {
        Err(_) => Some(
            Violation::new(ViolationKind::MissingVersions, format!("{label} is missing"))
                .with_fixer(write_fixer(path, contents)),
        ),
        Ok(existing) => {
            if existing.trim_end() != canonical_json.trim_end() {
                Some(
                    Violation::new(ViolationKind::OutdatedVersions, format!("{label} is outdated"))
                        .with_fixer(write_fixer(path, contents)),
                )
            } else {
                None
            }
        }
    };

    violation.into_iter().collect()
}

fn write_fixer(path: PathBuf, contents: String) -> Fixer {
    Box::new(move || write_text_file(&path, &contents))
}

fn write_text_file(path: &Path, contents: &str) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
            action: format!("creating parent directory for {}", path.display()),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| PipelineError::Io {
        action: format!("writing {}", path.display()),
        source,
    })
}

fn sidecar_path(licenses_path: &Path) -> PathBuf {
    let mut os_string = licenses_path.as_os_str().to_owned();
    os_string.push(".versions.json");
    PathBuf::from(os_string)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use super::super::AttributionsEngine;
    use crate::license_probe::fake::FakeLicenseProbe;
    use crate::package::Package;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn attribution(fqn: &str, licenses: Vec<&str>) -> Attribution {
        let (name, version) = fqn.split_once('@').unwrap();
        Attribution {
            package_fqn: fqn.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            url: format!("https://www.npmjs.com/package/{name}/v/{version}"),
            licenses: licenses.into_iter().map(str::to_string).collect(),
            license_text: None,
            notice_text: None,
        }
    }

    #[test]
    fn missing_licenses_file_is_fixable() {
        let tmp = TempDir::new().unwrap();
        let mut allowed = HashSet::new();
        allowed.insert("mit".to_string());
        let config = AttributionsConfig {
            package_dir: tmp.path().to_path_buf(),
            package_name: "consumer".to_string(),
            dependencies: vec![],
            dependencies_root: tmp.path().to_path_buf(),
            licenses_path: tmp.path().join("THIRD_PARTY_LICENSES"),
            allowed_licenses: allowed,
            exclude: None,
            versions_path: None,
            write_versions_sidecar_unconditionally: false,
        };
        let probe = FakeLicenseProbe::default();
        let engine = AttributionsEngine::new(config, &probe);

        let violations = engine.validate(&[]).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0].kind, ViolationKind::MissingLicenses));
        assert!(violations[0].fixable());
    }

    #[test]
    fn invalid_license_is_case_insensitive_against_allow_list() {
        let attrs = vec![attribution("dep1@1.0.0", vec!["mit"])];
        let mut allowed = HashSet::new();
        allowed.insert("mit".to_string());
        let config = AttributionsConfig {
            package_dir: PathBuf::from("/pkgs/consumer"),
            package_name: "consumer".to_string(),
            dependencies: vec![],
            dependencies_root: PathBuf::from("/pkgs/consumer/node_modules"),
            licenses_path: PathBuf::from("/pkgs/consumer/THIRD_PARTY_LICENSES"),
            allowed_licenses: allowed,
            exclude: None,
            versions_path: None,
            write_versions_sidecar_unconditionally: false,
        };
        assert!(license_violation(&attrs[0], &config).is_none());
    }

    #[test]
    fn flush_then_validate_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut allowed = HashSet::new();
        allowed.insert("mit".to_string());
        let config = AttributionsConfig {
            package_dir: tmp.path().to_path_buf(),
            package_name: "consumer".to_string(),
            dependencies: vec![],
            dependencies_root: tmp.path().to_path_buf(),
            licenses_path: tmp.path().join("THIRD_PARTY_LICENSES"),
            allowed_licenses: allowed,
            exclude: None,
            versions_path: Some(tmp.path().join("THIRD_PARTY_VERSIONS")),
            write_versions_sidecar_unconditionally: false,
        };
        let probe = FakeLicenseProbe::default();
        let engine = AttributionsEngine::new(config, &probe);

        engine.flush(&[]).unwrap();
        let violations = engine.validate(&[]).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn missing_versions_file_is_reported_when_versions_path_is_configured() {
        let tmp = TempDir::new().unwrap();
        let mut allowed = HashSet::new();
        allowed.insert("mit".to_string());
        let config = AttributionsConfig {
            package_dir: tmp.path().to_path_buf(),
            package_name: "consumer".to_string(),
            dependencies: vec![],
            dependencies_root: tmp.path().to_path_buf(),
            licenses_path: tmp.path().join("THIRD_PARTY_LICENSES"),
            allowed_licenses: allowed,
            exclude: None,
            versions_path: Some(tmp.path().join("THIRD_PARTY_VERSIONS")),
            write_versions_sidecar_unconditionally: false,
        };

        let canonical = compute_versions_index(&config).to_json_string().unwrap();
        let violations = versions_artifact_violations(&config, &canonical);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0].kind, ViolationKind::MissingVersions));
        assert_eq!(violations[0].message, "THIRD_PARTY_VERSIONS is missing");
        assert!(violations[0].fixable());
    }

    #[test]
    fn outdated_versions_file_is_reported_when_content_differs() {
        let tmp = TempDir::new().unwrap();
        let mut allowed = HashSet::new();
        allowed.insert("mit".to_string());
        let versions_path = tmp.path().join("THIRD_PARTY_VERSIONS");
        std::fs::write(&versions_path, "{}\n").unwrap();
        let config = AttributionsConfig {
            package_dir: tmp.path().to_path_buf(),
            package_name: "consumer".to_string(),
            dependencies: vec![Package {
                name: "dep1".to_string(),
                version: "1.0.0".to_string(),
                root_dir: tmp.path().join("node_modules/dep1"),
                manifest_path: tmp.path().join("node_modules/dep1/package.json"),
                dependencies: vec![],
            }],
            dependencies_root: tmp.path().to_path_buf(),
            licenses_path: tmp.path().join("THIRD_PARTY_LICENSES"),
            allowed_licenses: allowed,
            exclude: None,
            versions_path: Some(versions_path),
            write_versions_sidecar_unconditionally: false,
        };

        let canonical = compute_versions_index(&config).to_json_string().unwrap();
        let violations = versions_artifact_violations(&config, &canonical);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0].kind, ViolationKind::OutdatedVersions));
        assert_eq!(violations[0].message, "THIRD_PARTY_VERSIONS is outdated");
        assert!(violations[0].fixable());
    }
}
