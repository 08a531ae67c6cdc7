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

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::attributions::{self, Attribution, AttributionsConfig};
use crate::bundler::{BundleInput, Bundler};
use crate::closure::Classification;
use crate::config::BundleConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::manifest::ProjectManifest;
use crate::package::Package;

/// Materializes a publishable bundle directory: copies the package tree, overlays the
/// bundler's output onto the entry points, rewrites `package.json` so bundled dependencies
/// move to `devDependencies`, and flushes attributions into the bundle.
pub struct WriteEngine<'a> {
    pub config: &'a BundleConfig,
    pub root: &'a Package,
    pub classification: &'a Classification,
    pub bundler: &'a dyn Bundler,
}

/// The materialized bundle: its root directory, for `Packer` or inspection to consume.
#[derive(Debug, Clone)]
pub struct WrittenBundle {
    pub bundle_dir: PathBuf,
}

/// Top-level entries excluded when copying the package tree. Exact name match only — a
/// sibling like `.gitignore` or `node_modules_file` is not excluded.
const IGNORED_TOP_LEVEL_ENTRIES: [&str; 2] = [".git", "node_modules"];

impl<'a> WriteEngine<'a> {
    pub fn write(&self, attributions: &[Attribution]) -> PipelineResult<WrittenBundle> {
        let bundle_dir = tempfile::Builder::new()
            .prefix("bundle-write-")
            .tempdir()
            .map_err(|source| PipelineError::Io {
                action: "creating bundle output directory".to_string(),
                source,
            })?
            .keep();

        copy_package_tree(&self.config.package_dir, &bundle_dir)?;

        let externals: Vec<String> = self
            .classification
            .external_names()
            .into_iter()
            .map(String::from)
            .collect();
        let bundler_input = BundleInput {
            package_dir: self.config.package_dir.clone(),
            entry_points: self.config.entry_points.clone(),
            externals,
            minify_whitespace: self.config.minify_whitespace,
            metafile: self.config.metafile.clone(),
            sourcemap: self.config.sourcemap,
        };
        let bundled = self.bundler.bundle(&bundler_input)?;
        overlay_entry_points(
            &bundled.output_dir,
            &bundle_dir,
            &self.config.entry_points,
            self.config.sourcemap,
        )?;

        self.rewrite_manifest(&bundle_dir)?;
        self.flush_attributions(&bundle_dir, attributions)?;

        Ok(WrittenBundle { bundle_dir })
    }

    fn rewrite_manifest(&self, bundle_dir: &Path) -> PipelineResult<()> {
        let manifest = ProjectManifest::read(&self.root.manifest_path)?;
        let bundled_names: HashSet<String> = self
            .classification
            .bundled
            .iter()
            .map(|pkg| pkg.name.clone())
            .collect();
        let rewritten = manifest.rewrite_for_bundle(&bundled_names);
        rewritten.write(&bundle_dir.join("package.json"))
    }

    fn flush_attributions(&self, bundle_dir: &Path, attributions: &[Attribution]) -> PipelineResult<()> {
        let config = AttributionsConfig {
            package_dir: bundle_dir.to_path_buf(),
            package_name: self.root.name.clone(),
            dependencies: self.classification.bundled.clone(),
            dependencies_root: bundle_dir.join("node_modules"),
            licenses_path: relocate(&self.config.licenses_path, &self.config.package_dir, bundle_dir),
            allowed_licenses: self.config.allowed_licenses.clone(),
            exclude: self.config.dont_attribute.clone(),
            versions_path: self
                .config
                .versions_file
                .as_ref()
                .map(|p| relocate(p, &self.config.package_dir, bundle_dir)),
            write_versions_sidecar_unconditionally: self.config.write_versions_sidecar_unconditionally,
        };
        attributions::flush_standalone(&config, attributions)
    }
}

/// Re-roots `path` under `new_root` using its position relative to `old_root` when
/// possible, falling back to just the file name (e.g. for an absolute metafile path that
/// was never under the package directory to begin with).
fn relocate(path: &Path, old_root: &Path, new_root: &Path) -> PathBuf {
    match path.strip_prefix(old_root) {
        Ok(relative) => new_root.join(relative),
        Err(_) => new_root.join(path.file_name().unwrap_or_default()),
    }
}

fn copy_package_tree(src: &Path, dst: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dst).map_err(|source| PipelineError::Io {
        action: format!("creating bundle directory {}", dst.display()),
        source,
    })?;

    let entries = std::fs::read_dir(src).map_err(|source| PipelineError::Io {
        action: format!("reading package directory {}", src.display()),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::Io {
            action: format!("reading entry under {}", src.display()),
            source,
        })?;
        let file_name = entry.file_name();
        if IGNORED_TOP_LEVEL_ENTRIES.iter().any(|ignored| file_name == *ignored) {
            continue;
        }

        let from = entry.path();
        let to = dst.join(&file_name);
        let file_type = entry.file_type().map_err(|source| PipelineError::Io {
            action: format!("inspecting {}", from.display()),
            source,
        })?;
        if file_type.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            copy_file(&from, &to)?;
        }
    }

    Ok(())
}

/// Copies every nested entry unconditionally — the ignore list applies only at the
/// top level of the package directory.
fn copy_dir_recursive(src: &Path, dst: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dst).map_err(|source| PipelineError::Io {
        action: format!("creating directory {}", dst.display()),
        source,
    })?;
    let entries = std::fs::read_dir(src).map_err(|source| PipelineError::Io {
        action: format!("reading directory {}", src.display()),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::Io {
            action: format!("reading entry under {}", src.display()),
            source,
        })?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|source| PipelineError::Io {
            action: format!("inspecting {}", from.display()),
            source,
        })?;
        if file_type.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            copy_file(&from, &to)?;
        }
    }
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> PipelineResult<()> {
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| PipelineError::Io {
            action: format!("copying {} to {}", from.display(), to.display()),
            source,
        })
}

/// Overlays the bundler's output onto the bundle at the same relative entry-point paths:
/// the bundler writes one file per entry point (plus an optional sourcemap) named by the
/// entry point's base name under its own output directory.
fn overlay_entry_points(
    output_dir: &Path,
    bundle_dir: &Path,
    entry_points: &[PathBuf],
    sourcemap: bool,
) -> PipelineResult<()> {
    for entry_point in entry_points {
        let Some(base_name) = entry_point.file_name() else {
            continue;
        };
        let produced = output_dir.join(base_name);
        if produced.is_file() {
            let target = bundle_dir.join(entry_point);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
                    action: format!("creating directory {}", parent.display()),
                    source,
                })?;
            }
            copy_file(&produced, &target)?;
        }

        if sourcemap {
            let mut map_name = base_name.to_os_string();
            map_name.push(".map");
            let produced_map = output_dir.join(&map_name);
            if produced_map.is_file() {
                let target_map = bundle_dir.join(entry_point).with_extension(
                    entry_point
                        .extension()
                        .map(|ext| format!("{}.map", ext.to_string_lossy()))
                        .unwrap_or_else(|| "map".to_string()),
                );
                copy_file(&produced_map, &target_map)?;
            }
        }
    }
    Ok(())
}
