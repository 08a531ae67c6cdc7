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

//! Optional `[bundle]` table read from `bundle.toml`, sitting next to `package.json`. Every
//! field is optional so a missing file is equivalent to an empty table; CLI flags always win
//! over a file value, which in turn wins over the compiled-in default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
struct ConfigWrapper {
    bundle: Option<FileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub entry_points: Option<Vec<PathBuf>>,
    pub externals: Option<Vec<String>>,
    pub allowed_licenses: Option<Vec<String>>,
    pub resources: Option<Vec<String>>,
    pub dont_attribute: Option<String>,
    pub test_command: Option<String>,
    pub minify_whitespace: Option<bool>,
    pub metafile: Option<PathBuf>,
    pub sourcemap: Option<bool>,
    pub versions_file: Option<PathBuf>,
    pub attribute_versions_separately: Option<bool>,
    pub licenses_path: Option<PathBuf>,
}

impl FileConfig {
    /// Reads `<package_dir>/bundle.toml`. A missing file yields an empty (all-`None`) config;
    /// a present but unparsable one is a hard error.
    pub fn load(package_dir: &Path) -> Result<Self> {
        let path = package_dir.join("bundle.toml");
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let wrapper: ConfigWrapper =
                    toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
                Ok(wrapper.bundle.unwrap_or_default())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }
}
