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

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::PipelineResult;
use crate::shell::ShellInvoker;

/// One probe result: declared licenses, and the on-disk paths of the license/notice files if
/// the probed package carries them.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeEntry {
    #[serde(deserialize_with = "deserialize_licenses")]
    pub licenses: Vec<String>,
    #[serde(rename = "licenseFile")]
    pub license_file: Option<PathBuf>,
    #[serde(rename = "noticeFile")]
    pub notice_file: Option<PathBuf>,
}

/// The probe reports `licenses` as either a bare string or an array; normalize to a list at
/// this ingress boundary so downstream code only ever models `Vec<String>`.
fn deserialize_licenses<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Given a working directory and a list of package identifiers, returns a mapping of
/// identifier to probe result. Backed by an opaque external tool.
pub trait LicenseProbe {
    fn probe(&self, cwd: &Path, package_fqns: &[String]) -> PipelineResult<HashMap<String, ProbeEntry>>;
}

/// Default [`LicenseProbe`] shelling out to a probe binary with the contract
/// `--json --packages "a@1;b@2"`, emitting a JSON object keyed by package identifier.
pub struct ShellLicenseProbe<'a> {
    pub invoker: &'a dyn ShellInvoker,
    pub program: String,
}

impl<'a> ShellLicenseProbe<'a> {
    pub fn new(invoker: &'a dyn ShellInvoker, program: impl Into<String>) -> Self {
        ShellLicenseProbe {
            invoker,
            program: program.into(),
        }
    }
}

impl LicenseProbe for ShellLicenseProbe<'_> {
    fn probe(&self, cwd: &Path, package_fqns: &[String]) -> PipelineResult<HashMap<String, ProbeEntry>> {
        if package_fqns.is_empty() {
            return Ok(HashMap::new());
        }
        let packages_arg = package_fqns.join(";");
        let stdout = self
            .invoker
            .run(cwd, &self.program, &["--json", "--packages", &packages_arg])?;
        serde_json::from_slice(&stdout)
            .map_err(|source| crate::errors::PipelineError::ProbeOutputInvalid { source })
    }
}
