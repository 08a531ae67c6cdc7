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

use std::path::PathBuf;

/// Hard failures: thrown and fatal, never accumulated into a [`crate::violation::ValidationReport`].
///
/// Policy findings (invalid license, missing resource, staleness, ...) are represented
/// separately as [`crate::violation::Violation`]s collected by the orchestrator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("could not resolve dependency {name}: not found under any node_modules starting from {}", searched_from.display())]
    ResolutionFailed {
        name: String,
        searched_from: PathBuf,
    },

    #[error("failed to parse manifest at {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("license probe could not locate package {package_fqn}")]
    AttributionFailed { package_fqn: String },

    #[error("license probe emitted output that could not be parsed as JSON: {source}")]
    ProbeOutputInvalid {
        #[source]
        source: serde_json::Error,
    },

    #[error("{tool} exited with a non-zero status: {stderr}")]
    ToolFailure { tool: String, stderr: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error while {action}: {source}")]
    Io {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
