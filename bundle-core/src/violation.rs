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

use std::fmt;

use crate::errors::PipelineResult;

/// A violation's fixer is a bound action owned by the producing subsystem. The orchestrator
/// invokes each exactly once, in report order, never holding cross-fixer state.
pub type Fixer = Box<dyn FnOnce() -> PipelineResult<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    InvalidLicense,
    NoLicense,
    MultipleLicense,
    MissingLicenses,
    OutdatedLicenses,
    MissingVersions,
    OutdatedVersions,
    CircularImport,
    MissingResource,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::InvalidLicense => "invalid-license",
            ViolationKind::NoLicense => "no-license",
            ViolationKind::MultipleLicense => "multiple-license",
            ViolationKind::MissingLicenses => "missing-licenses",
            ViolationKind::OutdatedLicenses => "outdated-licenses",
            ViolationKind::MissingVersions => "missing-versions",
            ViolationKind::OutdatedVersions => "outdated-versions",
            ViolationKind::CircularImport => "circular-import",
            ViolationKind::MissingResource => "missing-resource",
        };
        f.write_str(s)
    }
}

/// A policy finding with a stable kind, a human-readable message, and an optional fixer.
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    pub fixer: Option<Fixer>,
}

impl fmt::Debug for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Violation")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("fixable", &self.fixer.is_some())
            .finish()
    }
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Violation {
            kind,
            message: message.into(),
            fixer: None,
        }
    }

    pub fn with_fixer(mut self, fixer: Fixer) -> Self {
        self.fixer = Some(fixer);
        self
    }

    pub fn fixable(&self) -> bool {
        self.fixer.is_some()
    }
}

/// `{ violations, success, summary }`. `success` holds iff `violations` is empty.
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub success: bool,
    pub summary: String,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        let success = violations.is_empty();
        let summary = violations
            .iter()
            .map(|v| format!("- {}: {}", v.kind, v.message))
            .collect::<Vec<_>>()
            .join("\n");
        ValidationReport {
            violations,
            success,
            summary,
        }
    }

    /// Invokes each fixable violation's fixer exactly once, in report order. The returned
    /// report still lists the originally detected violations but is marked `success=true`
    /// when every one of them was fixable. A second validation pass is not performed here;
    /// callers that need a guaranteed-fresh report should re-run validation.
    pub fn with_fix_applied(self) -> PipelineResult<Self> {
        let mut all_fixed = true;
        let mut violations = Vec::with_capacity(self.violations.len());
        for violation in self.violations {
            let fixable = violation.fixable();
            if fixable {
                if let Some(fixer) = violation.fixer {
                    fixer()?;
                    violations.push(Violation {
                        kind: violation.kind,
                        message: violation.message,
                        fixer: None,
                    });
                    continue;
                }
            } else {
                all_fixed = false;
            }
            violations.push(Violation {
                kind: violation.kind,
                message: violation.message,
                fixer: None,
            });
        }

        let summary = violations
            .iter()
            .map(|v| format!("- {}: {}", v.kind, v.message))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ValidationReport {
            success: all_fixed,
            violations,
            summary,
        })
    }
}
