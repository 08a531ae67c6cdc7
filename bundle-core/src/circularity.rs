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

use crate::errors::PipelineResult;
use crate::shell::ShellInvoker;

/// Given a package root and a list of entry points, returns a possibly-empty list of cycles
/// in the source-import graph, each rendered as an arrow chain (`a.js -> b.js`, or longer).
///
/// Treated as opaque: any failure to run the underlying tool is surfaced as
/// [`crate::errors::PipelineError::ToolFailure`] and is fatal, never a violation.
pub trait CircularityAnalyzer {
    fn find_cycles(&self, package_root: &Path, entry_points: &[PathBuf]) -> PipelineResult<Vec<String>>;
}

pub struct ShellCircularityAnalyzer<'a> {
    pub invoker: &'a dyn ShellInvoker,
    pub program: String,
}

impl<'a> ShellCircularityAnalyzer<'a> {
    pub fn new(invoker: &'a dyn ShellInvoker, program: impl Into<String>) -> Self {
        ShellCircularityAnalyzer {
            invoker,
            program: program.into(),
        }
    }
}

impl CircularityAnalyzer for ShellCircularityAnalyzer<'_> {
    fn find_cycles(&self, package_root: &Path, entry_points: &[PathBuf]) -> PipelineResult<Vec<String>> {
        if entry_points.is_empty() {
            return Ok(Vec::new());
        }
        let args: Vec<String> = entry_points.iter().map(|p| p.display().to_string()).collect();
        let args_ref: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.invoker.run(package_root, &self.program, &args_ref)?;
        let text = String::from_utf8_lossy(&stdout);
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    pub struct FakeCircularityAnalyzer {
        pub cycles: Vec<String>,
    }

    impl CircularityAnalyzer for FakeCircularityAnalyzer {
        fn find_cycles(&self, _package_root: &Path, _entry_points: &[PathBuf]) -> PipelineResult<Vec<String>> {
            Ok(self.cycles.clone())
        }
    }
}
