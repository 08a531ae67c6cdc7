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

use crate::errors::PipelineResult;
use crate::shell::ShellInvoker;

#[derive(Debug, Clone)]
pub struct BundleInput {
    pub package_dir: PathBuf,
    pub entry_points: Vec<PathBuf>,
    pub externals: Vec<String>,
    pub minify_whitespace: bool,
    pub metafile: Option<PathBuf>,
    pub sourcemap: bool,
}

#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub output_dir: PathBuf,
}

/// Opaque tree-shaker invoked with the bundled closure as input and externals as markers.
///
/// Must mark every external dependency name as "do not inline" and output a single file per
/// entry point plus any sourcemap. Failure is surfaced as
/// [`crate::errors::PipelineError::ToolFailure`].
pub trait Bundler {
    fn bundle(&self, input: &BundleInput) -> PipelineResult<BundleOutput>;
}

/// Default [`Bundler`] shelling out to an esbuild-compatible binary.
pub struct ShellBundler<'a> {
    pub invoker: &'a dyn ShellInvoker,
    pub program: String,
}

impl<'a> ShellBundler<'a> {
    pub fn new(invoker: &'a dyn ShellInvoker, program: impl Into<String>) -> Self {
        ShellBundler {
            invoker,
            program: program.into(),
        }
    }
}

impl Bundler for ShellBundler<'_> {
    fn bundle(&self, input: &BundleInput) -> PipelineResult<BundleOutput> {
        let output_dir = tempfile::Builder::new()
            .prefix("bundle-out-")
            .tempdir()
            .map_err(|source| crate::errors::PipelineError::Io {
                action: "creating bundler output directory".to_string(),
                source,
            })?
            .keep();

        let mut args: Vec<String> = input
            .entry_points
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        args.push(format!("--outdir={}", output_dir.display()));
        args.push("--bundle".to_string());
        for external in &input.externals {
            args.push(format!("--external:{external}"));
        }
        if input.minify_whitespace {
            args.push("--minify-whitespace".to_string());
        }
        if input.sourcemap {
            args.push("--sourcemap".to_string());
        }
        if let Some(metafile) = &input.metafile {
            args.push(format!("--metafile={}", metafile.display()));
        }

        let args_ref: Vec<&str> = args.iter().map(String::as_str).collect();
        self.invoker.run(&input.package_dir, &self.program, &args_ref)?;

        Ok(BundleOutput { output_dir })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::fake::FakeShellInvoker;
    use pretty_assertions::assert_eq;

    #[test]
    fn externals_and_flags_are_passed_through_as_cli_args() {
        let invoker = FakeShellInvoker::default();
        let bundler = ShellBundler::new(&invoker, "esbuild");
        let input = BundleInput {
            package_dir: PathBuf::from("/pkgs/consumer"),
            entry_points: vec![PathBuf::from("index.js")],
            externals: vec!["ext1".to_string()],
            minify_whitespace: true,
            metafile: Some(PathBuf::from("meta.json")),
            sourcemap: true,
        };

        bundler.bundle(&input).unwrap();

        let calls = invoker.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (program, args) = &calls[0];
        assert_eq!(program, "esbuild");
        assert!(args.contains(&"index.js".to_string()));
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--external:ext1".to_string()));
        assert!(args.contains(&"--minify-whitespace".to_string()));
        assert!(args.contains(&"--sourcemap".to_string()));
        assert!(args.contains(&"--metafile=meta.json".to_string()));
    }
}
