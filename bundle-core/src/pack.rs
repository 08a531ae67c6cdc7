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

use crate::attributions::Attribution;
use crate::errors::{PipelineError, PipelineResult};
use crate::shell::ShellInvoker;
use crate::write::{WriteEngine, WrittenBundle};

/// Opaque npm-compatible packer: given a bundle directory and a destination directory,
/// produces `<name>-<version>.tgz` under the destination.
pub trait PackTool {
    fn pack(&self, bundle_dir: &Path, destination: &Path, name: &str, version: &str) -> PipelineResult<PathBuf>;
}

/// Default [`PackTool`] shelling out to an npm-compatible packer.
pub struct ShellPackTool<'a> {
    pub invoker: &'a dyn ShellInvoker,
    pub program: String,
}

impl<'a> ShellPackTool<'a> {
    pub fn new(invoker: &'a dyn ShellInvoker, program: impl Into<String>) -> Self {
        ShellPackTool {
            invoker,
            program: program.into(),
        }
    }
}

impl PackTool for ShellPackTool<'_> {
    fn pack(&self, bundle_dir: &Path, destination: &Path, name: &str, version: &str) -> PipelineResult<PathBuf> {
        std::fs::create_dir_all(destination).map_err(|source| PipelineError::Io {
            action: format!("creating pack destination {}", destination.display()),
            source,
        })?;
        let destination_arg = destination.display().to_string();
        self.invoker
            .run(bundle_dir, &self.program, &["pack", "--pack-destination", &destination_arg])?;
        Ok(destination.join(tarball_file_name(name, version)))
    }
}

/// npm's tarball naming: a leading `@scope/` is stripped of its `@` and its `/` replaced
/// with `-`, e.g. `@scope/name@1.2.3` packs as `scope-name-1.2.3.tgz`.
fn tarball_file_name(name: &str, version: &str) -> String {
    let sanitized = name.trim_start_matches('@').replace('/', "-");
    format!("{sanitized}-{version}.tgz")
}

/// Runs `write`, then invokes the packing tool in the bundle directory to create the
/// tarball in the configured destination (default: the original package directory).
pub struct Packer<'a> {
    pub write_engine: WriteEngine<'a>,
    pub pack_tool: &'a dyn PackTool,
}

#[derive(Debug, Clone)]
pub struct PackedBundle {
    pub written: WrittenBundle,
    pub tarball_path: PathBuf,
}

impl<'a> Packer<'a> {
    pub fn pack(&self, attributions: &[Attribution]) -> PipelineResult<PackedBundle> {
        let written = self.write_engine.write(attributions)?;
        let destination = self
            .write_engine
            .config
            .pack_destination
            .resolve(&self.write_engine.config.package_dir);
        let tarball_path = self.pack_tool.pack(
            &written.bundle_dir,
            &destination,
            &self.write_engine.root.name,
            &self.write_engine.root.version,
        )?;
        Ok(PackedBundle { written, tarball_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tarball_name_strips_scope_and_joins_with_hyphen() {
        assert_eq!(tarball_file_name("consumer", "1.0.0"), "consumer-1.0.0.tgz");
        assert_eq!(tarball_file_name("@scope/consumer", "1.0.0"), "scope-consumer-1.0.0.tgz");
    }

    #[test]
    fn pack_destination_defaults_to_package_directory() {
        use crate::config::PackDestination;
        let package_dir = PathBuf::from("/pkgs/consumer");
        assert_eq!(PackDestination::Default.resolve(&package_dir), package_dir);
        assert_eq!(
            PackDestination::Custom(PathBuf::from("/out")).resolve(&package_dir),
            PathBuf::from("/out")
        );
    }

    #[test]
    fn pack_invokes_npm_pack_with_the_resolved_destination() {
        use crate::shell::fake::FakeShellInvoker;
        use tempfile::TempDir;

        let bundle_dir = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        let invoker = FakeShellInvoker::default();
        let pack_tool = ShellPackTool::new(&invoker, "npm");

        let tarball = pack_tool
            .pack(bundle_dir.path(), destination.path(), "consumer", "1.0.0")
            .unwrap();

        assert_eq!(tarball, destination.path().join("consumer-1.0.0.tgz"));
        let calls = invoker.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (program, args) = &calls[0];
        assert_eq!(program, "npm");
        assert_eq!(args[0], "pack");
        assert_eq!(args[1], "--pack-destination");
        assert_eq!(args[2], destination.path().display().to_string());
    }
}
