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

use std::path::Path;
use std::process::Command;

use crate::errors::{PipelineError, PipelineResult};

/// Synchronous external-process invoker returning captured stdout; propagates a non-zero
/// exit status as a [`PipelineError::ToolFailure`].
///
/// Abstracted behind a trait so tests can substitute a deterministic fake instead of
/// shelling out to a real probe/bundler/packer binary.
pub trait ShellInvoker {
    fn run(&self, cwd: &Path, program: &str, args: &[&str]) -> PipelineResult<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessShellInvoker;

impl ShellInvoker for ProcessShellInvoker {
    fn run(&self, cwd: &Path, program: &str, args: &[&str]) -> PipelineResult<Vec<u8>> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|source| PipelineError::Io {
                action: format!("invoking {program}"),
                source,
            })?;

        if !output.status.success() {
            return Err(PipelineError::ToolFailure {
                tool: program.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;

    /// Deterministic fake recording every invocation and returning queued responses in order.
    #[derive(Default)]
    pub struct FakeShellInvoker {
        pub responses: RefCell<Vec<PipelineResult<Vec<u8>>>>,
        pub calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl ShellInvoker for FakeShellInvoker {
        fn run(&self, _cwd: &Path, program: &str, args: &[&str]) -> PipelineResult<Vec<u8>> {
            self.calls.borrow_mut().push((
                program.to_string(),
                args.iter().map(|s| s.to_string()).collect(),
            ));
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }
}
