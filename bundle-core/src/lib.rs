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

#![deny(clippy::all)]
#![deny(warnings)]

//! Static analysis, policy validation, and packing for publishable bundles.
//!
//! Given a package root and its installed `node_modules` dependency tree, this crate
//! resolves the transitive closure, classifies dependencies as bundled or external,
//! computes a deterministic third-party attributions document, validates a set of policy
//! invariants (license allow-lists, import acyclicity, resource presence, attribution
//! freshness), and materializes a publishable bundle directory plus tarball.
//!
//! ```rust,no_run
//! use bundle_core::package::PackageResolver;
//! use std::path::Path;
//!
//! let root = PackageResolver::resolve(Path::new("."))?;
//! println!("resolved {} direct dependencies", root.dependencies.len());
//! # Ok::<(), bundle_core::errors::PipelineError>(())
//! ```

pub mod attributions;
pub mod bundler;
pub mod circularity;
pub mod closure;
pub mod config;
pub mod errors;
pub mod license_probe;
pub mod manifest;
pub mod orchestrator;
pub mod pack;
pub mod package;
pub mod resources;
pub mod shell;
pub mod violation;
pub mod write;
