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

mod cli;
mod config;
mod file_config;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use bundle_core::attributions::{Attribution, AttributionsConfig, AttributionsEngine};
use bundle_core::bundler::ShellBundler;
use bundle_core::circularity::ShellCircularityAnalyzer;
use bundle_core::closure::{Classification, DependencyClassifier};
use bundle_core::config::BundleConfig;
use bundle_core::license_probe::ShellLicenseProbe;
use bundle_core::orchestrator::ValidationOrchestrator;
use bundle_core::pack::{Packer, ShellPackTool};
use bundle_core::package::{Package, PackageResolver};
use bundle_core::shell::{ProcessShellInvoker, ShellInvoker};
use bundle_core::write::WriteEngine;

use cli::{Args, Command};

/// External tool contracts assumed by §6: a license-metadata probe, an import-cycle
/// analyzer, a tree-shaking bundler, and an npm-compatible packer. Substitutable via these
/// program names; no further configuration surface is exposed for them today.
const LICENSE_PROBE_PROGRAM: &str = "license-checker";
const CIRCULARITY_PROGRAM: &str = "madge";
const BUNDLER_PROGRAM: &str = "esbuild";
const PACK_PROGRAM: &str = "npm";

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = setup_logging(&args) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(args: &Args) -> Result<()> {
    let mut builder = Builder::new();
    let level_filter = if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    builder.filter_level(level_filter);
    builder.parse_default_env();
    builder.try_init().context("initializing logger")?;
    Ok(())
}

/// Returns `Ok(true)` on success, `Ok(false)` on a policy-level failure (non-zero exit
/// without an error banner), `Err` on a hard pipeline failure.
fn run(args: &Args) -> Result<bool> {
    let config = config::build_config(args)?;

    log::debug!("resolving dependency closure rooted at {}", config.package_dir.display());
    let root = PackageResolver::resolve(&config.package_dir).context("resolving dependency closure")?;
    let classification =
        DependencyClassifier::classify(&root, &config.externals).context("classifying dependencies")?;

    let invoker = ProcessShellInvoker;
    let probe = ShellLicenseProbe::new(&invoker, LICENSE_PROBE_PROGRAM);
    let circularity = ShellCircularityAnalyzer::new(&invoker, CIRCULARITY_PROGRAM);
    let bundler = ShellBundler::new(&invoker, BUNDLER_PROGRAM);
    let pack_tool = ShellPackTool::new(&invoker, PACK_PROGRAM);

    match &args.command {
        Command::Validate { fix } => run_validate(&config, &root, &classification, &circularity, &probe, *fix),
        Command::Write => {
            run_write(&config, &root, &classification, &probe, &bundler, &invoker)?;
            Ok(true)
        }
        Command::Pack { destination } => {
            let mut config = config;
            if let Some(destination) = destination {
                config.pack_destination = bundle_core::config::PackDestination::Custom(destination.clone());
            }
            run_pack(&config, &root, &classification, &probe, &bundler, &pack_tool, &invoker)?;
            Ok(true)
        }
    }
}

fn run_validate(
    config: &BundleConfig,
    root: &Package,
    classification: &Classification,
    circularity: &ShellCircularityAnalyzer<'_>,
    probe: &ShellLicenseProbe<'_>,
    fix: bool,
) -> Result<bool> {
    let orchestrator = ValidationOrchestrator::new(config, root, classification, circularity, probe);
    let (report, _attributions) = orchestrator.validate(fix).context("running validation")?;

    if report.success {
        log::info!("validation passed");
    } else {
        println!("{}", report.summary);
    }

    Ok(report.success)
}

fn collect_attributions(
    config: &BundleConfig,
    classification: &Classification,
    root: &Package,
    probe: &ShellLicenseProbe<'_>,
) -> Result<Vec<Attribution>> {
    let attributions_config = AttributionsConfig {
        package_dir: config.package_dir.clone(),
        package_name: root.name.clone(),
        dependencies: classification.bundled.clone(),
        dependencies_root: config.package_dir.join("node_modules"),
        licenses_path: config.licenses_path.clone(),
        allowed_licenses: config.allowed_licenses.clone(),
        exclude: config.dont_attribute.clone(),
        versions_path: config.versions_file.clone(),
        write_versions_sidecar_unconditionally: config.write_versions_sidecar_unconditionally,
    };
    let engine = AttributionsEngine::new(attributions_config, probe);
    engine.collect().context("collecting attributions")
}

fn run_write(
    config: &BundleConfig,
    root: &Package,
    classification: &Classification,
    probe: &ShellLicenseProbe<'_>,
    bundler: &ShellBundler<'_>,
    invoker: &dyn ShellInvoker,
) -> Result<()> {
    let attributions = collect_attributions(config, classification, root, probe)?;
    let write_engine = WriteEngine {
        config,
        root,
        classification,
        bundler,
    };
    let written = write_engine.write(&attributions).context("writing bundle")?;
    maybe_smoke_test(config, &written.bundle_dir, invoker)?;
    println!("{}", written.bundle_dir.display());
    Ok(())
}

fn run_pack(
    config: &BundleConfig,
    root: &Package,
    classification: &Classification,
    probe: &ShellLicenseProbe<'_>,
    bundler: &ShellBundler<'_>,
    pack_tool: &ShellPackTool<'_>,
    invoker: &dyn ShellInvoker,
) -> Result<()> {
    let attributions = collect_attributions(config, classification, root, probe)?;
    let write_engine = WriteEngine {
        config,
        root,
        classification,
        bundler,
    };
    let packer = Packer { write_engine, pack_tool };
    let packed = packer.pack(&attributions).context("packing bundle")?;
    maybe_smoke_test(config, &packed.written.bundle_dir, invoker)?;
    println!("{}", packed.tarball_path.display());
    Ok(())
}

fn maybe_smoke_test(config: &BundleConfig, bundle_dir: &Path, invoker: &dyn ShellInvoker) -> Result<()> {
    let Some(test_command) = &config.test_command else {
        return Ok(());
    };
    let mut parts = test_command.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(());
    };
    let args: Vec<&str> = parts.collect();
    invoker
        .run(bundle_dir, program, &args)
        .with_context(|| format!("running smoke test `{test_command}`"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_a_package_dir_default_of_current_directory() {
        let args = Args::parse_from(["bundle", "validate"]);
        assert_eq!(args.package_dir, std::path::PathBuf::from("."));
        assert!(matches!(args.command, Command::Validate { fix: false }));
    }

    #[test]
    fn validate_fix_flag_parses() {
        let args = Args::parse_from(["bundle", "validate", "--fix"]);
        assert!(matches!(args.command, Command::Validate { fix: true }));
    }

    #[test]
    fn pack_destination_is_optional() {
        let args = Args::parse_from(["bundle", "pack", "--destination", "/tmp/out"]);
        match args.command {
            Command::Pack { destination } => assert_eq!(destination, Some(std::path::PathBuf::from("/tmp/out"))),
            _ => panic!("expected Pack"),
        }
    }

    #[test]
    fn unknown_command_is_a_parse_error_not_a_process_exit() {
        let result = Args::try_parse_from(["bundle", "not-a-command"]);
        assert!(result.is_err());
    }
}
