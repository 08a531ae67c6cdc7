use std::collections::{BTreeMap, HashSet};

use anyhow::{bail, Context, Result};
use bundle_core::closure::ExternalsConfig;
use bundle_core::config::{BundleConfig, PackDestination};
use bundle_core::manifest::ProjectManifest;
use regex::Regex;

use crate::cli::Args;
use crate::file_config::FileConfig;

/// Translates parsed CLI arguments into the core pipeline's immutable [`BundleConfig`],
/// merging in an optional `bundle.toml` per §6: an explicit CLI flag always wins, a
/// `bundle.toml` value fills in anything the CLI left at its default, and `entryPoints`
/// falls back further still to the manifest's declared entry point.
pub fn build_config(args: &Args) -> Result<BundleConfig> {
    let package_dir = args
        .package_dir
        .canonicalize()
        .with_context(|| format!("resolving package directory {}", args.package_dir.display()))?;

    let file_config = FileConfig::load(&package_dir)?;

    let entry_points = if !args.entry_points.is_empty() {
        args.entry_points.clone()
    } else if let Some(entry_points) = file_config.entry_points {
        entry_points
    } else {
        let manifest_path = package_dir.join("package.json");
        let manifest = ProjectManifest::read(&manifest_path)
            .with_context(|| format!("reading manifest at {}", manifest_path.display()))?;
        vec![manifest.default_entry_point()]
    };

    let raw_externals = if !args.externals.is_empty() {
        &args.externals
    } else {
        file_config.externals.as_ref().unwrap_or(&args.externals)
    };
    let externals = parse_externals(raw_externals)?;

    let raw_resources = if !args.resources.is_empty() {
        &args.resources
    } else {
        file_config.resources.as_ref().unwrap_or(&args.resources)
    };
    let resources = parse_resources(raw_resources)?;

    let raw_allowed_licenses = if !args.allowed_licenses.is_empty() {
        &args.allowed_licenses
    } else {
        file_config.allowed_licenses.as_ref().unwrap_or(&args.allowed_licenses)
    };
    let allowed_licenses: HashSet<String> = raw_allowed_licenses.iter().map(|s| s.to_lowercase()).collect();

    let dont_attribute = args
        .dont_attribute
        .clone()
        .or(file_config.dont_attribute)
        .map(|pattern| Regex::new(&pattern))
        .transpose()
        .context("parsing --dont-attribute regex")?;

    let test_command = args.test_command.clone().or(file_config.test_command);
    let minify_whitespace = args.minify_whitespace || file_config.minify_whitespace.unwrap_or(false);
    let metafile = args.metafile.clone().or(file_config.metafile);
    let sourcemap = args.sourcemap || file_config.sourcemap.unwrap_or(false);
    let attribute_versions_separately =
        args.attribute_versions_separately || file_config.attribute_versions_separately.unwrap_or(false);
    let versions_file_flag = args.versions_file.clone().or(file_config.versions_file);

    let versions_file = match (&versions_file_flag, attribute_versions_separately) {
        (Some(path), _) => Some(package_dir.join(path)),
        (None, true) => Some(package_dir.join("THIRD_PARTY_VERSIONS")),
        (None, false) => None,
    };

    let licenses_path_flag = args
        .licenses_path
        .clone()
        .or(file_config.licenses_path)
        .unwrap_or_else(default_licenses_path);
    let licenses_path = package_dir.join(&licenses_path_flag);

    Ok(BundleConfig {
        package_dir,
        entry_points,
        externals,
        allowed_licenses,
        resources,
        dont_attribute,
        test_command,
        minify_whitespace,
        metafile,
        sourcemap,
        versions_file,
        write_versions_sidecar_unconditionally: false,
        licenses_path,
        pack_destination: PackDestination::Default,
    })
}

fn default_licenses_path() -> std::path::PathBuf {
    std::path::PathBuf::from("THIRD_PARTY_LICENSES")
}

fn parse_externals(raw: &[String]) -> Result<ExternalsConfig> {
    let mut externals = ExternalsConfig::default();
    for entry in raw {
        let Some((name, kind)) = entry.split_once(':') else {
            bail!("invalid --external `{entry}`, expected NAME:runtime or NAME:optional");
        };
        match kind {
            "runtime" => {
                externals.runtime.insert(name.to_string());
            }
            "optional" => {
                externals.optional.insert(name.to_string());
            }
            other => bail!("invalid --external kind `{other}` for `{name}`, expected runtime or optional"),
        }
    }
    Ok(externals)
}

fn parse_resources(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut resources = BTreeMap::new();
    for entry in raw {
        let Some((name, relpath)) = entry.split_once(':') else {
            bail!("invalid --resource `{entry}`, expected NAME:RELPATH");
        };
        resources.insert(name.to_string(), relpath.to_string());
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_kind_must_be_runtime_or_optional() {
        let err = parse_externals(&["dep1:weird".to_string()]).unwrap_err();
        assert!(err.to_string().contains("invalid --external kind"));
    }

    #[test]
    fn externals_split_into_runtime_and_optional_sets() {
        let externals = parse_externals(&["dep1:runtime".to_string(), "dep2:optional".to_string()]).unwrap();
        assert!(externals.runtime.contains("dep1"));
        assert!(externals.optional.contains("dep2"));
    }

    #[test]
    fn resources_parse_name_and_relative_path() {
        let resources = parse_resources(&["logo:assets/logo.png".to_string()]).unwrap();
        assert_eq!(resources.get("logo"), Some(&"assets/logo.png".to_string()));
    }
}
