use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(bin_name = "bundle", version, about = "Validate, write, and pack a publishable bundle")]
pub struct Args {
    /// Root of the package to bundle
    #[clap(long = "package-dir", value_name = "PATH", default_value = ".")]
    pub package_dir: PathBuf,

    /// Relative entry point; repeatable. Defaults to the manifest's declared entry point.
    #[clap(long = "entrypoint", value_name = "PATH")]
    pub entry_points: Vec<PathBuf>,

    /// A dependency name to externalize, in `name:runtime` or `name:optional` form; repeatable
    #[clap(long = "external", value_name = "NAME:KIND")]
    pub externals: Vec<String>,

    /// An SPDX identifier allowed in bundled dependencies; repeatable, case-insensitive
    #[clap(long = "allowed-license", value_name = "SPDX")]
    pub allowed_licenses: Vec<String>,

    /// A logical-name:relative-path resource that must exist under the package directory; repeatable
    #[clap(long = "resource", value_name = "NAME:RELPATH")]
    pub resources: Vec<String>,

    /// Regex of dependency names to exclude from attributions
    #[clap(long = "dont-attribute", value_name = "REGEX")]
    pub dont_attribute: Option<String>,

    /// Shell command to run in the written bundle for smoke-validation
    #[clap(long = "test", value_name = "COMMAND")]
    pub test_command: Option<String>,

    /// Passed through to the bundler
    #[clap(long = "minify-whitespace")]
    pub minify_whitespace: bool,

    /// Path the bundler should write its build metafile to
    #[clap(long = "metafile", value_name = "PATH")]
    pub metafile: Option<PathBuf>,

    /// Passed through to the bundler
    #[clap(long = "sourcemap")]
    pub sourcemap: bool,

    /// Path of a separate versions-index file; implies `--attribute-versions-separately`
    #[clap(long = "versions-file", value_name = "PATH")]
    pub versions_file: Option<PathBuf>,

    /// Emit the versions index as a separate file and omit versions from attribution titles
    #[clap(long = "attribute-versions-separately")]
    pub attribute_versions_separately: bool,

    /// Where the canonical attributions document is read from / written to
    #[clap(long = "licenses-path", value_name = "PATH")]
    pub licenses_path: Option<PathBuf>,

    /// Use verbose output (-vv for very verbose)
    #[clap(long = "verbose", short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// No output printed to stdout
    #[clap(long = "quiet", short = 'q')]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate policy invariants, optionally fixing stale attribution artifacts
    Validate {
        #[clap(long = "fix", short = 'f')]
        fix: bool,
    },
    /// Materialize the bundle directory without packing it
    Write,
    /// Write the bundle directory and pack it into a tarball
    Pack {
        /// Directory to place the produced tarball in; defaults to the package directory
        #[clap(long = "destination", value_name = "DIR")]
        destination: Option<PathBuf>,
    },
}
