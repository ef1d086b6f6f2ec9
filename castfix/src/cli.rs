use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.castfix.toml):
  Create this file in your project root to set defaults.

  [castfix]
  extensions = [\"cpp\", \"h\"]      # Source extensions to rewrite
  verify = true                    # Re-parse rewritten files
  skip_macro_arguments = true      # Leave casts inside macro calls alone

  # Path filters
  exclude_folders = [\"build\", \"third_party\"]
  include_folders = [\"src\"]        # Force-include these
";

/// Shared path arguments (mutually exclusive paths/root).
#[derive(Args, Debug, Default, Clone)]
pub struct PathArgs {
    /// Paths to rewrite (files or directories).
    /// When no paths are provided, defaults to the current directory.
    /// Cannot be used with --root.
    #[arg(conflicts_with = "root")]
    pub paths: Vec<PathBuf>,

    /// Project root used as both the rewrite target and the containment
    /// boundary for files written with --apply.
    /// Cannot be used together with positional path arguments.
    #[arg(long, conflicts_with = "paths")]
    pub root: Option<PathBuf>,
}

/// Options selecting what happens with the rewritten sources.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are legitimately booleans
pub struct ModeOptions {
    /// Write rewritten files in place.
    #[arg(long, conflicts_with_all = ["stdout", "json"])]
    pub apply: bool,

    /// Print every rewritten translation unit to stdout.
    #[arg(long)]
    pub stdout: bool,

    /// Output a JSON report of planned rewrites.
    #[arg(long, conflicts_with = "stdout")]
    pub json: bool,

    /// Exit with code 1 if any cast would be rewritten.
    #[arg(long)]
    pub check: bool,
}

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "castfix",
    author,
    version,
    about = "castfix - Rewrite C-style casts in C++ sources as const_cast/static_cast",
    after_help = CONFIG_HELP,
)]
pub struct Cli {
    /// Path options (paths vs root).
    #[command(flatten)]
    pub paths: PathArgs,

    /// Output mode.
    #[command(flatten)]
    pub mode: ModeOptions,

    /// Enable verbose output (shows files and type information).
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip re-parsing rewritten files.
    #[arg(long)]
    pub no_verify: bool,

    /// Rewrite casts inside arguments of function-like macros too.
    #[arg(long)]
    pub rewrite_macro_arguments: bool,

    /// Folders to exclude from the walk.
    #[arg(long, alias = "exclude-folder")]
    pub exclude_folders: Vec<String>,

    /// Folders to include even if excluded by default.
    #[arg(long, alias = "include-folder")]
    pub include_folders: Vec<String>,

    /// File extensions to rewrite (replaces the configured list).
    #[arg(long, value_delimiter = ',')]
    pub extensions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["castfix"]).unwrap();
        assert!(cli.paths.paths.is_empty());
        assert!(!cli.mode.apply);
        assert!(!cli.no_verify);
    }

    #[test]
    fn test_extensions_are_comma_separated() {
        let cli = Cli::try_parse_from(["castfix", "--extensions", "cpp,ipp", "src"]).unwrap();
        assert_eq!(cli.extensions, vec!["cpp", "ipp"]);
        assert_eq!(cli.paths.paths, vec![PathBuf::from("src")]);
    }

    #[test]
    fn test_apply_conflicts_with_stdout() {
        assert!(Cli::try_parse_from(["castfix", "--apply", "--stdout"]).is_err());
    }

    #[test]
    fn test_apply_conflicts_with_json() {
        assert!(Cli::try_parse_from(["castfix", "--apply", "--json"]).is_err());
    }

    #[test]
    fn test_root_conflicts_with_paths() {
        assert!(Cli::try_parse_from(["castfix", "--root", "a", "b"]).is_err());
    }
}
