use crate::cli::Cli;
use crate::commands::{run_rewrite, RewriteCommandOptions, RewriteMode};
use crate::config::Config;
use crate::constants::DEFAULT_EXTENSIONS;
use crate::engine::RewriteOptions;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Runs castfix with the given arguments.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run castfix with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
/// Returns the process exit code: 1 when a file failed, when arguments are
/// invalid, or when `--check` finds pending rewrites.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["castfix".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    let targets: Vec<PathBuf> = if let Some(root) = &cli_var.paths.root {
        vec![root.clone()]
    } else if cli_var.paths.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli_var.paths.paths.clone()
    };

    for target in &targets {
        if !target.exists() {
            eprintln!(
                "Error: The file or directory '{}' does not exist.",
                target.display()
            );
            return Ok(1);
        }
    }

    // Load config from the first path or current directory
    let config = Config::load_from_path(&targets[0]);
    let options = build_options(&cli_var, &config)?;

    let interactive = matches!(options.mode, RewriteMode::Preview | RewriteMode::Apply);
    if cli_var.verbose && interactive {
        writeln!(writer, "[VERBOSE] castfix v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(writer, "[VERBOSE] Using {} threads", rayon::current_num_threads())?;
        if let Some(path) = &config.config_file_path {
            writeln!(writer, "[VERBOSE] Config: {}", path.display())?;
        }
        writeln!(writer, "[VERBOSE] Extensions: {:?}", options.extensions)?;
        writeln!(writer, "[VERBOSE] Verify: {}", options.engine.verify)?;
        writeln!(
            writer,
            "[VERBOSE] Skip macro arguments: {}",
            options.engine.skip_macro_arguments
        )?;
        writeln!(writer)?;
    }
    if interactive {
        crate::output::print_exclusion_list(writer, &options.exclude_folders)?;
    }

    let summary = run_rewrite(&targets, &options, &mut *writer)?;

    if !summary.failures.is_empty() {
        return Ok(1);
    }
    if cli_var.mode.check && summary.total_rewrites() > 0 {
        if interactive {
            writeln!(
                writer,
                "[CHECK] {} cast(s) would be rewritten.",
                summary.total_rewrites()
            )?;
        }
        return Ok(1);
    }
    Ok(0)
}

/// Merges CLI flags over the loaded configuration.
fn build_options(cli_var: &Cli, config: &Config) -> Result<RewriteCommandOptions> {
    let mode = if cli_var.mode.apply {
        RewriteMode::Apply
    } else if cli_var.mode.stdout {
        RewriteMode::Stdout
    } else if cli_var.mode.json {
        RewriteMode::Json
    } else {
        RewriteMode::Preview
    };

    let mut exclude_folders = config.castfix.exclude_folders.clone().unwrap_or_default();
    exclude_folders.extend(cli_var.exclude_folders.iter().cloned());

    let mut include_folders = config.castfix.include_folders.clone().unwrap_or_default();
    include_folders.extend(cli_var.include_folders.iter().cloned());

    let extensions = if cli_var.extensions.is_empty() {
        config.castfix.extensions.clone().unwrap_or_else(|| {
            DEFAULT_EXTENSIONS
                .iter()
                .map(|&e| e.to_owned())
                .collect()
        })
    } else {
        cli_var.extensions.clone()
    };

    let engine = RewriteOptions {
        verify: !cli_var.no_verify && config.castfix.verify.unwrap_or(true),
        skip_macro_arguments: !cli_var.rewrite_macro_arguments
            && config.castfix.skip_macro_arguments.unwrap_or(true),
    };

    let root = match &cli_var.paths.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };

    Ok(RewriteCommandOptions {
        mode,
        verbose: cli_var.verbose,
        engine,
        exclude_folders,
        include_folders,
        extensions,
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_is_written_to_writer() {
        let mut out = Vec::new();
        let code = run_with_args_to(vec!["--help".to_owned()], &mut out).unwrap();
        assert_eq!(code, 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CONFIGURATION FILE (.castfix.toml)"));
    }

    #[test]
    fn test_missing_path_fails() {
        let mut out = Vec::new();
        let code =
            run_with_args_to(vec!["/definitely/not/here.cpp".to_owned()], &mut out).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from(["castfix", "--no-verify", "--extensions", "ipp"]).unwrap();
        let mut config = Config::default();
        config.castfix.verify = Some(true);
        config.castfix.extensions = Some(vec!["cpp".to_owned()]);
        config.castfix.skip_macro_arguments = Some(false);

        let options = build_options(&cli, &config).unwrap();
        assert!(!options.engine.verify);
        assert!(!options.engine.skip_macro_arguments);
        assert_eq!(options.extensions, vec!["ipp"]);
        assert_eq!(options.mode, RewriteMode::Preview);
    }
}
