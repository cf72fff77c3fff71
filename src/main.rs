use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};

use modshake::logging::init_tracing;
use modshake::modules::{MethodIndex, TrackedLibrary};
use modshake::report::{write_methods, write_run, FileReport, FileStatus, ReportFormat};
use modshake::transform::{
    collect_source_files, TransformError, TransformOutput, TransformResult, Transformer,
};

#[derive(Parser)]
#[command(name = "modshake")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Rewrites whole-library ramda imports into direct submodule imports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite tracked-library imports in files or directories
    Transform {
        /// Files or directories to process
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Directory node_modules lookup starts from (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Library to track; repeat for several (defaults to ramda and ramda-extension)
        #[arg(short, long = "library")]
        libraries: Vec<String>,

        /// Write rewritten files in place
        #[arg(short, long, conflicts_with = "check")]
        write: bool,

        /// Exit with status 1 if any file would change
        #[arg(long)]
        check: bool,

        /// Report format: text or json
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,
    },
    /// List the functions a tracked library exports
    Methods {
        /// Library to list
        #[arg(short, long, default_value = "ramda")]
        library: String,

        /// Directory node_modules lookup starts from (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,
    },
    /// Show version information
    Version,
}

/// Some files failed to transform.
const EXIT_FAILED: u8 = 2;
/// `--check` found files that would change.
const EXIT_WOULD_CHANGE: u8 = 1;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Transform {
            paths,
            root,
            libraries,
            write,
            check,
            format,
        }) => run_transform(&paths, root, &libraries, write, check, format),
        Some(Commands::Methods {
            library,
            root,
            format,
        }) => run_methods(&library, root, format),
        Some(Commands::Version) => {
            println!("modshake v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("modshake - direct submodule imports for ramda");
            println!("Run 'modshake transform <paths>' to rewrite files");
            println!("Run 'modshake --help' for more information");
            Ok(ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|e| {
        eprintln!("error: {:#}", e);
        ExitCode::from(EXIT_FAILED)
    })
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("failed to determine current directory"),
    }
}

fn tracked_libraries(names: &[String]) -> Vec<TrackedLibrary> {
    if names.is_empty() {
        TrackedLibrary::defaults()
    } else {
        names.iter().map(TrackedLibrary::new).collect()
    }
}

fn run_transform(
    paths: &[PathBuf],
    root: Option<PathBuf>,
    libraries: &[String],
    write: bool,
    check: bool,
    format: ReportFormat,
) -> Result<ExitCode> {
    let root = resolve_root(root)?;
    let libraries = tracked_libraries(libraries);
    let index = MethodIndex::build(&root, &libraries)
        .with_context(|| format!("failed to build method index from {}", root.display()))?;
    // Fail early if the grammars cannot be loaded.
    Transformer::new(&index).context("failed to initialize parsers")?;

    let files = collect_source_files(paths);
    info!(files = files.len(), "transforming");

    let results: Vec<_> = files
        .par_iter()
        .map_init(
            || Transformer::new(&index),
            |transformer, path| {
                let result = match transformer.as_mut() {
                    Ok(transformer) => transformer.transform_file(path),
                    Err(_) => Err(TransformError::LanguageInit),
                };
                (path, result)
            },
        )
        .collect();

    let reports: Vec<FileReport> = results
        .into_iter()
        .map(|(path, result)| settle_file(path, result, write))
        .collect();

    write_run(format, &reports, &mut io::stdout().lock()).context("failed to write report")?;

    let failed = reports.iter().any(|r| r.status == FileStatus::Failed);
    let would_change = reports.iter().any(|r| r.status == FileStatus::Rewritten);
    Ok(if failed {
        ExitCode::from(EXIT_FAILED)
    } else if check && would_change {
        ExitCode::from(EXIT_WOULD_CHANGE)
    } else {
        ExitCode::SUCCESS
    })
}

/// Report one file's outcome, writing the rewritten code back if asked.
/// A failed write is recorded against that file and the run continues.
fn settle_file(path: &Path, result: TransformResult<TransformOutput>, write: bool) -> FileReport {
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "file left untouched");
            return FileReport::failed(path, &e);
        }
    };

    if write && output.changed {
        if let Err(e) = fs::write(path, &output.code) {
            warn!(path = %path.display(), error = %e, "failed to write file");
            return FileReport::failed(path, format!("failed to write file: {}", e));
        }
    }
    FileReport::from_output(path, &output)
}

fn run_methods(library: &str, root: Option<PathBuf>, format: ReportFormat) -> Result<ExitCode> {
    let root = resolve_root(root)?;
    let library = TrackedLibrary::new(library);
    let index = MethodIndex::build(&root, std::slice::from_ref(&library))
        .with_context(|| format!("failed to index {}", library))?;

    write_methods(
        format,
        &library,
        &index.symbols(&library),
        &mut io::stdout().lock(),
    )
    .context("failed to write method list")?;
    Ok(ExitCode::SUCCESS)
}
