use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use diagnostics::Reporter;
use rayon::prelude::*;
use resolver::{FsResolver, ResolutionConfig};
use rewrite::{FileEngine, FileOutcome, PathStyle, RewriteError};
use tracing::{info, warn};

use crate::discover::discover_source_files;
use crate::sink::{self, Transformed, LOG_FILE_NAME};

/// Everything a run needs, collected from the command line once.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub base_path: PathBuf,
    /// `None` falls back to `./tsconfig.json` when that file exists.
    pub config_path: Option<PathBuf>,
    pub dry_run: bool,
    pub repl: bool,
    /// Worker threads; `None` lets rayon decide.
    pub jobs: Option<usize>,
    pub extensions: Option<Vec<String>>,
    pub path_style: PathStyle,
    pub log_path: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            config_path: None,
            dry_run: false,
            repl: false,
            jobs: None,
            extensions: None,
            path_style: PathStyle::default(),
            log_path: PathBuf::from(LOG_FILE_NAME),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Files with at least one rewritten specifier.
    pub transformed: usize,
    pub written: usize,
    pub failed: usize,
}

enum FileResult {
    Unchanged,
    Rewritten(Transformed),
    Rejected {
        path: PathBuf,
        source: String,
        error: RewriteError,
    },
    Unreadable {
        path: PathBuf,
        error: io::Error,
    },
}

pub fn run(options: &RunOptions, input: &mut dyn BufRead) -> Result<RunSummary> {
    let base_path = fs::canonicalize(&options.base_path)
        .with_context(|| format!("base path {} does not exist", options.base_path.display()))?;
    let config = load_config(options, &base_path)?;

    let files = discover_source_files(&config.root)
        .with_context(|| format!("failed to walk {}", config.root.display()))?;
    info!(files = files.len(), "discovered source files");

    let resolver = FsResolver::new(&config);
    let engine = FileEngine::new(&config, &resolver, options.path_style);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.unwrap_or(0))
        .build()
        .context("failed to start worker threads")?;
    let results: Vec<FileResult> =
        pool.install(|| files.par_iter().map(|path| transform_file(&engine, path)).collect());

    let mut summary = RunSummary::default();
    let mut reporter = Reporter::new();
    let mut transformed = Vec::new();
    for result in results {
        match result {
            FileResult::Unchanged => {}
            FileResult::Rewritten(file) => transformed.push(file),
            FileResult::Rejected {
                path,
                source,
                error,
            } => {
                summary.failed += 1;
                let file_id = reporter.add_file(path.display().to_string(), source);
                reporter.report(error.to_diagnostic(file_id));
            }
            FileResult::Unreadable { path, error } => {
                summary.failed += 1;
                eprintln!("Error: failed to read {}: {}", path.display(), error);
            }
        }
    }
    reporter.print_all();

    summary.transformed = transformed.len();
    if transformed.is_empty() {
        println!("There're no transform target files.");
        return Ok(summary);
    }
    println!("transform target {} files found.", transformed.len());

    if options.dry_run {
        sink::write_log(&options.log_path, &transformed)
            .with_context(|| format!("failed to write {}", options.log_path.display()))?;
        println!(
            "Dry run: {} files, finished.\n{}",
            transformed.len(),
            options.log_path.display()
        );
        return Ok(summary);
    }

    if options.repl && !confirm(input)? {
        return Ok(summary);
    }

    let failures = sink::write_files(&transformed);
    for (path, error) in &failures {
        eprintln!("Error: failed to write {}: {}", path.display(), error);
    }
    summary.written = transformed.len() - failures.len();
    summary.failed += failures.len();
    println!("update {} files, finished.", summary.written);
    Ok(summary)
}

fn load_config(options: &RunOptions, base_path: &Path) -> Result<ResolutionConfig> {
    let config = match &options.config_path {
        Some(path) => {
            let path = fs::canonicalize(path)
                .with_context(|| format!("config file {} does not exist", path.display()))?;
            ResolutionConfig::load(&path, base_path)?
        }
        None => match fs::canonicalize("tsconfig.json") {
            Ok(path) => ResolutionConfig::load(&path, base_path)?,
            Err(_) => {
                warn!("no tsconfig.json found, resolving relative specifiers only");
                ResolutionConfig::new(base_path)
            }
        },
    };

    Ok(match &options.extensions {
        Some(extensions) => config.with_extensions(extensions.clone()),
        None => config,
    })
}

fn transform_file<R: resolver::Resolve + ?Sized>(engine: &FileEngine<'_, R>, path: &Path) -> FileResult {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            return FileResult::Unreadable {
                path: path.to_path_buf(),
                error,
            }
        }
    };

    match engine.transform(path, &source) {
        Ok(FileOutcome::Unchanged) => FileResult::Unchanged,
        Ok(FileOutcome::Rewritten(text)) => FileResult::Rewritten(Transformed {
            path: path.to_path_buf(),
            text,
        }),
        Err(error) => FileResult::Rejected {
            path: path.to_path_buf(),
            source,
            error,
        },
    }
}

/// Asks before touching any file; only `y` proceeds.
fn confirm(input: &mut dyn BufRead) -> Result<bool> {
    println!("Are you sure complement the extension of module specifier to files? (y/n)");
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read the confirmation")?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        for (relative, content) in files {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn options(dir: &TempDir) -> RunOptions {
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{ "compilerOptions": { "newLine": "lf" } }"#,
        )
        .unwrap();
        RunOptions {
            base_path: dir.path().to_path_buf(),
            config_path: Some(dir.path().join("tsconfig.json")),
            jobs: Some(2),
            log_path: dir.path().join(LOG_FILE_NAME),
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_rewrites_files_in_place() {
        let dir = project(&[
            ("src/main.ts", "import { a } from './a';\n"),
            ("src/a.ts", "export const a = 1;\n"),
        ]);
        let summary = run(&options(&dir), &mut "".as_bytes()).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                transformed: 1,
                written: 1,
                failed: 0
            }
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.ts")).unwrap(),
            "import { a } from \"./a.ts\";\n"
        );
    }

    #[test]
    fn test_dry_run_only_writes_the_log() {
        let source = "import { a } from './a';\n";
        let dir = project(&[("src/main.ts", source), ("src/a.ts", "export const a = 1;\n")]);
        let options = RunOptions {
            dry_run: true,
            ..options(&dir)
        };

        run(&options, &mut "".as_bytes()).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("src/main.ts")).unwrap(), source);
        let log = fs::read_to_string(&options.log_path).unwrap();
        let main_path = fs::canonicalize(dir.path().join("src/main.ts")).unwrap();
        assert_eq!(
            log,
            format!(
                "file: {}\nimport {{ a }} from \"./a.ts\";\n\n\n",
                main_path.display()
            )
        );
    }

    #[test]
    fn test_repl_declined_leaves_files_alone() {
        let source = "import { a } from './a';\n";
        let dir = project(&[("src/main.ts", source), ("src/a.ts", "export const a = 1;\n")]);
        let options = RunOptions {
            repl: true,
            ..options(&dir)
        };

        let summary = run(&options, &mut "n\n".as_bytes()).unwrap();
        assert_eq!(summary.written, 0);
        assert_eq!(fs::read_to_string(dir.path().join("src/main.ts")).unwrap(), source);

        let summary = run(&options, &mut "Y\n".as_bytes()).unwrap();
        assert_eq!(summary.written, 1);
    }

    #[test]
    fn test_failed_file_does_not_block_others() {
        let broken = "import { gone } from './gone';\n";
        let dir = project(&[
            ("src/broken.ts", broken),
            ("src/main.ts", "import { a } from './a';\n"),
            ("src/a.ts", "export const a = 1;\n"),
        ]);

        let summary = run(&options(&dir), &mut "".as_bytes()).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 1);
        assert_eq!(fs::read_to_string(dir.path().join("src/broken.ts")).unwrap(), broken);
    }

    #[test]
    fn test_nothing_to_do() {
        let dir = project(&[("src/main.ts", "import React from 'react';\n")]);
        let summary = run(&options(&dir), &mut "".as_bytes()).unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_custom_extension_priority() {
        let dir = project(&[
            ("src/main.ts", "import './view';\n"),
            ("src/view.ts", ""),
            ("src/view.tsx", ""),
        ]);
        let options = RunOptions {
            extensions: Some(vec!["tsx".to_string(), "ts".to_string()]),
            ..options(&dir)
        };

        run(&options, &mut "".as_bytes()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.ts")).unwrap(),
            "import \"./view.tsx\";\n"
        );
    }

    #[test]
    fn test_walks_the_config_root() {
        let dir = project(&[
            ("app/main.ts", "import './a';\n"),
            ("app/a.ts", ""),
            ("other/main.ts", "import './b';\n"),
            ("other/b.ts", ""),
        ]);
        let options = RunOptions {
            base_path: dir.path().join("app"),
            ..options(&dir)
        };

        let summary = run(&options, &mut "".as_bytes()).unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("other/main.ts")).unwrap(),
            "import './b';\n"
        );
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = project(&[("src/main.ts", "")]);
        let options = RunOptions {
            config_path: Some(dir.path().join("nope.json")),
            ..options(&dir)
        };
        assert!(run(&options, &mut "".as_bytes()).is_err());
    }
}
