use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Dry-run output, written to the working directory.
pub const LOG_FILE_NAME: &str = "module-specifier-resolver.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub path: PathBuf,
    pub text: String,
}

/// Overwrites each file in place. Returns the files that could not be
/// written; the others are written regardless.
pub fn write_files(files: &[Transformed]) -> Vec<(PathBuf, io::Error)> {
    let mut failures = Vec::new();
    for file in files {
        match fs::write(&file.path, &file.text) {
            Ok(()) => debug!(path = %file.path.display(), "wrote file"),
            Err(error) => failures.push((file.path.clone(), error)),
        }
    }
    failures
}

/// Replaces the log at `log_path` with one record per transformed file.
pub fn write_log(log_path: &Path, files: &[Transformed]) -> io::Result<()> {
    match fs::remove_file(log_path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }

    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    for file in files {
        write!(log, "file: {}\n{}\n\n", file.path.display(), file.text)?;
    }
    log.flush()
}
