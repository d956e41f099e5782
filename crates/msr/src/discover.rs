use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Source files the rewrite looks at.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "ts", "mts", "jsx", "tsx"];

/// Every source file under `root`, in a stable order, skipping anything
/// inside a `node_modules` directory.
pub fn discover_source_files(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_node_modules(entry))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_source = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if is_source {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_node_modules(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == "node_modules"
}
