//! Module specifier resolution against the file system.
//!
//! Lookup order for a specifier:
//! - relative and absolute specifiers from the importing file's directory
//! - `paths` aliases, then `baseUrl`
//! - `node_modules`, walking up from the importing file (always external)
//!
//! A candidate path is probed as an exact file, then with its JavaScript
//! extension swapped for the TypeScript one, then with each configured
//! extension appended, then as a directory holding an `index` file.

pub mod config;
mod jsonc;

pub use config::{ConfigError, NewLine, PathAlias, ResolutionConfig, DEFAULT_EXTENSIONS};
pub use jsonc::strip_jsonc;

use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Where a specifier points. `resolved` is absent when nothing on disk
/// matched; `is_external` marks third-party and non-file specifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolutionResult {
    pub resolved: Option<PathBuf>,
    pub is_external: bool,
}

impl ResolutionResult {
    pub fn local(path: PathBuf) -> Self {
        Self {
            resolved: Some(path),
            is_external: false,
        }
    }

    pub fn external(path: Option<PathBuf>) -> Self {
        Self {
            resolved: path,
            is_external: true,
        }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }
}

pub trait Resolve {
    fn resolve(&self, specifier: &str, referrer: &Path) -> ResolutionResult;
}

/// Resolver backed by the real file system.
#[derive(Debug, Clone, Copy)]
pub struct FsResolver<'a> {
    config: &'a ResolutionConfig,
}

impl<'a> FsResolver<'a> {
    pub fn new(config: &'a ResolutionConfig) -> Self {
        Self { config }
    }

    fn resolve_specifier(&self, specifier: &str, referrer: &Path) -> ResolutionResult {
        if is_url_like(specifier) {
            return ResolutionResult::external(None);
        }

        let referrer_dir = referrer.parent().unwrap_or(referrer);

        if is_relative(specifier) || Path::new(specifier).is_absolute() {
            let base = normalize_path(&referrer_dir.join(specifier));
            return match self.probe(&base) {
                Some(path) => classify(path),
                None => ResolutionResult::unresolved(),
            };
        }

        if let Some(candidates) = self.config.match_alias(specifier) {
            if let Some(path) = candidates.iter().find_map(|candidate| self.probe(candidate)) {
                return classify(path);
            }
            return match self.resolve_node_module(specifier, referrer_dir) {
                Some(result) => result,
                None => ResolutionResult::unresolved(),
            };
        }

        if let Some(base_url) = &self.config.base_url {
            if let Some(path) = self.probe(&normalize_path(&base_url.join(specifier))) {
                return classify(path);
            }
        }

        self.resolve_node_module(specifier, referrer_dir)
            .unwrap_or_else(|| ResolutionResult::external(None))
    }

    fn resolve_node_module(&self, specifier: &str, from: &Path) -> Option<ResolutionResult> {
        let (package, subpath) = parse_bare_specifier(specifier);
        for dir in from.ancestors() {
            let package_dir = dir.join("node_modules").join(package);
            if !package_dir.is_dir() {
                continue;
            }
            let resolved = match subpath {
                Some(subpath) => self.probe(&package_dir.join(subpath)),
                None => self.probe_directory(&package_dir),
            };
            return Some(ResolutionResult::external(Some(
                resolved.unwrap_or(package_dir),
            )));
        }
        None
    }

    /// First existing file for `base`, following the probing order.
    pub fn probe(&self, base: &Path) -> Option<PathBuf> {
        let text = base.to_string_lossy();

        if let Some(extension) = extension_of(&text) {
            let stem = &text[..text.len() - extension.len()];
            for replacement in typescript_counterparts(extension) {
                let candidate = PathBuf::from(format!("{stem}{replacement}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            if base.is_file() {
                return Some(base.to_path_buf());
            }
        }

        for extension in &self.config.extensions {
            let candidate = PathBuf::from(format!("{text}{extension}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        self.probe_directory(base)
    }

    fn probe_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        self.config
            .extensions
            .iter()
            .map(|extension| dir.join(format!("index{extension}")))
            .find(|candidate| candidate.is_file())
    }
}

impl Resolve for FsResolver<'_> {
    fn resolve(&self, specifier: &str, referrer: &Path) -> ResolutionResult {
        let result = self.resolve_specifier(specifier, referrer);
        debug!(
            specifier,
            referrer = %referrer.display(),
            resolved = ?result.resolved,
            external = result.is_external,
            "resolved module specifier"
        );
        result
    }
}

fn classify(path: PathBuf) -> ResolutionResult {
    let in_node_modules = path
        .components()
        .any(|component| component.as_os_str() == "node_modules");
    if in_node_modules {
        ResolutionResult::external(Some(path))
    } else {
        ResolutionResult::local(path)
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// `node:fs`, `npm:react`, `https://...`, `data:...`
fn is_url_like(specifier: &str) -> bool {
    specifier.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Known source extension at the end of `path`, dot included.
fn extension_of(path: &str) -> Option<&'static str> {
    const KNOWN: &[&str] = &[
        ".d.mts", ".d.cts", ".d.ts", ".tsx", ".mts", ".cts", ".ts", ".jsx", ".mjs", ".cjs", ".js",
        ".json",
    ];
    if let Some(known) = KNOWN.iter().find(|ext| path.ends_with(*ext)) {
        return Some(known);
    }
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(_) => Some(""),
    }
}

fn typescript_counterparts(extension: &str) -> &'static [&'static str] {
    match extension {
        ".js" => &[".ts", ".tsx", ".d.ts"],
        ".jsx" => &[".tsx"],
        ".mjs" => &[".mts", ".d.mts"],
        ".cjs" => &[".cts", ".d.cts"],
        _ => &[],
    }
}

/// `@scope/pkg/sub` is package `@scope/pkg` with subpath `sub`.
fn parse_bare_specifier(specifier: &str) -> (&str, Option<&str>) {
    let package_end = if specifier.starts_with('@') {
        specifier
            .match_indices('/')
            .nth(1)
            .map(|(index, _)| index)
    } else {
        specifier.find('/')
    };
    match package_end {
        Some(index) => (&specifier[..index], Some(&specifier[index + 1..])),
        None => (specifier, None),
    }
}

/// Lexically removes `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
