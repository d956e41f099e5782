use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::jsonc::strip_jsonc;
use crate::normalize_path;

/// Extension probing order used when nothing else is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".d.ts", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Nested `extends` deeper than this is treated as a cycle.
const MAX_EXTENDS_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported newLine {value:?} in {} (expected \"lf\" or \"crlf\")", path.display())]
    InvalidNewLine { path: PathBuf, value: String },
    #[error("{} extends itself", path.display())]
    ExtendsCycle { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewLine {
    Lf,
    Crlf,
}

impl NewLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewLine::Lf => "\n",
            NewLine::Crlf => "\r\n",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "lf" => Some(NewLine::Lf),
            "crlf" => Some(NewLine::Crlf),
            _ => None,
        }
    }
}

/// `"@app/*": ["./src/app/*"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub targets: Vec<String>,
}

/// Everything module resolution needs, loaded once per run and shared
/// read-only by every file transform.
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Project root; source discovery walks it.
    pub root: PathBuf,
    /// Absolute `baseUrl`, when configured.
    pub base_url: Option<PathBuf>,
    /// Directory that `paths` targets are relative to.
    pub paths_base: PathBuf,
    pub aliases: Vec<PathAlias>,
    /// Probing order, each entry with its leading dot.
    pub extensions: Vec<String>,
    pub newline: Option<NewLine>,
}

impl ResolutionConfig {
    /// Configuration without a tsconfig: relative specifiers only.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            paths_base: root.clone(),
            root,
            base_url: None,
            aliases: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            newline: None,
        }
    }

    /// Reads `config_path` (following `extends`) for a project rooted at `root`.
    pub fn load(config_path: &Path, root: &Path) -> Result<Self, ConfigError> {
        let options = load_options(config_path, 0)?;
        let mut config = Self::new(root);

        config.base_url = options.base_url;
        if let Some((paths, paths_dir)) = options.paths {
            config.paths_base = config.base_url.clone().unwrap_or(paths_dir);
            config.aliases = paths
                .into_iter()
                .map(|(pattern, targets)| PathAlias { pattern, targets })
                .collect();
        }
        config.newline = options.newline;

        debug!(
            config = %config_path.display(),
            base_url = ?config.base_url,
            aliases = config.aliases.len(),
            "loaded resolution config"
        );
        Ok(config)
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        self
    }

    /// The configured newline sequence, or the platform's.
    pub fn newline(&self) -> &'static str {
        match self.newline {
            Some(newline) => newline.as_str(),
            None if cfg!(windows) => "\r\n",
            None => "\n",
        }
    }

    /// Candidate paths for `specifier` from the best matching `paths` entry.
    /// An exact pattern beats any wildcard; among wildcards the longest prefix wins.
    pub fn match_alias(&self, specifier: &str) -> Option<Vec<PathBuf>> {
        let mut best: Option<(&PathAlias, String, usize)> = None;

        for alias in &self.aliases {
            let candidate = match alias.pattern.split_once('*') {
                None if alias.pattern == specifier => Some((String::new(), usize::MAX)),
                None => None,
                Some((prefix, suffix)) => {
                    let matches = specifier.len() >= prefix.len() + suffix.len()
                        && specifier.starts_with(prefix)
                        && specifier.ends_with(suffix);
                    matches.then(|| {
                        let captured = &specifier[prefix.len()..specifier.len() - suffix.len()];
                        (captured.to_string(), prefix.len())
                    })
                }
            };

            if let Some((captured, weight)) = candidate {
                if best.as_ref().map_or(true, |(_, _, best_weight)| weight > *best_weight) {
                    best = Some((alias, captured, weight));
                }
            }
        }

        best.map(|(alias, captured, _)| {
            alias
                .targets
                .iter()
                .map(|target| normalize_path(&self.paths_base.join(target.replace('*', &captured))))
                .collect()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfigFile {
    extends: Option<Extends>,
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
    new_line: Option<String>,
}

/// Options after `extends` merging, with paths already made absolute.
#[derive(Debug, Default)]
struct ResolvedOptions {
    base_url: Option<PathBuf>,
    /// The alias table and the directory of the config that declared it.
    paths: Option<(BTreeMap<String, Vec<String>>, PathBuf)>,
    newline: Option<NewLine>,
}

fn load_options(path: &Path, depth: usize) -> Result<ResolvedOptions, ConfigError> {
    if depth > MAX_EXTENDS_DEPTH {
        return Err(ConfigError::ExtendsCycle {
            path: path.to_path_buf(),
        });
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: TsConfigFile =
        serde_json::from_str(&strip_jsonc(&text)).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

    let parents = match file.extends {
        Some(Extends::One(parent)) => vec![parent],
        Some(Extends::Many(parents)) => parents,
        None => Vec::new(),
    };
    let mut options = ResolvedOptions::default();
    for parent in parents {
        match extends_path(&dir, &parent) {
            Some(parent_path) => {
                let inherited = load_options(&parent_path, depth + 1)?;
                options.merge(inherited);
            }
            None => debug!(extends = %parent, "skipping package tsconfig base"),
        }
    }

    let compiler_options = file.compiler_options;
    if let Some(base_url) = compiler_options.base_url {
        options.base_url = Some(normalize_path(&dir.join(base_url)));
    }
    if let Some(paths) = compiler_options.paths {
        options.paths = Some((paths, dir.clone()));
    }
    if let Some(value) = compiler_options.new_line {
        let newline = NewLine::parse(&value).ok_or_else(|| ConfigError::InvalidNewLine {
            path: path.to_path_buf(),
            value,
        })?;
        options.newline = Some(newline);
    }

    Ok(options)
}

impl ResolvedOptions {
    fn merge(&mut self, other: ResolvedOptions) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.paths.is_some() {
            self.paths = other.paths;
        }
        if other.newline.is_some() {
            self.newline = other.newline;
        }
    }
}

/// Only file-relative bases are followed; package bases live in node_modules.
fn extends_path(dir: &Path, parent: &str) -> Option<PathBuf> {
    if !(parent.starts_with("./") || parent.starts_with("../") || Path::new(parent).is_absolute()) {
        return None;
    }
    let path = normalize_path(&dir.join(parent));
    if path.is_file() || path.extension().is_some_and(|ext| ext == "json") {
        Some(path)
    } else {
        let mut with_json = path.into_os_string();
        with_json.push(".json");
        Some(PathBuf::from(with_json))
    }
}
