use std::collections::HashSet;
use std::path::{Path, PathBuf};

use resolver::{Resolve, ResolutionResult};
use syntax::SpecifierRef;
use tracing::debug;

use crate::error::RewriteError;
use crate::relative_path::{relative_specifier, PathStyle};

/// What to do with one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Rewrite(PathBuf),
    /// Looks local, but nothing on disk matches.
    Unresolved,
}

/// A specifier needs rewriting when it resolves to a local file whose
/// extension differs from the one written in the source.
pub fn decide(specifier: &str, result: &ResolutionResult) -> Decision {
    match (&result.resolved, result.is_external) {
        (_, true) => Decision::Keep,
        (None, false) => Decision::Unresolved,
        (Some(resolved), false) => {
            if extname(specifier) == extname(&resolved.to_string_lossy()) {
                Decision::Keep
            } else {
                Decision::Rewrite(resolved.clone())
            }
        }
    }
}

/// Extension of the last path segment, dot included: `"./a.test.ts"` gives
/// `".ts"`, while `"./a"`, `"./.env"` and `"../.."` give `""`.
pub fn extname(path: &str) -> &str {
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    if segment == ".." {
        return "";
    }
    match segment.rfind('.') {
        Some(0) | None => "",
        Some(dot) => &segment[dot..],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpecifier {
    pub original: String,
    pub resolved: String,
}

/// Specifiers of one file that need rewriting, at most one entry per
/// original text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierMap {
    entries: Vec<ResolvedSpecifier>,
}

impl SpecifierMap {
    /// Resolves every reference of the file at `referrer` and keeps the ones
    /// that need a new specifier. Fails on the first reference that cannot be
    /// resolved.
    pub fn build<R: Resolve + ?Sized>(
        referrer: &Path,
        references: &[SpecifierRef],
        resolver: &R,
        style: PathStyle,
    ) -> Result<Self, RewriteError> {
        let mut map = SpecifierMap::default();
        let mut seen = HashSet::new();

        for reference in references {
            if !seen.insert(reference.text.as_str()) {
                continue;
            }
            let result = resolver.resolve(&reference.text, referrer);
            match decide(&reference.text, &result) {
                Decision::Keep => {}
                Decision::Unresolved => {
                    return Err(RewriteError::UnresolvedSpecifier {
                        specifier: reference.text.clone(),
                        span: reference.span,
                    });
                }
                Decision::Rewrite(target) => {
                    let resolved = relative_specifier(referrer, &target, style);
                    debug!(original = %reference.text, %resolved, "specifier needs rewriting");
                    map.entries.push(ResolvedSpecifier {
                        original: reference.text.clone(),
                        resolved,
                    });
                }
            }
        }

        Ok(map)
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.original == original)
            .map(|entry| entry.resolved.as_str())
    }

    pub fn insert(&mut self, original: impl Into<String>, resolved: impl Into<String>) {
        let original = original.into();
        if self.get(&original).is_none() {
            self.entries.push(ResolvedSpecifier {
                original,
                resolved: resolved.into(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
