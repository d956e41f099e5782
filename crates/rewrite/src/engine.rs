use std::path::Path;

use resolver::{Resolve, ResolutionConfig};
use syntax::{allows_jsx, collect_specifiers, parse_module_with_jsx};
use tracing::{debug, instrument};

use crate::decide::SpecifierMap;
use crate::error::RewriteError;
use crate::guard::{has_escaped_unicode, unescape_string_literals, BlankLineGuard};
use crate::relative_path::PathStyle;
use crate::rewriter::SpecifierRewriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// No specifier in the file needs a new extension.
    Unchanged,
    Rewritten(String),
}

/// Runs the whole rewrite for one file at a time. Holds only shared,
/// read-only state, so one engine serves every worker thread.
pub struct FileEngine<'a, R: ?Sized> {
    config: &'a ResolutionConfig,
    resolver: &'a R,
    style: PathStyle,
}

impl<'a, R: Resolve + ?Sized> FileEngine<'a, R> {
    pub fn new(config: &'a ResolutionConfig, resolver: &'a R, style: PathStyle) -> Self {
        Self {
            config,
            resolver,
            style,
        }
    }

    /// Produces the new text of the file at `path` (absolute) whose content
    /// is `source`. Error spans point into `source`.
    #[instrument(level = "debug", skip(self, source), fields(path = %path.display()))]
    pub fn transform(&self, path: &Path, source: &str) -> Result<FileOutcome, RewriteError> {
        let jsx = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map_or(true, allows_jsx);
        let guard = BlankLineGuard::protect(source, jsx);
        self.transform_protected(path, &guard, jsx)
            .map_err(|error| {
                let span = guard.original_span(error.span());
                error.at(span)
            })
    }

    fn transform_protected(
        &self,
        path: &Path,
        guard: &BlankLineGuard,
        jsx: bool,
    ) -> Result<FileOutcome, RewriteError> {
        let protected = guard.protected();
        let (module, warnings) = parse_module_with_jsx(protected, 0, jsx);
        for warning in &warnings {
            debug!(message = %warning.message, "parse warning");
        }

        let references = collect_specifiers(&module);
        let map = SpecifierMap::build(path, &references, self.resolver, self.style)?;
        if map.is_empty() {
            debug!(specifiers = references.len(), "nothing to rewrite");
            return Ok(FileOutcome::Unchanged);
        }

        let module = SpecifierRewriter::new(&map, protected).rewrite_module(module)?;
        let newline = self.config.newline();
        let printed = emit_js::emit(&module, newline);
        let mut text = guard.restore(&printed, newline);
        if has_escaped_unicode(&text) {
            text = unescape_string_literals(&text, jsx);
        }

        debug!(rewritten = map.len(), "rewrote specifiers");
        Ok(FileOutcome::Rewritten(text))
    }
}
