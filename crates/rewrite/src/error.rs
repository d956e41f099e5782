use diagnostics::{Diagnostic, ErrorCode, Span};
use thiserror::Error;

/// Failures that abandon the rewrite of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("cannot resolve module specifier \"{specifier}\"")]
    UnresolvedSpecifier { specifier: String, span: Span },
    #[error("import declaration has no module specifier")]
    MissingSpecifier { span: Span },
}

impl RewriteError {
    pub fn span(&self) -> Span {
        match self {
            RewriteError::UnresolvedSpecifier { span, .. } | RewriteError::MissingSpecifier { span } => {
                *span
            }
        }
    }

    /// The same error pointing at `span`.
    pub fn at(self, span: Span) -> Self {
        match self {
            RewriteError::UnresolvedSpecifier { specifier, .. } => {
                RewriteError::UnresolvedSpecifier { specifier, span }
            }
            RewriteError::MissingSpecifier { .. } => RewriteError::MissingSpecifier { span },
        }
    }

    pub fn to_diagnostic(&self, file_id: u32) -> Diagnostic {
        let span = Span::new(file_id, self.span().start, self.span().end);
        match self {
            RewriteError::UnresolvedSpecifier { .. } => {
                Diagnostic::error(ErrorCode::UnresolvedSpecifier, span, self.to_string())
                    .with_label(span, "no file on disk matches this specifier")
            }
            RewriteError::MissingSpecifier { .. } => {
                Diagnostic::error(ErrorCode::MissingSpecifier, span, self.to_string())
                    .with_label(span, "expected a string literal after `from`")
            }
        }
    }
}
