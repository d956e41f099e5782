use std::collections::HashMap;
use std::io::Write;
use std::ops::Range;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub file_id: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(file_id: u32, start: u32, end: u32) -> Self {
        Self { file_id, start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// The source text covered by this span, if it lies inside `source`.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.range())
    }
}

#[derive(Debug, Clone)]
pub enum DiagKind {
    Error(ErrorCode),
    Warning(WarningCode),
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnresolvedSpecifier,
    MissingSpecifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    UnclosedDelimiter,
    UnexpectedDelimiter,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
    pub labels: Vec<(Span, String)>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Error(code),
            span,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    pub fn warning(code: WarningCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Warning(code),
            span,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push((span, message.into()));
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, DiagKind::Error(_))
    }
}

/// Collects diagnostics for a set of source files and renders them with ariadne.
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    files: HashMap<u32, (String, String)>, // file_id -> (name, content)
    next_file_id: u32,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            files: HashMap::new(),
            next_file_id: 0,
        }
    }

    pub fn add_file(&mut self, name: String, content: String) -> u32 {
        let file_id = self.next_file_id;
        self.next_file_id += 1;
        self.files.insert(file_id, (name, content));
        file_id
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn print_all(&self) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        for diagnostic in &self.diagnostics {
            // Nothing useful can be done when stderr itself is gone.
            let _ = self.write_diagnostic(diagnostic, &mut handle, true);
        }
    }

    /// Renders every diagnostic without colors, mostly useful for tests and logs.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        for diagnostic in &self.diagnostics {
            let _ = self.write_diagnostic(diagnostic, &mut out, false);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn write_diagnostic<W: Write>(
        &self,
        diagnostic: &Diagnostic,
        writer: &mut W,
        color: bool,
    ) -> std::io::Result<()> {
        let Some((file_name, file_content)) = self.files.get(&diagnostic.span.file_id) else {
            return writeln!(writer, "{}", diagnostic.message);
        };

        let report_kind = match diagnostic.kind {
            DiagKind::Error(_) => ReportKind::Error,
            DiagKind::Warning(_) => ReportKind::Warning,
            DiagKind::Note => ReportKind::Advice,
        };

        let mut report = Report::build(report_kind, file_name, diagnostic.span.start as usize)
            .with_config(Config::default().with_color(color))
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((file_name, diagnostic.span.range()))
                    .with_message(&diagnostic.message)
                    .with_color(match diagnostic.kind {
                        DiagKind::Error(_) => Color::Red,
                        DiagKind::Warning(_) => Color::Yellow,
                        DiagKind::Note => Color::Blue,
                    }),
            );

        for (span, message) in &diagnostic.labels {
            report = report.with_label(
                Label::new((file_name, span.range()))
                    .with_message(message)
                    .with_color(Color::Cyan),
            );
        }

        report
            .finish()
            .write((file_name, Source::from(file_content)), writer)
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
