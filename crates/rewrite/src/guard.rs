//! Keeps a file's layout intact across parse and print.
//!
//! The printer collapses blank lines and escapes non-ASCII text. Before
//! parsing, every run of blank lines is folded into sentinel comments that
//! the printer carries through; after printing the sentinels turn back into
//! line breaks and escaped non-ASCII characters are decoded again.

use diagnostics::Span;
use syntax::{Lexer, Token};

pub struct BlankLineGuard {
    sentinel: String,
    protected: String,
    /// `(end of a replacement in protected text, protected minus original length so far)`
    shifts: Vec<(usize, i64)>,
}

impl BlankLineGuard {
    /// Protects the blank lines of `source`. Only line breaks between tokens
    /// count; breaks inside comments, strings, templates and JSX text are left
    /// alone. Line breaks before the first token are protected as well.
    pub fn protect(source: &str, jsx: bool) -> Self {
        let sentinel = choose_sentinel(source);
        let tokens = Lexer::new(source.to_string(), 0).with_jsx(jsx).tokenize();

        let mut protected = String::with_capacity(source.len());
        let mut shifts = Vec::new();
        let mut copied = 0;
        let mut index = 0;

        while index < tokens.len() {
            let Token::LineBreak(first_break) = &tokens[index].value else {
                index += 1;
                continue;
            };

            let mut breaks = 1;
            let mut last_break = index;
            for (cursor, token) in tokens.iter().enumerate().skip(index + 1) {
                match &token.value {
                    Token::LineBreak(_) => {
                        breaks += 1;
                        last_break = cursor;
                    }
                    Token::Whitespace(text) if text.chars().all(|c| c == ' ' || c == '\t') => {}
                    _ => break,
                }
            }

            let leading = tokens[..index]
                .iter()
                .all(|token| matches!(token.value, Token::Whitespace(_)));
            if breaks >= 2 || leading {
                let start = tokens[index].span.start as usize;
                let end = tokens[last_break].span.end as usize;
                protected.push_str(&source[copied..start]);
                if leading {
                    for _ in 0..breaks {
                        protected.push_str(&sentinel);
                    }
                } else {
                    for _ in 1..breaks {
                        protected.push_str(&sentinel);
                    }
                    protected.push_str(first_break);
                }
                copied = end;
                shifts.push((protected.len(), protected.len() as i64 - end as i64));
            }
            index = last_break + 1;
        }
        protected.push_str(&source[copied..]);

        Self {
            sentinel,
            protected,
            shifts,
        }
    }

    /// The text to hand to the parser.
    pub fn protected(&self) -> &str {
        &self.protected
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Turns sentinels in the printed text back into `newline` and ends the
    /// text with exactly one `newline`.
    pub fn restore(&self, printed: &str, newline: &str) -> String {
        let mut restored = printed.replace(&self.sentinel, newline);
        restored.truncate(restored.trim_end().len());
        restored.push_str(newline);
        restored
    }

    /// Maps an offset in the protected text back to the source text.
    pub fn original_offset(&self, offset: usize) -> usize {
        let shift = self
            .shifts
            .iter()
            .take_while(|(end, _)| *end <= offset)
            .last()
            .map_or(0, |(_, shift)| *shift);
        (offset as i64 - shift).max(0) as usize
    }

    pub fn original_span(&self, span: Span) -> Span {
        Span::new(
            span.file_id,
            self.original_offset(span.start as usize) as u32,
            self.original_offset(span.end as usize) as u32,
        )
    }
}

/// A block comment that does not occur anywhere in `source`.
fn choose_sentinel(source: &str) -> String {
    let mut sentinel = "/*__msr_blank__*/".to_string();
    let mut attempt = 0;
    while source.contains(&sentinel) {
        attempt += 1;
        sentinel = format!("/*__msr_blank_{attempt}__*/");
    }
    sentinel
}

/// Whether `text` contains a `\uXXXX` escape.
pub fn has_escaped_unicode(text: &str) -> bool {
    let bytes = text.as_bytes();
    (0..bytes.len()).any(|index| escape_at(text, index).is_some())
}

/// Decodes the non-ASCII escapes of every string literal in `text`.
/// Templates, comments, regular expressions and JSX are left as written.
pub fn unescape_string_literals(text: &str, jsx: bool) -> String {
    let tokens = Lexer::new(text.to_string(), 0).with_jsx(jsx).tokenize();
    let mut output = String::with_capacity(text.len());
    let mut copied = 0;
    for token in &tokens {
        if let Token::String(_) = token.value {
            let start = token.span.start as usize;
            let end = token.span.end as usize;
            output.push_str(&text[copied..start]);
            output.push_str(&unescape_unicode(&text[start..end]));
            copied = end;
        }
    }
    output.push_str(&text[copied..]);
    output
}

/// Decodes `\uXXXX` escapes (and surrogate pairs of them) that encode
/// non-ASCII characters. Escapes of ASCII characters, lone surrogates and
/// escaped backslashes followed by `u` are kept as written.
fn unescape_unicode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = String::with_capacity(text.len());
    let mut copied = 0;
    let mut index = 0;
    let mut preceding_backslashes = 0;

    while index < bytes.len() {
        if bytes[index] != b'\\' {
            preceding_backslashes = 0;
            index += 1;
            continue;
        }

        if preceding_backslashes % 2 == 0 {
            if let Some((ch, consumed)) = decode_escape(text, index) {
                output.push_str(&text[copied..index]);
                output.push(ch);
                index += consumed;
                copied = index;
                preceding_backslashes = 0;
                continue;
            }
        }
        preceding_backslashes += 1;
        index += 1;
    }

    output.push_str(&text[copied..]);
    output
}

/// The non-ASCII character escaped at `index` and the escape's length.
fn decode_escape(text: &str, index: usize) -> Option<(char, usize)> {
    let unit = escape_at(text, index)?;
    match unit {
        0xD800..=0xDBFF => {
            let low = escape_at(text, index + 6).filter(|low| (0xDC00..=0xDFFF).contains(low))?;
            let scalar = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            char::from_u32(scalar).map(|ch| (ch, 12))
        }
        0xDC00..=0xDFFF => None,
        0x80..=0xFFFF => char::from_u32(unit).map(|ch| (ch, 6)),
        _ => None,
    }
}

/// The code unit of a `\uXXXX` escape starting at byte `index`.
fn escape_at(text: &str, index: usize) -> Option<u32> {
    let escape = text.get(index..index + 6)?;
    let hex = escape.strip_prefix("\\u")?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
