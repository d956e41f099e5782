use crate::{Spanned, Token};
use diagnostics::Span;

/// Identifiers after which a `/` starts a regular expression rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// What the lexer is inside of, besides plain script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// `{` opened in script.
    Brace,
    /// `${` opened in a template literal.
    Substitution,
    /// `{` opened in a JSX tag or among JSX children.
    JsxExpression,
    /// Between the `<` and `>` of a JSX tag.
    JsxTag { closing: bool },
    /// Between an opening JSX tag and its closing tag.
    JsxChildren,
}

/// Lossless JavaScript/TypeScript lexer: concatenating the source text of every
/// token reproduces the input.
pub struct Lexer {
    input: String,
    chars: Vec<char>,
    char_indices: Vec<usize>, // byte positions of each character
    position: usize,          // character position
    file_id: u32,
    last_significant: Option<Token>,
    jsx: bool,
    contexts: Vec<Context>,
}

impl Lexer {
    pub fn new(input: String, file_id: u32) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let char_indices: Vec<usize> = input.char_indices().map(|(i, _)| i).collect();
        Self {
            input,
            chars,
            char_indices,
            position: 0,
            file_id,
            last_significant: None,
            jsx: false,
            contexts: Vec::new(),
        }
    }

    /// Recognizes JSX elements where an expression may start. JSX text and
    /// attribute strings come out as raw tokens.
    pub fn with_jsx(mut self, jsx: bool) -> Self {
        self.jsx = jsx;
        self
    }

    pub fn tokenize(&mut self) -> Vec<Spanned<Token>> {
        let mut tokens = Vec::new();

        while self.position < self.chars.len() {
            let start_char_pos = self.position;
            let token = self.next_token();
            let end_char_pos = self.position;

            let start_byte = self.byte_offset(start_char_pos);
            let end_byte = self.byte_offset(end_char_pos);
            if !token.is_trivia() {
                self.last_significant = Some(token.clone());
            }
            tokens.push(Spanned::new(
                token,
                Span::new(self.file_id, start_byte as u32, end_byte as u32),
            ));
        }

        tokens.push(Spanned::new(
            Token::Eof,
            Span::new(
                self.file_id,
                self.input.len() as u32,
                self.input.len() as u32,
            ),
        ));

        tokens
    }

    fn next_token(&mut self) -> Token {
        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Token::Eof,
        };

        match self.contexts.last() {
            Some(Context::JsxTag { closing }) => {
                let closing = *closing;
                self.next_jsx_tag_token(ch, closing)
            }
            Some(Context::JsxChildren) => self.next_jsx_child_token(ch),
            _ => self.next_script_token(ch),
        }
    }

    fn next_script_token(&mut self, ch: char) -> Token {
        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '{' => {
                self.contexts.push(Context::Brace);
                self.single(Token::LeftBrace)
            }
            '}' => match self.contexts.pop() {
                Some(Context::Substitution) => self.read_template_part(),
                _ => self.single(Token::RightBrace),
            },
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Equal),
            ':' => self.single(Token::Colon),
            '.' => {
                if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number()
                } else {
                    self.single(Token::Dot)
                }
            }
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => self.read_line_break(),
            '/' => match self.peek_char(1) {
                Some('/') => self.read_line_comment(),
                Some('*') => self.read_block_comment(),
                _ if self.regex_allowed() => self
                    .read_regex()
                    .unwrap_or_else(|| self.single(Token::Punct('/'))),
                _ => self.single(Token::Punct('/')),
            },
            '<' if self.jsx_element_starts() => {
                self.contexts.push(Context::JsxTag { closing: false });
                self.single(Token::Punct('<'))
            }
            '"' | '\'' => self.read_string(ch),
            '`' => self.read_template_part(),
            _ if ch.is_ascii_digit() => self.read_number(),
            _ if is_id_start(ch) => self.read_identifier(),
            _ if is_whitespace(ch) => self.read_whitespace(),
            _ => self.single(Token::Punct(ch)),
        }
    }

    fn next_jsx_tag_token(&mut self, ch: char, closing: bool) -> Token {
        match ch {
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => self.read_line_break(),
            _ if is_whitespace(ch) => self.read_whitespace(),
            '/' => match self.peek_char(1) {
                Some('/') => self.read_line_comment(),
                Some('*') => self.read_block_comment(),
                Some('>') => {
                    self.contexts.pop();
                    self.position += 2;
                    Token::Raw("/>".to_string())
                }
                _ => self.single(Token::Punct('/')),
            },
            '>' => {
                self.contexts.pop();
                self.advance();
                if closing {
                    Token::Raw(">".to_string())
                } else {
                    self.contexts.push(Context::JsxChildren);
                    Token::Punct('>')
                }
            }
            '{' => {
                self.contexts.push(Context::JsxExpression);
                self.single(Token::LeftBrace)
            }
            '"' | '\'' => self.read_jsx_attribute_string(ch),
            '.' => self.single(Token::Dot),
            '=' => self.single(Token::Equal),
            ':' => self.single(Token::Colon),
            _ if is_id_start(ch) => self.read_jsx_name(),
            _ => self.single(Token::Punct(ch)),
        }
    }

    fn next_jsx_child_token(&mut self, ch: char) -> Token {
        match ch {
            '{' => {
                self.contexts.push(Context::JsxExpression);
                self.single(Token::LeftBrace)
            }
            '<' => {
                if self.peek_char(1) == Some('/') {
                    self.contexts.pop();
                    self.contexts.push(Context::JsxTag { closing: true });
                } else {
                    self.contexts.push(Context::JsxTag { closing: false });
                }
                self.single(Token::Punct('<'))
            }
            _ => self.read_jsx_text(),
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn regex_allowed(&self) -> bool {
        match &self.last_significant {
            None => true,
            Some(Token::Ident(name)) => REGEX_PRECEDING_KEYWORDS.contains(&name.as_str()),
            Some(Token::Template(text)) => text.ends_with("${"),
            Some(
                Token::Number(_)
                | Token::String(_)
                | Token::Regex(_)
                | Token::Raw(_)
                | Token::RightParen
                | Token::RightBracket
                | Token::Import
                | Token::Export,
            ) => false,
            Some(_) => true,
        }
    }

    /// `<` opens a JSX element only where an expression may start, and only
    /// when a name or `>` follows.
    fn jsx_element_starts(&self) -> bool {
        self.jsx
            && self.regex_allowed()
            && self.peek_char(1).is_some_and(|c| is_id_start(c) || c == '>')
    }

    /// Attribute strings have no escapes; the text is kept as written.
    fn read_jsx_attribute_string(&mut self, quote: char) -> Token {
        let start = self.position;
        self.advance();
        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == quote {
                break;
            }
        }
        Token::Raw(self.text_from(start))
    }

    /// Element and attribute names, `-` included. Never keywords.
    fn read_jsx_name(&mut self) -> Token {
        let start = self.position;
        self.advance();
        while self
            .current_char()
            .is_some_and(|c| is_id_continue(c) || c == '-')
        {
            self.advance();
        }
        Token::Ident(self.text_from(start))
    }

    fn read_jsx_text(&mut self) -> Token {
        let start = self.position;
        while self.current_char().is_some_and(|c| c != '{' && c != '<') {
            self.advance();
        }
        Token::Raw(self.text_from(start))
    }

    fn read_line_break(&mut self) -> Token {
        let start = self.position;
        if self.current_char() == Some('\r') && self.peek_char(1) == Some('\n') {
            self.advance();
        }
        self.advance();
        Token::LineBreak(self.text_from(start))
    }

    fn read_whitespace(&mut self) -> Token {
        let start = self.position;
        while self.current_char().is_some_and(is_whitespace) {
            self.advance();
        }
        Token::Whitespace(self.text_from(start))
    }

    fn read_line_comment(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if is_line_break(ch) {
                break;
            }
            self.advance();
        }
        Token::Comment(self.text_from(start))
    }

    fn read_block_comment(&mut self) -> Token {
        let start = self.position;
        self.advance(); // '/'
        self.advance(); // '*'
        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '*' && self.current_char() == Some('/') {
                self.advance();
                break;
            }
        }
        Token::Comment(self.text_from(start))
    }

    /// Regex literals never span lines; anything else falls back to a plain `/`.
    fn read_regex(&mut self) -> Option<Token> {
        let start = self.position;
        let mut offset = 1;
        let mut in_class = false;
        loop {
            let ch = self.peek_char(offset)?;
            if is_line_break(ch) {
                return None;
            }
            match ch {
                '\\' => offset += 1,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
            offset += 1;
        }
        offset += 1;
        while self.peek_char(offset).is_some_and(is_id_continue) {
            offset += 1;
        }
        self.position += offset;
        Some(Token::Regex(self.text_from(start)))
    }

    fn read_string(&mut self, quote: char) -> Token {
        let start = self.position;
        self.advance(); // skip opening quote
        let mut value = String::new();
        let mut cookable = true;

        loop {
            let Some(ch) = self.current_char() else {
                return self.unterminated_string(start, quote);
            };
            if ch == quote {
                self.advance(); // skip closing quote
                break;
            } else if ch == '\n' || ch == '\r' {
                return self.unterminated_string(start, quote);
            } else if ch == '\\' {
                self.advance();
                if !self.read_escape(&mut value) {
                    cookable = false;
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        if cookable {
            Token::String(value)
        } else {
            Token::Raw(self.text_from(start))
        }
    }

    /// An unterminated quote is kept as raw text and lexing continues right
    /// after it.
    fn unterminated_string(&mut self, start: usize, quote: char) -> Token {
        self.position = start + 1;
        Token::Raw(quote.to_string())
    }

    /// Cooks one escape sequence (the backslash is already consumed). Returns
    /// false when the sequence cannot be represented as a Rust string.
    fn read_escape(&mut self, value: &mut String) -> bool {
        let Some(escaped) = self.current_char() else {
            return false;
        };
        self.advance();
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.current_char().is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
            '0'..='9' => return false, // legacy octal escapes
            'x' => match self.read_hex(2).and_then(char::from_u32) {
                Some(ch) => value.push(ch),
                None => return false,
            },
            'u' => match self.read_unicode_escape() {
                Some(ch) => value.push(ch),
                None => return false,
            },
            '\r' => {
                if self.current_char() == Some('\n') {
                    self.advance();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => value.push(other),
        }
        true
    }

    fn read_unicode_escape(&mut self) -> Option<char> {
        if self.current_char() == Some('{') {
            self.advance();
            let mut code = 0u32;
            let mut digits = 0;
            while let Some(ch) = self.current_char() {
                self.advance();
                if ch == '}' {
                    break;
                }
                code = code.checked_mul(16)?.checked_add(ch.to_digit(16)?)?;
                digits += 1;
            }
            if digits == 0 {
                return None;
            }
            return char::from_u32(code);
        }

        let unit = self.read_hex(4)?;
        if (0xD800..0xDC00).contains(&unit) {
            if self.current_char() == Some('\\') && self.peek_char(1) == Some('u') {
                self.position += 2;
                let low = self.read_hex(4)?;
                if (0xDC00..0xE000).contains(&low) {
                    return char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00));
                }
            }
            return None;
        }
        char::from_u32(unit)
    }

    fn read_hex(&mut self, len: usize) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self.current_char()?.to_digit(16)?;
            code = code * 16 + digit;
            self.advance();
        }
        Some(code)
    }

    /// Reads template text from the opening backtick, or from the `}` that
    /// closes a substitution, through the closing backtick or the next `${`.
    fn read_template_part(&mut self) -> Token {
        let start = self.position;
        self.advance(); // '`' or '}'
        while let Some(ch) = self.current_char() {
            match ch {
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '`' => {
                    self.advance();
                    break;
                }
                '$' if self.peek_char(1) == Some('{') => {
                    self.position += 2;
                    self.contexts.push(Context::Substitution);
                    break;
                }
                _ => self.advance(),
            }
        }
        Token::Template(self.text_from(start))
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;

        let radix_prefix = self.current_char() == Some('0')
            && matches!(
                self.peek_char(1),
                Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')
            );
        if radix_prefix {
            self.advance();
            self.advance();
            while self
                .current_char()
                .is_some_and(|c| c.is_ascii_hexdigit() || c == '_')
            {
                self.advance();
            }
        } else {
            self.skip_digits();
            if self.current_char() == Some('.') {
                self.advance();
                self.skip_digits();
            }
            if matches!(self.current_char(), Some('e' | 'E')) {
                let sign = matches!(self.peek_char(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    self.position += digit_at;
                    self.skip_digits();
                }
            }
        }

        if self.current_char() == Some('n') {
            self.advance();
        }

        Token::Number(self.text_from(start))
    }

    fn skip_digits(&mut self) {
        while self
            .current_char()
            .is_some_and(|c| c.is_ascii_digit() || c == '_')
        {
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        self.advance();
        while self.current_char().is_some_and(is_id_continue) {
            self.advance();
        }
        let value = self.text_from(start);

        // `foo.import` and `obj.export` are property names, not keywords.
        if matches!(self.last_significant, Some(Token::Dot)) {
            return Token::Ident(value);
        }
        Token::keyword(&value).unwrap_or(Token::Ident(value))
    }

    fn text_from(&self, start: usize) -> String {
        let start_byte = self.byte_offset(start);
        let end_byte = self.byte_offset(self.position);
        self.input[start_byte..end_byte].to_string()
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.char_indices
            .get(char_pos)
            .copied()
            .unwrap_or(self.input.len())
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.position < self.chars.len() {
            self.position += 1;
        }
    }
}

fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(ch: char) -> bool {
    (ch.is_whitespace() && !is_line_break(ch)) || ch == '\u{feff}'
}

fn is_id_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$' || ch == '#'
}

fn is_id_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200c}' || ch == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source.to_string(), 0)
            .tokenize()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    fn significant(source: &str) -> Vec<Token> {
        tokens(source)
            .into_iter()
            .filter(|t| !t.is_trivia() && *t != Token::Eof)
            .collect()
    }

    #[test]
    fn test_spans_cover_source() {
        let source = "import { a } from './a';\nconst s = '😎'; // done\n";
        let spanned = Lexer::new(source.to_string(), 0).tokenize();
        let mut rebuilt = String::new();
        for token in &spanned {
            rebuilt.push_str(token.span.slice(source).unwrap());
        }
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_import_declaration_tokens() {
        assert_eq!(
            significant("import { a } from './a';"),
            vec![
                Token::Import,
                Token::LeftBrace,
                Token::Ident("a".to_string()),
                Token::RightBrace,
                Token::Ident("from".to_string()),
                Token::String("./a".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_string_escapes_are_cooked() {
        assert_eq!(
            significant(r#"'a\'b' "\u{1F60E}" '😎' "\x41\n""#),
            vec![
                Token::String("a'b".to_string()),
                Token::String("😎".to_string()),
                Token::String("😎".to_string()),
                Token::String("A\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_uncookable_string_stays_raw() {
        assert_eq!(significant(r"'\uD83D'"), vec![Token::Raw(r"'\uD83D'".to_string())]);
        assert_eq!(significant(r"'\101'"), vec![Token::Raw(r"'\101'".to_string())]);
    }

    #[test]
    fn test_unterminated_quote_stays_raw() {
        assert_eq!(
            significant("a = 'b\nc"),
            vec![
                Token::Ident("a".to_string()),
                Token::Equal,
                Token::Raw("'".to_string()),
                Token::Ident("b".to_string()),
                Token::Ident("c".to_string()),
            ]
        );
    }

    fn jsx_significant(source: &str) -> Vec<Token> {
        Lexer::new(source.to_string(), 0)
            .with_jsx(true)
            .tokenize()
            .into_iter()
            .map(|t| t.value)
            .filter(|t| !t.is_trivia() && *t != Token::Eof)
            .collect()
    }

    #[test]
    fn test_jsx_text_is_raw() {
        assert_eq!(
            jsx_significant("x = <p>It's Bob's day</p>;"),
            vec![
                Token::Ident("x".to_string()),
                Token::Equal,
                Token::Punct('<'),
                Token::Ident("p".to_string()),
                Token::Punct('>'),
                Token::Raw("It's Bob's day".to_string()),
                Token::Punct('<'),
                Token::Punct('/'),
                Token::Ident("p".to_string()),
                Token::Raw(">".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_jsx_attribute_strings_are_not_cooked() {
        assert_eq!(
            jsx_significant(r"<a title='C:\dir' data-id={'\n'} />"),
            vec![
                Token::Punct('<'),
                Token::Ident("a".to_string()),
                Token::Ident("title".to_string()),
                Token::Equal,
                Token::Raw(r"'C:\dir'".to_string()),
                Token::Ident("data-id".to_string()),
                Token::Equal,
                Token::LeftBrace,
                Token::String("\n".to_string()),
                Token::RightBrace,
                Token::Raw("/>".to_string()),
            ]
        );
    }

    #[test]
    fn test_jsx_nesting_returns_to_script() {
        let tokens = jsx_significant(
            "f(<A.B x={<i>{import('./c')}</i>}>text</A.B>, 1 < 2)",
        );
        assert!(tokens.contains(&Token::Import));
        assert!(tokens.contains(&Token::Raw("text".to_string())));
        assert_eq!(
            tokens[tokens.len() - 5..].to_vec(),
            vec![
                Token::Comma,
                Token::Number("1".to_string()),
                Token::Punct('<'),
                Token::Number("2".to_string()),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_less_than_without_jsx() {
        assert_eq!(
            significant("a = <T>b;")[2],
            Token::Punct('<')
        );
        assert_eq!(significant("a = <p>It's</p>;")[6], Token::Raw("'".to_string()));
    }

    #[test]
    fn test_numbers_keep_raw_text() {
        assert_eq!(
            significant("100_000 0o777777777777n 0x00111 1.5e-3 .5"),
            vec![
                Token::Number("100_000".to_string()),
                Token::Number("0o777777777777n".to_string()),
                Token::Number("0x00111".to_string()),
                Token::Number("1.5e-3".to_string()),
                Token::Number(".5".to_string()),
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(
            significant("a / b"),
            vec![
                Token::Ident("a".to_string()),
                Token::Punct('/'),
                Token::Ident("b".to_string()),
            ]
        );
        assert_eq!(
            significant("x = /[/]import('x')/g"),
            vec![
                Token::Ident("x".to_string()),
                Token::Equal,
                Token::Regex("/[/]import('x')/g".to_string()),
            ]
        );
    }

    #[test]
    fn test_template_with_nested_expression() {
        assert_eq!(
            significant("`a ${ { b: `c${'}'}` } } d` + 1"),
            vec![
                Token::Template("`a ${".to_string()),
                Token::LeftBrace,
                Token::Ident("b".to_string()),
                Token::Colon,
                Token::Template("`c${".to_string()),
                Token::String("}".to_string()),
                Token::Template("}`".to_string()),
                Token::RightBrace,
                Token::Template("} d`".to_string()),
                Token::Punct('+'),
                Token::Number("1".to_string()),
            ]
        );
    }

    #[test]
    fn test_template_substitution_is_lexed() {
        assert_eq!(
            significant("`${await import('./a')}` / 2"),
            vec![
                Token::Template("`${".to_string()),
                Token::Ident("await".to_string()),
                Token::Import,
                Token::LeftParen,
                Token::String("./a".to_string()),
                Token::RightParen,
                Token::Template("}`".to_string()),
                Token::Punct('/'),
                Token::Number("2".to_string()),
            ]
        );
    }

    #[test]
    fn test_member_import_is_identifier() {
        assert_eq!(
            significant("loader.import('./x')")[2],
            Token::Ident("import".to_string())
        );
    }

    #[test]
    fn test_crlf_is_one_line_break() {
        assert_eq!(
            tokens("a\r\n\nb"),
            vec![
                Token::Ident("a".to_string()),
                Token::LineBreak("\r\n".to_string()),
                Token::LineBreak("\n".to_string()),
                Token::Ident("b".to_string()),
                Token::Eof,
            ]
        );
    }
}
