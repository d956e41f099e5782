#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Literals
    /// Cooked string value; the quotes and escapes are gone.
    String(String),
    /// Raw text of a template literal up to its first `${`, or from the `}`
    /// closing a substitution up to the next `${` or the closing backtick.
    Template(String),
    /// Raw numeric text as written, including separators, radix prefix and BigInt suffix.
    Number(String),
    /// Raw regular expression literal, flags included.
    Regex(String),

    // Identifiers
    Ident(String),

    // Keywords
    Import,
    Export,

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Semicolon,    // ;
    Dot,          // .
    Star,         // *
    Equal,        // =
    Colon,        // :
    Punct(char),

    // Trivia
    Whitespace(String),
    LineBreak(String),
    Comment(String),

    // Special
    /// Source text that is carried through untouched: JSX text and attribute
    /// strings, unterminated or uncookable strings.
    Raw(String),
    Eof,
}

impl Token {
    pub fn keyword(s: &str) -> Option<Token> {
        match s {
            "import" => Some(Token::Import),
            "export" => Some(Token::Export),
            _ => None,
        }
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace(_) | Token::LineBreak(_) | Token::Comment(_)
        )
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Token::Ident(ident) if ident == name)
    }

    /// The source text this token prints as. Strings yield their cooked value;
    /// quoting them is the emitter's job.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        use std::borrow::Cow;
        match self {
            Token::String(text)
            | Token::Template(text)
            | Token::Number(text)
            | Token::Regex(text)
            | Token::Ident(text)
            | Token::Whitespace(text)
            | Token::LineBreak(text)
            | Token::Comment(text)
            | Token::Raw(text) => Cow::Borrowed(text),
            Token::Import => Cow::Borrowed("import"),
            Token::Export => Cow::Borrowed("export"),
            Token::LeftParen => Cow::Borrowed("("),
            Token::RightParen => Cow::Borrowed(")"),
            Token::LeftBrace => Cow::Borrowed("{"),
            Token::RightBrace => Cow::Borrowed("}"),
            Token::LeftBracket => Cow::Borrowed("["),
            Token::RightBracket => Cow::Borrowed("]"),
            Token::Comma => Cow::Borrowed(","),
            Token::Semicolon => Cow::Borrowed(";"),
            Token::Dot => Cow::Borrowed("."),
            Token::Star => Cow::Borrowed("*"),
            Token::Equal => Cow::Borrowed("="),
            Token::Colon => Cow::Borrowed(":"),
            Token::Punct(ch) => Cow::Owned(ch.to_string()),
            Token::Eof => Cow::Borrowed(""),
        }
    }

    /// The delimiter that closes a group opened by this token.
    pub fn closing(&self) -> Option<Token> {
        match self {
            Token::LeftParen => Some(Token::RightParen),
            Token::LeftBrace => Some(Token::RightBrace),
            Token::LeftBracket => Some(Token::RightBracket),
            _ => None,
        }
    }

    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            Token::RightParen | Token::RightBrace | Token::RightBracket
        )
    }
}
