//! CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! Values that still contain `var()` are kept as component values until the
//! element they apply to is known, so the token stream is also what the style
//! engine re-parses after substitution. Tokens therefore implement
//! [`fmt::Display`] as CSS serialization rather than a debug dump.

use core::fmt;

/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
#[derive(Debug, Clone, PartialEq)]
pub enum CSSToken {
    /// `<ident-token>`
    Ident(String),
    /// `<function-token>`, the name without the parenthesis
    Function(String),
    /// `<at-keyword-token>`, the name without the `@`
    AtKeyword(String),
    /// `<hash-token>`; `is_id` is the "id" type flag
    Hash {
        /// Value after the `#`.
        value: String,
        /// Whether the value would start an ident sequence.
        is_id: bool,
    },
    /// `<string-token>`
    String(String),
    /// `<bad-string-token>`
    BadString,
    /// `<url-token>` from an unquoted `url(...)`
    Url(String),
    /// `<bad-url-token>`
    BadUrl,
    /// `<delim-token>`
    Delim(char),
    /// `<number-token>`
    Number {
        /// Numeric value.
        value: f64,
        /// The "integer" type flag.
        is_integer: bool,
    },
    /// `<percentage-token>`
    Percentage(f64),
    /// `<dimension-token>`
    Dimension {
        /// Numeric value.
        value: f64,
        /// The "integer" type flag.
        is_integer: bool,
        /// Unit, as written.
        unit: String,
    },
    /// `<whitespace-token>`
    Whitespace,
    /// `<CDO-token>`
    CDO,
    /// `<CDC-token>`
    CDC,
    /// `<colon-token>`
    Colon,
    /// `<semicolon-token>`
    Semicolon,
    /// `<comma-token>`
    Comma,
    /// `<[-token>`
    LeftBracket,
    /// `<]-token>`
    RightBracket,
    /// `<(-token>`
    LeftParen,
    /// `<)-token>`
    RightParen,
    /// `<{-token>`
    LeftBrace,
    /// `<}-token>`
    RightBrace,
    /// End of input
    EOF,
}

impl CSSToken {
    /// Returns true if this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }

    /// The ident's value if this is an `<ident-token>`.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CSSToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(v) => f.write_str(v),
            Self::Function(v) => write!(f, "{v}("),
            Self::AtKeyword(v) => write!(f, "@{v}"),
            Self::Hash { value, .. } => write!(f, "#{value}"),
            Self::String(v) => write!(f, "\"{}\"", v.replace('"', "\\\"")),
            Self::Url(v) => write!(f, "url({v})"),
            Self::BadString | Self::BadUrl | Self::EOF => Ok(()),
            Self::Delim(c) => write!(f, "{c}"),
            Self::Number { value, .. } => write!(f, "{value}"),
            Self::Percentage(value) => write!(f, "{value}%"),
            Self::Dimension { value, unit, .. } => write!(f, "{value}{unit}"),
            Self::Whitespace => f.write_str(" "),
            Self::CDO => f.write_str("<!--"),
            Self::CDC => f.write_str("-->"),
            Self::Colon => f.write_str(":"),
            Self::Semicolon => f.write_str(";"),
            Self::Comma => f.write_str(","),
            Self::LeftBracket => f.write_str("["),
            Self::RightBracket => f.write_str("]"),
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
            Self::LeftBrace => f.write_str("{"),
            Self::RightBrace => f.write_str("}"),
        }
    }
}

/// [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
pub struct CSSTokenizer {
    input: Vec<char>,
    position: usize,
    tokens: Vec<CSSToken>,
}

impl CSSTokenizer {
    /// Create a tokenizer over `input`.
    ///
    /// [§ 3.3 Preprocessing](https://www.w3.org/TR/css-syntax-3/#input-preprocessing):
    /// CR, FF and CRLF become LF; NUL becomes U+FFFD.
    pub fn new(input: &str) -> Self {
        let mut chars = Vec::with_capacity(input.len());
        let mut iter = input.chars().peekable();
        while let Some(c) = iter.next() {
            match c {
                '\r' => {
                    if iter.peek() == Some(&'\n') {
                        let _ = iter.next();
                    }
                    chars.push('\n');
                }
                '\u{c}' => chars.push('\n'),
                '\0' => chars.push('\u{FFFD}'),
                c => chars.push(c),
            }
        }
        Self {
            input: chars,
            position: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize `input` in one go, including the trailing EOF token.
    #[must_use]
    pub fn tokenize(input: &str) -> Vec<CSSToken> {
        let mut tokenizer = Self::new(input);
        tokenizer.run();
        tokenizer.into_tokens()
    }

    /// Consume tokens until EOF.
    pub fn run(&mut self) {
        loop {
            let token = self.consume_token();
            let is_eof = token == CSSToken::EOF;
            self.tokens.push(token);
            if is_eof {
                break;
            }
        }
    }

    /// Return the collected tokens.
    #[must_use]
    pub fn into_tokens(self) -> Vec<CSSToken> {
        self.tokens
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    fn consume_token(&mut self) -> CSSToken {
        self.consume_comments();

        let Some(c) = self.consume() else {
            return CSSToken::EOF;
        };

        match c {
            c if is_whitespace(c) => {
                while self.peek().is_some_and(is_whitespace) {
                    let _ = self.consume();
                }
                CSSToken::Whitespace
            }
            '"' | '\'' => self.consume_string_token(c),
            '#' => {
                if self.peek().is_some_and(is_ident_code_point)
                    || is_valid_escape(self.peek(), self.peek_at(1))
                {
                    let is_id = self.starts_ident_sequence(0);
                    CSSToken::Hash {
                        value: self.consume_ident_sequence(),
                        is_id,
                    }
                } else {
                    CSSToken::Delim('#')
                }
            }
            '(' => CSSToken::LeftParen,
            ')' => CSSToken::RightParen,
            '+' | '.' => {
                if self.starts_number(-1) {
                    self.position -= 1;
                    self.consume_numeric_token()
                } else {
                    CSSToken::Delim(c)
                }
            }
            ',' => CSSToken::Comma,
            '-' => {
                if self.starts_number(-1) {
                    self.position -= 1;
                    self.consume_numeric_token()
                } else if self.peek() == Some('-') && self.peek_at(1) == Some('>') {
                    self.position += 2;
                    CSSToken::CDC
                } else if self.starts_ident_sequence(-1) {
                    self.position -= 1;
                    self.consume_ident_like_token()
                } else {
                    CSSToken::Delim('-')
                }
            }
            ':' => CSSToken::Colon,
            ';' => CSSToken::Semicolon,
            '<' => {
                if self.peek() == Some('!')
                    && self.peek_at(1) == Some('-')
                    && self.peek_at(2) == Some('-')
                {
                    self.position += 3;
                    CSSToken::CDO
                } else {
                    CSSToken::Delim('<')
                }
            }
            '@' => {
                if self.starts_ident_sequence(0) {
                    CSSToken::AtKeyword(self.consume_ident_sequence())
                } else {
                    CSSToken::Delim('@')
                }
            }
            '[' => CSSToken::LeftBracket,
            ']' => CSSToken::RightBracket,
            '{' => CSSToken::LeftBrace,
            '}' => CSSToken::RightBrace,
            '\\' => {
                if is_valid_escape(Some('\\'), self.peek()) {
                    self.position -= 1;
                    self.consume_ident_like_token()
                } else {
                    CSSToken::Delim('\\')
                }
            }
            c if c.is_ascii_digit() => {
                self.position -= 1;
                self.consume_numeric_token()
            }
            c if is_ident_start_code_point(c) => {
                self.position -= 1;
                self.consume_ident_like_token()
            }
            c => CSSToken::Delim(c),
        }
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
    fn consume_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            self.position += 2;
            while let Some(c) = self.consume() {
                if c == '*' && self.peek() == Some('/') {
                    let _ = self.consume();
                    break;
                }
            }
        }
    }

    /// [§ 4.3.4 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string_token(&mut self, ending: char) -> CSSToken {
        let mut value = String::new();
        loop {
            match self.consume() {
                None => return CSSToken::String(value),
                Some(c) if c == ending => return CSSToken::String(value),
                Some('\n') => {
                    self.position -= 1;
                    return CSSToken::BadString;
                }
                Some('\\') => match self.peek() {
                    None => {}
                    Some('\n') => {
                        let _ = self.consume();
                    }
                    Some(_) => value.push(self.consume_escaped_code_point()),
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.3 Consume a numeric token](https://www.w3.org/TR/css-syntax-3/#consume-numeric-token)
    fn consume_numeric_token(&mut self) -> CSSToken {
        let (value, is_integer) = self.consume_number();
        if self.starts_ident_sequence(0) {
            CSSToken::Dimension {
                value,
                is_integer,
                unit: self.consume_ident_sequence(),
            }
        } else if self.peek() == Some('%') {
            let _ = self.consume();
            CSSToken::Percentage(value)
        } else {
            CSSToken::Number { value, is_integer }
        }
    }

    /// [§ 4.3.12 Consume a number](https://www.w3.org/TR/css-syntax-3/#consume-number)
    fn consume_number(&mut self) -> (f64, bool) {
        let mut repr = String::new();
        let mut is_integer = true;

        if let Some(sign @ ('+' | '-')) = self.peek() {
            repr.push(sign);
            let _ = self.consume();
        }
        self.consume_digits(&mut repr);

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.push('.');
            let _ = self.consume();
            self.consume_digits(&mut repr);
            is_integer = false;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                repr.push('e');
                let _ = self.consume();
                if signed {
                    repr.extend(self.consume());
                }
                self.consume_digits(&mut repr);
                is_integer = false;
            }
        }

        (repr.parse().unwrap_or(0.0), is_integer)
    }

    fn consume_digits(&mut self, into: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            into.push(c);
            let _ = self.consume();
        }
    }

    /// [§ 4.3.4 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like_token(&mut self) -> CSSToken {
        let string = self.consume_ident_sequence();

        if self.peek() != Some('(') {
            return CSSToken::Ident(string);
        }
        let _ = self.consume();

        if !string.eq_ignore_ascii_case("url") {
            return CSSToken::Function(string);
        }

        while self.peek().is_some_and(is_whitespace) && self.peek_at(1).is_some_and(is_whitespace) {
            let _ = self.consume();
        }
        let next = if self.peek().is_some_and(is_whitespace) {
            self.peek_at(1)
        } else {
            self.peek()
        };
        if matches!(next, Some('"' | '\'')) {
            CSSToken::Function(string)
        } else {
            self.consume_url_token()
        }
    }

    /// [§ 4.3.6 Consume a url token](https://www.w3.org/TR/css-syntax-3/#consume-url-token)
    fn consume_url_token(&mut self) -> CSSToken {
        let mut value = String::new();
        while self.peek().is_some_and(is_whitespace) {
            let _ = self.consume();
        }
        loop {
            match self.consume() {
                None | Some(')') => return CSSToken::Url(value),
                Some(c) if is_whitespace(c) => {
                    while self.peek().is_some_and(is_whitespace) {
                        let _ = self.consume();
                    }
                    if matches!(self.peek(), None | Some(')')) {
                        let _ = self.consume();
                        return CSSToken::Url(value);
                    }
                    self.consume_bad_url_remnants();
                    return CSSToken::BadUrl;
                }
                Some('"' | '\'' | '(') => {
                    self.consume_bad_url_remnants();
                    return CSSToken::BadUrl;
                }
                Some(c) if is_non_printable(c) => {
                    self.consume_bad_url_remnants();
                    return CSSToken::BadUrl;
                }
                Some('\\') => {
                    if is_valid_escape(Some('\\'), self.peek()) {
                        value.push(self.consume_escaped_code_point());
                    } else {
                        self.consume_bad_url_remnants();
                        return CSSToken::BadUrl;
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.14 Consume the remnants of a bad url](https://www.w3.org/TR/css-syntax-3/#consume-remnants-of-bad-url)
    fn consume_bad_url_remnants(&mut self) {
        loop {
            match self.consume() {
                None | Some(')') => return,
                Some('\\') if is_valid_escape(Some('\\'), self.peek()) => {
                    let _ = self.consume_escaped_code_point();
                }
                Some(_) => {}
            }
        }
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    fn consume_escaped_code_point(&mut self) -> char {
        let Some(c) = self.consume() else {
            return '\u{FFFD}';
        };
        if !c.is_ascii_hexdigit() {
            return c;
        }
        let mut hex = String::from(c);
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.extend(self.consume());
        }
        if self.peek().is_some_and(is_whitespace) {
            let _ = self.consume();
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|&n| n != 0)
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}')
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_code_point(c) => {
                    result.push(c);
                    let _ = self.consume();
                }
                Some('\\') if is_valid_escape(Some('\\'), self.peek_at(1)) => {
                    let _ = self.consume();
                    result.push(self.consume_escaped_code_point());
                }
                _ => return result,
            }
        }
    }

    /// [§ 4.3.9 Check if three code points would start an ident sequence](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
    ///
    /// `offset` is relative to the next input code point; `-1` means "starting
    /// with the current input code point".
    fn starts_ident_sequence(&self, offset: isize) -> bool {
        let first = self.peek_rel(offset);
        let second = self.peek_rel(offset + 1);
        match first {
            Some('-') => {
                second.is_some_and(|c| is_ident_start_code_point(c) || c == '-')
                    || is_valid_escape(second, self.peek_rel(offset + 2))
            }
            Some('\\') => is_valid_escape(first, second),
            Some(c) => is_ident_start_code_point(c),
            None => false,
        }
    }

    /// [§ 4.3.10 Check if three code points would start a number](https://www.w3.org/TR/css-syntax-3/#starts-with-a-number)
    fn starts_number(&self, offset: isize) -> bool {
        let first = self.peek_rel(offset);
        let second = self.peek_rel(offset + 1);
        match first {
            Some('+' | '-') => {
                second.is_some_and(|c| c.is_ascii_digit())
                    || (second == Some('.')
                        && self.peek_rel(offset + 2).is_some_and(|c| c.is_ascii_digit()))
            }
            Some('.') => second.is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.input.get(self.position).copied();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn peek_rel(&self, offset: isize) -> Option<char> {
        self.position
            .checked_add_signed(offset)
            .and_then(|i| self.input.get(i).copied())
    }
}

/// [§ 4.2](https://www.w3.org/TR/css-syntax-3/#whitespace)
const fn is_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\t' | ' ')
}

/// [§ 4.2](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_code_point(c: char) -> bool {
    c.is_ascii_alphabetic() || !c.is_ascii() || c == '_'
}

/// [§ 4.2](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_code_point(c: char) -> bool {
    is_ident_start_code_point(c) || c.is_ascii_digit() || c == '-'
}

/// [§ 4.2](https://www.w3.org/TR/css-syntax-3/#non-printable-code-point)
const fn is_non_printable(c: char) -> bool {
    matches!(c, '\0'..='\u{8}' | '\u{b}' | '\u{e}'..='\u{1f}' | '\u{7f}')
}

/// [§ 4.3.8 Check if two code points are a valid escape](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second.is_some_and(|c| c != '\n')
}
