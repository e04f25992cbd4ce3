//! CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! Produces generic rules (qualified rules and at-rules) whose preludes and
//! blocks are component values. Style rule blocks are parsed eagerly into
//! declarations and nested rules following the nesting-aware
//! [§ 5.4.4 Consume a block's contents](https://drafts.csswg.org/css-syntax-3/#consume-block-contents);
//! at-rule blocks are kept raw and reparsed by [`crate::stylesheet`] once the
//! at-rule's grammar is known.

use core::fmt;

use crate::tokenizer::CSSToken;

/// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// A preserved token.
    Token(CSSToken),
    /// A function with its contents.
    Function {
        /// The function name, as written.
        name: String,
        /// The function arguments.
        value: Vec<ComponentValue>,
    },
    /// A simple block.
    Block {
        /// The opening token character: `{`, `[` or `(`.
        token: char,
        /// The block contents.
        value: Vec<ComponentValue>,
    },
}

impl ComponentValue {
    /// Whether this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Token(CSSToken::Whitespace))
    }

    /// The ident's value if this is an `<ident-token>`.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Token(token) => token.as_ident(),
            _ => None,
        }
    }

    /// Flatten back into the token stream that produced it.
    pub fn flatten_into(&self, out: &mut Vec<CSSToken>) {
        match self {
            Self::Token(token) => out.push(token.clone()),
            Self::Function { name, value } => {
                out.push(CSSToken::Function(name.clone()));
                for v in value {
                    v.flatten_into(out);
                }
                out.push(CSSToken::RightParen);
            }
            Self::Block { token, value } => {
                let (open, close) = match token {
                    '{' => (CSSToken::LeftBrace, CSSToken::RightBrace),
                    '[' => (CSSToken::LeftBracket, CSSToken::RightBracket),
                    _ => (CSSToken::LeftParen, CSSToken::RightParen),
                };
                out.push(open);
                for v in value {
                    v.flatten_into(out);
                }
                out.push(close);
            }
        }
    }
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => write!(f, "{token}"),
            Self::Function { name, value } => {
                write!(f, "{name}(")?;
                for v in value {
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Self::Block { token, value } => {
                let close = match token {
                    '{' => '}',
                    '[' => ']',
                    _ => ')',
                };
                write!(f, "{token}")?;
                for v in value {
                    write!(f, "{v}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

/// Serialize component values back to CSS text.
#[must_use]
pub fn serialize(values: &[ComponentValue]) -> String {
    values.iter().map(ToString::to_string).collect::<String>().trim().to_string()
}

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
#[derive(Debug, Clone, PartialEq)]
pub struct RawDeclaration {
    /// The property name, as written.
    pub name: String,
    /// The value, with `!important` and surrounding whitespace removed.
    pub value: Vec<ComponentValue>,
    /// Whether the declaration has `!important`.
    pub important: bool,
}

/// An item inside a style block: a declaration or a nested rule.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    /// A declaration.
    Declaration(RawDeclaration),
    /// A nested rule.
    Rule(RawRule),
}

/// A generic rule before at-rule specific interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRule {
    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    Qualified {
        /// The prelude (the selector list, for style rules).
        prelude: Vec<ComponentValue>,
        /// The parsed block contents.
        block: Vec<BlockItem>,
    },
    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    At {
        /// The at-keyword name (without the `@`), as written.
        name: String,
        /// The prelude component values.
        prelude: Vec<ComponentValue>,
        /// The raw block contents, if the rule has a block.
        block: Option<Vec<ComponentValue>>,
    },
}

/// CSS parser over a token stream.
pub struct CSSParser {
    tokens: Vec<CSSToken>,
    position: usize,
}

impl CSSParser {
    /// Create a new parser from a list of tokens.
    #[must_use]
    pub const fn new(tokens: Vec<CSSToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Create a parser over previously consumed component values.
    #[must_use]
    pub fn from_component_values(values: &[ComponentValue]) -> Self {
        let mut tokens = Vec::new();
        for value in values {
            value.flatten_into(&mut tokens);
        }
        Self::new(tokens)
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    pub fn parse_stylesheet(&mut self) -> Vec<RawRule> {
        self.consume_list_of_rules(true)
    }

    /// [§ 5.3.4 Parse a rule list](https://drafts.csswg.org/css-syntax-3/#parse-rule-list)
    pub fn parse_rule_list(&mut self) -> Vec<RawRule> {
        self.consume_list_of_rules(false)
    }

    /// [§ 5.3.7 Parse a block's contents](https://drafts.csswg.org/css-syntax-3/#parse-block-contents)
    ///
    /// Used for style attributes, `@font-face` and keyframe blocks.
    pub fn parse_block_contents(&mut self) -> Vec<BlockItem> {
        self.consume_block_contents()
    }

    /// [§ 5.3.10 Parse a list of component values](https://www.w3.org/TR/css-syntax-3/#parse-list-of-component-values)
    pub fn parse_component_values(&mut self) -> Vec<ComponentValue> {
        let mut values = Vec::new();
        while let Some(v) = self.consume_component_value() {
            values.push(v);
        }
        values
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<RawRule> {
        let mut rules = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::Whitespace) => {
                    let _ = self.consume();
                }
                None | Some(CSSToken::EOF) => return rules,
                Some(CSSToken::CDO | CSSToken::CDC) if top_level => {
                    let _ = self.consume();
                }
                Some(CSSToken::AtKeyword(_)) => rules.extend(self.consume_at_rule()),
                Some(_) => rules.extend(self.consume_qualified_rule(false)),
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Option<RawRule> {
        let name = match self.consume() {
            Some(CSSToken::AtKeyword(name)) => name.clone(),
            _ => return None,
        };
        let mut prelude = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::Semicolon) => {
                    let _ = self.consume();
                    break;
                }
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => break,
                Some(CSSToken::LeftBrace) => {
                    let _ = self.consume();
                    let block = self.consume_until_close(&CSSToken::RightBrace);
                    return Some(RawRule::At {
                        name,
                        prelude: trim_whitespace(prelude),
                        block: Some(block),
                    });
                }
                Some(_) => prelude.extend(self.consume_component_value()),
            }
        }
        Some(RawRule::At {
            name,
            prelude: trim_whitespace(prelude),
            block: None,
        })
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    ///
    /// With `nested` set, a semicolon ends the rule (and it is dropped).
    fn consume_qualified_rule(&mut self, nested: bool) -> Option<RawRule> {
        let mut prelude = Vec::new();
        loop {
            match self.peek() {
                None | Some(CSSToken::EOF) => return None,
                Some(CSSToken::RightBrace) if nested => return None,
                Some(CSSToken::Semicolon) if nested => {
                    let _ = self.consume();
                    return None;
                }
                Some(CSSToken::LeftBrace) => {
                    let _ = self.consume();
                    let block = self.consume_block_contents();
                    if self.peek() == Some(&CSSToken::RightBrace) {
                        let _ = self.consume();
                    }
                    return Some(RawRule::Qualified {
                        prelude: trim_whitespace(prelude),
                        block,
                    });
                }
                Some(_) => prelude.extend(self.consume_component_value()),
            }
        }
    }

    /// [§ 5.4.4 Consume a block's contents](https://drafts.csswg.org/css-syntax-3/#consume-block-contents)
    ///
    /// Stops before an unmatched `}` without consuming it.
    fn consume_block_contents(&mut self) -> Vec<BlockItem> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::Whitespace | CSSToken::Semicolon) => {
                    let _ = self.consume();
                }
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => return items,
                Some(CSSToken::AtKeyword(_)) => {
                    if let Some(rule) = self.consume_at_rule() {
                        items.push(BlockItem::Rule(rule));
                    }
                }
                Some(_) => {
                    let start = self.position;
                    if let Some(declaration) = self.consume_declaration() {
                        items.push(BlockItem::Declaration(declaration));
                        continue;
                    }
                    self.position = start;
                    if let Some(rule) = self.consume_qualified_rule(true) {
                        items.push(BlockItem::Rule(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    ///
    /// Leaves the position unspecified when it returns `None`; the caller
    /// rewinds.
    fn consume_declaration(&mut self) -> Option<RawDeclaration> {
        let name = match self.consume() {
            Some(CSSToken::Ident(name)) => name.clone(),
            _ => return None,
        };
        while self.peek() == Some(&CSSToken::Whitespace) {
            let _ = self.consume();
        }
        if self.peek() != Some(&CSSToken::Colon) {
            return None;
        }
        let _ = self.consume();

        let mut value = Vec::new();
        while !matches!(
            self.peek(),
            None | Some(CSSToken::EOF | CSSToken::Semicolon | CSSToken::RightBrace)
        ) {
            value.extend(self.consume_component_value());
        }

        let important = check_important(&value);
        let value = trim_important(value);

        // A `{}` block mixed with other values means this was really a
        // nested rule such as `a:hover { ... }`.
        if !name.starts_with("--") {
            let has_brace_block = value
                .iter()
                .any(|v| matches!(v, ComponentValue::Block { token: '{', .. }));
            if has_brace_block && value.len() > 1 {
                return None;
            }
        }

        Some(RawDeclaration {
            name,
            value,
            important,
        })
    }

    /// [§ 5.4.7 Consume a simple block](https://www.w3.org/TR/css-syntax-3/#consume-simple-block)
    /// (after the opening token has been consumed).
    fn consume_until_close(&mut self, ending: &CSSToken) -> Vec<ComponentValue> {
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(token) if token == ending => {
                    let _ = self.consume();
                    return value;
                }
                None | Some(CSSToken::EOF) => return value,
                Some(_) => value.extend(self.consume_component_value()),
            }
        }
    }

    /// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    fn consume_component_value(&mut self) -> Option<ComponentValue> {
        match self.consume()?.clone() {
            CSSToken::EOF => {
                self.position -= 1;
                None
            }
            CSSToken::LeftBrace => Some(ComponentValue::Block {
                token: '{',
                value: self.consume_until_close(&CSSToken::RightBrace),
            }),
            CSSToken::LeftBracket => Some(ComponentValue::Block {
                token: '[',
                value: self.consume_until_close(&CSSToken::RightBracket),
            }),
            CSSToken::LeftParen => Some(ComponentValue::Block {
                token: '(',
                value: self.consume_until_close(&CSSToken::RightParen),
            }),
            CSSToken::Function(name) => Some(ComponentValue::Function {
                name,
                value: self.consume_until_close(&CSSToken::RightParen),
            }),
            token => Some(ComponentValue::Token(token)),
        }
    }

    fn consume(&mut self) -> Option<&CSSToken> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&CSSToken> {
        self.tokens.get(self.position)
    }
}

/// Parse a complete stylesheet from text.
#[must_use]
pub fn parse_stylesheet(css: &str) -> Vec<RawRule> {
    CSSParser::new(crate::tokenizer::CSSTokenizer::tokenize(css)).parse_stylesheet()
}

/// Parse a string into a list of component values.
#[must_use]
pub fn parse_component_values(css: &str) -> Vec<ComponentValue> {
    CSSParser::new(crate::tokenizer::CSSTokenizer::tokenize(css)).parse_component_values()
}

/// [§ 5.3.8 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
///
/// Used for `style` attributes. Nested rules are dropped.
#[must_use]
pub fn parse_declaration_list(css: &str) -> Vec<RawDeclaration> {
    CSSParser::new(crate::tokenizer::CSSTokenizer::tokenize(css))
        .parse_block_contents()
        .into_iter()
        .filter_map(|item| match item {
            BlockItem::Declaration(declaration) => Some(declaration),
            BlockItem::Rule(_) => None,
        })
        .collect()
}

/// Drop leading and trailing whitespace tokens.
#[must_use]
pub fn trim_whitespace(mut values: Vec<ComponentValue>) -> Vec<ComponentValue> {
    while values.last().is_some_and(ComponentValue::is_whitespace) {
        let _ = values.pop();
    }
    let leading = values.iter().take_while(|v| v.is_whitespace()).count();
    let _ = values.drain(..leading);
    values
}

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
fn check_important(value: &[ComponentValue]) -> bool {
    let mut significant = value.iter().rev().filter(|v| !v.is_whitespace());
    matches!(significant.next(), Some(v) if v.as_ident().is_some_and(|s| s.eq_ignore_ascii_case("important")))
        && matches!(significant.next(), Some(ComponentValue::Token(CSSToken::Delim('!'))))
}

/// Remove `!important` and surrounding whitespace from a declaration value.
fn trim_important(value: Vec<ComponentValue>) -> Vec<ComponentValue> {
    let mut value = trim_whitespace(value);
    if !check_important(&value) {
        return value;
    }
    let _ = value.pop();
    while value.last().is_some_and(ComponentValue::is_whitespace) {
        let _ = value.pop();
    }
    let _ = value.pop();
    trim_whitespace(value)
}

/// Split component values on top-level commas.
#[must_use]
pub fn split_on_commas(values: &[ComponentValue]) -> Vec<Vec<ComponentValue>> {
    let mut groups = vec![Vec::new()];
    for value in values {
        if matches!(value, ComponentValue::Token(CSSToken::Comma)) {
            groups.push(Vec::new());
        } else if let Some(current) = groups.last_mut() {
            current.push(value.clone());
        }
    }
    groups.into_iter().map(trim_whitespace).collect()
}
