//! Selector parsing from component values.
//!
//! [§ 18 Grammar](https://www.w3.org/TR/selectors-4/#grammar)

use wombat_common::warning::warn_once;

use super::{
    AnPlusB, AttributeOperator, AttributeSelector, CaseSensitivity, Combinator, CompoundSelector,
    NamespacePrefix, PseudoClass, PseudoClassKind, PseudoElement, RelativeSelector, Selector, SelectorList,
    SimpleSelector,
};
use crate::syntax::{ComponentValue, split_on_commas};
use crate::tokenizer::CSSToken;

/// Parse a `<selector-list>`. Any invalid selector invalidates the list.
///
/// A leading combinator (`> .child` inside a nested rule) is allowed and
/// makes the selector relative to `&`.
#[must_use]
pub fn parse_selector_list(values: &[ComponentValue]) -> Option<SelectorList> {
    split_on_commas(values)
        .iter()
        .map(|group| SelectorParser::new(group).parse_complex(Anchor::Nesting))
        .collect()
}

/// Parse a `<relative-selector-list>` as used by `:has()`.
#[must_use]
pub fn parse_relative_selector_list(values: &[ComponentValue]) -> Option<Vec<RelativeSelector>> {
    split_on_commas(values)
        .iter()
        .map(|group| SelectorParser::new(group).parse_complex(Anchor::Relative))
        .collect()
}

/// [§ 3.5 Forgiving selector list](https://www.w3.org/TR/selectors-4/#typedef-forgiving-selector-list)
fn parse_forgiving_selector_list(values: &[ComponentValue]) -> SelectorList {
    split_on_commas(values)
        .iter()
        .filter_map(|group| SelectorParser::new(group).parse_complex(Anchor::Nesting))
        .collect()
}

/// What a leading combinator attaches to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Nesting,
    Relative,
}

struct SelectorParser<'a> {
    values: &'a [ComponentValue],
    position: usize,
}

impl<'a> SelectorParser<'a> {
    const fn new(values: &'a [ComponentValue]) -> Self {
        Self { values, position: 0 }
    }

    fn peek(&self) -> Option<&'a ComponentValue> {
        self.values.get(self.position)
    }

    fn peek_token(&self) -> Option<&'a CSSToken> {
        match self.peek()? {
            ComponentValue::Token(token) => Some(token),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<&'a ComponentValue> {
        let value = self.values.get(self.position)?;
        self.position += 1;
        Some(value)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(ComponentValue::is_whitespace) {
            self.position += 1;
        }
        self.position > start
    }

    fn peek_combinator(&self) -> Option<Combinator> {
        match self.peek_token()? {
            CSSToken::Delim('>') => Some(Combinator::Child),
            CSSToken::Delim('+') => Some(Combinator::NextSibling),
            CSSToken::Delim('~') => Some(Combinator::SubsequentSibling),
            _ => None,
        }
    }

    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    fn parse_complex(&mut self, anchor: Anchor) -> Option<Selector> {
        let mut compounds: Vec<CompoundSelector> = Vec::new();
        let mut combinators: Vec<Combinator> = Vec::new();
        let mut leading = None;
        let mut pending: Option<Combinator> = None;

        loop {
            let saw_whitespace = self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            if let Some(combinator) = self.peek_combinator() {
                self.position += 1;
                if pending.is_some() {
                    return None;
                }
                if compounds.is_empty() {
                    if leading.is_some() {
                        return None;
                    }
                    leading = Some(combinator);
                } else {
                    pending = Some(combinator);
                }
                continue;
            }
            let compound = self.parse_compound()?;
            if !compounds.is_empty() {
                let combinator = match pending.take() {
                    Some(combinator) => combinator,
                    None if saw_whitespace => Combinator::Descendant,
                    None => return None,
                };
                combinators.push(combinator);
            }
            compounds.push(compound);
        }

        if pending.is_some() {
            return None;
        }
        let leading = match (leading, anchor) {
            (Some(combinator), _) => Some(combinator),
            (None, Anchor::Relative) => Some(Combinator::Descendant),
            (None, Anchor::Nesting) => None,
        };
        if let Some(combinator) = leading {
            let anchor_selector = match anchor {
                Anchor::Nesting => SimpleSelector::Nesting,
                Anchor::Relative => SimpleSelector::RelativeAnchor,
            };
            compounds.insert(
                0,
                CompoundSelector {
                    simple_selectors: vec![anchor_selector],
                },
            );
            combinators.insert(0, combinator);
        }

        let subject = compounds.pop()?;
        let mut chain = Vec::with_capacity(compounds.len());
        while let Some(compound) = compounds.pop() {
            chain.push((combinators.pop()?, compound));
        }
        Some(Selector {
            subject,
            combinators: chain,
        })
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    fn parse_compound(&mut self) -> Option<CompoundSelector> {
        let mut simple_selectors = Vec::new();
        if let Some(type_selector) = self.parse_type_selector() {
            simple_selectors.push(type_selector?);
        }
        loop {
            let simple = match self.peek() {
                Some(ComponentValue::Token(CSSToken::Hash { value, is_id })) => {
                    if !is_id {
                        return None;
                    }
                    self.position += 1;
                    SimpleSelector::Id(value.clone())
                }
                Some(ComponentValue::Token(CSSToken::Delim('.'))) => {
                    self.position += 1;
                    let ComponentValue::Token(CSSToken::Ident(class)) = self.next()? else {
                        return None;
                    };
                    SimpleSelector::Class(class.clone())
                }
                Some(ComponentValue::Token(CSSToken::Delim('&'))) => {
                    self.position += 1;
                    SimpleSelector::Nesting
                }
                Some(ComponentValue::Block { token: '[', value }) => {
                    self.position += 1;
                    SimpleSelector::Attribute(parse_attribute(value)?)
                }
                Some(ComponentValue::Token(CSSToken::Colon)) => {
                    self.position += 1;
                    self.parse_pseudo()?
                }
                _ => break,
            };
            simple_selectors.push(simple);
        }
        if simple_selectors.is_empty() {
            return None;
        }
        Some(CompoundSelector { simple_selectors })
    }

    /// `[ns|]name`, `[ns|]*`. Returns `None` when the next tokens are not a
    /// type selector, `Some(None)` when they are malformed.
    fn parse_type_selector(&mut self) -> Option<Option<SimpleSelector>> {
        let first = match self.peek_token()? {
            CSSToken::Ident(name) => Some(name.clone()),
            CSSToken::Delim('*') => None,
            CSSToken::Delim('|') => {
                self.position += 1;
                return Some(self.parse_type_name(NamespacePrefix::None));
            }
            _ => return None,
        };
        self.position += 1;
        if self.peek_token() == Some(&CSSToken::Delim('|')) {
            self.position += 1;
            let namespace = match first {
                Some(prefix) => NamespacePrefix::Named(prefix),
                None => NamespacePrefix::Any,
            };
            return Some(self.parse_type_name(namespace));
        }
        Some(Some(match first {
            Some(name) => SimpleSelector::Type {
                name: name.to_ascii_lowercase(),
                namespace: NamespacePrefix::Default,
            },
            None => SimpleSelector::Universal(NamespacePrefix::Default),
        }))
    }

    fn parse_type_name(&mut self, namespace: NamespacePrefix) -> Option<SimpleSelector> {
        match self.next()? {
            ComponentValue::Token(CSSToken::Ident(name)) => Some(SimpleSelector::Type {
                name: name.to_ascii_lowercase(),
                namespace,
            }),
            ComponentValue::Token(CSSToken::Delim('*')) => Some(SimpleSelector::Universal(namespace)),
            _ => None,
        }
    }

    /// After the first `:`.
    fn parse_pseudo(&mut self) -> Option<SimpleSelector> {
        if self.peek_token() == Some(&CSSToken::Colon) {
            self.position += 1;
            return match self.next()? {
                ComponentValue::Token(CSSToken::Ident(name)) => Some(name.parse::<PseudoElement>().map_or_else(
                    |_| SimpleSelector::UnknownPseudoElement(name.to_ascii_lowercase()),
                    SimpleSelector::PseudoElement,
                )),
                ComponentValue::Function { name, .. } => {
                    Some(SimpleSelector::UnknownPseudoElement(name.to_ascii_lowercase()))
                }
                _ => None,
            };
        }
        match self.next()? {
            ComponentValue::Token(CSSToken::Ident(name)) => parse_pseudo_class_ident(name),
            ComponentValue::Function { name, value } => {
                parse_functional_pseudo_class(name, value).map(SimpleSelector::PseudoClass)
            }
            _ => None,
        }
    }
}

fn parse_pseudo_class_ident(name: &str) -> Option<SimpleSelector> {
    // [§ 3.6.1](https://www.w3.org/TR/selectors-4/#pseudo-element-syntax)
    // "for compatibility with existing style sheets, user agents must also
    // accept the previous one-colon notation for pseudo-elements introduced
    // in CSS levels 1 and 2"
    if let Ok(pseudo) = name.parse::<PseudoElement>()
        && pseudo.has_legacy_single_colon_form()
    {
        return Some(SimpleSelector::PseudoElement(pseudo));
    }
    let kind = name.parse::<PseudoClassKind>().ok().filter(|kind| {
        !matches!(
            kind,
            PseudoClassKind::NthChild
                | PseudoClassKind::NthLastChild
                | PseudoClassKind::NthOfType
                | PseudoClassKind::NthLastOfType
                | PseudoClassKind::Is
                | PseudoClassKind::Where
                | PseudoClassKind::Not
                | PseudoClassKind::Has
        )
    });
    let Some(kind) = kind else {
        warn_once("CSS", &format!("unsupported pseudo-class ':{name}'"));
        return None;
    };
    Some(SimpleSelector::PseudoClass(if kind == PseudoClassKind::Host {
        PseudoClass::Host(None)
    } else {
        PseudoClass::Simple(kind)
    }))
}

fn parse_functional_pseudo_class(name: &str, args: &[ComponentValue]) -> Option<PseudoClass> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "is" | "matches" | "-webkit-any" => Some(PseudoClass::Is(parse_forgiving_selector_list(args))),
        "where" => Some(PseudoClass::Where(parse_forgiving_selector_list(args))),
        "not" => Some(PseudoClass::Not(parse_selector_list(args)?)),
        "has" => Some(PseudoClass::Has(parse_relative_selector_list(args)?)),
        "host" => Some(PseudoClass::Host(Some(parse_selector_list(args)?))),
        "nth-child" | "nth-last-child" => {
            let of_position = args.iter().position(|v| v.as_ident().is_some_and(|s| s.eq_ignore_ascii_case("of")));
            let (step, filter) = match of_position {
                Some(position) => (
                    parse_an_plus_b(&args[..position])?,
                    Some(parse_selector_list(&args[position + 1..])?),
                ),
                None => (parse_an_plus_b(args)?, None),
            };
            Some(if lower == "nth-child" {
                PseudoClass::NthChild(step, filter)
            } else {
                PseudoClass::NthLastChild(step, filter)
            })
        }
        "nth-of-type" => Some(PseudoClass::NthOfType(parse_an_plus_b(args)?)),
        "nth-last-of-type" => Some(PseudoClass::NthLastOfType(parse_an_plus_b(args)?)),
        _ => {
            warn_once("CSS", &format!("unsupported pseudo-class ':{lower}()'"));
            None
        }
    }
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
fn parse_attribute(values: &[ComponentValue]) -> Option<AttributeSelector> {
    let mut parser = SelectorParser::new(values);
    let _ = parser.skip_whitespace();
    let ComponentValue::Token(CSSToken::Ident(mut name)) = parser.next()?.clone() else {
        return None;
    };
    // A namespace prefix on the attribute name is accepted and ignored.
    if parser.peek_token() == Some(&CSSToken::Delim('|'))
        && let Some(ComponentValue::Token(CSSToken::Ident(local))) = parser.values.get(parser.position + 1)
    {
        name.clone_from(local);
        parser.position += 2;
    }
    let name = name.to_ascii_lowercase();
    let _ = parser.skip_whitespace();
    let Some(first) = parser.next() else {
        return Some(AttributeSelector {
            name,
            operator: AttributeOperator::Exists,
            value: String::new(),
            case: CaseSensitivity::Default,
        });
    };
    let operator = match first {
        ComponentValue::Token(CSSToken::Delim('=')) => AttributeOperator::Equals,
        ComponentValue::Token(CSSToken::Delim(c)) => {
            let operator = match c {
                '~' => AttributeOperator::Includes,
                '|' => AttributeOperator::DashMatch,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                '*' => AttributeOperator::Substring,
                _ => return None,
            };
            if parser.next()? != &ComponentValue::Token(CSSToken::Delim('=')) {
                return None;
            }
            operator
        }
        _ => return None,
    };
    let _ = parser.skip_whitespace();
    let value = match parser.next()? {
        ComponentValue::Token(CSSToken::Ident(value) | CSSToken::String(value)) => value.clone(),
        _ => return None,
    };
    let _ = parser.skip_whitespace();
    let case = match parser.next() {
        None => CaseSensitivity::Default,
        Some(flag) => match flag.as_ident().map(str::to_ascii_lowercase).as_deref() {
            Some("i") => CaseSensitivity::Insensitive,
            Some("s") => CaseSensitivity::Sensitive,
            _ => return None,
        },
    };
    let _ = parser.skip_whitespace();
    if parser.peek().is_some() {
        return None;
    }
    Some(AttributeSelector {
        name,
        operator,
        value,
        case,
    })
}

/// [§ 6 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
///
/// The tokenizer splits `2n+1` in several ways depending on spacing, so the
/// tokens are written back to text first.
fn parse_an_plus_b(values: &[ComponentValue]) -> Option<AnPlusB> {
    let mut text = String::new();
    for value in values.iter().filter(|v| !v.is_whitespace()) {
        match value {
            ComponentValue::Token(CSSToken::Number { value, is_integer: true }) => {
                if !text.is_empty() && !text.ends_with(['+', '-']) && *value >= 0.0 {
                    text.push('+');
                }
                text.push_str(&format!("{value}"));
            }
            ComponentValue::Token(
                token @ (CSSToken::Dimension { is_integer: true, .. } | CSSToken::Ident(_) | CSSToken::Delim('+' | '-')),
            ) => text.push_str(&token.to_string()),
            _ => return None,
        }
    }
    let text = text.to_ascii_lowercase();
    match text.as_str() {
        "odd" => return Some(AnPlusB { a: 2, b: 1 }),
        "even" => return Some(AnPlusB { a: 2, b: 0 }),
        _ => {}
    }
    let Some(n) = text.find('n') else {
        return Some(AnPlusB { a: 0, b: text.parse().ok()? });
    };
    let a = match &text[..n] {
        "" | "+" => 1,
        "-" => -1,
        coefficient => coefficient.parse().ok()?,
    };
    let rest = &text[n + 1..];
    let b = if rest.is_empty() { 0 } else { rest.parse().ok()? };
    Some(AnPlusB { a, b })
}
