//! `@supports` conditions.
//!
//! [CSS Conditional Rules Level 3 § 6](https://www.w3.org/TR/css-conditional-3/#at-supports)
//!
//! Conditions are evaluated once, when the rule is interpreted: the answer
//! only depends on what this engine can parse.

use crate::parse_value::parse_css_value;
use crate::property::{PropertyId, is_custom_property_name};
use crate::selector::parse_selector_list;
use crate::syntax::ComponentValue;
use crate::tokenizer::CSSToken;

/// [§ 6.1 Definition of support](https://www.w3.org/TR/css-conditional-3/#support-definition)
///
/// Returns `None` when the condition does not parse, which makes the whole
/// `@supports` rule invalid.
#[must_use]
pub fn evaluate_supports_condition(values: &[ComponentValue]) -> Option<bool> {
    let items: Vec<&ComponentValue> = values.iter().filter(|v| !v.is_whitespace()).collect();
    evaluate_condition(&items)
}

fn is_ident(value: &ComponentValue, ident: &str) -> bool {
    value.as_ident().is_some_and(|s| s.eq_ignore_ascii_case(ident))
}

/// `not <supports-in-parens> | <supports-in-parens> [ and | or <supports-in-parens> ]*`
fn evaluate_condition(items: &[&ComponentValue]) -> Option<bool> {
    match items {
        [] => None,
        [not, operand] if is_ident(not, "not") => evaluate_in_parens(operand).map(|b| !b),
        [first, rest @ ..] => {
            let mut result = evaluate_in_parens(first)?;
            let mut combinator: Option<bool> = None;
            for pair in rest.chunks(2) {
                let [keyword, operand] = pair else {
                    return None;
                };
                let is_and = if is_ident(keyword, "and") {
                    true
                } else if is_ident(keyword, "or") {
                    false
                } else {
                    return None;
                };
                if combinator.is_some_and(|c| c != is_and) {
                    return None;
                }
                combinator = Some(is_and);
                let operand = evaluate_in_parens(operand)?;
                result = if is_and { result && operand } else { result || operand };
            }
            Some(result)
        }
    }
}

/// `( <supports-condition> ) | <supports-feature> | <general-enclosed>`
fn evaluate_in_parens(value: &ComponentValue) -> Option<bool> {
    match value {
        ComponentValue::Block { token: '(', value } => {
            let inner: Vec<&ComponentValue> = value.iter().filter(|v| !v.is_whitespace()).collect();
            if let [ComponentValue::Token(CSSToken::Ident(_)), ComponentValue::Token(CSSToken::Colon), ..] =
                inner.as_slice()
            {
                return Some(supports_declaration(value));
            }
            evaluate_condition(&inner).or(Some(false))
        }
        // "selector(<complex-selector>)"
        ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("selector") => {
            Some(parse_selector_list(value).is_some_and(|list| list.len() == 1))
        }
        ComponentValue::Function { .. } => Some(false),
        _ => None,
    }
}

/// `<supports-decl> = ( <declaration> )`
fn supports_declaration(values: &[ComponentValue]) -> bool {
    let Some(colon) = values
        .iter()
        .position(|v| matches!(v, ComponentValue::Token(CSSToken::Colon)))
    else {
        return false;
    };
    let Some(name) = values[..colon].iter().find_map(ComponentValue::as_ident) else {
        return false;
    };
    let value = &values[colon + 1..];
    if is_custom_property_name(name) {
        return true;
    }
    PropertyId::parse(name).is_some_and(|property| parse_css_value(property, value).is_some())
}

#[cfg(test)]
mod tests {
    use super::evaluate_supports_condition;
    use crate::syntax::parse_component_values;

    fn supports(text: &str) -> Option<bool> {
        evaluate_supports_condition(&parse_component_values(text))
    }

    #[test]
    fn declarations() {
        assert_eq!(supports("(display: flex)"), Some(true));
        assert_eq!(supports("(display: banana)"), Some(false));
        assert_eq!(supports("(not-a-property: 1)"), Some(false));
        assert_eq!(supports("(--anything: whatever)"), Some(true));
    }

    #[test]
    fn logic() {
        assert_eq!(supports("not (display: banana)"), Some(true));
        assert_eq!(supports("(display: flex) and (color: red)"), Some(true));
        assert_eq!(supports("(display: banana) or (color: red)"), Some(true));
        assert_eq!(supports("(display: flex) and (color: red) or (x: y)"), None);
    }

    #[test]
    fn selector_function() {
        assert_eq!(supports("selector(a > b)"), Some(true));
        assert_eq!(supports("selector(:banana)"), Some(false));
    }
}
