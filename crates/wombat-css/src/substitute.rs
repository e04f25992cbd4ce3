//! Arbitrary substitution functions: `var()`, `env()` and `attr()`.
//!
//! [CSS Custom Properties for Cascading Variables Level 1 § 3](https://www.w3.org/TR/css-variables-1/#using-variables)
//!
//! "If a property value contains one or more `var()` functions, and those
//! functions are syntactically valid, the entire property's grammar must be
//! assumed to be valid at parse time. It is only syntax-checked at
//! computed-value time, after `var()` functions have been substituted."

use crate::syntax::{ComponentValue, trim_whitespace};
use crate::tokenizer::CSSToken;
use crate::value::length_from_dimension;

/// Nesting limit for fallbacks and nested blocks.
const MAX_SUBSTITUTION_DEPTH: u32 = 32;

const SUBSTITUTION_FUNCTIONS: [&str; 3] = ["var", "env", "attr"];

/// Where substituted values come from.
pub trait SubstitutionSource {
    /// The computed value of a custom property, already substituted.
    /// `None` means the property is absent or guaranteed-invalid.
    fn custom_property(&self, name: &str) -> Option<&[ComponentValue]>;

    /// An attribute of the element the value applies to.
    fn attribute(&self, name: &str) -> Option<&str>;
}

/// Whether `values` contain `var()`, `env()` or `attr()` at any depth.
#[must_use]
pub fn contains_arbitrary_substitution_function(values: &[ComponentValue]) -> bool {
    values.iter().any(|value| match value {
        ComponentValue::Function { name, value } => {
            SUBSTITUTION_FUNCTIONS.iter().any(|f| name.eq_ignore_ascii_case(f))
                || contains_arbitrary_substitution_function(value)
        }
        ComponentValue::Block { value, .. } => contains_arbitrary_substitution_function(value),
        ComponentValue::Token(_) => false,
    })
}

/// Names of the custom properties referenced by `var()` in `values`,
/// including those inside fallbacks.
#[must_use]
pub fn referenced_custom_properties(values: &[ComponentValue]) -> Vec<String> {
    let mut names = Vec::new();
    collect_references(values, &mut names);
    names
}

fn collect_references(values: &[ComponentValue], out: &mut Vec<String>) {
    for value in values {
        match value {
            ComponentValue::Function { name, value } => {
                if name.eq_ignore_ascii_case("var") {
                    let (referenced, _) = split_arguments(value);
                    if let Some(referenced) = referenced.and_then(|v| v.as_ident().map(str::to_string)) {
                        out.push(referenced);
                    }
                }
                collect_references(value, out);
            }
            ComponentValue::Block { value, .. } => collect_references(value, out),
            ComponentValue::Token(_) => {}
        }
    }
}

/// [§ 3.1 Substitute arbitrary substitution functions](https://drafts.csswg.org/css-values-5/#substitute-arbitrary-substitution-function)
///
/// Returns `None` when the value is invalid at computed-value time.
#[must_use]
pub fn substitute(values: &[ComponentValue], source: &dyn SubstitutionSource) -> Option<Vec<ComponentValue>> {
    substitute_at_depth(values, source, 0)
}

fn substitute_at_depth(
    values: &[ComponentValue],
    source: &dyn SubstitutionSource,
    depth: u32,
) -> Option<Vec<ComponentValue>> {
    if depth > MAX_SUBSTITUTION_DEPTH {
        return None;
    }
    let mut result = Vec::with_capacity(values.len());
    for value in values {
        match value {
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("var") => {
                let (referenced, fallback) = split_arguments(value);
                let referenced = referenced?.as_ident()?;
                if !referenced.starts_with("--") {
                    return None;
                }
                if let Some(replacement) = source.custom_property(referenced) {
                    result.extend(replacement.iter().cloned());
                } else {
                    result.extend(substitute_at_depth(&fallback?, source, depth + 1)?);
                }
            }
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("env") => {
                let (variable, fallback) = split_arguments(value);
                if let Some(replacement) = environment_variable(variable?.as_ident()?) {
                    result.push(replacement);
                } else {
                    result.extend(substitute_at_depth(&fallback?, source, depth + 1)?);
                }
            }
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("attr") => {
                let (attribute, fallback) = split_arguments(value);
                let attribute = attribute?;
                let attribute_name = attribute.as_ident()?;
                let attribute_type = value
                    .iter()
                    .filter(|v| !v.is_whitespace())
                    .take_while(|v| !matches!(v, ComponentValue::Token(CSSToken::Comma)))
                    .nth(1);
                let substituted = source
                    .attribute(attribute_name)
                    .and_then(|text| typed_attribute(text, attribute_type));
                match substituted {
                    Some(replacement) => result.push(replacement),
                    None => result.extend(substitute_at_depth(&fallback?, source, depth + 1)?),
                }
            }
            ComponentValue::Function { name, value } => result.push(ComponentValue::Function {
                name: name.clone(),
                value: substitute_at_depth(value, source, depth + 1)?,
            }),
            ComponentValue::Block { token, value } => result.push(ComponentValue::Block {
                token: *token,
                value: substitute_at_depth(value, source, depth + 1)?,
            }),
            token @ ComponentValue::Token(_) => result.push(token.clone()),
        }
    }
    Some(result)
}

/// Split `name [, fallback]`. The fallback is everything after the first
/// top-level comma, so `var(--foo, red, blue)` falls back to `red, blue`.
fn split_arguments(args: &[ComponentValue]) -> (Option<&ComponentValue>, Option<Vec<ComponentValue>>) {
    let first = args.iter().find(|v| !v.is_whitespace());
    let fallback = args
        .iter()
        .position(|v| matches!(v, ComponentValue::Token(CSSToken::Comma)))
        .map(|comma| trim_whitespace(args[comma + 1..].to_vec()));
    (first, fallback)
}

/// [§ 3 Environment Variables](https://drafts.csswg.org/css-env-1/#safe-area-insets)
fn environment_variable(name: &str) -> Option<ComponentValue> {
    const ZERO_INSETS: [&str; 4] = [
        "safe-area-inset-top",
        "safe-area-inset-right",
        "safe-area-inset-bottom",
        "safe-area-inset-left",
    ];
    ZERO_INSETS
        .iter()
        .any(|inset| name.eq_ignore_ascii_case(inset))
        .then(|| {
            ComponentValue::Token(CSSToken::Dimension {
                value: 0.0,
                is_integer: true,
                unit: "px".to_string(),
            })
        })
}

/// [§ 7.5 Attribute References](https://drafts.csswg.org/css-values-5/#attr-notation)
///
/// Without a type the attribute is substituted as a string. A unit or
/// `number` type parses the attribute text as a number.
fn typed_attribute(text: &str, attribute_type: Option<&ComponentValue>) -> Option<ComponentValue> {
    let Some(attribute_type) = attribute_type else {
        return Some(ComponentValue::Token(CSSToken::String(text.to_string())));
    };
    let number: f64 = text.trim().parse().ok()?;
    match attribute_type {
        ComponentValue::Token(CSSToken::Ident(kind)) if kind.eq_ignore_ascii_case("number") => {
            Some(ComponentValue::Token(CSSToken::Number {
                value: number,
                is_integer: number.fract() == 0.0,
            }))
        }
        ComponentValue::Token(CSSToken::Delim('%')) => Some(ComponentValue::Token(CSSToken::Percentage(number))),
        ComponentValue::Token(CSSToken::Ident(unit)) => {
            let _ = length_from_dimension(number, unit)?;
            Some(ComponentValue::Token(CSSToken::Dimension {
                value: number,
                is_integer: number.fract() == 0.0,
                unit: unit.to_ascii_lowercase(),
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::syntax::{parse_component_values, serialize};

    #[derive(Default)]
    struct Source {
        custom: HashMap<String, Vec<ComponentValue>>,
        attributes: HashMap<String, String>,
    }

    impl SubstitutionSource for Source {
        fn custom_property(&self, name: &str) -> Option<&[ComponentValue]> {
            self.custom.get(name).map(Vec::as_slice)
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes.get(name).map(String::as_str)
        }
    }

    fn substituted(css: &str, source: &Source) -> Option<String> {
        substitute(&parse_component_values(css), source).map(|values| serialize(&values))
    }

    #[test]
    fn var_uses_value_then_fallback() {
        let mut source = Source::default();
        let _ = source.custom.insert("--a".into(), parse_component_values("10px"));
        assert_eq!(substituted("var(--a)", &source).as_deref(), Some("10px"));
        assert_eq!(substituted("var(--b, red, blue)", &source).as_deref(), Some("red, blue"));
        assert_eq!(substituted("var(--b)", &source), None);
    }

    #[test]
    fn nested_functions_are_substituted() {
        let mut source = Source::default();
        let _ = source.custom.insert("--x".into(), parse_component_values("2px"));
        assert_eq!(substituted("calc(var(--x) + 1px)", &source).as_deref(), Some("calc(2px + 1px)"));
    }

    #[test]
    fn attr_and_env() {
        let mut source = Source::default();
        let _ = source.attributes.insert("data-w".into(), "12".into());
        assert_eq!(substituted("attr(data-w px)", &source).as_deref(), Some("12px"));
        assert_eq!(substituted("attr(data-w)", &source).as_deref(), Some("\"12\""));
        assert_eq!(substituted("attr(missing, 3px)", &source).as_deref(), Some("3px"));
        assert_eq!(substituted("env(safe-area-inset-top)", &source).as_deref(), Some("0px"));
    }

    #[test]
    fn test_attr_with_unknown_unit_uses_fallback() {
        let mut source = Source::default();
        let _ = source.attributes.insert("data-w".into(), "12".into());
        assert_eq!(substituted("attr(data-w furlong, 3px)", &source).as_deref(), Some("3px"));
        assert_eq!(substituted("attr(data-w EM)", &source).as_deref(), Some("12em"));
        assert_eq!(substituted("attr(data-w furlong)", &source), None);
    }

    #[test]
    fn detection_and_references() {
        let values = parse_component_values("calc(var(--a) + var(--b, var(--c)))");
        assert!(contains_arbitrary_substitution_function(&values));
        assert_eq!(referenced_custom_properties(&values), ["--a", "--b", "--c"]);
        assert!(!contains_arbitrary_substitution_function(&parse_component_values("1px solid")));
    }
}
