//! Media queries.
//!
//! [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/)
//!
//! Only the features that depend on the viewport are evaluated. Anything
//! else parses to an unknown condition that evaluates to false.

use crate::syntax::{ComponentValue, split_on_commas};
use crate::tokenizer::CSSToken;
use crate::value::{AbsolutizeContext, Length, length_from_dimension};

/// What media queries are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaEnvironment {
    /// Viewport width in CSS pixels.
    pub width: f32,
    /// Viewport height in CSS pixels.
    pub height: f32,
}

impl Default for MediaEnvironment {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// [§ 2 Media Queries](https://www.w3.org/TR/mediaqueries-4/#media)
///
/// "A media query list is true if any of its component media queries are
/// true, and false only if all of its component media queries are false."
/// An empty list is true.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaQueryList {
    queries: Vec<MediaQuery>,
}

/// [§ 2.2 Media Types](https://www.w3.org/TR/mediaqueries-4/#media-types)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `all`
    All,
    /// `screen`
    Screen,
    /// `print`
    Print,
    /// Anything else. Never matches.
    Unknown,
}

/// One media query.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    negated: bool,
    media_type: MediaType,
    condition: Option<MediaCondition>,
}

/// [§ 3 Syntax](https://www.w3.org/TR/mediaqueries-4/#mq-syntax)
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCondition {
    /// `( <media-feature> )`
    Feature(MediaFeature),
    /// `not <media-in-parens>`
    Not(Box<MediaCondition>),
    /// `<media-in-parens> [ and <media-in-parens> ]+`
    And(Vec<MediaCondition>),
    /// `<media-in-parens> [ or <media-in-parens> ]+`
    Or(Vec<MediaCondition>),
    /// `<general-enclosed>`: parses, never matches.
    Unknown,
}

/// Features we can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureName {
    /// `width`
    Width,
    /// `height`
    Height,
    /// `aspect-ratio`
    AspectRatio,
    /// `orientation`
    Orientation,
    /// `prefers-color-scheme`
    PrefersColorScheme,
    /// `prefers-reduced-motion`
    PrefersReducedMotion,
}

/// A feature value as written.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// A `<length>`.
    Length(Length),
    /// A `<number>` or `<ratio>`.
    Number(f32),
    /// An identifier.
    Ident(String),
}

/// Comparison against the environment, from the feature's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparison {
    const fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }

    fn compare(self, actual: f32, expected: f32) -> bool {
        match self {
            Self::Eq => (actual - expected).abs() < f32::EPSILON,
            Self::Lt => actual < expected,
            Self::Le => actual <= expected,
            Self::Gt => actual > expected,
            Self::Ge => actual >= expected,
        }
    }
}

/// [§ 2.4 Media Features](https://www.w3.org/TR/mediaqueries-4/#mq-features)
///
/// `min-width: 10px` is stored as `width >= 10px`. No tests means the
/// feature is evaluated in a boolean context.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFeature {
    name: FeatureName,
    tests: Vec<(Comparison, FeatureValue)>,
}

impl MediaQueryList {
    /// A list that always matches.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// [§ 3 Syntax](https://www.w3.org/TR/mediaqueries-4/#mq-syntax)
    ///
    /// Queries that fail to parse become `not all`.
    #[must_use]
    pub fn parse(values: &[ComponentValue]) -> Self {
        if values.iter().all(ComponentValue::is_whitespace) {
            return Self::all();
        }
        let queries = split_on_commas(values)
            .iter()
            .map(|query| {
                MediaQuery::parse(query).unwrap_or(MediaQuery {
                    negated: true,
                    media_type: MediaType::All,
                    condition: None,
                })
            })
            .collect();
        Self { queries }
    }

    /// Evaluate against `environment`.
    #[must_use]
    pub fn matches(&self, environment: &MediaEnvironment) -> bool {
        self.queries.is_empty() || self.queries.iter().any(|q| q.matches(environment))
    }
}

impl MediaQuery {
    fn parse(values: &[ComponentValue]) -> Option<Self> {
        let items: Vec<&ComponentValue> = values.iter().filter(|v| !v.is_whitespace()).collect();
        let first = items.first()?;
        let starts_condition =
            matches!(first, ComponentValue::Block { token: '(', .. }) || is_ident(first, "not") && items.len() == 2;
        if starts_condition && let Some(condition) = parse_condition(&items) {
            return Some(Self {
                negated: false,
                media_type: MediaType::All,
                condition: Some(condition),
            });
        }
        let mut index = 0;
        let mut negated = false;
        if is_ident(items[index], "not") {
            negated = true;
            index += 1;
        } else if is_ident(items[index], "only") {
            index += 1;
        }
        let media_type = match items.get(index)?.as_ident()?.to_ascii_lowercase().as_str() {
            "all" => MediaType::All,
            "screen" => MediaType::Screen,
            "print" => MediaType::Print,
            "and" | "or" | "not" | "only" | "layer" => return None,
            _ => MediaType::Unknown,
        };
        index += 1;
        let condition = match items.get(index) {
            None => None,
            Some(and) if is_ident(and, "and") => {
                let rest = &items[index + 1..];
                // "or" is not allowed after a media type.
                if rest.iter().any(|v| is_ident(v, "or")) {
                    return None;
                }
                Some(parse_condition(rest)?)
            }
            Some(_) => return None,
        };
        Some(Self {
            negated,
            media_type,
            condition,
        })
    }

    fn matches(&self, environment: &MediaEnvironment) -> bool {
        let type_matches = matches!(self.media_type, MediaType::All | MediaType::Screen);
        let result = type_matches && self.condition.as_ref().is_none_or(|c| c.matches(environment));
        result != self.negated
    }
}

fn is_ident(value: &ComponentValue, ident: &str) -> bool {
    value.as_ident().is_some_and(|s| s.eq_ignore_ascii_case(ident))
}

/// Parse `<media-condition>` from significant component values.
fn parse_condition(items: &[&ComponentValue]) -> Option<MediaCondition> {
    match items {
        [] => None,
        [not, operand] if is_ident(not, "not") => Some(MediaCondition::Not(Box::new(parse_in_parens(operand)?))),
        [first, rest @ ..] => {
            let mut operands = vec![parse_in_parens(first)?];
            let mut combinator: Option<&str> = None;
            for pair in rest.chunks(2) {
                let [keyword, operand] = pair else {
                    return None;
                };
                let keyword = keyword.as_ident()?.to_ascii_lowercase();
                if !matches!(keyword.as_str(), "and" | "or") {
                    return None;
                }
                // Mixing "and" and "or" at one level is invalid.
                match combinator {
                    Some(existing) if existing != keyword => return None,
                    Some(_) => {}
                    None => combinator = Some(if keyword == "and" { "and" } else { "or" }),
                }
                operands.push(parse_in_parens(operand)?);
            }
            Some(match combinator {
                None => operands.pop()?,
                Some("and") => MediaCondition::And(operands),
                Some(_) => MediaCondition::Or(operands),
            })
        }
    }
}

/// `<media-in-parens> = ( <media-condition> ) | ( <media-feature> ) | <general-enclosed>`
fn parse_in_parens(value: &ComponentValue) -> Option<MediaCondition> {
    match value {
        ComponentValue::Block { token: '(', value } => {
            let inner: Vec<&ComponentValue> = value.iter().filter(|v| !v.is_whitespace()).collect();
            if let Some(condition) = parse_condition(&inner)
                && (inner.len() > 1 || matches!(inner.first(), Some(ComponentValue::Block { .. })))
            {
                return Some(condition);
            }
            Some(parse_feature(&inner).map_or(MediaCondition::Unknown, MediaCondition::Feature))
        }
        ComponentValue::Function { .. } => Some(MediaCondition::Unknown),
        _ => None,
    }
}

fn feature_name(ident: &str) -> Option<FeatureName> {
    Some(match ident.to_ascii_lowercase().as_str() {
        "width" => FeatureName::Width,
        "height" => FeatureName::Height,
        "aspect-ratio" => FeatureName::AspectRatio,
        "orientation" => FeatureName::Orientation,
        "prefers-color-scheme" => FeatureName::PrefersColorScheme,
        "prefers-reduced-motion" => FeatureName::PrefersReducedMotion,
        _ => return None,
    })
}

/// [§ 2.4.3 Range context](https://www.w3.org/TR/mediaqueries-4/#mq-range-context)
fn parse_feature(items: &[&ComponentValue]) -> Option<MediaFeature> {
    // Boolean context.
    if let [only] = items {
        return Some(MediaFeature {
            name: feature_name(only.as_ident()?)?,
            tests: Vec::new(),
        });
    }
    // Plain context, with min-/max- prefixes.
    if let [name, ComponentValue::Token(CSSToken::Colon), value @ ..] = items {
        let name = name.as_ident()?.to_ascii_lowercase();
        let (comparison, name) = if let Some(rest) = name.strip_prefix("min-") {
            (Comparison::Ge, rest)
        } else if let Some(rest) = name.strip_prefix("max-") {
            (Comparison::Le, rest)
        } else {
            (Comparison::Eq, name.as_str())
        };
        return Some(MediaFeature {
            name: feature_name(name)?,
            tests: vec![(comparison, parse_feature_value(value)?)],
        });
    }
    // Range context: split on comparison operators.
    let mut segments: Vec<Vec<&ComponentValue>> = vec![Vec::new()];
    let mut operators = Vec::new();
    let mut index = 0;
    while index < items.len() {
        let (operator, width) = match (items[index], items.get(index + 1)) {
            (ComponentValue::Token(CSSToken::Delim('<')), Some(ComponentValue::Token(CSSToken::Delim('=')))) => {
                (Some(Comparison::Le), 2)
            }
            (ComponentValue::Token(CSSToken::Delim('>')), Some(ComponentValue::Token(CSSToken::Delim('=')))) => {
                (Some(Comparison::Ge), 2)
            }
            (ComponentValue::Token(CSSToken::Delim('<')), _) => (Some(Comparison::Lt), 1),
            (ComponentValue::Token(CSSToken::Delim('>')), _) => (Some(Comparison::Gt), 1),
            (ComponentValue::Token(CSSToken::Delim('=')), _) => (Some(Comparison::Eq), 1),
            _ => (None, 1),
        };
        match operator {
            Some(operator) => {
                operators.push(operator);
                segments.push(Vec::new());
            }
            None => segments.last_mut()?.push(items[index]),
        }
        index += width;
    }
    match (segments.as_slice(), operators.as_slice()) {
        // <mf-name> <mf-comparison> <mf-value>
        ([name, value], [op]) if name.len() == 1 && name[0].as_ident().and_then(feature_name).is_some() => {
            Some(MediaFeature {
                name: feature_name(name[0].as_ident()?)?,
                tests: vec![(*op, parse_feature_value(value)?)],
            })
        }
        // <mf-value> <mf-comparison> <mf-name>
        ([value, name], [op]) if name.len() == 1 => Some(MediaFeature {
            name: feature_name(name[0].as_ident()?)?,
            tests: vec![(op.flipped(), parse_feature_value(value)?)],
        }),
        // <mf-value> <mf-lt> <mf-name> <mf-lt> <mf-value>
        ([low, name, high], [first, second]) if name.len() == 1 => {
            let ascending = matches!(first, Comparison::Lt | Comparison::Le);
            let same_direction = ascending == matches!(second, Comparison::Lt | Comparison::Le);
            if !same_direction || matches!(first, Comparison::Eq) || matches!(second, Comparison::Eq) {
                return None;
            }
            Some(MediaFeature {
                name: feature_name(name[0].as_ident()?)?,
                tests: vec![
                    (first.flipped(), parse_feature_value(low)?),
                    (*second, parse_feature_value(high)?),
                ],
            })
        }
        _ => None,
    }
}

fn parse_feature_value(items: &[&ComponentValue]) -> Option<FeatureValue> {
    match items {
        [ComponentValue::Token(CSSToken::Dimension { value, unit, .. })] => {
            length_from_dimension(*value, unit).map(FeatureValue::Length)
        }
        [ComponentValue::Token(CSSToken::Number { value, .. })] => Some(FeatureValue::Number(*value as f32)),
        [
            ComponentValue::Token(CSSToken::Number { value: numerator, .. }),
            ComponentValue::Token(CSSToken::Delim('/')),
            ComponentValue::Token(CSSToken::Number { value: denominator, .. }),
        ] if *denominator != 0.0 => Some(FeatureValue::Number((numerator / denominator) as f32)),
        [ident] => ident.as_ident().map(|s| FeatureValue::Ident(s.to_ascii_lowercase())),
        _ => None,
    }
}

impl MediaCondition {
    /// Evaluate against `environment`.
    #[must_use]
    pub fn matches(&self, environment: &MediaEnvironment) -> bool {
        match self {
            Self::Feature(feature) => feature.matches(environment),
            Self::Not(inner) => !inner.matches(environment),
            Self::And(operands) => operands.iter().all(|c| c.matches(environment)),
            Self::Or(operands) => operands.iter().any(|c| c.matches(environment)),
            Self::Unknown => false,
        }
    }
}

impl MediaFeature {
    fn matches(&self, environment: &MediaEnvironment) -> bool {
        let context = AbsolutizeContext {
            viewport: (environment.width, environment.height),
            ..AbsolutizeContext::default()
        };
        let ident = match self.name {
            FeatureName::Orientation => Some(if environment.height >= environment.width {
                "portrait"
            } else {
                "landscape"
            }),
            FeatureName::PrefersColorScheme => Some("light"),
            FeatureName::PrefersReducedMotion => Some("no-preference"),
            _ => None,
        };
        if let Some(actual) = ident {
            return match self.tests.as_slice() {
                [] => actual != "no-preference",
                [(Comparison::Eq, FeatureValue::Ident(expected))] => actual == expected.as_str(),
                _ => false,
            };
        }
        let actual = match self.name {
            FeatureName::Width => environment.width,
            FeatureName::Height => environment.height,
            _ if environment.height > 0.0 => environment.width / environment.height,
            _ => 0.0,
        };
        if self.tests.is_empty() {
            return actual != 0.0;
        }
        self.tests.iter().all(|(comparison, expected)| {
            let expected = match (self.name, expected) {
                (FeatureName::Width | FeatureName::Height, FeatureValue::Length(length)) => length.to_px(&context),
                (FeatureName::Width | FeatureName::Height, FeatureValue::Number(n)) if *n == 0.0 => 0.0,
                (FeatureName::AspectRatio, FeatureValue::Number(n)) => *n,
                _ => return false,
            };
            comparison.compare(actual, expected)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_component_values;

    fn matches(query: &str, width: f32, height: f32) -> bool {
        MediaQueryList::parse(&parse_component_values(query)).matches(&MediaEnvironment { width, height })
    }

    #[test]
    fn media_types() {
        assert!(matches("screen", 800.0, 600.0));
        assert!(matches("all", 800.0, 600.0));
        assert!(!matches("print", 800.0, 600.0));
        assert!(matches("not print", 800.0, 600.0));
        assert!(matches("print, screen", 800.0, 600.0));
    }

    #[test]
    fn min_and_max_width() {
        assert!(matches("screen and (min-width: 600px)", 800.0, 600.0));
        assert!(!matches("screen and (max-width: 600px)", 800.0, 600.0));
        assert!(matches("(min-width: 30em)", 800.0, 600.0));
    }

    #[test]
    fn range_syntax() {
        assert!(matches("(width >= 600px)", 800.0, 600.0));
        assert!(matches("(400px < width <= 800px)", 800.0, 600.0));
        assert!(!matches("(400px < width < 800px)", 800.0, 600.0));
        assert!(matches("(600px < width)", 800.0, 600.0));
    }

    #[test]
    fn orientation_and_logic() {
        assert!(matches("(orientation: landscape)", 800.0, 600.0));
        assert!(matches("(orientation: portrait) or (min-height: 100px)", 800.0, 600.0));
        assert!(matches("not (orientation: portrait)", 800.0, 600.0));
    }

    #[test]
    fn unknown_features_never_match() {
        assert!(!matches("(hover: hover)", 800.0, 600.0));
        assert!(!matches("screen and (min-width: 600px) or (x)", 800.0, 600.0));
    }
}
