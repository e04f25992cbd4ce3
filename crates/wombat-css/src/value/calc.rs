//! Math functions: `calc()`, `min()`, `max()` and `clamp()`.
//!
//! [§ 10 Mathematical Expressions](https://www.w3.org/TR/css-values-4/#math)

use serde::Serialize;

use super::{AbsolutizeContext, Length, StyleValue, Time, length_from_dimension, time_from_dimension};
use crate::syntax::ComponentValue;
use crate::tokenizer::CSSToken;

/// [§ 10.3 Calculation Trees](https://www.w3.org/TR/css-values-4/#calc-internal)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "kebab-case")]
pub enum CalcNode {
    /// A `<number>` leaf.
    Number(f32),
    /// A `<percentage>` leaf.
    Percentage(f32),
    /// A `<length>` leaf.
    Length(Length),
    /// A `<time>` leaf.
    Time(Time),
    /// Sum of the children.
    Sum(Vec<CalcNode>),
    /// Product of the children.
    Product(Vec<CalcNode>),
    /// Negation.
    Negate(Box<CalcNode>),
    /// Reciprocal.
    Invert(Box<CalcNode>),
    /// `min()`
    Min(Vec<CalcNode>),
    /// `max()`
    Max(Vec<CalcNode>),
    /// `clamp(min, value, max)`
    Clamp(Box<CalcNode>, Box<CalcNode>, Box<CalcNode>),
}

/// Parse a math function. Returns the simplified tree.
#[must_use]
pub fn parse_calc(value: &ComponentValue) -> Option<CalcNode> {
    let ComponentValue::Function { name, value: args } = value else {
        return None;
    };
    let node = match name.to_ascii_lowercase().as_str() {
        "calc" => parse_sum(&significant(args))?,
        "min" => CalcNode::Min(parse_arguments(args)?),
        "max" => CalcNode::Max(parse_arguments(args)?),
        "clamp" => {
            let mut arguments = parse_arguments(args)?;
            if arguments.len() != 3 {
                return None;
            }
            let max = arguments.pop()?;
            let center = arguments.pop()?;
            let min = arguments.pop()?;
            CalcNode::Clamp(Box::new(min), Box::new(center), Box::new(max))
        }
        _ => return None,
    };
    Some(node.simplify())
}

fn significant(values: &[ComponentValue]) -> Vec<&ComponentValue> {
    values.iter().filter(|v| !v.is_whitespace()).collect()
}

fn parse_arguments(args: &[ComponentValue]) -> Option<Vec<CalcNode>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for arg in args {
        if matches!(arg, ComponentValue::Token(CSSToken::Comma)) {
            out.push(parse_sum(&current)?);
            current.clear();
        } else if !arg.is_whitespace() {
            current.push(arg);
        }
    }
    out.push(parse_sum(&current)?);
    Some(out)
}

/// `<calc-sum> = <calc-product> [ [ '+' | '-' ] <calc-product> ]*`
fn parse_sum(values: &[&ComponentValue]) -> Option<CalcNode> {
    let mut terms = Vec::new();
    let mut start = 0;
    let mut negate_next = false;
    for (i, value) in values.iter().enumerate() {
        let sign = match value {
            ComponentValue::Token(CSSToken::Delim('+')) => false,
            ComponentValue::Token(CSSToken::Delim('-')) => true,
            _ => continue,
        };
        let product = parse_product(&values[start..i])?;
        terms.push(if negate_next { CalcNode::Negate(Box::new(product)) } else { product });
        negate_next = sign;
        start = i + 1;
    }
    let product = parse_product(&values[start..])?;
    terms.push(if negate_next { CalcNode::Negate(Box::new(product)) } else { product });
    Some(if terms.len() == 1 { terms.pop()? } else { CalcNode::Sum(terms) })
}

/// `<calc-product> = <calc-value> [ [ '*' | '/' ] <calc-value> ]*`
fn parse_product(values: &[&ComponentValue]) -> Option<CalcNode> {
    let (first, rest) = values.split_first()?;
    let mut factors = vec![parse_value(first)?];
    for pair in rest.chunks(2) {
        let [operator, operand] = pair else {
            return None;
        };
        let operand = parse_value(operand)?;
        match operator {
            ComponentValue::Token(CSSToken::Delim('*')) => factors.push(operand),
            ComponentValue::Token(CSSToken::Delim('/')) => factors.push(CalcNode::Invert(Box::new(operand))),
            _ => return None,
        }
    }
    Some(if factors.len() == 1 { factors.pop()? } else { CalcNode::Product(factors) })
}

fn parse_value(value: &ComponentValue) -> Option<CalcNode> {
    match value {
        ComponentValue::Token(CSSToken::Number { value, .. }) => Some(CalcNode::Number(*value as f32)),
        ComponentValue::Token(CSSToken::Percentage(value)) => Some(CalcNode::Percentage(*value as f32)),
        ComponentValue::Token(CSSToken::Dimension { value, unit, .. }) => length_from_dimension(*value, unit)
            .map(CalcNode::Length)
            .or_else(|| time_from_dimension(*value, unit).map(CalcNode::Time)),
        ComponentValue::Block { token: '(', value } => parse_sum(&significant(value)),
        ComponentValue::Function { .. } => parse_calc(value),
        _ => None,
    }
}

impl CalcNode {
    const fn is_leaf(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Percentage(_) | Self::Length(_) | Self::Time(_))
    }

    /// Leaves that can be added or compared directly.
    fn same_unit(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(_), Self::Number(_))
            | (Self::Percentage(_), Self::Percentage(_))
            | (Self::Time(_), Self::Time(_)) => true,
            (Self::Length(a), Self::Length(b)) => a.unit == b.unit,
            _ => false,
        }
    }

    /// Magnitude of a leaf, in its own unit.
    fn leaf_value(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::Percentage(n) => Some(f64::from(*n)),
            Self::Length(length) => Some(f64::from(length.value)),
            Self::Time(time) => Some(time.ms),
            _ => None,
        }
    }

    /// A leaf of the same kind with a different magnitude.
    fn with_leaf_value(&self, value: f64) -> Self {
        match self {
            Self::Number(_) => Self::Number(value as f32),
            Self::Percentage(_) => Self::Percentage(value as f32),
            Self::Length(length) => Self::Length(Length {
                value: value as f32,
                unit: length.unit,
            }),
            Self::Time(_) => Self::Time(Time { ms: value }),
            other => other.clone(),
        }
    }

    /// [§ 10.10.1 Simplification](https://www.w3.org/TR/css-values-4/#calc-simplification)
    ///
    /// Folds like-unit leaves and numeric factors. The result is a fixed
    /// point: simplifying it again yields the same tree.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Number(_) | Self::Percentage(_) | Self::Length(_) | Self::Time(_) => self,
            Self::Negate(inner) => Self::Product(vec![Self::Number(-1.0), *inner]).simplify(),
            Self::Invert(inner) => match inner.simplify() {
                Self::Number(n) if n != 0.0 => Self::Number(1.0 / n),
                Self::Invert(inner) => *inner,
                other => Self::Invert(Box::new(other)),
            },
            Self::Sum(children) => {
                let mut terms: Vec<Self> = Vec::new();
                for child in children {
                    match child.simplify() {
                        Self::Sum(inner) => terms.extend(inner),
                        other => terms.push(other),
                    }
                }
                let mut combined: Vec<Self> = Vec::new();
                for term in terms {
                    let existing = combined
                        .iter_mut()
                        .find(|existing| existing.is_leaf() && existing.same_unit(&term));
                    match (existing, term.leaf_value()) {
                        (Some(existing), Some(value)) => {
                            let total = existing.leaf_value().unwrap_or(0.0) + value;
                            *existing = existing.with_leaf_value(total);
                        }
                        _ => combined.push(term),
                    }
                }
                if combined.len() == 1 {
                    combined.swap_remove(0)
                } else {
                    Self::Sum(combined)
                }
            }
            Self::Product(children) => {
                let mut factor = 1.0_f64;
                let mut others = Vec::new();
                let mut pending: Vec<Self> = children;
                while let Some(child) = pending.pop() {
                    match child.simplify() {
                        Self::Number(n) => factor *= f64::from(n),
                        Self::Product(inner) => pending.extend(inner),
                        other => others.insert(0, other),
                    }
                }
                if others.is_empty() {
                    return Self::Number(factor as f32);
                }
                if others.len() > 1 {
                    if factor != 1.0 {
                        others.insert(0, Self::Number(factor as f32));
                    }
                    return Self::Product(others);
                }
                match others.swap_remove(0) {
                    leaf if leaf.is_leaf() => {
                        let value = leaf.leaf_value().unwrap_or(0.0) * factor;
                        leaf.with_leaf_value(value)
                    }
                    Self::Sum(terms) => Self::Sum(
                        terms
                            .into_iter()
                            .map(|term| Self::Product(vec![Self::Number(factor as f32), term]))
                            .collect(),
                    )
                    .simplify(),
                    other if factor == 1.0 => other,
                    other => Self::Product(vec![Self::Number(factor as f32), other]),
                }
            }
            Self::Min(args) => Self::simplify_extremum(args, true),
            Self::Max(args) => Self::simplify_extremum(args, false),
            Self::Clamp(min, center, max) => {
                let (min, center, max) = (min.simplify(), center.simplify(), max.simplify());
                if min.same_unit(&center) && center.same_unit(&max) {
                    let lower = min.leaf_value().unwrap_or(0.0);
                    let upper = max.leaf_value().unwrap_or(0.0);
                    let value = center.leaf_value().unwrap_or(0.0).min(upper).max(lower);
                    center.with_leaf_value(value)
                } else {
                    Self::Clamp(Box::new(min), Box::new(center), Box::new(max))
                }
            }
        }
    }

    fn simplify_extremum(args: Vec<Self>, minimum: bool) -> Self {
        let args: Vec<Self> = args.into_iter().map(Self::simplify).collect();
        let comparable = args.first().is_some_and(|first| args.iter().all(|a| a.same_unit(first)));
        if comparable {
            let values = args.iter().filter_map(Self::leaf_value);
            let chosen = if minimum {
                values.fold(f64::INFINITY, f64::min)
            } else {
                values.fold(f64::NEG_INFINITY, f64::max)
            };
            return args[0].with_leaf_value(chosen);
        }
        if minimum { Self::Min(args) } else { Self::Max(args) }
    }

    /// Whether a percentage appears anywhere in the tree.
    #[must_use]
    pub fn contains_percentage(&self) -> bool {
        match self {
            Self::Percentage(_) => true,
            Self::Number(_) | Self::Length(_) | Self::Time(_) => false,
            Self::Sum(children) | Self::Product(children) | Self::Min(children) | Self::Max(children) => {
                children.iter().any(Self::contains_percentage)
            }
            Self::Negate(inner) | Self::Invert(inner) => inner.contains_percentage(),
            Self::Clamp(a, b, c) => [a, b, c].iter().any(|n| n.contains_percentage()),
        }
    }

    /// Replace every length leaf with its pixel value and simplify.
    #[must_use]
    pub fn absolutized(&self, context: &AbsolutizeContext) -> Self {
        let map = |children: &[Self]| children.iter().map(|c| c.absolutized(context)).collect();
        let node = match self {
            Self::Length(length) => Self::Length(length.absolutized(context)),
            Self::Number(_) | Self::Percentage(_) | Self::Time(_) => self.clone(),
            Self::Sum(children) => Self::Sum(map(children)),
            Self::Product(children) => Self::Product(map(children)),
            Self::Min(children) => Self::Min(map(children)),
            Self::Max(children) => Self::Max(map(children)),
            Self::Negate(inner) => Self::Negate(Box::new(inner.absolutized(context))),
            Self::Invert(inner) => Self::Invert(Box::new(inner.absolutized(context))),
            Self::Clamp(a, b, c) => Self::Clamp(
                Box::new(a.absolutized(context)),
                Box::new(b.absolutized(context)),
                Box::new(c.absolutized(context)),
            ),
        };
        node.simplify()
    }

    /// Evaluate to a single number: pixels for lengths, milliseconds for
    /// times. Percentages need `percentage_basis`.
    #[must_use]
    pub fn resolve(&self, context: &AbsolutizeContext, percentage_basis: Option<f32>) -> Option<f32> {
        let all = |children: &[Self]| -> Option<Vec<f32>> {
            children.iter().map(|c| c.resolve(context, percentage_basis)).collect()
        };
        Some(match self {
            Self::Number(n) => *n,
            Self::Percentage(p) => percentage_basis? * p / 100.0,
            Self::Length(length) => length.to_px(context),
            Self::Time(time) => time.ms as f32,
            Self::Sum(children) => all(children)?.into_iter().sum(),
            Self::Product(children) => all(children)?.into_iter().product(),
            Self::Negate(inner) => -inner.resolve(context, percentage_basis)?,
            Self::Invert(inner) => 1.0 / inner.resolve(context, percentage_basis)?,
            Self::Min(children) => all(children)?.into_iter().fold(f32::INFINITY, f32::min),
            Self::Max(children) => all(children)?.into_iter().fold(f32::NEG_INFINITY, f32::max),
            Self::Clamp(min, center, max) => {
                let min = min.resolve(context, percentage_basis)?;
                let max = max.resolve(context, percentage_basis)?;
                center.resolve(context, percentage_basis)?.min(max).max(min)
            }
        })
    }

    /// Unwrap a leaf into a plain value; anything else stays calculated.
    #[must_use]
    pub fn into_style_value(self) -> StyleValue {
        match self {
            Self::Number(n) => StyleValue::Number(n),
            Self::Percentage(p) => StyleValue::Percentage(p),
            Self::Length(length) => StyleValue::Length(length),
            Self::Time(time) => StyleValue::Time(time),
            other => StyleValue::Calculated(Box::new(other)),
        }
    }
}
