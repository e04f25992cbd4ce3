//! CSS style values.
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//!
//! Every declared, cascaded and computed value is a [`StyleValue`]: one sum
//! type over all value kinds, with [`StyleValue::absolutize`] turning
//! font- and viewport-relative values into pixels.

mod calc;
mod color;
mod easing;

use serde::{Serialize, Serializer};
use strum_macros::{Display, EnumString};

pub use calc::{CalcNode, parse_calc};
pub use color::{Color, parse_color};
pub use easing::{Easing, StepPosition};

use crate::keyword::Keyword;
use crate::property::PropertyId;
use crate::syntax::{ComponentValue, serialize};

/// Default `medium` font size in CSS pixels.
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// [§ 6 Distance Units](https://www.w3.org/TR/css-values-4/#lengths)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Ex,
    Rex,
    Ch,
    Rch,
    Lh,
    Rlh,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Cm,
    Mm,
    #[strum(serialize = "q")]
    Q,
    In,
    Pt,
    Pc,
}

impl LengthUnit {
    /// [§ 6.2 Absolute Lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
    ///
    /// Pixels per unit for absolute units.
    #[must_use]
    pub const fn absolute_px(self) -> Option<f32> {
        match self {
            Self::Px => Some(1.0),
            Self::Cm => Some(96.0 / 2.54),
            Self::Mm => Some(96.0 / 25.4),
            Self::Q => Some(96.0 / 101.6),
            Self::In => Some(96.0),
            Self::Pt => Some(96.0 / 72.0),
            Self::Pc => Some(16.0),
            _ => None,
        }
    }
}

/// A `<length>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Length {
    /// Magnitude.
    pub value: f32,
    /// Unit.
    pub unit: LengthUnit,
}

impl Length {
    /// A pixel length.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    /// Whether this length is already in absolute pixels.
    #[must_use]
    pub fn is_px(&self) -> bool {
        self.unit == LengthUnit::Px
    }

    /// [§ 6.1 Relative Lengths](https://www.w3.org/TR/css-values-4/#relative-lengths)
    ///
    /// Resolve to pixels.
    #[must_use]
    pub fn to_px(&self, context: &AbsolutizeContext) -> f32 {
        if let Some(factor) = self.unit.absolute_px() {
            return self.value * factor;
        }
        let font = &context.font_metrics;
        let root = &context.root_font_metrics;
        let (width, height) = context.viewport;
        let scale = match self.unit {
            LengthUnit::Em => font.font_size,
            LengthUnit::Rem => root.font_size,
            LengthUnit::Ex => font.x_height,
            LengthUnit::Rex => root.x_height,
            LengthUnit::Ch => font.zero_advance,
            LengthUnit::Rch => root.zero_advance,
            LengthUnit::Lh => font.line_height,
            LengthUnit::Rlh => root.line_height,
            LengthUnit::Vw => width / 100.0,
            LengthUnit::Vh => height / 100.0,
            LengthUnit::Vmin => width.min(height) / 100.0,
            LengthUnit::Vmax => width.max(height) / 100.0,
            _ => 1.0,
        };
        self.value * scale
    }

    /// Convert to an absolute pixel length.
    #[must_use]
    pub fn absolutized(&self, context: &AbsolutizeContext) -> Self {
        if self.is_px() {
            *self
        } else {
            Self::px(self.to_px(context))
        }
    }
}

/// Font metrics that relative lengths resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontMetrics {
    /// Computed font size.
    pub font_size: f32,
    /// x-height, for `ex`.
    pub x_height: f32,
    /// Advance of "0", for `ch`.
    pub zero_advance: f32,
    /// Computed line height, for `lh`.
    pub line_height: f32,
}

impl FontMetrics {
    /// Metrics synthesised from a font size alone.
    #[must_use]
    pub fn from_font_size(font_size: f32) -> Self {
        Self {
            font_size,
            x_height: font_size * 0.5,
            zero_advance: font_size * 0.5,
            line_height: font_size * 1.2,
        }
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::from_font_size(DEFAULT_FONT_SIZE_PX)
    }
}

/// Everything needed to absolutize a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsolutizeContext {
    /// Viewport width and height.
    pub viewport: (f32, f32),
    /// The element's font metrics.
    pub font_metrics: FontMetrics,
    /// The root element's font metrics.
    pub root_font_metrics: FontMetrics,
}

impl Default for AbsolutizeContext {
    fn default() -> Self {
        Self {
            viewport: (800.0, 600.0),
            font_metrics: FontMetrics::default(),
            root_font_metrics: FontMetrics::default(),
        }
    }
}

/// [§ 7.1 Time Units](https://www.w3.org/TR/css-values-4/#time)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Time {
    /// Milliseconds.
    pub ms: f64,
}

impl Time {
    /// Zero seconds.
    pub const ZERO: Self = Self { ms: 0.0 };

    /// Construct from seconds.
    #[must_use]
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            ms: seconds * 1000.0,
        }
    }
}

/// Separator of a [`ValueList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// Space-separated.
    Space,
    /// Comma-separated.
    Comma,
}

/// A list of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueList {
    /// Separator used when serializing.
    pub separator: Separator,
    /// Items.
    pub values: Vec<StyleValue>,
}

impl ValueList {
    /// Item `index`, repeating the list cyclically.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&StyleValue> {
        if self.values.is_empty() {
            return None;
        }
        self.values.get(index % self.values.len())
    }
}

/// A shorthand declaration after parsing: one value per longhand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShorthandValue {
    /// The shorthand property.
    pub shorthand: PropertyId,
    /// Sub-properties, parallel to `values`. May themselves be shorthands.
    pub sub_properties: Vec<PropertyId>,
    /// Values, parallel to `sub_properties`.
    pub values: Vec<StyleValue>,
}

/// A value that still contains `var()`, `env()` or `attr()` and can only be
/// parsed once the element it applies to is known.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedValue {
    /// Raw component values.
    pub values: Vec<ComponentValue>,
}

impl Serialize for UnresolvedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&serialize(&self.values))
    }
}

/// [§ 3.1 math-depth](https://w3c.github.io/mathml-core/#the-math-script-level-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MathDepth {
    /// `auto-add`
    AutoAdd,
    /// `add(<integer>)`
    Add(i32),
    /// `<integer>`
    Integer(i32),
}

/// The value sum type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum StyleValue {
    /// A keyword.
    Keyword(Keyword),
    /// A `<length>`.
    Length(Length),
    /// A `<percentage>`, stored as the number before `%`.
    Percentage(f32),
    /// A `<number>`.
    Number(f32),
    /// An `<integer>`.
    Integer(i32),
    /// A resolved colour.
    Color(Color),
    /// A `url()`.
    Url(String),
    /// A `<string>`.
    String(String),
    /// A `<custom-ident>`.
    CustomIdent(String),
    /// A `<time>`.
    Time(Time),
    /// An `<easing-function>`.
    Easing(Easing),
    /// `math-depth` values.
    MathDepth(MathDepth),
    /// A space- or comma-separated list.
    List(ValueList),
    /// A parsed shorthand.
    Shorthand(ShorthandValue),
    /// A `calc()` (or `min()`, `max()`, `clamp()`) expression.
    Calculated(Box<CalcNode>),
    /// A value with unresolved arbitrary substitution functions.
    Unresolved(UnresolvedValue),
    /// Placeholder on a longhand whose shorthand is unresolved.
    PendingSubstitution(PropertyId),
    /// `revert`
    Revert,
    /// `revert-layer`
    RevertLayer,
    /// `initial`
    Initial,
    /// `inherit`
    Inherit,
    /// `unset`
    Unset,
    /// The guaranteed-invalid value.
    GuaranteedInvalid,
}

impl StyleValue {
    /// A pixel length.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self::Length(Length::px(value))
    }

    /// [§ 7.3 CSS-wide keywords](https://www.w3.org/TR/css-values-4/#common-keywords)
    #[must_use]
    pub const fn is_css_wide_keyword(&self) -> bool {
        matches!(
            self,
            Self::Initial | Self::Inherit | Self::Unset | Self::Revert | Self::RevertLayer
        )
    }

    /// The keyword, if this is one.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match self {
            Self::Keyword(keyword) => Some(*keyword),
            _ => None,
        }
    }

    /// Whether this is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_keyword() == Some(keyword)
    }

    /// The pixel value of an absolute length.
    #[must_use]
    pub fn as_px(&self) -> Option<f32> {
        match self {
            Self::Length(length) if length.is_px() => Some(length.value),
            _ => None,
        }
    }

    /// Numeric value of a `<number>` or `<integer>`.
    #[must_use]
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// The list items, or the value itself as a one-item slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Self] {
        match self {
            Self::List(list) => &list.values,
            other => std::slice::from_ref(other),
        }
    }

    /// [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-5/#computed)
    ///
    /// Resolve font- and viewport-relative lengths to pixels, recursively.
    /// Percentages stay percentages; calc expressions that still contain a
    /// percentage stay calc. Applying this to its own output is a no-op.
    #[must_use]
    pub fn absolutize(&self, context: &AbsolutizeContext) -> Self {
        match self {
            Self::Length(length) => Self::Length(length.absolutized(context)),
            Self::List(list) => Self::List(ValueList {
                separator: list.separator,
                values: list.values.iter().map(|v| v.absolutize(context)).collect(),
            }),
            Self::Calculated(node) => node.absolutized(context).into_style_value(),
            other => other.clone(),
        }
    }
}

/// Build a `<length>` from a dimension token's unit, if it is a length unit.
#[must_use]
pub fn length_from_dimension(value: f64, unit: &str) -> Option<Length> {
    let unit: LengthUnit = unit.parse().ok()?;
    Some(Length {
        value: value as f32,
        unit,
    })
}

/// Build a `<time>` from a dimension token.
#[must_use]
pub fn time_from_dimension(value: f64, unit: &str) -> Option<Time> {
    if unit.eq_ignore_ascii_case("s") {
        Some(Time::from_seconds(value))
    } else if unit.eq_ignore_ascii_case("ms") {
        Some(Time { ms: value })
    } else {
        None
    }
}
