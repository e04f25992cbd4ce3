//! The property table.
//!
//! [§ 2 Property definitions](https://www.w3.org/TR/css-cascade-5/#shorthand)
//!
//! Property ids are laid out as physical longhands first (these index the
//! dense computed-value array), then logical aliases, then shorthands.

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString, IntoStaticStr};

use crate::keyword::Keyword;
use crate::logical::{LogicalAliasMappingContext, LogicalAxis, LogicalSide, PhysicalSide};
use crate::value::{Color, Easing, Separator, StyleValue, Time, ValueList};

/// A known CSS property.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    EnumCountMacro,
    IntoStaticStr,
    Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum PropertyId {
    // Physical longhands.
    AnimationDelay,
    AnimationDirection,
    AnimationDuration,
    AnimationFillMode,
    AnimationIterationCount,
    AnimationName,
    AnimationPlayState,
    AnimationTimingFunction,
    BackgroundColor,
    BackgroundImage,
    BorderBottomColor,
    BorderBottomStyle,
    BorderBottomWidth,
    BorderLeftColor,
    BorderLeftStyle,
    BorderLeftWidth,
    BorderRightColor,
    BorderRightStyle,
    BorderRightWidth,
    BorderTopColor,
    BorderTopStyle,
    BorderTopWidth,
    Bottom,
    BoxSizing,
    Clear,
    Color,
    ColumnGap,
    Content,
    Cursor,
    Direction,
    Display,
    FlexBasis,
    FlexDirection,
    FlexGrow,
    FlexShrink,
    FlexWrap,
    Float,
    FontFamily,
    FontSize,
    FontStretch,
    FontStyle,
    FontWeight,
    Height,
    JustifyContent,
    AlignItems,
    Left,
    LetterSpacing,
    LineHeight,
    ListStyleType,
    MarginBottom,
    MarginLeft,
    MarginRight,
    MarginTop,
    MathDepth,
    MathStyle,
    MaxHeight,
    MaxWidth,
    MinHeight,
    MinWidth,
    Opacity,
    Order,
    OverflowX,
    OverflowY,
    PaddingBottom,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    Position,
    Right,
    RowGap,
    TextAlign,
    TextDecorationLine,
    TextIndent,
    TextTransform,
    Top,
    TransitionBehavior,
    TransitionDelay,
    TransitionDuration,
    TransitionProperty,
    TransitionTimingFunction,
    UnicodeBidi,
    Visibility,
    WhiteSpace,
    Width,
    WordSpacing,
    WritingMode,
    ZIndex,

    // Logical aliases.
    MarginBlockStart,
    MarginBlockEnd,
    MarginInlineStart,
    MarginInlineEnd,
    PaddingBlockStart,
    PaddingBlockEnd,
    PaddingInlineStart,
    PaddingInlineEnd,
    InsetBlockStart,
    InsetBlockEnd,
    InsetInlineStart,
    InsetInlineEnd,
    BorderBlockStartWidth,
    BorderBlockEndWidth,
    BorderInlineStartWidth,
    BorderInlineEndWidth,
    BorderBlockStartStyle,
    BorderBlockEndStyle,
    BorderInlineStartStyle,
    BorderInlineEndStyle,
    BorderBlockStartColor,
    BorderBlockEndColor,
    BorderInlineStartColor,
    BorderInlineEndColor,
    InlineSize,
    BlockSize,
    MinInlineSize,
    MinBlockSize,
    MaxInlineSize,
    MaxBlockSize,

    // Shorthands.
    Margin,
    Padding,
    Inset,
    BorderWidth,
    BorderStyle,
    BorderColor,
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,
    Border,
    MarginBlock,
    MarginInline,
    PaddingBlock,
    PaddingInline,
    InsetBlock,
    InsetInline,
    BorderBlockWidth,
    BorderInlineWidth,
    BorderBlockStyle,
    BorderInlineStyle,
    BorderBlockColor,
    BorderInlineColor,
    BorderBlockStart,
    BorderBlockEnd,
    BorderInlineStart,
    BorderInlineEnd,
    Overflow,
    Gap,
    Flex,
    FlexFlow,
    Transition,
    Animation,
    Font,
    TextDecoration,
    Background,
}

/// Number of physical longhands; the size of a dense computed-value array.
pub const PHYSICAL_LONGHAND_COUNT: usize = PropertyId::ZIndex as usize + 1;

/// [§ 3 Animation types](https://www.w3.org/TR/web-animations-1/#animation-type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationType {
    /// Not animatable.
    None,
    /// Flips from start to end at 50% progress.
    Discrete,
    /// Interpolated component-wise on the computed value.
    ByComputedValue,
}

/// Property groups that have flow-relative aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicalGroup {
    Margin,
    Padding,
    Inset,
    BorderWidth,
    BorderStyle,
    BorderColor,
    Size,
    MinSize,
    MaxSize,
}

/// Whether `name` is a custom property name (`--*`).
#[must_use]
pub fn is_custom_property_name(name: &str) -> bool {
    name.starts_with("--") && name.len() > 2
}

impl PropertyId {
    /// Look up a property by name, ASCII case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// The property name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Dense index for physical longhands.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        let index = self as usize;
        (index < PHYSICAL_LONGHAND_COUNT).then_some(index)
    }

    /// Inverse of [`Self::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        (index < PHYSICAL_LONGHAND_COUNT)
            .then(|| Self::iter().nth(index))
            .flatten()
    }

    /// All physical longhands in index order.
    pub fn physical_longhands() -> impl Iterator<Item = Self> {
        Self::iter().take(PHYSICAL_LONGHAND_COUNT)
    }

    /// All properties.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Whether this is a physical longhand.
    #[must_use]
    pub fn is_physical_longhand(self) -> bool {
        self.index().is_some()
    }

    /// Whether this is a shorthand.
    #[must_use]
    pub fn is_shorthand(self) -> bool {
        self as usize >= Self::Margin as usize
    }

    /// Whether this is a flow-relative alias of a physical longhand.
    #[must_use]
    pub fn is_logical_alias(self) -> bool {
        !self.is_physical_longhand() && !self.is_shorthand()
    }

    /// [§ 3.3 Inheritance](https://www.w3.org/TR/css-cascade-5/#inheriting)
    #[must_use]
    pub const fn is_inherited(self) -> bool {
        matches!(
            self,
            Self::Color
                | Self::Cursor
                | Self::Direction
                | Self::FontFamily
                | Self::FontSize
                | Self::FontStretch
                | Self::FontStyle
                | Self::FontWeight
                | Self::LetterSpacing
                | Self::LineHeight
                | Self::ListStyleType
                | Self::MathDepth
                | Self::MathStyle
                | Self::TextAlign
                | Self::TextIndent
                | Self::TextTransform
                | Self::Visibility
                | Self::WhiteSpace
                | Self::WordSpacing
                | Self::WritingMode
        )
    }

    /// [§ 4.1 Initial values](https://www.w3.org/TR/css-cascade-5/#initial-values)
    #[must_use]
    pub fn initial_value(self) -> StyleValue {
        use StyleValue as V;
        let keyword = V::Keyword;
        let zero = || V::px(0.0);
        match self {
            Self::AnimationDelay | Self::TransitionDelay | Self::TransitionDuration => V::Time(Time::ZERO),
            Self::AnimationDirection
            | Self::ColumnGap
            | Self::Content
            | Self::FontStretch
            | Self::FontStyle
            | Self::FontWeight
            | Self::JustifyContent
            | Self::AlignItems
            | Self::LetterSpacing
            | Self::LineHeight
            | Self::MathStyle
            | Self::RowGap
            | Self::TransitionBehavior
            | Self::UnicodeBidi
            | Self::WhiteSpace
            | Self::WordSpacing => keyword(Keyword::Normal),
            Self::AnimationDuration
            | Self::Bottom
            | Self::Cursor
            | Self::FlexBasis
            | Self::Height
            | Self::Left
            | Self::MaxHeight
            | Self::MaxWidth
            | Self::MinHeight
            | Self::MinWidth
            | Self::Right
            | Self::Top
            | Self::Width
            | Self::ZIndex => keyword(Keyword::Auto),
            Self::AnimationFillMode
            | Self::AnimationName
            | Self::BackgroundImage
            | Self::BorderBottomStyle
            | Self::BorderLeftStyle
            | Self::BorderRightStyle
            | Self::BorderTopStyle
            | Self::Clear
            | Self::Float
            | Self::TextDecorationLine
            | Self::TextTransform => keyword(Keyword::None),
            Self::AnimationIterationCount | Self::FlexShrink | Self::Opacity => V::Number(1.0),
            Self::AnimationPlayState => keyword(Keyword::Running),
            Self::AnimationTimingFunction | Self::TransitionTimingFunction => V::Easing(Easing::EASE),
            Self::BackgroundColor => V::Color(Color::TRANSPARENT),
            Self::BorderBottomColor | Self::BorderLeftColor | Self::BorderRightColor | Self::BorderTopColor => {
                keyword(Keyword::Currentcolor)
            }
            Self::BorderBottomWidth | Self::BorderLeftWidth | Self::BorderRightWidth | Self::BorderTopWidth => {
                keyword(Keyword::Medium)
            }
            Self::BoxSizing => keyword(Keyword::ContentBox),
            Self::Color => V::Color(Color::BLACK),
            Self::Direction => keyword(Keyword::Ltr),
            Self::Display => keyword(Keyword::Inline),
            Self::FlexDirection => keyword(Keyword::Row),
            Self::FlexGrow => V::Number(0.0),
            Self::FlexWrap => keyword(Keyword::Nowrap),
            Self::FontFamily => V::List(ValueList {
                separator: Separator::Comma,
                values: vec![keyword(Keyword::Serif)],
            }),
            Self::FontSize => keyword(Keyword::Medium),
            Self::ListStyleType => keyword(Keyword::Disc),
            Self::MarginBottom
            | Self::MarginLeft
            | Self::MarginRight
            | Self::MarginTop
            | Self::PaddingBottom
            | Self::PaddingLeft
            | Self::PaddingRight
            | Self::PaddingTop
            | Self::TextIndent => zero(),
            Self::MathDepth | Self::Order => V::Integer(0),
            Self::OverflowX | Self::OverflowY | Self::Visibility => keyword(Keyword::Visible),
            Self::Position => keyword(Keyword::Static),
            Self::TextAlign => keyword(Keyword::Start),
            Self::TransitionProperty => keyword(Keyword::All),
            Self::WritingMode => keyword(Keyword::HorizontalTb),
            alias if alias.is_logical_alias() => alias
                .map_logical_alias(LogicalAliasMappingContext::default())
                .initial_value(),
            _ => V::GuaranteedInvalid,
        }
    }

    /// [§ 3 Animation types](https://www.w3.org/TR/web-animations-1/#animation-type)
    #[must_use]
    pub fn animation_type(self) -> AnimationType {
        if self.is_shorthand() {
            return AnimationType::None;
        }
        if self.is_logical_alias() {
            return self
                .map_logical_alias(LogicalAliasMappingContext::default())
                .animation_type();
        }
        match self {
            Self::AnimationDelay
            | Self::AnimationDirection
            | Self::AnimationDuration
            | Self::AnimationFillMode
            | Self::AnimationIterationCount
            | Self::AnimationName
            | Self::AnimationPlayState
            | Self::AnimationTimingFunction
            | Self::Direction
            | Self::TransitionBehavior
            | Self::TransitionDelay
            | Self::TransitionDuration
            | Self::TransitionProperty
            | Self::TransitionTimingFunction
            | Self::UnicodeBidi
            | Self::WritingMode => AnimationType::None,
            Self::BackgroundColor
            | Self::BorderBottomColor
            | Self::BorderBottomWidth
            | Self::BorderLeftColor
            | Self::BorderLeftWidth
            | Self::BorderRightColor
            | Self::BorderRightWidth
            | Self::BorderTopColor
            | Self::BorderTopWidth
            | Self::Bottom
            | Self::Color
            | Self::ColumnGap
            | Self::FlexBasis
            | Self::FlexGrow
            | Self::FlexShrink
            | Self::FontSize
            | Self::FontStretch
            | Self::FontWeight
            | Self::Height
            | Self::Left
            | Self::LetterSpacing
            | Self::LineHeight
            | Self::MarginBottom
            | Self::MarginLeft
            | Self::MarginRight
            | Self::MarginTop
            | Self::MathDepth
            | Self::MaxHeight
            | Self::MaxWidth
            | Self::MinHeight
            | Self::MinWidth
            | Self::Opacity
            | Self::Order
            | Self::PaddingBottom
            | Self::PaddingLeft
            | Self::PaddingRight
            | Self::PaddingTop
            | Self::Right
            | Self::RowGap
            | Self::TextIndent
            | Self::Top
            | Self::Width
            | Self::WordSpacing
            | Self::ZIndex => AnimationType::ByComputedValue,
            _ => AnimationType::Discrete,
        }
    }

    /// Whether the property can be animated at all.
    #[must_use]
    pub fn is_animatable(self) -> bool {
        self.animation_type() != AnimationType::None
    }

    /// Direct sub-properties of a shorthand, in canonical order. Empty for
    /// longhands. Sub-properties may themselves be shorthands.
    #[must_use]
    pub const fn longhands(self) -> &'static [Self] {
        use PropertyId as P;
        match self {
            P::Margin => &[P::MarginTop, P::MarginRight, P::MarginBottom, P::MarginLeft],
            P::Padding => &[P::PaddingTop, P::PaddingRight, P::PaddingBottom, P::PaddingLeft],
            P::Inset => &[P::Top, P::Right, P::Bottom, P::Left],
            P::BorderWidth => &[
                P::BorderTopWidth,
                P::BorderRightWidth,
                P::BorderBottomWidth,
                P::BorderLeftWidth,
            ],
            P::BorderStyle => &[
                P::BorderTopStyle,
                P::BorderRightStyle,
                P::BorderBottomStyle,
                P::BorderLeftStyle,
            ],
            P::BorderColor => &[
                P::BorderTopColor,
                P::BorderRightColor,
                P::BorderBottomColor,
                P::BorderLeftColor,
            ],
            P::BorderTop => &[P::BorderTopWidth, P::BorderTopStyle, P::BorderTopColor],
            P::BorderRight => &[P::BorderRightWidth, P::BorderRightStyle, P::BorderRightColor],
            P::BorderBottom => &[P::BorderBottomWidth, P::BorderBottomStyle, P::BorderBottomColor],
            P::BorderLeft => &[P::BorderLeftWidth, P::BorderLeftStyle, P::BorderLeftColor],
            P::Border => &[P::BorderWidth, P::BorderStyle, P::BorderColor],
            P::MarginBlock => &[P::MarginBlockStart, P::MarginBlockEnd],
            P::MarginInline => &[P::MarginInlineStart, P::MarginInlineEnd],
            P::PaddingBlock => &[P::PaddingBlockStart, P::PaddingBlockEnd],
            P::PaddingInline => &[P::PaddingInlineStart, P::PaddingInlineEnd],
            P::InsetBlock => &[P::InsetBlockStart, P::InsetBlockEnd],
            P::InsetInline => &[P::InsetInlineStart, P::InsetInlineEnd],
            P::BorderBlockWidth => &[P::BorderBlockStartWidth, P::BorderBlockEndWidth],
            P::BorderInlineWidth => &[P::BorderInlineStartWidth, P::BorderInlineEndWidth],
            P::BorderBlockStyle => &[P::BorderBlockStartStyle, P::BorderBlockEndStyle],
            P::BorderInlineStyle => &[P::BorderInlineStartStyle, P::BorderInlineEndStyle],
            P::BorderBlockColor => &[P::BorderBlockStartColor, P::BorderBlockEndColor],
            P::BorderInlineColor => &[P::BorderInlineStartColor, P::BorderInlineEndColor],
            P::BorderBlockStart => &[
                P::BorderBlockStartWidth,
                P::BorderBlockStartStyle,
                P::BorderBlockStartColor,
            ],
            P::BorderBlockEnd => &[P::BorderBlockEndWidth, P::BorderBlockEndStyle, P::BorderBlockEndColor],
            P::BorderInlineStart => &[
                P::BorderInlineStartWidth,
                P::BorderInlineStartStyle,
                P::BorderInlineStartColor,
            ],
            P::BorderInlineEnd => &[
                P::BorderInlineEndWidth,
                P::BorderInlineEndStyle,
                P::BorderInlineEndColor,
            ],
            P::Overflow => &[P::OverflowX, P::OverflowY],
            P::Gap => &[P::RowGap, P::ColumnGap],
            P::Flex => &[P::FlexGrow, P::FlexShrink, P::FlexBasis],
            P::FlexFlow => &[P::FlexDirection, P::FlexWrap],
            P::Transition => &[
                P::TransitionProperty,
                P::TransitionDuration,
                P::TransitionTimingFunction,
                P::TransitionDelay,
                P::TransitionBehavior,
            ],
            P::Animation => &[
                P::AnimationName,
                P::AnimationDuration,
                P::AnimationTimingFunction,
                P::AnimationDelay,
                P::AnimationIterationCount,
                P::AnimationDirection,
                P::AnimationFillMode,
                P::AnimationPlayState,
            ],
            P::Font => &[
                P::FontStyle,
                P::FontWeight,
                P::FontStretch,
                P::FontSize,
                P::LineHeight,
                P::FontFamily,
            ],
            P::TextDecoration => &[P::TextDecorationLine],
            P::Background => &[P::BackgroundColor, P::BackgroundImage],
            _ => &[],
        }
    }

    /// Fully expanded longhands (physical or logical), recursively.
    #[must_use]
    pub fn expanded_longhands(self) -> Vec<Self> {
        if !self.is_shorthand() {
            return vec![self];
        }
        self.longhands()
            .iter()
            .flat_map(|sub| sub.expanded_longhands())
            .collect()
    }

    fn logical_group(self) -> Option<(LogicalGroup, Result<LogicalSide, LogicalAxis>)> {
        use LogicalAxis::{Block, Inline};
        use LogicalGroup as G;
        use LogicalSide::{BlockEnd, BlockStart, InlineEnd, InlineStart};
        Some(match self {
            Self::MarginBlockStart => (G::Margin, Ok(BlockStart)),
            Self::MarginBlockEnd => (G::Margin, Ok(BlockEnd)),
            Self::MarginInlineStart => (G::Margin, Ok(InlineStart)),
            Self::MarginInlineEnd => (G::Margin, Ok(InlineEnd)),
            Self::PaddingBlockStart => (G::Padding, Ok(BlockStart)),
            Self::PaddingBlockEnd => (G::Padding, Ok(BlockEnd)),
            Self::PaddingInlineStart => (G::Padding, Ok(InlineStart)),
            Self::PaddingInlineEnd => (G::Padding, Ok(InlineEnd)),
            Self::InsetBlockStart => (G::Inset, Ok(BlockStart)),
            Self::InsetBlockEnd => (G::Inset, Ok(BlockEnd)),
            Self::InsetInlineStart => (G::Inset, Ok(InlineStart)),
            Self::InsetInlineEnd => (G::Inset, Ok(InlineEnd)),
            Self::BorderBlockStartWidth => (G::BorderWidth, Ok(BlockStart)),
            Self::BorderBlockEndWidth => (G::BorderWidth, Ok(BlockEnd)),
            Self::BorderInlineStartWidth => (G::BorderWidth, Ok(InlineStart)),
            Self::BorderInlineEndWidth => (G::BorderWidth, Ok(InlineEnd)),
            Self::BorderBlockStartStyle => (G::BorderStyle, Ok(BlockStart)),
            Self::BorderBlockEndStyle => (G::BorderStyle, Ok(BlockEnd)),
            Self::BorderInlineStartStyle => (G::BorderStyle, Ok(InlineStart)),
            Self::BorderInlineEndStyle => (G::BorderStyle, Ok(InlineEnd)),
            Self::BorderBlockStartColor => (G::BorderColor, Ok(BlockStart)),
            Self::BorderBlockEndColor => (G::BorderColor, Ok(BlockEnd)),
            Self::BorderInlineStartColor => (G::BorderColor, Ok(InlineStart)),
            Self::BorderInlineEndColor => (G::BorderColor, Ok(InlineEnd)),
            Self::InlineSize => (G::Size, Err(Inline)),
            Self::BlockSize => (G::Size, Err(Block)),
            Self::MinInlineSize => (G::MinSize, Err(Inline)),
            Self::MinBlockSize => (G::MinSize, Err(Block)),
            Self::MaxInlineSize => (G::MaxSize, Err(Inline)),
            Self::MaxBlockSize => (G::MaxSize, Err(Block)),
            _ => return None,
        })
    }

    /// [§ 4 Flow-Relative Box Model Properties](https://drafts.csswg.org/css-logical-1/#box)
    ///
    /// Map a logical alias to its physical longhand. Other properties map
    /// to themselves.
    #[must_use]
    pub fn map_logical_alias(self, context: LogicalAliasMappingContext) -> Self {
        let Some((group, position)) = self.logical_group() else {
            return self;
        };
        match position {
            Ok(side) => {
                let [top, right, bottom, left] = match group {
                    LogicalGroup::Margin => [Self::MarginTop, Self::MarginRight, Self::MarginBottom, Self::MarginLeft],
                    LogicalGroup::Padding => [
                        Self::PaddingTop,
                        Self::PaddingRight,
                        Self::PaddingBottom,
                        Self::PaddingLeft,
                    ],
                    LogicalGroup::Inset => [Self::Top, Self::Right, Self::Bottom, Self::Left],
                    LogicalGroup::BorderWidth => [
                        Self::BorderTopWidth,
                        Self::BorderRightWidth,
                        Self::BorderBottomWidth,
                        Self::BorderLeftWidth,
                    ],
                    LogicalGroup::BorderStyle => [
                        Self::BorderTopStyle,
                        Self::BorderRightStyle,
                        Self::BorderBottomStyle,
                        Self::BorderLeftStyle,
                    ],
                    LogicalGroup::Size | LogicalGroup::MinSize | LogicalGroup::MaxSize => return self,
                    LogicalGroup::BorderColor => [
                        Self::BorderTopColor,
                        Self::BorderRightColor,
                        Self::BorderBottomColor,
                        Self::BorderLeftColor,
                    ],
                };
                match context.physical_side(side) {
                    PhysicalSide::Top => top,
                    PhysicalSide::Right => right,
                    PhysicalSide::Bottom => bottom,
                    PhysicalSide::Left => left,
                }
            }
            Err(axis) => {
                let (width, height) = match group {
                    LogicalGroup::MinSize => (Self::MinWidth, Self::MinHeight),
                    LogicalGroup::MaxSize => (Self::MaxWidth, Self::MaxHeight),
                    _ => (Self::Width, Self::Height),
                };
                let inline_is_width = context.is_horizontal();
                match (axis, inline_is_width) {
                    (LogicalAxis::Inline, true) | (LogicalAxis::Block, false) => width,
                    _ => height,
                }
            }
        }
    }
}
