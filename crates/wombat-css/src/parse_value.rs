//! Declaration value parsing.
//!
//! [§ 2.1 Property value definitions](https://www.w3.org/TR/css-values-4/#value-defs)
//!
//! Turns a declaration's component values into a [`StyleValue`] per the
//! property's grammar. Box-edge shorthands parse to a positional list
//! (`1px 2px` stays a two-item list) and are expanded during the cascade;
//! other shorthands parse to a [`ShorthandValue`].

use crate::keyword::Keyword;
use crate::property::PropertyId;
use crate::substitute::contains_arbitrary_substitution_function;
use crate::syntax::{ComponentValue, split_on_commas, trim_whitespace};
use crate::tokenizer::CSSToken;
use crate::value::{
    Easing, MathDepth, Separator, ShorthandValue, StyleValue, Time, UnresolvedValue, ValueList,
    length_from_dimension, parse_calc, parse_color, time_from_dimension,
};

const BORDER_STYLES: &[Keyword] = &[
    Keyword::None,
    Keyword::Hidden,
    Keyword::Dotted,
    Keyword::Dashed,
    Keyword::Solid,
    Keyword::Double,
    Keyword::Groove,
    Keyword::Ridge,
    Keyword::Inset,
    Keyword::Outset,
];

const BORDER_WIDTHS: &[Keyword] = &[Keyword::Thin, Keyword::Medium, Keyword::Thick];

const ABSOLUTE_SIZES: &[Keyword] = &[
    Keyword::XxSmall,
    Keyword::XSmall,
    Keyword::Small,
    Keyword::Medium,
    Keyword::Large,
    Keyword::XLarge,
    Keyword::XxLarge,
    Keyword::XxxLarge,
];

const FONT_STRETCHES: &[Keyword] = &[
    Keyword::UltraCondensed,
    Keyword::ExtraCondensed,
    Keyword::Condensed,
    Keyword::SemiCondensed,
    Keyword::SemiExpanded,
    Keyword::Expanded,
    Keyword::ExtraExpanded,
    Keyword::UltraExpanded,
];

const ANIMATION_DIRECTIONS: &[Keyword] = &[
    Keyword::Normal,
    Keyword::Reverse,
    Keyword::Alternate,
    Keyword::AlternateReverse,
];

const FILL_MODES: &[Keyword] = &[Keyword::None, Keyword::Forwards, Keyword::Backwards, Keyword::Both];

const OVERFLOWS: &[Keyword] = &[
    Keyword::Visible,
    Keyword::Hidden,
    Keyword::Clip,
    Keyword::Scroll,
    Keyword::Auto,
];

/// Whether negative values are accepted.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Range {
    All,
    NonNegative,
}

/// Parse a declaration value for `property`.
///
/// CSS-wide keywords are recognised first. Values containing `var()`,
/// `env()` or `attr()` become [`StyleValue::Unresolved`] and are parsed
/// again after substitution. Returns `None` for invalid values.
#[must_use]
pub fn parse_css_value(property: PropertyId, values: &[ComponentValue]) -> Option<StyleValue> {
    let values = trim_whitespace(values.to_vec());
    if values.is_empty() {
        return None;
    }
    if let [single] = values.as_slice()
        && let Some(keyword) = css_wide_keyword(single)
    {
        return Some(keyword);
    }
    if contains_arbitrary_substitution_function(&values) {
        return Some(StyleValue::Unresolved(UnresolvedValue { values }));
    }
    if property.is_shorthand() {
        return parse_shorthand(property, &values);
    }
    parse_longhand(property, &values)
}

/// [§ 7.3 CSS-wide keywords](https://www.w3.org/TR/css-values-4/#common-keywords)
fn css_wide_keyword(value: &ComponentValue) -> Option<StyleValue> {
    let ident = value.as_ident()?.to_ascii_lowercase();
    Some(match ident.as_str() {
        "initial" => StyleValue::Initial,
        "inherit" => StyleValue::Inherit,
        "unset" => StyleValue::Unset,
        "revert" => StyleValue::Revert,
        "revert-layer" => StyleValue::RevertLayer,
        _ => return None,
    })
}

fn significant(values: &[ComponentValue]) -> Vec<&ComponentValue> {
    values.iter().filter(|v| !v.is_whitespace()).collect()
}

fn single(values: &[ComponentValue]) -> Option<&ComponentValue> {
    match significant(values).as_slice() {
        [only] => Some(only),
        _ => None,
    }
}

fn keyword_in(value: &ComponentValue, allowed: &[Keyword]) -> Option<StyleValue> {
    let keyword = Keyword::from_ident(value.as_ident()?)?;
    allowed.contains(&keyword).then_some(StyleValue::Keyword(keyword))
}

fn math(value: &ComponentValue) -> Option<StyleValue> {
    parse_calc(value).map(crate::value::CalcNode::into_style_value)
}

fn parse_length_percentage(value: &ComponentValue, range: Range) -> Option<StyleValue> {
    let parsed = match value {
        ComponentValue::Token(CSSToken::Dimension { value, unit, .. }) => {
            StyleValue::Length(length_from_dimension(*value, unit)?)
        }
        ComponentValue::Token(CSSToken::Percentage(value)) => StyleValue::Percentage(*value as f32),
        // "unitless zero" is a valid <length>.
        ComponentValue::Token(CSSToken::Number { value, .. }) if *value == 0.0 => StyleValue::px(0.0),
        ComponentValue::Function { .. } => {
            return math(value).filter(|v| {
                matches!(v, StyleValue::Length(_) | StyleValue::Percentage(_) | StyleValue::Calculated(_))
            });
        }
        _ => return None,
    };
    let negative = match &parsed {
        StyleValue::Length(length) => length.value < 0.0,
        StyleValue::Percentage(p) => *p < 0.0,
        _ => false,
    };
    (range == Range::All || !negative).then_some(parsed)
}

fn parse_length(value: &ComponentValue, range: Range) -> Option<StyleValue> {
    parse_length_percentage(value, range).filter(|v| !matches!(v, StyleValue::Percentage(_)))
}

fn parse_number(value: &ComponentValue, range: Range) -> Option<StyleValue> {
    let number = match value {
        ComponentValue::Token(CSSToken::Number { value, .. }) => *value as f32,
        ComponentValue::Function { .. } => match math(value)? {
            StyleValue::Number(n) => n,
            calculated @ StyleValue::Calculated(_) => return Some(calculated),
            _ => return None,
        },
        _ => return None,
    };
    (range == Range::All || number >= 0.0).then_some(StyleValue::Number(number))
}

fn parse_integer(value: &ComponentValue) -> Option<StyleValue> {
    match value {
        ComponentValue::Token(CSSToken::Number { value, is_integer: true }) => Some(StyleValue::Integer(*value as i32)),
        ComponentValue::Function { .. } => match math(value)? {
            StyleValue::Number(n) => Some(StyleValue::Integer(n.round() as i32)),
            _ => None,
        },
        _ => None,
    }
}

fn parse_time(value: &ComponentValue, range: Range) -> Option<StyleValue> {
    let time = match value {
        ComponentValue::Token(CSSToken::Dimension { value, unit, .. }) => time_from_dimension(*value, unit)?,
        ComponentValue::Function { .. } => match math(value)? {
            StyleValue::Time(time) => time,
            _ => return None,
        },
        _ => return None,
    };
    (range == Range::All || time.ms >= 0.0).then_some(StyleValue::Time(time))
}

fn parse_color_value(value: &ComponentValue) -> Option<StyleValue> {
    if value.as_ident().is_some_and(|s| s.eq_ignore_ascii_case("currentcolor")) {
        return Some(StyleValue::Keyword(Keyword::Currentcolor));
    }
    parse_color(value).map(StyleValue::Color)
}

fn parse_easing(value: &ComponentValue) -> Option<StyleValue> {
    Easing::parse(value).map(StyleValue::Easing)
}

fn custom_ident(value: &ComponentValue) -> Option<String> {
    let ident = value.as_ident()?;
    let reserved = ["initial", "inherit", "unset", "revert", "revert-layer", "default"];
    (!reserved.iter().any(|r| ident.eq_ignore_ascii_case(r))).then(|| ident.to_string())
}

/// One item, or a comma-separated list of items.
fn comma_list(
    values: &[ComponentValue],
    mut item: impl FnMut(&[&ComponentValue]) -> Option<StyleValue>,
) -> Option<StyleValue> {
    let mut items = Vec::new();
    for group in split_on_commas(values) {
        items.push(item(&significant(&group))?);
    }
    Some(if items.len() == 1 {
        items.pop()?
    } else {
        StyleValue::List(ValueList {
            separator: Separator::Comma,
            values: items,
        })
    })
}

fn one_of(
    item: impl Fn(&ComponentValue) -> Option<StyleValue>,
) -> impl FnMut(&[&ComponentValue]) -> Option<StyleValue> {
    move |group| match group {
        [only] => item(only),
        _ => None,
    }
}

fn space_list(items: Vec<StyleValue>) -> StyleValue {
    StyleValue::List(ValueList {
        separator: Separator::Space,
        values: items,
    })
}

/// Parse a longhand (or a logical alias, which shares its physical
/// property's grammar).
fn parse_longhand(property: PropertyId, values: &[ComponentValue]) -> Option<StyleValue> {
    use PropertyId as P;
    let property = property.map_logical_alias(crate::logical::LogicalAliasMappingContext::default());
    match property {
        P::AnimationDelay => comma_list(values, one_of(|v| parse_time(v, Range::All))),
        P::TransitionDelay => comma_list(values, one_of(|v| parse_time(v, Range::All))),
        P::TransitionDuration => comma_list(values, one_of(|v| parse_time(v, Range::NonNegative))),
        P::AnimationDuration => comma_list(
            values,
            one_of(|v| keyword_in(v, &[Keyword::Auto]).or_else(|| parse_time(v, Range::NonNegative))),
        ),
        P::AnimationDirection => comma_list(values, one_of(|v| keyword_in(v, ANIMATION_DIRECTIONS))),
        P::AnimationFillMode => comma_list(values, one_of(|v| keyword_in(v, FILL_MODES))),
        P::AnimationIterationCount => comma_list(
            values,
            one_of(|v| keyword_in(v, &[Keyword::Infinite]).or_else(|| parse_number(v, Range::NonNegative))),
        ),
        P::AnimationName => comma_list(values, one_of(parse_animation_name)),
        P::AnimationPlayState => comma_list(values, one_of(|v| keyword_in(v, &[Keyword::Running, Keyword::Paused]))),
        P::AnimationTimingFunction | P::TransitionTimingFunction => comma_list(values, one_of(parse_easing)),
        P::TransitionBehavior => comma_list(
            values,
            one_of(|v| keyword_in(v, &[Keyword::Normal, Keyword::AllowDiscrete])),
        ),
        P::TransitionProperty => parse_transition_property(values),
        P::BackgroundColor
        | P::BorderBottomColor
        | P::BorderLeftColor
        | P::BorderRightColor
        | P::BorderTopColor
        | P::Color => parse_color_value(single(values)?),
        P::BackgroundImage => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::None]).or_else(|| parse_url(value))
        }
        P::BorderBottomStyle | P::BorderLeftStyle | P::BorderRightStyle | P::BorderTopStyle => {
            keyword_in(single(values)?, BORDER_STYLES)
        }
        P::BorderBottomWidth | P::BorderLeftWidth | P::BorderRightWidth | P::BorderTopWidth => {
            let value = single(values)?;
            keyword_in(value, BORDER_WIDTHS).or_else(|| parse_length(value, Range::NonNegative))
        }
        P::Top | P::Right | P::Bottom | P::Left => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Auto]).or_else(|| parse_length_percentage(value, Range::All))
        }
        P::BoxSizing => keyword_in(single(values)?, &[Keyword::ContentBox, Keyword::BorderBox]),
        P::Clear => keyword_in(
            single(values)?,
            &[
                Keyword::None,
                Keyword::Left,
                Keyword::Right,
                Keyword::Both,
                Keyword::InlineStart,
                Keyword::InlineEnd,
            ],
        ),
        P::ColumnGap | P::RowGap => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Normal]).or_else(|| parse_length_percentage(value, Range::NonNegative))
        }
        P::Content => parse_content(values),
        P::Cursor => keyword_in(
            single(values)?,
            &[
                Keyword::Auto,
                Keyword::Default,
                Keyword::None,
                Keyword::Pointer,
                Keyword::Text,
                Keyword::Move,
                Keyword::NotAllowed,
                Keyword::Wait,
                Keyword::Help,
                Keyword::Crosshair,
                Keyword::Grab,
            ],
        ),
        P::Direction => keyword_in(single(values)?, &[Keyword::Ltr, Keyword::Rtl]),
        P::Display => parse_display(values),
        P::FlexBasis => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Auto, Keyword::Content])
                .or_else(|| parse_length_percentage(value, Range::NonNegative))
        }
        P::FlexDirection => keyword_in(
            single(values)?,
            &[Keyword::Row, Keyword::RowReverse, Keyword::Column, Keyword::ColumnReverse],
        ),
        P::FlexGrow | P::FlexShrink => parse_number(single(values)?, Range::NonNegative),
        P::FlexWrap => keyword_in(single(values)?, &[Keyword::Nowrap, Keyword::Wrap, Keyword::WrapReverse]),
        P::Float => keyword_in(
            single(values)?,
            &[
                Keyword::None,
                Keyword::Left,
                Keyword::Right,
                Keyword::InlineStart,
                Keyword::InlineEnd,
            ],
        ),
        P::FontFamily => parse_font_family(values),
        P::FontSize => parse_font_size(single(values)?),
        P::FontStretch => parse_font_stretch(single(values)?),
        P::FontStyle => parse_font_style(values),
        P::FontWeight => parse_font_weight(single(values)?),
        P::Width | P::Height | P::MinWidth | P::MinHeight => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Auto]).or_else(|| parse_length_percentage(value, Range::NonNegative))
        }
        P::MaxWidth | P::MaxHeight => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::None]).or_else(|| parse_length_percentage(value, Range::NonNegative))
        }
        P::JustifyContent => keyword_in(
            single(values)?,
            &[
                Keyword::Normal,
                Keyword::FlexStart,
                Keyword::FlexEnd,
                Keyword::Start,
                Keyword::End,
                Keyword::Center,
                Keyword::SpaceBetween,
                Keyword::SpaceAround,
                Keyword::SpaceEvenly,
                Keyword::Stretch,
            ],
        ),
        P::AlignItems => keyword_in(
            single(values)?,
            &[
                Keyword::Normal,
                Keyword::FlexStart,
                Keyword::FlexEnd,
                Keyword::Start,
                Keyword::End,
                Keyword::Center,
                Keyword::Baseline,
                Keyword::Stretch,
            ],
        ),
        P::LetterSpacing | P::WordSpacing => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Normal]).or_else(|| parse_length_percentage(value, Range::All))
        }
        P::LineHeight => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Normal])
                .or_else(|| parse_number(value, Range::NonNegative))
                .or_else(|| parse_length_percentage(value, Range::NonNegative))
        }
        P::ListStyleType => {
            let value = single(values)?;
            keyword_in(
                value,
                &[
                    Keyword::None,
                    Keyword::Disc,
                    Keyword::Circle,
                    Keyword::Square,
                    Keyword::Decimal,
                    Keyword::LowerAlpha,
                    Keyword::UpperAlpha,
                    Keyword::LowerRoman,
                    Keyword::UpperRoman,
                ],
            )
            .or_else(|| parse_string(value))
        }
        P::MarginBottom | P::MarginLeft | P::MarginRight | P::MarginTop => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Auto]).or_else(|| parse_length_percentage(value, Range::All))
        }
        P::PaddingBottom | P::PaddingLeft | P::PaddingRight | P::PaddingTop => {
            parse_length_percentage(single(values)?, Range::NonNegative)
        }
        P::MathDepth => parse_math_depth(single(values)?),
        P::MathStyle => keyword_in(single(values)?, &[Keyword::Normal, Keyword::Compact]),
        P::Opacity => {
            let value = single(values)?;
            match value {
                ComponentValue::Token(CSSToken::Percentage(p)) => Some(StyleValue::Number(*p as f32 / 100.0)),
                _ => parse_number(value, Range::All),
            }
        }
        P::Order => parse_integer(single(values)?),
        P::ZIndex => {
            let value = single(values)?;
            keyword_in(value, &[Keyword::Auto]).or_else(|| parse_integer(value))
        }
        P::OverflowX | P::OverflowY => keyword_in(single(values)?, OVERFLOWS),
        P::Position => keyword_in(
            single(values)?,
            &[
                Keyword::Static,
                Keyword::Relative,
                Keyword::Absolute,
                Keyword::Fixed,
                Keyword::Sticky,
            ],
        ),
        P::TextAlign => keyword_in(
            single(values)?,
            &[
                Keyword::Start,
                Keyword::End,
                Keyword::Left,
                Keyword::Right,
                Keyword::Center,
                Keyword::Justify,
                Keyword::MatchParent,
                Keyword::InheritOrCenter,
            ],
        ),
        P::TextDecorationLine => parse_text_decoration_line(values),
        P::TextIndent => parse_length_percentage(single(values)?, Range::All),
        P::TextTransform => keyword_in(
            single(values)?,
            &[
                Keyword::None,
                Keyword::Capitalize,
                Keyword::Uppercase,
                Keyword::Lowercase,
            ],
        ),
        P::UnicodeBidi => keyword_in(
            single(values)?,
            &[
                Keyword::Normal,
                Keyword::Embed,
                Keyword::Isolate,
                Keyword::BidiOverride,
                Keyword::IsolateOverride,
                Keyword::Plaintext,
            ],
        ),
        P::Visibility => keyword_in(single(values)?, &[Keyword::Visible, Keyword::Hidden, Keyword::Collapse]),
        P::WhiteSpace => keyword_in(
            single(values)?,
            &[
                Keyword::Normal,
                Keyword::Pre,
                Keyword::Nowrap,
                Keyword::PreWrap,
                Keyword::PreLine,
                Keyword::BreakSpaces,
            ],
        ),
        P::WritingMode => keyword_in(
            single(values)?,
            &[
                Keyword::HorizontalTb,
                Keyword::VerticalRl,
                Keyword::VerticalLr,
                Keyword::SidewaysRl,
                Keyword::SidewaysLr,
            ],
        ),
        _ => None,
    }
}

fn parse_url(value: &ComponentValue) -> Option<StyleValue> {
    match value {
        ComponentValue::Token(CSSToken::Url(url)) => Some(StyleValue::Url(url.clone())),
        ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("url") => {
            match significant(value).as_slice() {
                [ComponentValue::Token(CSSToken::String(url))] => Some(StyleValue::Url(url.clone())),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_string(value: &ComponentValue) -> Option<StyleValue> {
    match value {
        ComponentValue::Token(CSSToken::String(s)) => Some(StyleValue::String(s.clone())),
        _ => None,
    }
}

fn parse_animation_name(value: &ComponentValue) -> Option<StyleValue> {
    keyword_in(value, &[Keyword::None])
        .or_else(|| parse_string(value))
        .or_else(|| custom_ident(value).map(StyleValue::CustomIdent))
}

/// [§ 2.1 transition-property](https://www.w3.org/TR/css-transitions-1/#transition-property-property)
///
/// `none | <single-transition-property>#`. Unknown property names are kept
/// as custom idents so list positions stay aligned with the other
/// transition lists.
fn parse_transition_property(values: &[ComponentValue]) -> Option<StyleValue> {
    let groups = split_on_commas(values);
    if groups.len() == 1
        && let Some(none) = single(&groups[0]).and_then(|v| keyword_in(v, &[Keyword::None]))
    {
        return Some(none);
    }
    comma_list(values, one_of(transition_property_name))
}

fn transition_property_name(value: &ComponentValue) -> Option<StyleValue> {
    if let Some(all) = keyword_in(value, &[Keyword::All]) {
        return Some(all);
    }
    if value.as_ident().is_some_and(|s| s.eq_ignore_ascii_case("none")) {
        return None;
    }
    custom_ident(value).map(StyleValue::CustomIdent)
}

/// [§ 1.1 content](https://www.w3.org/TR/css-content-3/#content-property)
fn parse_content(values: &[ComponentValue]) -> Option<StyleValue> {
    let items = significant(values);
    if let [only] = items.as_slice()
        && let Some(keyword) = keyword_in(only, &[Keyword::Normal, Keyword::None])
    {
        return Some(keyword);
    }
    let parsed = items
        .into_iter()
        .map(|item| {
            parse_string(item).or_else(|| parse_url(item)).or_else(|| {
                keyword_in(
                    item,
                    &[
                        Keyword::OpenQuote,
                        Keyword::CloseQuote,
                        Keyword::NoOpenQuote,
                        Keyword::NoCloseQuote,
                    ],
                )
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(space_list(parsed))
}

/// [§ 2 display](https://www.w3.org/TR/css-display-3/#the-display-properties)
///
/// Multi-keyword forms are folded to their single-keyword equivalents.
fn parse_display(values: &[ComponentValue]) -> Option<StyleValue> {
    let keywords = significant(values)
        .into_iter()
        .map(|v| Keyword::from_ident(v.as_ident()?))
        .collect::<Option<Vec<_>>>()?;
    let keyword = match keywords.as_slice() {
        [single] => match single {
            Keyword::Block
            | Keyword::Inline
            | Keyword::InlineBlock
            | Keyword::Flex
            | Keyword::InlineFlex
            | Keyword::Grid
            | Keyword::InlineGrid
            | Keyword::FlowRoot
            | Keyword::ListItem
            | Keyword::Table
            | Keyword::InlineTable
            | Keyword::TableRow
            | Keyword::TableCell
            | Keyword::TableRowGroup
            | Keyword::TableHeaderGroup
            | Keyword::TableFooterGroup
            | Keyword::TableColumn
            | Keyword::TableColumnGroup
            | Keyword::TableCaption
            | Keyword::Contents
            | Keyword::None
            | Keyword::Math => *single,
            Keyword::Flow => Keyword::Block,
            _ => return None,
        },
        [Keyword::Block, Keyword::Flow] | [Keyword::Flow, Keyword::Block] => Keyword::Block,
        [Keyword::Inline, Keyword::Flow] | [Keyword::Flow, Keyword::Inline] => Keyword::Inline,
        [Keyword::Inline, Keyword::FlowRoot] | [Keyword::FlowRoot, Keyword::Inline] => Keyword::InlineBlock,
        [Keyword::Block, Keyword::FlowRoot] | [Keyword::FlowRoot, Keyword::Block] => Keyword::FlowRoot,
        [Keyword::Block, Keyword::Flex] | [Keyword::Flex, Keyword::Block] => Keyword::Flex,
        [Keyword::Inline, Keyword::Flex] | [Keyword::Flex, Keyword::Inline] => Keyword::InlineFlex,
        [Keyword::Block, Keyword::Grid] | [Keyword::Grid, Keyword::Block] => Keyword::Grid,
        [Keyword::Inline, Keyword::Grid] | [Keyword::Grid, Keyword::Inline] => Keyword::InlineGrid,
        [Keyword::Block, Keyword::Table] | [Keyword::Table, Keyword::Block] => Keyword::Table,
        [Keyword::Inline, Keyword::Table] | [Keyword::Table, Keyword::Inline] => Keyword::InlineTable,
        [Keyword::Block, Keyword::ListItem] | [Keyword::ListItem, Keyword::Block] => Keyword::ListItem,
        [Keyword::Block, Keyword::Math] | [Keyword::Math, Keyword::Block] => Keyword::BlockMath,
        [Keyword::Inline, Keyword::Math] | [Keyword::Math, Keyword::Inline] => Keyword::Math,
        _ => return None,
    };
    Some(StyleValue::Keyword(keyword))
}

/// [§ 3.1 font-family](https://www.w3.org/TR/css-fonts-4/#font-family-prop)
///
/// Each family is a generic keyword, a string, or a sequence of idents
/// joined by single spaces.
fn parse_font_family(values: &[ComponentValue]) -> Option<StyleValue> {
    let mut families = Vec::new();
    for group in split_on_commas(values) {
        let items = significant(&group);
        let family = match items.as_slice() {
            [] => return None,
            [ComponentValue::Token(CSSToken::String(name))] => StyleValue::String(name.clone()),
            [only] if only.as_ident().and_then(Keyword::from_ident).is_some_and(Keyword::is_generic_font_family) => {
                StyleValue::Keyword(Keyword::from_ident(only.as_ident()?)?)
            }
            idents => {
                let names = idents.iter().map(|v| v.as_ident()).collect::<Option<Vec<_>>>()?;
                StyleValue::String(names.join(" "))
            }
        };
        families.push(family);
    }
    Some(StyleValue::List(ValueList {
        separator: Separator::Comma,
        values: families,
    }))
}

/// [§ 3.5 font-size](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
fn parse_font_size(value: &ComponentValue) -> Option<StyleValue> {
    keyword_in(value, ABSOLUTE_SIZES)
        .or_else(|| keyword_in(value, &[Keyword::Smaller, Keyword::Larger, Keyword::Math]))
        .or_else(|| parse_length_percentage(value, Range::NonNegative))
}

/// [§ 3.4 font-width](https://www.w3.org/TR/css-fonts-4/#font-stretch-prop)
fn parse_font_stretch(value: &ComponentValue) -> Option<StyleValue> {
    keyword_in(value, FONT_STRETCHES)
        .or_else(|| keyword_in(value, &[Keyword::Normal]))
        .or_else(|| match value {
            ComponentValue::Token(CSSToken::Percentage(p)) if *p >= 0.0 => Some(StyleValue::Percentage(*p as f32)),
            _ => None,
        })
}

/// [§ 3.3 font-style](https://www.w3.org/TR/css-fonts-4/#font-style-prop)
///
/// An oblique angle is accepted and dropped.
fn parse_font_style(values: &[ComponentValue]) -> Option<StyleValue> {
    match significant(values).as_slice() {
        [only] => keyword_in(only, &[Keyword::Normal, Keyword::Italic, Keyword::Oblique]),
        [oblique, ComponentValue::Token(CSSToken::Dimension { .. })] => keyword_in(oblique, &[Keyword::Oblique]),
        _ => None,
    }
}

/// [§ 3.2 font-weight](https://www.w3.org/TR/css-fonts-4/#font-weight-prop)
fn parse_font_weight(value: &ComponentValue) -> Option<StyleValue> {
    keyword_in(value, &[Keyword::Normal, Keyword::Bold, Keyword::Bolder, Keyword::Lighter]).or_else(|| {
        match parse_number(value, Range::NonNegative)? {
            StyleValue::Number(n) if (1.0..=1000.0).contains(&n) => Some(StyleValue::Number(n)),
            _ => None,
        }
    })
}

/// [§ 3.1 math-depth](https://w3c.github.io/mathml-core/#the-math-script-level-property)
fn parse_math_depth(value: &ComponentValue) -> Option<StyleValue> {
    if keyword_in(value, &[Keyword::AutoAdd]).is_some() {
        return Some(StyleValue::MathDepth(MathDepth::AutoAdd));
    }
    if let ComponentValue::Function { name, value } = value
        && name.eq_ignore_ascii_case("add")
    {
        let StyleValue::Integer(delta) = parse_integer(single(value)?)? else {
            return None;
        };
        return Some(StyleValue::MathDepth(MathDepth::Add(delta)));
    }
    match parse_integer(value)? {
        StyleValue::Integer(depth) => Some(StyleValue::MathDepth(MathDepth::Integer(depth))),
        _ => None,
    }
}

/// [§ 2.1 text-decoration-line](https://www.w3.org/TR/css-text-decor-3/#text-decoration-line-property)
fn parse_text_decoration_line(values: &[ComponentValue]) -> Option<StyleValue> {
    let items = significant(values);
    if let [only] = items.as_slice()
        && let Some(none) = keyword_in(only, &[Keyword::None])
    {
        return Some(none);
    }
    let mut lines = Vec::new();
    for item in items {
        let line = keyword_in(item, &[Keyword::Underline, Keyword::Overline, Keyword::LineThrough])?;
        if lines.contains(&line) {
            return None;
        }
        lines.push(line);
    }
    Some(space_list(lines))
}

/// Parse the value of a shorthand.
fn parse_shorthand(shorthand: PropertyId, values: &[ComponentValue]) -> Option<StyleValue> {
    use PropertyId as P;
    match shorthand {
        P::Margin | P::Padding | P::Inset | P::BorderWidth | P::BorderStyle | P::BorderColor => {
            parse_positional(shorthand, values, 4)
        }
        P::MarginBlock
        | P::MarginInline
        | P::PaddingBlock
        | P::PaddingInline
        | P::InsetBlock
        | P::InsetInline
        | P::BorderBlockWidth
        | P::BorderInlineWidth
        | P::BorderBlockStyle
        | P::BorderInlineStyle
        | P::BorderBlockColor
        | P::BorderInlineColor
        | P::Overflow
        | P::Gap => parse_positional(shorthand, values, 2),
        P::BorderTop
        | P::BorderRight
        | P::BorderBottom
        | P::BorderLeft
        | P::Border
        | P::BorderBlockStart
        | P::BorderBlockEnd
        | P::BorderInlineStart
        | P::BorderInlineEnd => parse_border(shorthand, values),
        P::Flex => parse_flex(values),
        P::FlexFlow => parse_any_order(shorthand, values),
        P::Transition => parse_transition(values),
        P::Animation => parse_animation(values),
        P::Font => parse_font(values),
        P::TextDecoration => Some(shorthand_value(
            shorthand,
            vec![parse_text_decoration_line(values)?],
        )),
        P::Background => parse_any_order(shorthand, values),
        _ => None,
    }
}

fn shorthand_value(shorthand: PropertyId, values: Vec<StyleValue>) -> StyleValue {
    StyleValue::Shorthand(ShorthandValue {
        shorthand,
        sub_properties: shorthand.longhands().to_vec(),
        values,
    })
}

/// Edge (`max` = 4) and start/end (`max` = 2) shorthands. Every item must
/// parse as the first longhand's grammar.
fn parse_positional(shorthand: PropertyId, values: &[ComponentValue], max: usize) -> Option<StyleValue> {
    let first = *shorthand.longhands().first()?;
    let items = significant(values);
    if items.is_empty() || items.len() > max {
        return None;
    }
    let parsed = items
        .into_iter()
        .map(|item| parse_longhand(first, core::slice::from_ref(item)))
        .collect::<Option<Vec<_>>>()?;
    Some(if parsed.len() == 1 {
        parsed.into_iter().next()?
    } else {
        space_list(parsed)
    })
}

/// `<line-width> || <line-style> || <color>`, missing parts take their
/// initial value.
fn parse_border(shorthand: PropertyId, values: &[ComponentValue]) -> Option<StyleValue> {
    let mut width = None;
    let mut style = None;
    let mut color = None;
    for item in significant(values) {
        if width.is_none()
            && let Some(parsed) =
                keyword_in(item, BORDER_WIDTHS).or_else(|| parse_length(item, Range::NonNegative))
        {
            width = Some(parsed);
        } else if style.is_none()
            && let Some(parsed) = keyword_in(item, BORDER_STYLES)
        {
            style = Some(parsed);
        } else if color.is_none()
            && let Some(parsed) = parse_color_value(item)
        {
            color = Some(parsed);
        } else {
            return None;
        }
    }
    if width.is_none() && style.is_none() && color.is_none() {
        return None;
    }
    Some(shorthand_value(
        shorthand,
        vec![
            width.unwrap_or(StyleValue::Keyword(Keyword::Medium)),
            style.unwrap_or(StyleValue::Keyword(Keyword::None)),
            color.unwrap_or(StyleValue::Keyword(Keyword::Currentcolor)),
        ],
    ))
}

/// Shorthands whose parts may appear in any order, each at most once.
fn parse_any_order(shorthand: PropertyId, values: &[ComponentValue]) -> Option<StyleValue> {
    let longhands = shorthand.longhands();
    let mut parsed: Vec<Option<StyleValue>> = vec![None; longhands.len()];
    for item in significant(values) {
        let slot = longhands.iter().enumerate().find_map(|(i, longhand)| {
            if parsed[i].is_some() {
                return None;
            }
            parse_longhand(*longhand, core::slice::from_ref(item)).map(|value| (i, value))
        });
        let (index, value) = slot?;
        parsed[index] = Some(value);
    }
    if parsed.iter().all(Option::is_none) {
        return None;
    }
    let values = longhands
        .iter()
        .zip(parsed)
        .map(|(longhand, value)| value.unwrap_or_else(|| longhand.initial_value()))
        .collect();
    Some(shorthand_value(shorthand, values))
}

/// [§ 7.1 flex](https://www.w3.org/TR/css-flexbox-1/#flex-property)
fn parse_flex(values: &[ComponentValue]) -> Option<StyleValue> {
    let items = significant(values);
    let number = |v: &ComponentValue| parse_number(v, Range::NonNegative);
    let basis = |v: &ComponentValue| {
        keyword_in(v, &[Keyword::Auto, Keyword::Content]).or_else(|| parse_length_percentage(v, Range::NonNegative))
    };
    let (grow, shrink, flex_basis) = match items.as_slice() {
        [only] if only.as_ident().is_some_and(|s| s.eq_ignore_ascii_case("none")) => {
            (StyleValue::Number(0.0), StyleValue::Number(0.0), StyleValue::Keyword(Keyword::Auto))
        }
        // "flex: <positive-number>" is "flex: <positive-number> 1 0".
        [only] => match number(only) {
            Some(grow) => (grow, StyleValue::Number(1.0), StyleValue::Percentage(0.0)),
            None if keyword_in(only, &[Keyword::Auto]).is_some() => (
                StyleValue::Number(1.0),
                StyleValue::Number(1.0),
                StyleValue::Keyword(Keyword::Auto),
            ),
            None => (StyleValue::Number(1.0), StyleValue::Number(1.0), basis(only)?),
        },
        [first, second] => match (number(first), number(second)) {
            (Some(grow), Some(shrink)) => (grow, shrink, StyleValue::Percentage(0.0)),
            (Some(grow), None) => (grow, StyleValue::Number(1.0), basis(second)?),
            (None, _) => (number(second)?, StyleValue::Number(1.0), basis(first)?),
        },
        [first, second, third] => match number(first) {
            Some(grow) => (grow, number(second)?, basis(third)?),
            None => (number(second)?, number(third)?, basis(first)?),
        },
        _ => return None,
    };
    Some(shorthand_value(PropertyId::Flex, vec![grow, shrink, flex_basis]))
}

/// [§ 2.5 transition](https://www.w3.org/TR/css-transitions-1/#transition-shorthand-property)
///
/// `transition: none` is kept as the keyword and expands to
/// `all 0s ease 0s normal`.
fn parse_transition(values: &[ComponentValue]) -> Option<StyleValue> {
    if let Some(only) = single(values)
        && let Some(none) = keyword_in(only, &[Keyword::None])
    {
        return Some(none);
    }
    let mut lists: [Vec<StyleValue>; 5] = Default::default();
    for group in split_on_commas(values) {
        let mut property = None;
        let mut duration = None;
        let mut delay = None;
        let mut easing = None;
        let mut behavior = None;
        for item in significant(&group) {
            if let Some(time) = parse_time(item, Range::All) {
                if duration.is_none() {
                    duration = Some(time);
                } else if delay.is_none() {
                    delay = Some(time);
                } else {
                    return None;
                }
            } else if easing.is_none()
                && let Some(parsed) = parse_easing(item)
            {
                easing = Some(parsed);
            } else if behavior.is_none()
                && let Some(parsed) = keyword_in(item, &[Keyword::Normal, Keyword::AllowDiscrete])
            {
                behavior = Some(parsed);
            } else if property.is_none()
                && let Some(parsed) = transition_property_name(item)
            {
                property = Some(parsed);
            } else {
                return None;
            }
        }
        lists[0].push(property.unwrap_or(StyleValue::Keyword(Keyword::All)));
        lists[1].push(duration.unwrap_or(StyleValue::Time(Time::ZERO)));
        lists[2].push(easing.unwrap_or(StyleValue::Easing(Easing::EASE)));
        lists[3].push(delay.unwrap_or(StyleValue::Time(Time::ZERO)));
        lists[4].push(behavior.unwrap_or(StyleValue::Keyword(Keyword::Normal)));
    }
    let values = lists
        .into_iter()
        .map(|values| StyleValue::List(ValueList {
            separator: Separator::Comma,
            values,
        }))
        .collect();
    Some(shorthand_value(PropertyId::Transition, values))
}

/// [§ 3.9 animation](https://www.w3.org/TR/css-animations-1/#animation)
fn parse_animation(values: &[ComponentValue]) -> Option<StyleValue> {
    let longhands = PropertyId::Animation.longhands();
    let mut lists: Vec<Vec<StyleValue>> = vec![Vec::new(); longhands.len()];
    for group in split_on_commas(values) {
        let mut name = None;
        let mut duration = None;
        let mut easing = None;
        let mut delay = None;
        let mut iterations = None;
        let mut direction = None;
        let mut fill = None;
        let mut play_state = None;
        for item in significant(&group) {
            if let Some(time) = parse_time(item, Range::All) {
                if duration.is_none() {
                    duration = Some(time);
                } else if delay.is_none() {
                    delay = Some(time);
                } else {
                    return None;
                }
            } else if easing.is_none()
                && let Some(parsed) = parse_easing(item)
            {
                easing = Some(parsed);
            } else if iterations.is_none()
                && let Some(parsed) =
                    keyword_in(item, &[Keyword::Infinite]).or_else(|| parse_number(item, Range::NonNegative))
            {
                iterations = Some(parsed);
            } else if direction.is_none()
                && let Some(parsed) = keyword_in(item, ANIMATION_DIRECTIONS)
            {
                direction = Some(parsed);
            } else if fill.is_none()
                && let Some(parsed) = keyword_in(item, FILL_MODES)
            {
                fill = Some(parsed);
            } else if play_state.is_none()
                && let Some(parsed) = keyword_in(item, &[Keyword::Running, Keyword::Paused])
            {
                play_state = Some(parsed);
            } else if name.is_none()
                && let Some(parsed) = parse_animation_name(item)
            {
                name = Some(parsed);
            } else {
                return None;
            }
        }
        let parts = [name, duration, easing, delay, iterations, direction, fill, play_state];
        for ((list, part), longhand) in lists.iter_mut().zip(parts).zip(longhands) {
            list.push(part.unwrap_or_else(|| longhand.initial_value()));
        }
    }
    let values = lists
        .into_iter()
        .map(|values| StyleValue::List(ValueList {
            separator: Separator::Comma,
            values,
        }))
        .collect();
    Some(shorthand_value(PropertyId::Animation, values))
}

/// [§ 3.7 font](https://www.w3.org/TR/css-fonts-4/#font-prop)
///
/// `[ <font-style> || <font-weight> || <font-width> ]? <font-size>
/// [ / <line-height> ]? <font-family>`
fn parse_font(values: &[ComponentValue]) -> Option<StyleValue> {
    let items = significant(values);
    let mut style = None;
    let mut weight = None;
    let mut stretch = None;
    let mut index = 0;
    let size = loop {
        let item = items.get(index)?;
        index += 1;
        if let Some(size) = parse_font_size(item).filter(|v| !v.is_keyword(Keyword::Math)) {
            break size;
        }
        if keyword_in(item, &[Keyword::Normal]).is_some() {
            continue;
        }
        if style.is_none()
            && let Some(parsed) = keyword_in(item, &[Keyword::Italic, Keyword::Oblique])
        {
            style = Some(parsed);
        } else if weight.is_none()
            && let Some(parsed) = parse_font_weight(item)
        {
            weight = Some(parsed);
        } else if stretch.is_none()
            && let Some(parsed) = keyword_in(item, FONT_STRETCHES)
        {
            stretch = Some(parsed);
        } else {
            return None;
        }
    };
    let mut line_height = StyleValue::Keyword(Keyword::Normal);
    if items.get(index) == Some(&&ComponentValue::Token(CSSToken::Delim('/'))) {
        let item = items.get(index + 1)?;
        line_height = parse_longhand(PropertyId::LineHeight, core::slice::from_ref(*item))?;
        index += 2;
    }
    let family_start = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_whitespace())
        .nth(index)
        .map(|(i, _)| i)?;
    let family = parse_font_family(&values[family_start..])?;
    Some(shorthand_value(
        PropertyId::Font,
        vec![
            style.unwrap_or(StyleValue::Keyword(Keyword::Normal)),
            weight.unwrap_or(StyleValue::Keyword(Keyword::Normal)),
            stretch.unwrap_or(StyleValue::Keyword(Keyword::Normal)),
            size,
            line_height,
            family,
        ],
    ))
}

