//! CSS front-end for the Wombat style engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Stylesheets, rule lists, declaration lists
//!   - Nested style rules ([CSS Nesting](https://www.w3.org/TR/css-nesting-1/))
//! - **Stylesheet model**: style rules, nested declarations, `@font-face`,
//!   `@keyframes`, `@layer`, `@import`, `@media`, `@supports`, `@namespace`
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Parsing and specificity; matching lives in `wombat-style`
//! - **Property table** with inheritance, initial values, shorthands and
//!   logical aliases
//! - **Values** ([CSS Values Level 4](https://www.w3.org/TR/css-values-4/))
//!   - Lengths, colours, times, easing functions, `calc()`
//!   - `var()`, `env()` and `attr()` substitution
//!
//! # Not Yet Implemented
//!
//! - Serialization of rules back to text
//! - `@container`, `@page`, `@property`, `@scope`
//! - Colour functions beyond `rgb()`/`rgba()`/`hsl()`/`hsla()`

/// Keywords used by the property grammars.
pub mod keyword;
/// Logical-to-physical mapping per [CSS Logical Properties](https://www.w3.org/TR/css-logical-1/).
pub mod logical;
/// Media queries per [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/).
pub mod media;
/// Declaration value parsing.
pub mod parse_value;
/// The property table.
pub mod property;
/// Selector model and parser per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Stylesheet object model.
pub mod stylesheet;
/// `var()`, `env()` and `attr()` substitution.
pub mod substitute;
/// `@supports` conditions.
pub mod supports;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod syntax;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;
/// Style values.
pub mod value;

pub use keyword::Keyword;
pub use logical::{Direction, LogicalAliasMappingContext, WritingMode};
pub use media::{MediaEnvironment, MediaQueryList};
pub use parse_value::parse_css_value;
pub use property::{AnimationType, PropertyId, is_custom_property_name};
pub use selector::{
    PseudoClass, PseudoClassBitmap, PseudoClassKind, PseudoElement, Selector, SelectorList, SimpleSelector,
    Specificity, parse_selector_list,
};
pub use stylesheet::{
    CssRule, CustomPropertyDeclaration, Declaration, DeclarationBlock, FontFaceRule, FontFaceSource, Keyframe,
    KeyframesRule, StyleRule, Stylesheet,
};
pub use syntax::{CSSParser, ComponentValue, parse_component_values};
pub use tokenizer::{CSSToken, CSSTokenizer};
pub use value::{
    AbsolutizeContext, Color, DEFAULT_FONT_SIZE_PX, Easing, FontMetrics, Length, LengthUnit, StyleValue, Time,
};
