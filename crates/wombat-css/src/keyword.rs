//! CSS keywords recognised by the property grammars.

use serde::Serialize;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// A CSS keyword value. Parsing is ASCII case-insensitive.
///
/// CSS-wide keywords (`initial`, `inherit`, `unset`, `revert`,
/// `revert-layer`) are not here; they are distinct [`crate::StyleValue`]
/// variants because the cascade treats them specially.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum Keyword {
    Auto,
    None,
    Normal,
    All,
    Currentcolor,

    // display
    Block,
    Inline,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    Flow,
    FlowRoot,
    ListItem,
    Table,
    InlineTable,
    TableRow,
    TableCell,
    TableRowGroup,
    TableHeaderGroup,
    TableFooterGroup,
    TableColumn,
    TableColumnGroup,
    TableCaption,
    Contents,
    Math,
    BlockMath,
    InlineMath,

    // position, float, clear
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
    Left,
    Right,
    Top,
    Bottom,
    Both,
    InlineStart,
    InlineEnd,

    // overflow, visibility
    Visible,
    Hidden,
    Clip,
    Scroll,
    Collapse,

    // border style and width
    Dotted,
    Dashed,
    Solid,
    Double,
    Groove,
    Ridge,
    Inset,
    Outset,
    Thin,
    Medium,
    Thick,

    // font-size
    XxSmall,
    XSmall,
    Small,
    Large,
    XLarge,
    XxLarge,
    XxxLarge,
    Smaller,
    Larger,

    // font-style, font-weight, font-width
    Italic,
    Oblique,
    Bold,
    Bolder,
    Lighter,
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,

    // generic font families
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
    UiSerif,
    UiSansSerif,
    UiMonospace,
    UiRounded,
    SystemUi,

    // text
    Start,
    End,
    Center,
    Justify,
    MatchParent,
    #[strum(serialize = "-wombat-inherit-or-center")]
    #[serde(rename = "-wombat-inherit-or-center")]
    InheritOrCenter,
    Capitalize,
    Uppercase,
    Lowercase,
    Underline,
    Overline,
    LineThrough,
    Pre,
    Nowrap,
    PreWrap,
    PreLine,
    BreakSpaces,

    // writing modes
    Ltr,
    Rtl,
    HorizontalTb,
    VerticalRl,
    VerticalLr,
    SidewaysRl,
    SidewaysLr,
    Embed,
    Isolate,
    BidiOverride,
    IsolateOverride,
    Plaintext,

    // box
    ContentBox,
    BorderBox,

    // flex and alignment
    Row,
    RowReverse,
    Column,
    ColumnReverse,
    Wrap,
    WrapReverse,
    Content,
    FlexStart,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    Stretch,
    Baseline,

    // animations and transitions
    Reverse,
    Alternate,
    AlternateReverse,
    Forwards,
    Backwards,
    Infinite,
    Running,
    Paused,
    AllowDiscrete,

    // easing
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    StepStart,
    StepEnd,
    JumpStart,
    JumpEnd,
    JumpNone,
    JumpBoth,

    // math
    AutoAdd,
    Compact,

    // content
    OpenQuote,
    CloseQuote,
    NoOpenQuote,
    NoCloseQuote,

    // cursor
    Default,
    Pointer,
    Text,
    Move,
    NotAllowed,
    Wait,
    Help,
    Crosshair,
    Grab,

    // list-style-type
    Disc,
    Circle,
    Square,
    Decimal,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

impl Keyword {
    /// Parse an identifier as a keyword.
    #[must_use]
    pub fn from_ident(ident: &str) -> Option<Self> {
        ident.parse().ok()
    }

    /// Generic font family keywords.
    #[must_use]
    pub const fn is_generic_font_family(self) -> bool {
        matches!(
            self,
            Self::Serif
                | Self::SansSerif
                | Self::Monospace
                | Self::Cursive
                | Self::Fantasy
                | Self::Math
                | Self::UiSerif
                | Self::UiSansSerif
                | Self::UiMonospace
                | Self::UiRounded
                | Self::SystemUi
        )
    }
}
