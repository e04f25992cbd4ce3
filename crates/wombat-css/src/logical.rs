//! Flow-relative to physical mapping.
//!
//! [§ 6.2 Flow-relative Directions](https://www.w3.org/TR/css-writing-modes-4/#logical-directions)

use serde::Serialize;

use crate::keyword::Keyword;
use crate::value::StyleValue;

/// [§ 3.1 writing-mode](https://www.w3.org/TR/css-writing-modes-4/#block-flow)
///
/// "The writing-mode property specifies whether lines of text are laid out
/// horizontally or vertically and the direction in which blocks progress."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WritingMode {
    /// Top-to-bottom block flow.
    #[default]
    HorizontalTb,
    /// Right-to-left block flow, vertical typographic mode.
    VerticalRl,
    /// Left-to-right block flow, vertical typographic mode.
    VerticalLr,
    /// Right-to-left block flow, horizontal typographic mode.
    SidewaysRl,
    /// Left-to-right block flow, horizontal typographic mode, lines
    /// progress bottom to top.
    SidewaysLr,
}

impl WritingMode {
    /// Read a computed `writing-mode`.
    #[must_use]
    pub fn from_value(value: &StyleValue) -> Self {
        match value.as_keyword() {
            Some(Keyword::VerticalRl) => Self::VerticalRl,
            Some(Keyword::VerticalLr) => Self::VerticalLr,
            Some(Keyword::SidewaysRl) => Self::SidewaysRl,
            Some(Keyword::SidewaysLr) => Self::SidewaysLr,
            _ => Self::HorizontalTb,
        }
    }
}

/// [§ 2.1 direction](https://www.w3.org/TR/css-writing-modes-4/#direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

impl Direction {
    /// Read a computed `direction`.
    #[must_use]
    pub fn from_value(value: &StyleValue) -> Self {
        if value.is_keyword(Keyword::Rtl) { Self::Rtl } else { Self::Ltr }
    }
}

/// A physical side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum PhysicalSide {
    Top,
    Right,
    Bottom,
    Left,
}

/// A flow-relative side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum LogicalSide {
    BlockStart,
    BlockEnd,
    InlineStart,
    InlineEnd,
}

/// A flow-relative dimension of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(missing_docs)]
pub enum LogicalAxis {
    Inline,
    Block,
}

/// The inputs logical property mapping depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct LogicalAliasMappingContext {
    /// Computed `writing-mode`.
    pub writing_mode: WritingMode,
    /// Computed `direction`.
    pub direction: Direction,
}

impl LogicalAliasMappingContext {
    /// | writing-mode   | block-start | inline-start (ltr) | inline-start (rtl) |
    /// |----------------|-------------|--------------------|--------------------|
    /// | horizontal-tb  | top         | left               | right              |
    /// | vertical-rl    | right       | top                | bottom             |
    /// | sideways-rl    | right       | top                | bottom             |
    /// | vertical-lr    | left        | top                | bottom             |
    /// | sideways-lr    | left        | bottom             | top                |
    #[must_use]
    pub const fn physical_side(&self, side: LogicalSide) -> PhysicalSide {
        let block_start = match self.writing_mode {
            WritingMode::HorizontalTb => PhysicalSide::Top,
            WritingMode::VerticalRl | WritingMode::SidewaysRl => PhysicalSide::Right,
            WritingMode::VerticalLr | WritingMode::SidewaysLr => PhysicalSide::Left,
        };
        let inline_start = match (self.writing_mode, self.direction) {
            (WritingMode::HorizontalTb, Direction::Ltr) => PhysicalSide::Left,
            (WritingMode::HorizontalTb, Direction::Rtl) => PhysicalSide::Right,
            (WritingMode::SidewaysLr, Direction::Ltr)
            | (
                WritingMode::VerticalRl | WritingMode::VerticalLr | WritingMode::SidewaysRl,
                Direction::Rtl,
            ) => PhysicalSide::Bottom,
            _ => PhysicalSide::Top,
        };
        match side {
            LogicalSide::BlockStart => block_start,
            LogicalSide::BlockEnd => block_start.opposite(),
            LogicalSide::InlineStart => inline_start,
            LogicalSide::InlineEnd => inline_start.opposite(),
        }
    }

    /// Whether the inline axis is horizontal.
    #[must_use]
    pub const fn is_horizontal(&self) -> bool {
        matches!(self.writing_mode, WritingMode::HorizontalTb)
    }
}

impl PhysicalSide {
    /// The side across the box.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(writing_mode: WritingMode, direction: Direction) -> LogicalAliasMappingContext {
        LogicalAliasMappingContext {
            writing_mode,
            direction,
        }
    }

    #[test]
    fn horizontal_tb() {
        let ltr = context(WritingMode::HorizontalTb, Direction::Ltr);
        assert_eq!(ltr.physical_side(LogicalSide::BlockStart), PhysicalSide::Top);
        assert_eq!(ltr.physical_side(LogicalSide::InlineStart), PhysicalSide::Left);
        let rtl = context(WritingMode::HorizontalTb, Direction::Rtl);
        assert_eq!(rtl.physical_side(LogicalSide::InlineStart), PhysicalSide::Right);
        assert_eq!(rtl.physical_side(LogicalSide::InlineEnd), PhysicalSide::Left);
    }

    #[test]
    fn vertical_modes() {
        let rl = context(WritingMode::VerticalRl, Direction::Ltr);
        assert_eq!(rl.physical_side(LogicalSide::BlockStart), PhysicalSide::Right);
        assert_eq!(rl.physical_side(LogicalSide::InlineStart), PhysicalSide::Top);
        let lr = context(WritingMode::VerticalLr, Direction::Rtl);
        assert_eq!(lr.physical_side(LogicalSide::BlockEnd), PhysicalSide::Right);
        assert_eq!(lr.physical_side(LogicalSide::InlineStart), PhysicalSide::Bottom);
    }

    #[test]
    fn sideways_lr_inline_start_is_bottom() {
        let ctx = context(WritingMode::SidewaysLr, Direction::Ltr);
        assert_eq!(ctx.physical_side(LogicalSide::InlineStart), PhysicalSide::Bottom);
        assert_eq!(ctx.physical_side(LogicalSide::BlockStart), PhysicalSide::Left);
    }
}
