//! CSS colours.
//!
//! [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)

use serde::Serialize;

use crate::syntax::ComponentValue;
use crate::tokenizer::CSSToken;

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 = opaque.
    pub a: u8,
}

/// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors),
/// sorted by name for binary search.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("black", 0x000000),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkorange", 0xff8c00),
    ("darkred", 0x8b0000),
    ("deeppink", 0xff1493),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gold", 0xffd700),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("grey", 0x808080),
    ("hotpink", 0xff69b4),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lightblue", 0xadd8e6),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lime", 0x00ff00),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("navy", 0x000080),
    ("olive", 0x808000),
    ("orange", 0xffa500),
    ("orchid", 0xda70d6),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("royalblue", 0x4169e1),
    ("salmon", 0xfa8072),
    ("seagreen", 0x2e8b57),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

impl Color {
    /// Black (#000000)
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// White (#ffffff)
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// `transparent`
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// An opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn from_packed(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// [§ 5.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    ///
    /// "The syntax of a <hex-color> is a <hash-token> token whose value consists of
    /// 3, 4, 6, or 8 hexadecimal digits."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 | 4 => {
                let channel = |i: usize| digit(i).map(|d| d * 17);
                Some(Self {
                    r: channel(0)?,
                    g: channel(1)?,
                    b: channel(2)?,
                    a: if hex.len() == 4 { channel(3)? } else { 255 },
                })
            }
            6 | 8 => Some(Self {
                r: pair(0)?,
                g: pair(2)?,
                b: pair(4)?,
                a: if hex.len() == 8 { pair(6)? } else { 255 },
            }),
            _ => None,
        }
    }

    /// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name == "transparent" {
            return Some(Self::TRANSPARENT);
        }
        NAMED_COLORS
            .binary_search_by(|(candidate, _)| (*candidate).cmp(name.as_str()))
            .ok()
            .map(|index| Self::from_packed(NAMED_COLORS[index].1))
    }

    /// `#rrggbb` or `#rrggbbaa`.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parse one component value as a colour. `currentcolor` is a keyword and
/// is not handled here.
#[must_use]
pub fn parse_color(value: &ComponentValue) -> Option<Color> {
    match value {
        ComponentValue::Token(CSSToken::Hash { value, .. }) => Color::from_hex(value),
        ComponentValue::Token(CSSToken::Ident(name)) => Color::from_named(name),
        ComponentValue::Function { name, value } => match name.to_ascii_lowercase().as_str() {
            "rgb" | "rgba" => parse_rgb_function(value),
            "hsl" | "hsla" => parse_hsl_function(value),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum ColorArg {
    Number(f64),
    Percentage(f64),
}

impl ColorArg {
    fn to_channel(self) -> u8 {
        let v = match self {
            Self::Number(n) => n,
            Self::Percentage(p) => p * 255.0 / 100.0,
        };
        v.round().clamp(0.0, 255.0) as u8
    }

    fn to_alpha(self) -> u8 {
        let v = match self {
            Self::Number(n) => n * 255.0,
            Self::Percentage(p) => p * 255.0 / 100.0,
        };
        v.round().clamp(0.0, 255.0) as u8
    }

    const fn raw(self) -> f64 {
        match self {
            Self::Number(v) | Self::Percentage(v) => v,
        }
    }
}

/// Numeric arguments, ignoring commas, whitespace and the `/` before alpha;
/// legacy and modern syntax produce the same list.
fn extract_color_args(args: &[ComponentValue]) -> Vec<ColorArg> {
    args.iter()
        .filter_map(|arg| match arg {
            ComponentValue::Token(CSSToken::Number { value, .. }) => Some(ColorArg::Number(*value)),
            ComponentValue::Token(CSSToken::Percentage(value)) => {
                Some(ColorArg::Percentage(*value))
            }
            ComponentValue::Token(CSSToken::Dimension { value, unit, .. })
                if unit.eq_ignore_ascii_case("deg") =>
            {
                Some(ColorArg::Number(*value))
            }
            _ => None,
        })
        .collect()
}

/// [§ 5.1 The RGB Functions](https://www.w3.org/TR/css-color-4/#rgb-functions)
fn parse_rgb_function(args: &[ComponentValue]) -> Option<Color> {
    let vals = extract_color_args(args);
    if !(3..=4).contains(&vals.len()) {
        return None;
    }
    Some(Color {
        r: vals[0].to_channel(),
        g: vals[1].to_channel(),
        b: vals[2].to_channel(),
        a: vals.get(3).map_or(255, |a| a.to_alpha()),
    })
}

/// [§ 7 HSL Colors](https://www.w3.org/TR/css-color-4/#the-hsl-notation)
fn parse_hsl_function(args: &[ComponentValue]) -> Option<Color> {
    let vals = extract_color_args(args);
    if !(3..=4).contains(&vals.len()) {
        return None;
    }
    let (r, g, b) = hsl_to_rgb(vals[0].raw(), vals[1].raw() / 100.0, vals[2].raw() / 100.0);
    Some(Color {
        r,
        g,
        b,
        a: vals.get(3).map_or(255, |a| a.to_alpha()),
    })
}

/// [§ 7.1 Converting HSL Colors to sRGB](https://www.w3.org/TR/css-color-4/#hsl-to-rgb)
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let f = |n: f64| {
        let k = (n + h / 30.0) % 12.0;
        let a = s * l.min(1.0 - l);
        let v = l - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0);
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    (f(0.0), f(8.0), f(4.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn hex_forms() {
        assert_eq!(Color::from_hex("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("00ff0080").map(|c| c.a), Some(0x80));
        assert_eq!(Color::from_hex("#12345"), None);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }
}
