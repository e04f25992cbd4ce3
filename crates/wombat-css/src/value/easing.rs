//! Easing functions.
//!
//! [CSS Easing Functions Level 1](https://www.w3.org/TR/css-easing-1/)

use serde::Serialize;

use crate::keyword::Keyword;
use crate::syntax::ComponentValue;
use crate::tokenizer::CSSToken;

/// [§ 3.1 Step position](https://www.w3.org/TR/css-easing-1/#step-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum StepPosition {
    JumpStart,
    JumpEnd,
    JumpNone,
    JumpBoth,
}

/// An `<easing-function>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// [§ 2.1](https://www.w3.org/TR/css-easing-1/#linear-easing-function)
    Linear,
    /// [§ 2.2](https://www.w3.org/TR/css-easing-1/#cubic-bezier-easing-functions)
    CubicBezier {
        /// First control point x.
        x1: f64,
        /// First control point y.
        y1: f64,
        /// Second control point x.
        x2: f64,
        /// Second control point y.
        y2: f64,
    },
    /// [§ 2.3](https://www.w3.org/TR/css-easing-1/#step-easing-functions)
    Steps {
        /// Number of intervals.
        count: u32,
        /// Where the jumps happen.
        position: StepPosition,
    },
}

impl Easing {
    /// `ease`, the default for transitions and animations.
    pub const EASE: Self = Self::CubicBezier {
        x1: 0.25,
        y1: 0.1,
        x2: 0.25,
        y2: 1.0,
    };

    /// Map a keyword to its easing function.
    #[must_use]
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        let bezier = |x1, y1, x2, y2| Self::CubicBezier { x1, y1, x2, y2 };
        Some(match keyword {
            Keyword::Linear => Self::Linear,
            Keyword::Ease => Self::EASE,
            Keyword::EaseIn => bezier(0.42, 0.0, 1.0, 1.0),
            Keyword::EaseOut => bezier(0.0, 0.0, 0.58, 1.0),
            Keyword::EaseInOut => bezier(0.42, 0.0, 0.58, 1.0),
            Keyword::StepStart => Self::Steps {
                count: 1,
                position: StepPosition::JumpStart,
            },
            Keyword::StepEnd => Self::Steps {
                count: 1,
                position: StepPosition::JumpEnd,
            },
            _ => return None,
        })
    }

    /// Parse one easing function.
    #[must_use]
    pub fn parse(value: &ComponentValue) -> Option<Self> {
        if let Some(ident) = value.as_ident() {
            return Self::from_keyword(Keyword::from_ident(ident)?);
        }
        let ComponentValue::Function { name, value: args } = value else {
            return None;
        };
        let numbers: Vec<f64> = args
            .iter()
            .filter_map(|arg| match arg {
                ComponentValue::Token(CSSToken::Number { value, .. }) => Some(*value),
                _ => None,
            })
            .collect();
        match name.to_ascii_lowercase().as_str() {
            "cubic-bezier" => {
                let [x1, y1, x2, y2] = numbers.as_slice() else {
                    return None;
                };
                // "Both x values must be in the range [0, 1] or the definition is invalid."
                if !(0.0..=1.0).contains(x1) || !(0.0..=1.0).contains(x2) {
                    return None;
                }
                Some(Self::CubicBezier {
                    x1: *x1,
                    y1: *y1,
                    x2: *x2,
                    y2: *y2,
                })
            }
            "steps" => {
                let count = *numbers.first()?;
                let position = args
                    .iter()
                    .filter_map(ComponentValue::as_ident)
                    .find_map(Keyword::from_ident)
                    .map_or(Some(StepPosition::JumpEnd), |keyword| match keyword {
                        Keyword::JumpStart | Keyword::Start => Some(StepPosition::JumpStart),
                        Keyword::JumpEnd | Keyword::End => Some(StepPosition::JumpEnd),
                        Keyword::JumpNone => Some(StepPosition::JumpNone),
                        Keyword::JumpBoth => Some(StepPosition::JumpBoth),
                        _ => None,
                    })?;
                let minimum = if position == StepPosition::JumpNone { 2.0 } else { 1.0 };
                if count < minimum || count.fract() != 0.0 {
                    return None;
                }
                Some(Self::Steps {
                    count: count as u32,
                    position,
                })
            }
            "linear" if numbers.is_empty() => Some(Self::Linear),
            _ => None,
        }
    }

    /// Evaluate at input progress `t`. `before_flag` is set when the
    /// animation is in its before phase, which matters for `jump-start`.
    #[must_use]
    pub fn evaluate(&self, t: f64, before_flag: bool) -> f64 {
        match *self {
            Self::Linear => t,
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier_at(t, x1, y1, x2, y2),
            Self::Steps { count, position } => {
                // [§ 3.2 Output of a step easing function](https://www.w3.org/TR/css-easing-1/#step-easing-algo)
                let steps = f64::from(count);
                let mut current_step = (t * steps).floor();
                if matches!(position, StepPosition::JumpStart | StepPosition::JumpBoth) {
                    current_step += 1.0;
                }
                if before_flag && (t * steps).fract() == 0.0 {
                    current_step -= 1.0;
                }
                if t >= 0.0 && current_step < 0.0 {
                    current_step = 0.0;
                }
                let jumps = match position {
                    StepPosition::JumpStart | StepPosition::JumpEnd => steps,
                    StepPosition::JumpNone => steps - 1.0,
                    StepPosition::JumpBoth => steps + 1.0,
                };
                if t <= 1.0 && current_step > jumps {
                    current_step = jumps;
                }
                current_step / jumps
            }
        }
    }
}

/// Solve the bezier for x = `t` by Newton iteration with a bisection
/// fallback, then return y. Outside [0, 1] the curve is extended linearly.
fn cubic_bezier_at(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let sample = |a: f64, b: f64, s: f64| {
        let u = 1.0 - s;
        3.0 * u * u * s * a + 3.0 * u * s * s * b + s * s * s
    };
    let slope = |a: f64, b: f64, s: f64| {
        let u = 1.0 - s;
        3.0 * u * u * a + 6.0 * u * s * (b - a) + 3.0 * s * s * (1.0 - b)
    };

    if t <= 0.0 {
        let gradient = if x1 > 0.0 {
            y1 / x1
        } else if y1 == 0.0 && x2 > 0.0 {
            y2 / x2
        } else {
            0.0
        };
        return gradient * t;
    }
    if t >= 1.0 {
        let gradient = if x2 < 1.0 {
            (y2 - 1.0) / (x2 - 1.0)
        } else if y2 == 1.0 && x1 < 1.0 {
            (y1 - 1.0) / (x1 - 1.0)
        } else {
            0.0
        };
        return 1.0 + gradient * (t - 1.0);
    }

    let mut s = t;
    for _ in 0..8 {
        let error = sample(x1, x2, s) - t;
        if error.abs() < 1e-7 {
            return sample(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= error / d;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = t;
    for _ in 0..64 {
        let x = sample(x1, x2, s);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = f64::midpoint(lo, hi);
    }
    sample(y1, y2, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        assert!((Easing::Linear.evaluate(0.4, false) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn ease_endpoints_and_midpoint() {
        assert!(Easing::EASE.evaluate(0.0, false).abs() < 1e-6);
        assert!((Easing::EASE.evaluate(1.0, false) - 1.0).abs() < 1e-6);
        let mid = Easing::EASE.evaluate(0.5, false);
        assert!((mid - 0.8024).abs() < 1e-3, "{mid}");
    }

    #[test]
    fn test_keywords_map_to_easing_functions() {
        assert_eq!(Easing::from_keyword(Keyword::Ease), Some(Easing::EASE));
        assert_eq!(
            Easing::from_keyword(Keyword::EaseInOut),
            Some(Easing::CubicBezier {
                x1: 0.42,
                y1: 0.0,
                x2: 0.58,
                y2: 1.0
            })
        );
        assert_eq!(
            Easing::from_keyword(Keyword::StepStart),
            Some(Easing::Steps {
                count: 1,
                position: StepPosition::JumpStart
            })
        );
        assert_eq!(Easing::from_keyword(Keyword::Auto), None);
    }

    #[test]
    fn steps_jump_end() {
        let steps = Easing::Steps {
            count: 4,
            position: StepPosition::JumpEnd,
        };
        assert!((steps.evaluate(0.3, false) - 0.25).abs() < 1e-9);
        assert!((steps.evaluate(1.0, false) - 1.0).abs() < 1e-9);
    }
}
