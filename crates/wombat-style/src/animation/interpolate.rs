//! Interpolation of computed values.
//!
//! [Web Animations § 5.3 Animation types](https://www.w3.org/TR/web-animations-1/#animation-types)

use wombat_css::value::{CalcNode, ValueList};
use wombat_css::{AnimationType, Color, Keyword, Length, PropertyId, StyleValue};

fn lerp(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

fn lerp_f32(from: f32, to: f32, progress: f64) -> f32 {
    lerp(f64::from(from), f64::from(to), progress) as f32
}

/// Values that only exist before computation and so cannot be animated.
fn is_uncomputed(value: &StyleValue) -> bool {
    value.is_css_wide_keyword()
        || matches!(
            value,
            StyleValue::Unresolved(_)
                | StyleValue::PendingSubstitution(_)
                | StyleValue::GuaranteedInvalid
                | StyleValue::Shorthand(_)
        )
}

/// "Animation type: discrete ... the property's values cannot be
/// meaningfully combined, thus it is not additive and interpolation swaps
/// from Va to Vb at 50% (p=0.5)".
fn discrete(from: &StyleValue, to: &StyleValue, progress: f64) -> StyleValue {
    if progress < 0.5 { from.clone() } else { to.clone() }
}

/// [CSS Color 4 § 12.3](https://www.w3.org/TR/css-color-4/#interpolation-alpha)
///
/// Interpolated in premultiplied sRGB.
fn interpolate_color(from: Color, to: Color, progress: f64) -> Color {
    let alpha = lerp(f64::from(from.a), f64::from(to.a), progress).clamp(0.0, 255.0);
    let channel = |a: u8, b: u8| {
        if alpha == 0.0 {
            return 0;
        }
        let premultiplied = lerp(
            f64::from(a) * f64::from(from.a),
            f64::from(b) * f64::from(to.a),
            progress,
        );
        (premultiplied / alpha).round().clamp(0.0, 255.0) as u8
    };
    Color {
        r: channel(from.r, to.r),
        g: channel(from.g, to.g),
        b: channel(from.b, to.b),
        a: alpha.round() as u8,
    }
}

/// A length, percentage or calculation as a calc tree scaled by `factor`.
fn scaled_calc_node(value: &StyleValue, factor: f64) -> Option<CalcNode> {
    let factor_f32 = factor as f32;
    Some(match value {
        StyleValue::Length(length) => CalcNode::Length(Length {
            value: length.value * factor_f32,
            unit: length.unit,
        }),
        StyleValue::Percentage(percentage) => CalcNode::Percentage(percentage * factor_f32),
        StyleValue::Calculated(node) => CalcNode::Product(vec![node.as_ref().clone(), CalcNode::Number(factor_f32)]),
        _ => return None,
    })
}

/// [CSS Values 4 § 3.4.2 Combination of length-percentages](https://www.w3.org/TR/css-values-4/#combine-mixed)
fn interpolate_length_percentage(from: &StyleValue, to: &StyleValue, progress: f64) -> Option<StyleValue> {
    let sum = CalcNode::Sum(vec![scaled_calc_node(from, 1.0 - progress)?, scaled_calc_node(to, progress)?]);
    Some(sum.simplify().into_style_value())
}

/// Interpolate two computed values component-wise. `None` when their
/// types do not line up.
fn interpolate_by_computed_value(from: &StyleValue, to: &StyleValue, progress: f64) -> Option<StyleValue> {
    Some(match (from, to) {
        (StyleValue::Length(a), StyleValue::Length(b)) if a.unit == b.unit => StyleValue::Length(Length {
            value: lerp_f32(a.value, b.value, progress),
            unit: a.unit,
        }),
        (StyleValue::Percentage(a), StyleValue::Percentage(b)) => StyleValue::Percentage(lerp_f32(*a, *b, progress)),
        (StyleValue::Number(a), StyleValue::Number(b)) => StyleValue::Number(lerp_f32(*a, *b, progress)),
        (StyleValue::Integer(a), StyleValue::Integer(b)) => {
            StyleValue::Integer(lerp(f64::from(*a), f64::from(*b), progress).round() as i32)
        }
        (StyleValue::Color(a), StyleValue::Color(b)) => StyleValue::Color(interpolate_color(*a, *b, progress)),
        (
            StyleValue::Length(_) | StyleValue::Percentage(_) | StyleValue::Calculated(_),
            StyleValue::Length(_) | StyleValue::Percentage(_) | StyleValue::Calculated(_),
        ) => interpolate_length_percentage(from, to, progress)?,
        (StyleValue::List(a), StyleValue::List(b)) if a.separator == b.separator && a.values.len() == b.values.len() => {
            StyleValue::List(ValueList {
                separator: a.separator,
                values: a
                    .values
                    .iter()
                    .zip(&b.values)
                    .map(|(a, b)| interpolate_by_computed_value(a, b, progress))
                    .collect::<Option<_>>()?,
            })
        }
        (a, b) if a == b => a.clone(),
        _ => return None,
    })
}

/// Interpolate `property` from `from` to `to`. Values that cannot be
/// combined fall back to a discrete flip at 50%; `None` means the values
/// cannot be animated at all.
#[must_use]
pub fn interpolate(property: PropertyId, from: &StyleValue, to: &StyleValue, progress: f64) -> Option<StyleValue> {
    if is_uncomputed(from) || is_uncomputed(to) {
        return None;
    }
    match property.animation_type() {
        AnimationType::None => None,
        // [CSS Display 4 § 4 Visibility](https://drafts.csswg.org/css-display-4/#visibility)
        // "if one of the values is visible, interpolated as a discrete step
        // where values of p between 0 and 1 map to visible"
        AnimationType::Discrete
            if property == PropertyId::Visibility
                && (from.is_keyword(Keyword::Visible) || to.is_keyword(Keyword::Visible))
                && progress > 0.0
                && progress < 1.0 =>
        {
            Some(StyleValue::Keyword(Keyword::Visible))
        }
        AnimationType::Discrete => Some(discrete(from, to, progress)),
        AnimationType::ByComputedValue => {
            Some(interpolate_by_computed_value(from, to, progress).unwrap_or_else(|| discrete(from, to, progress)))
        }
    }
}

/// Whether two values interpolate smoothly rather than by a discrete
/// flip.
#[must_use]
pub fn can_interpolate(property: PropertyId, from: &StyleValue, to: &StyleValue) -> bool {
    property.animation_type() == AnimationType::ByComputedValue
        && !is_uncomputed(from)
        && !is_uncomputed(to)
        && interpolate_by_computed_value(from, to, 0.5).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_interpolate_linearly() {
        let value = interpolate(PropertyId::Width, &StyleValue::px(0.0), &StyleValue::px(100.0), 0.25);
        assert_eq!(value, Some(StyleValue::px(25.0)));
    }

    #[test]
    fn test_discrete_flips_at_half() {
        let from = StyleValue::Keyword(Keyword::Block);
        let to = StyleValue::Keyword(Keyword::Flex);
        assert_eq!(interpolate(PropertyId::Display, &from, &to, 0.49), Some(from.clone()));
        assert_eq!(interpolate(PropertyId::Display, &from, &to, 0.5), Some(to));
    }

    #[test]
    fn test_mismatched_types_fall_back_to_discrete() {
        let from = StyleValue::Keyword(Keyword::Auto);
        let to = StyleValue::px(10.0);
        assert_eq!(interpolate(PropertyId::Width, &from, &to, 0.2), Some(from.clone()));
        assert!(!can_interpolate(PropertyId::Width, &from, &to));
    }

    #[test]
    fn test_colors_interpolate_per_channel() {
        let value = interpolate(
            PropertyId::Color,
            &StyleValue::Color(Color::rgb(0, 0, 0)),
            &StyleValue::Color(Color::rgb(200, 100, 50)),
            0.5,
        );
        assert_eq!(value, Some(StyleValue::Color(Color::rgb(100, 50, 25))));
    }

    #[test]
    fn test_visibility_stays_visible_inside_interval() {
        let hidden = StyleValue::Keyword(Keyword::Hidden);
        let visible = StyleValue::Keyword(Keyword::Visible);
        assert_eq!(interpolate(PropertyId::Visibility, &hidden, &visible, 0.1), Some(visible.clone()));
        assert_eq!(interpolate(PropertyId::Visibility, &hidden, &visible, 0.0), Some(hidden));
    }

    #[test]
    fn test_uncomputed_values_fail() {
        assert_eq!(
            interpolate(PropertyId::Opacity, &StyleValue::Inherit, &StyleValue::Number(1.0), 0.5),
            None
        );
    }

    #[test]
    fn test_length_and_percentage_mix() {
        let value = interpolate(PropertyId::Width, &StyleValue::px(100.0), &StyleValue::Percentage(50.0), 0.5);
        assert!(matches!(value, Some(StyleValue::Calculated(_))));
    }
}
