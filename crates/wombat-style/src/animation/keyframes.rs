//! Computed keyframes of a CSS animation.
//!
//! [CSS Animations § 3 Declaring Keyframes](https://www.w3.org/TR/css-animations-1/#keyframes)
//!
//! Keyframe blocks are flattened into one track per animated longhand.
//! Every track has a keyframe at offset 0 and 1; missing endpoints take
//! the element's base value.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use wombat_css::substitute::substitute;
use wombat_css::{
    AbsolutizeContext, Declaration, Easing, KeyframesRule, PropertyId, StyleValue, parse_css_value,
};

use super::interpolate::interpolate;
use crate::cascade::for_each_property_expanding_shorthands;
use crate::computed::ComputedProperties;
use crate::resolver::Substitutions;

/// One keyframe of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeStop {
    /// Offset in `[0, 1]`.
    pub offset: f64,
    /// Computed value at this offset.
    pub value: StyleValue,
    /// Easing of the segment that starts here.
    pub easing: Easing,
}

/// Keyframes of one animation, resolved against one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedKeyframes {
    tracks: BTreeMap<PropertyId, Vec<KeyframeStop>>,
}

/// Declarations of one keyframe block, keyed by longhand, plus the block's
/// own `animation-timing-function`.
#[derive(Default)]
struct BlockValues {
    values: BTreeMap<PropertyId, StyleValue>,
    easing: Option<Easing>,
}

/// [Web Animations § 5.3.4](https://www.w3.org/TR/web-animations-1/#calculating-computed-keyframes)
///
/// "Longhand properties override shorthand properties ... Shorthand
/// properties with fewer longhand components override those with more
/// longhand components ... Physical properties override logical
/// properties". Declarations are applied in ascending order of this key.
fn declaration_priority(declaration: &Declaration) -> (bool, Reverse<usize>, bool, Reverse<&'static str>) {
    let property = declaration.property;
    (
        !property.is_shorthand(),
        Reverse(property.expanded_longhands().len()),
        !property.is_logical_alias(),
        Reverse(property.name()),
    )
}

fn easing_at(value: &StyleValue, index: usize) -> Option<Easing> {
    let items = value.as_slice();
    match items.get(index % items.len().max(1))? {
        StyleValue::Easing(easing) => Some(*easing),
        _ => None,
    }
}

impl ComputedKeyframes {
    /// Resolve `rule` for an element whose base style is `style`, as the
    /// `animation_index`-th entry of its `animation-name` list. Keyframes
    /// without their own timing function use that entry's
    /// `animation-timing-function`.
    #[must_use]
    pub fn compute(
        rule: &KeyframesRule,
        style: &ComputedProperties,
        context: &AbsolutizeContext,
        animation_index: usize,
    ) -> Self {
        let default_easing =
            easing_at(style.base_value(PropertyId::AnimationTimingFunction), animation_index).unwrap_or(Easing::EASE);
        let logical = style.logical_alias_mapping_context();
        let source = Substitutions {
            custom: style.custom_properties().as_ref(),
            element: None,
        };

        // Blocks sharing an offset merge; later blocks win.
        let mut by_offset: Vec<(f64, BlockValues)> = Vec::new();
        for keyframe in &rule.keyframes {
            let mut declarations: Vec<&Declaration> =
                keyframe.declarations.declarations.iter().filter(|d| !d.important).collect();
            declarations.sort_by_key(|declaration| declaration_priority(declaration));

            for &offset in &keyframe.offsets {
                let offset = f64::from(offset);
                let index = match by_offset.iter().position(|(existing, _)| *existing == offset) {
                    Some(index) => index,
                    None => {
                        by_offset.push((offset, BlockValues::default()));
                        by_offset.len() - 1
                    }
                };
                let block = &mut by_offset[index].1;

                for declaration in &declarations {
                    let value = match &declaration.value {
                        StyleValue::Unresolved(unresolved) => {
                            let Some(value) = substitute(&unresolved.values, &source)
                                .and_then(|values| parse_css_value(declaration.property, &values))
                                .filter(|value| !matches!(value, StyleValue::Unresolved(_)))
                            else {
                                log::debug!(target: "wombat::style", "dropping invalid keyframe value for {}", declaration.property);
                                continue;
                            };
                            value
                        }
                        value => value.clone(),
                    };
                    if declaration.property == PropertyId::AnimationTimingFunction {
                        block.easing = easing_at(&value, 0);
                        continue;
                    }
                    for_each_property_expanding_shorthands(declaration.property, &value, &mut |longhand, value| {
                        let longhand = longhand.map_logical_alias(logical);
                        if !longhand.is_physical_longhand() || !longhand.is_animatable() {
                            return;
                        }
                        let value = match value {
                            StyleValue::Initial => longhand.initial_value(),
                            value if value.is_css_wide_keyword() => return,
                            StyleValue::PendingSubstitution(_) | StyleValue::GuaranteedInvalid => return,
                            value => value.absolutize(context),
                        };
                        let _ = block.values.insert(longhand, value);
                    });
                }
            }
        }
        by_offset.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut tracks: BTreeMap<PropertyId, Vec<KeyframeStop>> = BTreeMap::new();
        for (offset, block) in &by_offset {
            let easing = block.easing.unwrap_or(default_easing);
            for (property, value) in &block.values {
                tracks.entry(*property).or_default().push(KeyframeStop {
                    offset: *offset,
                    value: value.clone(),
                    easing,
                });
            }
        }

        // [CSS Animations § 3](https://www.w3.org/TR/css-animations-1/#keyframes)
        // "If a 0% or from keyframe is not specified, then the user agent
        // constructs a 0% keyframe using the computed values of the
        // properties being animated."
        for (property, stops) in &mut tracks {
            let base = style.base_value(*property);
            if stops.first().is_none_or(|stop| stop.offset > 0.0) {
                stops.insert(0, KeyframeStop {
                    offset: 0.0,
                    value: base.clone(),
                    easing: default_easing,
                });
            }
            if stops.last().is_none_or(|stop| stop.offset < 1.0) {
                stops.push(KeyframeStop {
                    offset: 1.0,
                    value: base.clone(),
                    easing: default_easing,
                });
            }
        }
        Self { tracks }
    }

    /// Properties with at least one keyframe.
    pub fn properties(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.tracks.keys().copied()
    }

    /// The keyframes of one property.
    #[must_use]
    pub fn track(&self, property: PropertyId) -> Option<&[KeyframeStop]> {
        self.tracks.get(&property).map(Vec::as_slice)
    }

    /// Whether no property is animated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// [Web Animations § 5.3.5](https://www.w3.org/TR/web-animations-1/#the-effect-value-of-a-keyframe-animation-effect)
    ///
    /// Value of `property` at iteration progress `progress`. `None` if the
    /// property is not animated or its keyframes cannot be combined.
    #[must_use]
    pub fn sample(&self, property: PropertyId, progress: f64, before_flag: bool) -> Option<StyleValue> {
        let stops = self.tracks.get(&property)?;
        if stops.len() < 2 {
            return stops.first().map(|stop| stop.value.clone());
        }
        // Progress outside [0, 1] extrapolates along the outer segments.
        let index = stops
            .iter()
            .rposition(|stop| stop.offset <= progress)
            .unwrap_or(0)
            .min(stops.len() - 2);
        let (from, to) = (&stops[index], &stops[index + 1]);
        let length = to.offset - from.offset;
        if length <= 0.0 {
            return Some(from.value.clone());
        }
        let local = (progress - from.offset) / length;
        interpolate(property, &from.value, &to.value, from.easing.evaluate(local, before_flag))
    }
}

#[cfg(test)]
mod tests {
    use wombat_css::{CssRule, Stylesheet};

    use super::*;

    fn keyframes(css: &str) -> KeyframesRule {
        let stylesheet = Stylesheet::parse(css, None);
        stylesheet
            .rules
            .into_iter()
            .find_map(|rule| match rule {
                CssRule::Keyframes(rule) => Some(rule),
                _ => None,
            })
            .expect("a @keyframes rule")
    }

    fn compute(css: &str, style: &ComputedProperties) -> ComputedKeyframes {
        ComputedKeyframes::compute(&keyframes(css), style, &AbsolutizeContext::default(), 0)
    }

    #[test]
    fn test_missing_endpoints_use_base_value() {
        let mut style = ComputedProperties::initial();
        style.set(PropertyId::Width, StyleValue::px(10.0), false);
        let computed = compute("@keyframes grow { 50% { width: 20px } }", &style);
        let track = computed.track(PropertyId::Width).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track[0].value, StyleValue::px(10.0));
        assert_eq!(track[2].value, StyleValue::px(10.0));
    }

    #[test]
    fn test_longhand_beats_shorthand_in_block() {
        let style = ComputedProperties::initial();
        let computed = compute(
            "@keyframes k { to { margin-top: 5px; margin: 1px } }",
            &style,
        );
        let track = computed.track(PropertyId::MarginTop).unwrap();
        assert_eq!(track.last().unwrap().value, StyleValue::px(5.0));
        assert_eq!(
            computed.track(PropertyId::MarginLeft).unwrap().last().unwrap().value,
            StyleValue::px(1.0)
        );
    }

    #[test]
    fn test_same_offset_blocks_merge() {
        let style = ComputedProperties::initial();
        let computed = compute(
            "@keyframes k { to { opacity: 0.5; width: 1px } to { opacity: 0.2 } }",
            &style,
        );
        assert_eq!(
            computed.track(PropertyId::Opacity).unwrap().last().unwrap().value,
            StyleValue::Number(0.2)
        );
        assert!(computed.track(PropertyId::Width).is_some());
    }

    #[test]
    fn test_sample_uses_segment_easing() {
        let style = ComputedProperties::initial();
        let computed = compute(
            "@keyframes k { from { opacity: 0; animation-timing-function: linear } to { opacity: 1 } }",
            &style,
        );
        let value = computed.sample(PropertyId::Opacity, 0.25, false).unwrap();
        assert!(matches!(value, StyleValue::Number(n) if (n - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_non_animatable_properties_are_dropped() {
        let style = ComputedProperties::initial();
        let computed = compute("@keyframes k { to { animation-delay: 1s; direction: rtl } }", &style);
        assert!(computed.is_empty());
    }
}
