//! CSS transitions.
//!
//! [CSS Transitions § 3 Starting of transitions](https://www.w3.org/TR/css-transitions-1/#starting)

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use wombat_css::{Easing, Keyword, LogicalAliasMappingContext, PropertyId, StyleValue};

use super::interpolate::{can_interpolate, interpolate};
use super::timing::{AnimationPhase, FillMode, Timing};
use super::{AnimationEvent, AnimationEventKind, AnimationKey};
use crate::computed::ComputedProperties;

/// The `transition-*` values that apply to one longhand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionAttributes {
    /// Duration in milliseconds.
    pub duration: f64,
    /// Delay in milliseconds; may be negative.
    pub delay: f64,
    /// Timing function.
    pub easing: Easing,
    /// `transition-behavior: allow-discrete`
    pub allow_discrete: bool,
}

impl TransitionAttributes {
    /// "the combined duration is max(matching transition duration, 0s) +
    /// matching transition delay"
    #[must_use]
    pub fn combined_duration(&self) -> f64 {
        self.duration.max(0.0) + self.delay
    }
}

/// Transition attributes per longhand.
pub type TransitionAttributeMap = FxHashMap<PropertyId, TransitionAttributes>;

const TRANSITION_SOURCES: [PropertyId; 5] = [
    PropertyId::TransitionProperty,
    PropertyId::TransitionDuration,
    PropertyId::TransitionDelay,
    PropertyId::TransitionTimingFunction,
    PropertyId::TransitionBehavior,
];

fn time_at(value: &StyleValue, index: usize) -> f64 {
    let items = value.as_slice();
    match items.get(index % items.len().max(1)) {
        Some(StyleValue::Time(time)) => time.ms,
        _ => 0.0,
    }
}

fn item_at(value: &StyleValue, index: usize) -> Option<&StyleValue> {
    let items = value.as_slice();
    items.get(index % items.len().max(1))
}

/// [CSS Transitions § 2](https://www.w3.org/TR/css-transitions-1/#transitions)
///
/// Zip `transition-property` with the other `transition-*` lists. Shorter
/// lists repeat; `all` covers every animatable longhand; shorthands cover
/// their longhands and logical names map through `logical`. "If a
/// property is specified multiple times in the value of
/// transition-property ... the transition uses the duration, delay, and
/// timing function at the index corresponding to the last occurrence".
#[must_use]
pub fn normalize_transition_properties(style: &ComputedProperties) -> TransitionAttributeMap {
    let mut map = TransitionAttributeMap::default();
    let properties = style.base_value(PropertyId::TransitionProperty);
    if properties.is_keyword(Keyword::None) {
        return map;
    }
    let logical = style.logical_alias_mapping_context();
    let durations = style.base_value(PropertyId::TransitionDuration);
    let delays = style.base_value(PropertyId::TransitionDelay);
    let easings = style.base_value(PropertyId::TransitionTimingFunction);
    let behaviors = style.base_value(PropertyId::TransitionBehavior);

    for (index, item) in properties.as_slice().iter().enumerate() {
        let targets: Vec<PropertyId> = match item {
            StyleValue::Keyword(Keyword::All) => {
                PropertyId::physical_longhands().filter(|property| property.is_animatable()).collect()
            }
            StyleValue::CustomIdent(name) => match PropertyId::parse(name) {
                Some(property) => property
                    .expanded_longhands()
                    .into_iter()
                    .map(|longhand| longhand.map_logical_alias(logical))
                    .filter(|longhand| longhand.is_physical_longhand() && longhand.is_animatable())
                    .collect(),
                None => continue,
            },
            _ => continue,
        };
        let attributes = TransitionAttributes {
            duration: time_at(durations, index),
            delay: time_at(delays, index),
            easing: match item_at(easings, index) {
                Some(StyleValue::Easing(easing)) => *easing,
                _ => Easing::EASE,
            },
            allow_discrete: item_at(behaviors, index).is_some_and(|v| v.is_keyword(Keyword::AllowDiscrete)),
        };
        for property in targets {
            let _ = map.insert(property, attributes);
        }
    }
    map
}

struct CachedTransitionProperties {
    sources: [StyleValue; 5],
    logical: LogicalAliasMappingContext,
    attributes: Arc<TransitionAttributeMap>,
}

/// Normalised transition attributes per element, reused until the
/// element's `transition-*` values or writing mode change.
#[derive(Default)]
pub struct TransitionPropertyCache {
    entries: FxHashMap<AnimationKey, CachedTransitionProperties>,
}

impl std::fmt::Debug for TransitionPropertyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionPropertyCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl TransitionPropertyCache {
    /// The attribute map for `style`, normalising only when the source
    /// values changed.
    pub fn get(&mut self, key: AnimationKey, style: &ComputedProperties) -> Arc<TransitionAttributeMap> {
        let sources = TRANSITION_SOURCES.map(|property| style.base_value(property).clone());
        let logical = style.logical_alias_mapping_context();
        if let Some(cached) = self.entries.get(&key)
            && cached.sources == sources
            && cached.logical == logical
        {
            return Arc::clone(&cached.attributes);
        }
        let attributes = Arc::new(normalize_transition_properties(style));
        let _ = self.entries.insert(
            key,
            CachedTransitionProperties {
                sources,
                logical,
                attributes: Arc::clone(&attributes),
            },
        );
        attributes
    }

    /// Forget an element.
    pub fn remove(&mut self, key: AnimationKey) {
        let _ = self.entries.remove(&key);
    }
}

/// One running or completed transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The transitioning longhand.
    pub property: PropertyId,
    /// Value at the start.
    pub start_value: StyleValue,
    /// Value at the end.
    pub end_value: StyleValue,
    /// [§ 3](https://www.w3.org/TR/css-transitions-1/#transition-reversing-adjusted-start-value)
    pub reversing_adjusted_start_value: StyleValue,
    /// [§ 3](https://www.w3.org/TR/css-transitions-1/#transition-reversing-shortening-factor)
    pub reversing_shortening_factor: f64,
    /// Timeline time of the style change event that started it.
    pub start_time: f64,
    /// Delay, duration and easing.
    pub timing: Timing,
    last_phase: Option<AnimationPhase>,
}

impl Transition {
    fn new(
        property: PropertyId,
        start_value: StyleValue,
        end_value: StyleValue,
        attributes: &TransitionAttributes,
        now: f64,
    ) -> Self {
        Self {
            property,
            reversing_adjusted_start_value: start_value.clone(),
            start_value,
            end_value,
            reversing_shortening_factor: 1.0,
            start_time: now,
            timing: Timing {
                delay: attributes.delay,
                iteration_duration: attributes.duration.max(0.0),
                iterations: 1.0,
                // CSS transitions fill backwards so the start value holds
                // during the delay.
                fill: FillMode::Backwards,
                easing: attributes.easing,
                ..Timing::default()
            },
            last_phase: None,
        }
    }

    fn local_time(&self, now: f64) -> f64 {
        now - self.start_time
    }

    /// The eased progress at `now`.
    #[must_use]
    pub fn output_progress(&self, now: f64) -> f64 {
        let local = self.local_time(now);
        match self.timing.sample(local).progress {
            Some(progress) => progress,
            None if self.timing.phase(local) == AnimationPhase::After => 1.0,
            None => 0.0,
        }
    }

    /// The animated value at `now`. `None` if the endpoints cannot be
    /// combined.
    #[must_use]
    pub fn current_value(&self, now: f64) -> Option<StyleValue> {
        interpolate(self.property, &self.start_value, &self.end_value, self.output_progress(now))
    }

    /// Phase at `now`.
    #[must_use]
    pub fn phase(&self, now: f64) -> AnimationPhase {
        self.timing.phase(self.local_time(now))
    }

    fn elapsed_seconds(&self, now: f64) -> f64 {
        (self.local_time(now) - self.timing.delay).clamp(0.0, self.timing.active_duration()) / 1000.0
    }

    fn event(&self, key: AnimationKey, kind: AnimationEventKind, elapsed_time: f64) -> AnimationEvent {
        AnimationEvent {
            kind,
            element: key.0,
            pseudo_element: key.1,
            name: self.property.name().to_string(),
            elapsed_time,
        }
    }
}

/// Whether a transition can run between two values.
fn is_transitionable(property: PropertyId, from: &StyleValue, to: &StyleValue, allow_discrete: bool) -> bool {
    property.is_animatable()
        && !from.is_css_wide_keyword()
        && !to.is_css_wide_keyword()
        && (can_interpolate(property, from, to) || allow_discrete)
}

/// Transitions of one element or pseudo-element. At most one running and
/// one completed transition exist per property.
#[derive(Debug, Clone, Default)]
pub struct ElementTransitions {
    running: BTreeMap<PropertyId, Transition>,
    completed: BTreeMap<PropertyId, Transition>,
}

impl ElementTransitions {
    /// The running transition of `property`.
    #[must_use]
    pub fn running(&self, property: PropertyId) -> Option<&Transition> {
        self.running.get(&property)
    }

    /// The completed transition of `property`.
    #[must_use]
    pub fn completed(&self, property: PropertyId) -> Option<&Transition> {
        self.completed.get(&property)
    }

    /// Whether any transition is running.
    #[must_use]
    pub fn has_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.running.is_empty() && self.completed.is_empty()
    }

    fn cancel(&mut self, key: AnimationKey, property: PropertyId, now: f64, events: &mut Vec<AnimationEvent>) {
        if let Some(transition) = self.running.remove(&property) {
            log::debug!(target: "wombat::style", "cancelling transition of {property}");
            events.push(transition.event(key, AnimationEventKind::TransitionCancel, transition.elapsed_seconds(now)));
        }
    }

    fn start(&mut self, transition: Transition) {
        log::debug!(
            target: "wombat::style",
            "starting transition of {} over {}ms",
            transition.property,
            transition.timing.iteration_duration
        );
        let _ = self.running.insert(transition.property, transition);
    }

    /// [CSS Transitions § 3](https://www.w3.org/TR/css-transitions-1/#starting)
    ///
    /// Run the style change event for every longhand. `before` carries the
    /// previous computed values with animations applied; `after` the newly
    /// computed values without them.
    pub fn update(
        &mut self,
        key: AnimationKey,
        before: &ComputedProperties,
        after: &ComputedProperties,
        attributes: &TransitionAttributeMap,
        now: f64,
        events: &mut Vec<AnimationEvent>,
    ) {
        let mut properties: Vec<PropertyId> = attributes.keys().copied().collect();
        properties.extend(self.running.keys().copied());
        properties.extend(self.completed.keys().copied());
        properties.sort_unstable();
        properties.dedup();

        for property in properties {
            let before_value = before.property(property);
            let after_value = after.base_value(property);
            let matching = attributes.get(&property);

            // 1. Start a transition.
            if !self.running.contains_key(&property)
                && before_value != after_value
                && self.completed.get(&property).is_none_or(|c| &c.end_value != after_value)
                && let Some(matching) = matching
                && is_transitionable(property, before_value, after_value, matching.allow_discrete)
                && matching.combined_duration() > 0.0
            {
                let _ = self.completed.remove(&property);
                self.start(Transition::new(property, before_value.clone(), after_value.clone(), matching, now));
                continue;
            }

            // 2. "if the element has a completed transition for the property
            // and the end value of the completed transition is different
            // than the value of the property in the after-change style,
            // implementations must remove the completed transition"
            if self.completed.get(&property).is_some_and(|c| &c.end_value != after_value) {
                let _ = self.completed.remove(&property);
            }

            // 3. No matching transition-property entry any more.
            let Some(matching) = matching else {
                self.cancel(key, property, now, events);
                let _ = self.completed.remove(&property);
                continue;
            };

            // 4. A running transition whose end value is out of date.
            let Some(running) = self.running.get(&property) else {
                continue;
            };
            if &running.end_value == after_value {
                continue;
            }
            let Some(current) = running.current_value(now) else {
                self.cancel(key, property, now, events);
                continue;
            };
            if &current == after_value
                || !is_transitionable(property, &current, after_value, matching.allow_discrete)
                || matching.combined_duration() <= 0.0
            {
                self.cancel(key, property, now, events);
                continue;
            }
            if &running.reversing_adjusted_start_value == after_value {
                // "the reversing shortening factor of the new transition is
                // the absolute value, clamped to the range [0, 1], of the sum
                // of: the output of the timing function of the old
                // transition at the time of the style change event, times
                // the reversing shortening factor of the old transition; 1
                // minus the reversing shortening factor of the old
                // transition."
                let old_factor = running.reversing_shortening_factor;
                let factor = (running.output_progress(now) * old_factor + (1.0 - old_factor))
                    .abs()
                    .clamp(0.0, 1.0);
                let reversing_adjusted_start_value = running.end_value.clone();
                let shortened = TransitionAttributes {
                    duration: matching.duration * factor,
                    delay: if matching.delay < 0.0 { matching.delay * factor } else { matching.delay },
                    ..*matching
                };
                self.cancel(key, property, now, events);
                let mut transition = Transition::new(property, current, after_value.clone(), &shortened, now);
                transition.reversing_adjusted_start_value = reversing_adjusted_start_value;
                transition.reversing_shortening_factor = factor;
                self.start(transition);
            } else {
                self.cancel(key, property, now, events);
                self.start(Transition::new(property, current, after_value.clone(), matching, now));
            }
        }
    }

    /// Advance to `now`: queue start and end events and move finished
    /// transitions to the completed set.
    pub fn tick(&mut self, key: AnimationKey, now: f64, events: &mut Vec<AnimationEvent>) {
        let mut finished = Vec::new();
        for (property, transition) in &mut self.running {
            let phase = transition.phase(now);
            let previous = transition.last_phase.replace(phase);
            let was_before = previous.is_none_or(|previous| previous == AnimationPhase::Before);
            // [CSS Transitions § 6.1](https://www.w3.org/TR/css-transitions-1/#event-dispatch)
            if was_before && phase != AnimationPhase::Before {
                events.push(transition.event(key, AnimationEventKind::TransitionStart, 0.0));
            }
            if phase == AnimationPhase::After {
                events.push(transition.event(
                    key,
                    AnimationEventKind::TransitionEnd,
                    transition.timing.active_duration() / 1000.0,
                ));
                finished.push(*property);
            }
        }
        for property in finished {
            if let Some(transition) = self.running.remove(&property) {
                let _ = self.completed.insert(property, transition);
            }
        }
    }

    /// Write the value of every running transition into `style`. Returns
    /// `false` if some transition could not produce a value.
    pub fn apply(&self, style: &mut ComputedProperties, now: f64) -> bool {
        let mut ok = true;
        for (property, transition) in &self.running {
            match transition.current_value(now) {
                Some(value) => style.set_animated(*property, value),
                None => ok = false,
            }
        }
        ok
    }

    /// Cancel every running transition.
    pub fn cancel_all(&mut self, key: AnimationKey, now: f64, events: &mut Vec<AnimationEvent>) {
        let properties: Vec<PropertyId> = self.running.keys().copied().collect();
        for property in properties {
            self.cancel(key, property, now, events);
        }
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use wombat_css::{Time, parse_component_values, parse_css_value};
    use wombat_dom::NodeId;

    use super::*;

    const KEY: AnimationKey = (NodeId(1), None);

    fn style(entries: &[(PropertyId, StyleValue)]) -> ComputedProperties {
        let mut style = ComputedProperties::initial();
        for (property, value) in entries {
            style.set(*property, value.clone(), false);
        }
        style
    }

    fn opacity_transition(opacity: f32) -> ComputedProperties {
        style(&[
            (PropertyId::Opacity, StyleValue::Number(opacity)),
            (PropertyId::TransitionProperty, StyleValue::CustomIdent("opacity".into())),
            (PropertyId::TransitionDuration, StyleValue::Time(Time::from_seconds(1.0))),
            (PropertyId::TransitionTimingFunction, StyleValue::Easing(Easing::Linear)),
        ])
    }

    fn number(value: Option<StyleValue>) -> f32 {
        match value {
            Some(StyleValue::Number(n)) => n,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_zips_lists_cyclically() {
        let mut style = ComputedProperties::initial();
        let parse = |property, css: &str| parse_css_value(property, &parse_component_values(css)).unwrap();
        style.set(PropertyId::TransitionProperty, parse(PropertyId::TransitionProperty, "opacity, margin, opacity"), false);
        style.set(PropertyId::TransitionDuration, parse(PropertyId::TransitionDuration, "1s, 2s"), false);
        let map = normalize_transition_properties(&style);
        assert!((map[&PropertyId::Opacity].duration - 1000.0).abs() < 1e-9);
        assert!((map[&PropertyId::MarginLeft].duration - 2000.0).abs() < 1e-9);
        assert!(!map.contains_key(&PropertyId::Width));
    }

    #[test]
    fn test_transition_none_is_empty() {
        let style = style(&[(PropertyId::TransitionProperty, StyleValue::Keyword(Keyword::None))]);
        assert!(normalize_transition_properties(&style).is_empty());
    }

    #[test]
    fn test_cache_reuses_attribute_map() {
        let mut cache = TransitionPropertyCache::default();
        let style = opacity_transition(1.0);
        let first = cache.get(KEY, &style);
        let second = cache.get(KEY, &style);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_starts_transition_on_change() {
        let before = opacity_transition(1.0);
        let after = opacity_transition(0.0);
        let attributes = normalize_transition_properties(&after);
        let mut transitions = ElementTransitions::default();
        let mut events = Vec::new();
        transitions.update(KEY, &before, &after, &attributes, 0.0, &mut events);
        let running = transitions.running(PropertyId::Opacity).unwrap();
        assert!((number(running.current_value(250.0)) - 0.75).abs() < 1e-6);

        transitions.tick(KEY, 1000.0, &mut events);
        assert!(transitions.running(PropertyId::Opacity).is_none());
        assert!(transitions.completed(PropertyId::Opacity).is_some());
        let kinds: Vec<_> = events.iter().map(|event| event.kind).collect();
        assert_eq!(kinds, [AnimationEventKind::TransitionStart, AnimationEventKind::TransitionEnd]);
    }

    #[test]
    fn test_zero_duration_does_not_start() {
        let mut after = opacity_transition(0.0);
        after.set(PropertyId::TransitionDuration, StyleValue::Time(Time::ZERO), false);
        let attributes = normalize_transition_properties(&after);
        let mut transitions = ElementTransitions::default();
        transitions.update(KEY, &opacity_transition(1.0), &after, &attributes, 0.0, &mut Vec::new());
        assert!(transitions.is_empty());
    }

    #[test]
    fn test_discrete_needs_allow_discrete() {
        let attributes: TransitionAttributeMap = [(
            PropertyId::Display,
            TransitionAttributes {
                duration: 1000.0,
                delay: 0.0,
                easing: Easing::Linear,
                allow_discrete: false,
            },
        )]
        .into_iter()
        .collect();
        let before = style(&[(PropertyId::Display, StyleValue::Keyword(Keyword::Block))]);
        let after = style(&[(PropertyId::Display, StyleValue::Keyword(Keyword::None))]);
        let mut transitions = ElementTransitions::default();
        transitions.update(KEY, &before, &after, &attributes, 0.0, &mut Vec::new());
        assert!(transitions.is_empty());

        let mut allowed = attributes.clone();
        allowed.get_mut(&PropertyId::Display).unwrap().allow_discrete = true;
        transitions.update(KEY, &before, &after, &allowed, 0.0, &mut Vec::new());
        assert!(transitions.running(PropertyId::Display).is_some());
    }

    #[test]
    fn test_removed_property_cancels() {
        let before = opacity_transition(1.0);
        let after = opacity_transition(0.0);
        let mut transitions = ElementTransitions::default();
        let mut events = Vec::new();
        transitions.update(KEY, &before, &after, &normalize_transition_properties(&after), 0.0, &mut events);
        transitions.update(KEY, &after, &after, &TransitionAttributeMap::default(), 100.0, &mut events);
        assert!(transitions.is_empty());
        assert_eq!(events.last().map(|event| event.kind), Some(AnimationEventKind::TransitionCancel));
    }

    #[test]
    fn test_retargeting_starts_from_current_value() {
        let before = opacity_transition(1.0);
        let after = opacity_transition(0.0);
        let mut transitions = ElementTransitions::default();
        let mut events = Vec::new();
        transitions.update(KEY, &before, &after, &normalize_transition_properties(&after), 0.0, &mut events);

        let retarget = opacity_transition(0.25);
        transitions.update(KEY, &after, &retarget, &normalize_transition_properties(&retarget), 500.0, &mut events);
        let running = transitions.running(PropertyId::Opacity).unwrap();
        assert!((number(Some(running.start_value.clone())) - 0.5).abs() < 1e-6);
        assert_eq!(running.end_value, StyleValue::Number(0.25));
        assert_eq!(running.reversing_adjusted_start_value, running.start_value);
        assert!((running.reversing_shortening_factor - 1.0).abs() < 1e-9);
    }
}
