//! CSS animations and transitions.
//!
//! [CSS Animations Level 1](https://www.w3.org/TR/css-animations-1/),
//! [CSS Transitions Level 1](https://www.w3.org/TR/css-transitions-1/) and
//! the timing model of [Web Animations](https://www.w3.org/TR/web-animations-1/).
//!
//! The [`AnimationEngine`] owns every running animation and transition of
//! a document, keyed by element and pseudo-element. It is driven by the
//! style engine: after an element's style is computed, transitions are
//! started from the previous style, animations are created or updated from
//! `animation-*`, and the animated values are written into the computed
//! properties. The embedder advances the document timeline and drains the
//! resulting events.

mod interpolate;
mod keyframes;
mod timing;
mod transition;

use std::mem;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use wombat_css::{AbsolutizeContext, Easing, Keyword, KeyframesRule, PropertyId, PseudoElement, StyleValue};
use wombat_dom::NodeId;

pub use interpolate::{can_interpolate, interpolate};
pub use keyframes::{ComputedKeyframes, KeyframeStop};
pub use timing::{AnimationPhase, ComputedTiming, FillMode, PlaybackDirection, Timing};
pub use transition::{
    ElementTransitions, Transition, TransitionAttributeMap, TransitionAttributes, TransitionPropertyCache,
    normalize_transition_properties,
};

use crate::computed::ComputedProperties;

/// An element or one of its pseudo-elements.
pub type AnimationKey = (NodeId, Option<PseudoElement>);

/// [CSS Animations § 4.2](https://www.w3.org/TR/css-animations-1/#events)
/// and [CSS Transitions § 6.1](https://www.w3.org/TR/css-transitions-1/#transition-events)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationEventKind {
    /// `animationstart`
    AnimationStart,
    /// `animationend`
    AnimationEnd,
    /// `animationcancel`
    AnimationCancel,
    /// `transitionstart`
    TransitionStart,
    /// `transitionend`
    TransitionEnd,
    /// `transitioncancel`
    TransitionCancel,
}

impl AnimationEventKind {
    /// The DOM event type.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::AnimationStart => "animationstart",
            Self::AnimationEnd => "animationend",
            Self::AnimationCancel => "animationcancel",
            Self::TransitionStart => "transitionstart",
            Self::TransitionEnd => "transitionend",
            Self::TransitionCancel => "transitioncancel",
        }
    }
}

/// A queued animation or transition event.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationEvent {
    /// Event kind.
    pub kind: AnimationEventKind,
    /// Target element.
    pub element: NodeId,
    /// Target pseudo-element.
    pub pseudo_element: Option<PseudoElement>,
    /// `animationName`, or `propertyName` for transitions.
    pub name: String,
    /// `elapsedTime` in seconds.
    pub elapsed_time: f64,
}

/// A running CSS animation.
#[derive(Debug, Clone)]
pub struct CssAnimation {
    name: String,
    rule: Arc<KeyframesRule>,
    keyframes: ComputedKeyframes,
    timing: Timing,
    start_time: f64,
    hold_time: Option<f64>,
    last_phase: Option<AnimationPhase>,
}

impl CssAnimation {
    /// The `@keyframes` name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `@keyframes` rule this animation runs.
    #[must_use]
    pub const fn rule(&self) -> &Arc<KeyframesRule> {
        &self.rule
    }

    /// Timing properties.
    #[must_use]
    pub const fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Whether `animation-play-state` is `paused`.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.hold_time.is_some()
    }

    /// The resolved keyframes.
    #[must_use]
    pub const fn keyframes(&self) -> &ComputedKeyframes {
        &self.keyframes
    }

    fn local_time(&self, now: f64) -> f64 {
        self.hold_time.unwrap_or(now - self.start_time)
    }

    fn set_paused(&mut self, paused: bool, now: f64) {
        match (paused, self.hold_time) {
            (true, None) => self.hold_time = Some(now - self.start_time),
            (false, Some(hold)) => {
                self.start_time = now - hold;
                self.hold_time = None;
            }
            _ => {}
        }
    }

    fn event(&self, key: AnimationKey, kind: AnimationEventKind, elapsed_time: f64) -> AnimationEvent {
        AnimationEvent {
            kind,
            element: key.0,
            pseudo_element: key.1,
            name: self.name.clone(),
            elapsed_time,
        }
    }

    fn elapsed_seconds(&self, now: f64) -> f64 {
        (self.local_time(now) - self.timing.delay).clamp(0.0, self.timing.active_duration()) / 1000.0
    }

    /// [CSS Animations § 4.2](https://www.w3.org/TR/css-animations-1/#event-dispatch)
    fn tick(&mut self, key: AnimationKey, now: f64, events: &mut Vec<AnimationEvent>) {
        let phase = self.timing.phase(self.local_time(now));
        let previous = self.last_phase.replace(phase);
        if previous == Some(phase) {
            return;
        }
        let was_before = previous.is_none_or(|previous| previous == AnimationPhase::Before);
        if was_before && phase != AnimationPhase::Before {
            let elapsed = (-self.timing.delay).clamp(0.0, self.timing.active_duration()) / 1000.0;
            events.push(self.event(key, AnimationEventKind::AnimationStart, elapsed));
        }
        if phase == AnimationPhase::After {
            events.push(self.event(
                key,
                AnimationEventKind::AnimationEnd,
                self.timing.active_duration() / 1000.0,
            ));
        }
    }

    /// Whether the animation still produces new values over time.
    fn is_running(&self, now: f64) -> bool {
        self.hold_time.is_none() && self.timing.phase(self.local_time(now)) != AnimationPhase::After
    }

    /// Write animated values into `style`. Returns `false` if some
    /// keyframes could not be interpolated.
    fn apply(&self, style: &mut ComputedProperties, now: f64) -> bool {
        let sample = self.timing.sample(self.local_time(now));
        let Some(progress) = sample.progress else {
            return true;
        };
        let mut ok = true;
        for property in self.keyframes.properties() {
            match self.keyframes.sample(property, progress, sample.before_flag) {
                Some(value) => style.set_animated(property, value),
                None => ok = false,
            }
        }
        ok
    }
}

fn list_item(style: &ComputedProperties, property: PropertyId, index: usize) -> Option<&StyleValue> {
    let items = style.base_value(property).as_slice();
    items.get(index % items.len().max(1))
}

fn time_item(style: &ComputedProperties, property: PropertyId, index: usize) -> f64 {
    match list_item(style, property, index) {
        Some(StyleValue::Time(time)) => time.ms,
        _ => 0.0,
    }
}

/// [CSS Animations § 3](https://www.w3.org/TR/css-animations-1/#animation-name)
fn animation_timing(style: &ComputedProperties, index: usize) -> Timing {
    let iterations = match list_item(style, PropertyId::AnimationIterationCount, index) {
        Some(StyleValue::Keyword(Keyword::Infinite)) => f64::INFINITY,
        Some(value) => value.as_number().map_or(1.0, |count| f64::from(count).max(0.0)),
        None => 1.0,
    };
    Timing {
        delay: time_item(style, PropertyId::AnimationDelay, index),
        iteration_duration: time_item(style, PropertyId::AnimationDuration, index).max(0.0),
        iterations,
        direction: list_item(style, PropertyId::AnimationDirection, index)
            .map(PlaybackDirection::from_value)
            .unwrap_or_default(),
        fill: list_item(style, PropertyId::AnimationFillMode, index)
            .map(FillMode::from_value)
            .unwrap_or_default(),
        // Easing applies per keyframe segment.
        easing: Easing::Linear,
    }
}

fn animation_names(style: &ComputedProperties) -> Vec<String> {
    style
        .base_value(PropertyId::AnimationName)
        .as_slice()
        .iter()
        .map(|value| match value {
            StyleValue::CustomIdent(name) | StyleValue::String(name) => name.clone(),
            _ => String::new(),
        })
        .collect()
}

/// Animations and transitions of a document.
#[derive(Debug, Default)]
pub struct AnimationEngine {
    timeline_time: f64,
    transitions: FxHashMap<AnimationKey, ElementTransitions>,
    transition_properties: TransitionPropertyCache,
    animations: FxHashMap<AnimationKey, Vec<CssAnimation>>,
    events: Vec<AnimationEvent>,
}

impl AnimationEngine {
    /// An engine with the timeline at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document timeline time in milliseconds.
    #[must_use]
    pub const fn timeline_time(&self) -> f64 {
        self.timeline_time
    }

    /// Advance the document timeline and queue the resulting events.
    pub fn set_timeline_time(&mut self, time: f64) {
        self.timeline_time = time;
        for (key, transitions) in &mut self.transitions {
            transitions.tick(*key, time, &mut self.events);
        }
        for (key, animations) in &mut self.animations {
            for animation in animations {
                animation.tick(*key, time, &mut self.events);
            }
        }
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<AnimationEvent> {
        mem::take(&mut self.events)
    }

    /// The running transitions of an element.
    #[must_use]
    pub fn transitions(&self, key: AnimationKey) -> Option<&ElementTransitions> {
        self.transitions.get(&key)
    }

    /// The animations of an element.
    #[must_use]
    pub fn animations(&self, key: AnimationKey) -> &[CssAnimation] {
        self.animations.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Run the transition style change event for an element.
    pub fn update_transitions(&mut self, key: AnimationKey, before: &ComputedProperties, after: &ComputedProperties) {
        let attributes = self.transition_properties.get(key, after);
        let now = self.timeline_time;
        let transitions = self.transitions.entry(key).or_default();
        transitions.update(key, before, after, &attributes, now, &mut self.events);
        transitions.tick(key, now, &mut self.events);
        if transitions.is_empty() {
            let _ = self.transitions.remove(&key);
        }
    }

    /// Create, update or cancel the CSS animations of an element from its
    /// `animation-*` values.
    pub fn update_animations(
        &mut self,
        key: AnimationKey,
        style: &ComputedProperties,
        context: &AbsolutizeContext,
        lookup: &dyn Fn(&str) -> Option<Arc<KeyframesRule>>,
    ) {
        let now = self.timeline_time;
        let mut previous = self.animations.remove(&key).unwrap_or_default();
        let mut current = Vec::new();

        for (index, name) in animation_names(style).into_iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let Some(rule) = lookup(&name) else {
                continue;
            };
            let paused = list_item(style, PropertyId::AnimationPlayState, index)
                .is_some_and(|state| state.is_keyword(Keyword::Paused));
            let timing = animation_timing(style, index);
            let keyframes = ComputedKeyframes::compute(&rule, style, context, index);

            let mut animation = match previous.iter().position(|animation| animation.name == name) {
                Some(position) => {
                    let mut animation = previous.remove(position);
                    animation.rule = rule;
                    animation.keyframes = keyframes;
                    animation.timing = timing;
                    animation
                }
                None => {
                    log::debug!(target: "wombat::style", "starting animation {name}");
                    CssAnimation {
                        name,
                        rule,
                        keyframes,
                        timing,
                        start_time: now,
                        hold_time: None,
                        last_phase: None,
                    }
                }
            };
            animation.set_paused(paused, now);
            animation.tick(key, now, &mut self.events);
            current.push(animation);
        }

        for animation in previous {
            cancel_animation(&animation, key, now, &mut self.events);
        }
        if !current.is_empty() {
            let _ = self.animations.insert(key, current);
        }
    }

    /// Write animated values into `style`. Transitions are applied after
    /// animations so they win, matching their place in the cascade. A
    /// value that cannot be interpolated hides the element.
    pub fn apply(&self, key: AnimationKey, style: &mut ComputedProperties) {
        style.clear_animated();
        let now = self.timeline_time;
        let mut ok = true;
        for animation in self.animations(key) {
            ok &= animation.apply(style, now);
        }
        if let Some(transitions) = self.transitions.get(&key) {
            ok &= transitions.apply(style, now);
        }
        if !ok {
            log::debug!(target: "wombat::style", "interpolation failed on {:?}; hiding it", key.0);
            style.set_animated(PropertyId::Visibility, StyleValue::Keyword(Keyword::Hidden));
        }
    }

    /// Cancel everything on an element that left the document.
    pub fn remove(&mut self, key: AnimationKey) {
        let now = self.timeline_time;
        if let Some(mut transitions) = self.transitions.remove(&key) {
            transitions.cancel_all(key, now, &mut self.events);
        }
        for animation in self.animations.remove(&key).unwrap_or_default() {
            cancel_animation(&animation, key, now, &mut self.events);
        }
        self.transition_properties.remove(key);
    }

    /// Elements whose animated values change as the timeline advances.
    #[must_use]
    pub fn animated_elements(&self) -> Vec<AnimationKey> {
        let now = self.timeline_time;
        let mut keys: Vec<AnimationKey> = self
            .transitions
            .iter()
            .filter(|(_, transitions)| transitions.has_running())
            .map(|(key, _)| *key)
            .chain(
                self.animations
                    .iter()
                    .filter(|(_, animations)| animations.iter().any(|animation| animation.is_running(now)))
                    .map(|(key, _)| *key),
            )
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

fn cancel_animation(animation: &CssAnimation, key: AnimationKey, now: f64, events: &mut Vec<AnimationEvent>) {
    log::debug!(target: "wombat::style", "cancelling animation {}", animation.name);
    if animation.last_phase.is_some_and(|phase| phase != AnimationPhase::After) {
        events.push(animation.event(key, AnimationEventKind::AnimationCancel, animation.elapsed_seconds(now)));
    }
}

#[cfg(test)]
mod tests {
    use wombat_css::{CssRule, Stylesheet, Time};

    use super::*;

    const KEY: AnimationKey = (NodeId(7), None);

    fn fade_rule() -> Arc<KeyframesRule> {
        let sheet = Stylesheet::parse("@keyframes fade { from { opacity: 0 } to { opacity: 1 } }", None);
        sheet
            .rules
            .into_iter()
            .find_map(|rule| match rule {
                CssRule::Keyframes(rule) => Some(Arc::new(rule)),
                _ => None,
            })
            .expect("keyframes")
    }

    fn animated_style(name: &str) -> ComputedProperties {
        let mut style = ComputedProperties::initial();
        style.set(PropertyId::AnimationName, StyleValue::CustomIdent(name.into()), false);
        style.set(PropertyId::AnimationDuration, StyleValue::Time(Time::from_seconds(1.0)), false);
        style.set(PropertyId::AnimationTimingFunction, StyleValue::Easing(Easing::Linear), false);
        style
    }

    fn run(engine: &mut AnimationEngine, style: &ComputedProperties) {
        let rule = fade_rule();
        engine.update_animations(KEY, style, &AbsolutizeContext::default(), &|name| {
            (name == "fade").then(|| Arc::clone(&rule))
        });
    }

    #[test]
    fn test_animation_writes_animated_values() {
        let mut engine = AnimationEngine::new();
        let style = animated_style("fade");
        run(&mut engine, &style);
        engine.set_timeline_time(500.0);

        let mut computed = style.clone();
        engine.apply(KEY, &mut computed);
        assert!(matches!(
            computed.property(PropertyId::Opacity),
            StyleValue::Number(n) if (n - 0.5).abs() < 1e-6
        ));
        assert_eq!(engine.animated_elements(), [KEY]);
    }

    #[test]
    fn test_animation_events() {
        let mut engine = AnimationEngine::new();
        run(&mut engine, &animated_style("fade"));
        engine.set_timeline_time(2000.0);
        let kinds: Vec<_> = engine.take_events().into_iter().map(|event| event.kind).collect();
        assert_eq!(kinds, [AnimationEventKind::AnimationStart, AnimationEventKind::AnimationEnd]);
        assert!(engine.take_events().is_empty());
        assert!(engine.animated_elements().is_empty());
    }

    #[test]
    fn test_removing_name_cancels() {
        let mut engine = AnimationEngine::new();
        run(&mut engine, &animated_style("fade"));
        engine.set_timeline_time(100.0);
        let _ = engine.take_events();

        run(&mut engine, &ComputedProperties::initial());
        let events = engine.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AnimationEventKind::AnimationCancel);
        assert_eq!(events[0].name, "fade");
        assert!(engine.animations(KEY).is_empty());
    }

    #[test]
    fn test_paused_animation_holds_time() {
        let mut engine = AnimationEngine::new();
        let mut style = animated_style("fade");
        run(&mut engine, &style);
        engine.set_timeline_time(250.0);
        style.set(PropertyId::AnimationPlayState, StyleValue::Keyword(Keyword::Paused), false);
        run(&mut engine, &style);
        engine.set_timeline_time(900.0);

        let mut computed = style.clone();
        engine.apply(KEY, &mut computed);
        assert!(matches!(
            computed.property(PropertyId::Opacity),
            StyleValue::Number(n) if (n - 0.25).abs() < 1e-6
        ));
    }

    #[test]
    fn test_unknown_keyframes_are_ignored() {
        let mut engine = AnimationEngine::new();
        run(&mut engine, &animated_style("missing"));
        assert!(engine.animations(KEY).is_empty());
    }

    #[test]
    fn test_event_types() {
        assert_eq!(AnimationEventKind::TransitionCancel.event_type(), "transitioncancel");
    }
}
