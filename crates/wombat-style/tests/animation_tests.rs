//! Integration tests for transitions and CSS animations driven through the
//! style engine.

use std::sync::Arc;

use wombat_css::{Keyword, PropertyId, StyleValue, Stylesheet};
use wombat_dom::{DomTree, NodeId};
use wombat_style::{AnimationEventKind, ComputedProperties, StyleConfig, StyleEngine};

struct Page {
    engine: StyleEngine,
    tree: DomTree,
    target: NodeId,
}

impl Page {
    fn new(css: &str, inline: &str) -> Self {
        let mut engine = StyleEngine::new(StyleConfig::default());
        let _ = engine.add_sheet(Arc::new(Stylesheet::parse(css, None)), None);
        let mut tree = DomTree::new();
        let html = tree.create_html_element("html");
        tree.append_child(NodeId::ROOT, html);
        let target = tree.create_html_element("div");
        tree.set_inline_style(target, inline);
        tree.append_child(html, target);
        let _ = engine.compute_document_styles(&mut tree);
        Self { engine, tree, target }
    }

    fn restyle_with(&mut self, inline: &str) {
        self.tree.set_inline_style(self.target, inline);
        let _ = self.engine.compute_document_styles(&mut self.tree);
    }

    fn advance_to(&mut self, time: f64) {
        self.engine.set_timeline_time(&mut self.tree, time);
        let _ = self.engine.compute_document_styles(&mut self.tree);
    }

    fn style(&self) -> &ComputedProperties {
        self.engine.style(self.target, None).expect("style")
    }

    fn opacity(&self) -> f32 {
        self.style()
            .property(PropertyId::Opacity)
            .as_number()
            .expect("numeric opacity")
    }

    fn event_kinds(&mut self) -> Vec<AnimationEventKind> {
        self.engine.take_events().into_iter().map(|event| event.kind).collect()
    }
}

const FADE_TRANSITION: &str = "div { transition: opacity 1s linear }";

#[test]
fn test_transition_runs_between_styles() {
    let mut page = Page::new(FADE_TRANSITION, "opacity: 1");
    page.restyle_with("opacity: 0");
    assert!((page.opacity() - 1.0).abs() < 1e-6);

    page.advance_to(250.0);
    assert!((page.opacity() - 0.75).abs() < 1e-4);
    assert_eq!(page.style().base_value(PropertyId::Opacity), &StyleValue::Number(0.0));

    page.advance_to(1000.0);
    assert!(page.opacity().abs() < 1e-6);
    assert_eq!(
        page.event_kinds(),
        [AnimationEventKind::TransitionStart, AnimationEventKind::TransitionEnd]
    );
}

#[test]
fn test_reversed_transition_is_shortened() {
    let mut page = Page::new(FADE_TRANSITION, "opacity: 1");
    page.restyle_with("opacity: 0");
    page.advance_to(400.0);
    page.restyle_with("opacity: 1");

    let transitions = page
        .engine
        .animations()
        .transitions((page.target, None))
        .expect("transitions");
    let running = transitions.running(PropertyId::Opacity).expect("running transition");
    let start = running.start_value.as_number().expect("number");
    assert!((start - 0.6).abs() < 1e-4, "start {start}");
    assert_eq!(running.end_value, StyleValue::Number(1.0));
    // 0.4 of the way through a linear 1 -> 0 transition.
    assert!((running.reversing_shortening_factor - 0.4).abs() < 1e-6);
    assert!((running.timing.iteration_duration - 400.0).abs() < 1e-6);
    assert!(transitions.completed(PropertyId::Opacity).is_none());

    let kinds = page.event_kinds();
    assert!(kinds.contains(&AnimationEventKind::TransitionCancel));
}

#[test]
fn test_retargeting_keeps_one_running_transition() {
    let mut page = Page::new(FADE_TRANSITION, "opacity: 1");
    for (time, target) in [(0.0, "0"), (100.0, "0.5"), (200.0, "0.2"), (300.0, "0.9")] {
        page.advance_to(time);
        page.restyle_with(&format!("opacity: {target}"));
        let transitions = page
            .engine
            .animations()
            .transitions((page.target, None))
            .expect("transitions");
        assert!(transitions.running(PropertyId::Opacity).is_some());
    }
    page.advance_to(5000.0);
    let transitions = page.engine.animations().transitions((page.target, None));
    assert!(transitions.is_none_or(|transitions| transitions.running(PropertyId::Opacity).is_none()));
    assert!((page.opacity() - 0.9).abs() < 1e-6);
}

#[test]
fn test_no_transition_without_matching_property() {
    let mut page = Page::new("div { transition: width 1s }", "opacity: 1");
    page.restyle_with("opacity: 0");
    assert!(page.opacity().abs() < 1e-6);
    assert!(page.engine.animations().transitions((page.target, None)).is_none());
}

#[test]
fn test_keyframe_animation_through_engine() {
    let css = "@keyframes fade { from { opacity: 0 } to { opacity: 1 } } \
               div.run { animation-name: fade; animation-duration: 1s; animation-timing-function: linear }";
    let mut page = Page::new(css, "");
    let _ = page.tree.set_attribute(page.target, "class", "run");
    let _ = page.engine.compute_document_styles(&mut page.tree);
    assert!(page.opacity().abs() < 1e-6);

    page.advance_to(500.0);
    assert!((page.opacity() - 0.5).abs() < 1e-4);

    page.advance_to(1500.0);
    assert!((page.opacity() - 1.0).abs() < 1e-6);
    assert!(!page.style().has_animated_values());
    assert_eq!(
        page.event_kinds(),
        [AnimationEventKind::AnimationStart, AnimationEventKind::AnimationEnd]
    );
}

#[test]
fn test_each_animation_uses_its_own_timing_function() {
    let css = "@keyframes a { from { width: 0px } to { width: 100px } } \
               @keyframes b { from { width: 0px } to { width: 100px } } \
               div { animation-name: a, b; animation-duration: 1s; animation-timing-function: linear, steps(1, end) }";
    let mut page = Page::new(css, "");
    page.advance_to(500.0);

    let animations = page.engine.animations().animations((page.target, None));
    assert_eq!(animations.len(), 2);
    let width_at_half = |name: &str| {
        let animation = animations.iter().find(|animation| animation.name() == name).expect("animation");
        animation.keyframes().sample(PropertyId::Width, 0.5, false).expect("width sample")
    };
    assert_eq!(width_at_half("a"), StyleValue::px(50.0));
    assert_eq!(width_at_half("b"), StyleValue::px(0.0));
    // `b` is later in the list, so its value is the one applied.
    assert_eq!(page.style().property(PropertyId::Width), &StyleValue::px(0.0));
}

#[test]
fn test_animation_in_shadow_scope_uses_its_keyframes() {
    let mut engine = StyleEngine::new(StyleConfig::default());
    let mut tree = DomTree::new();
    let html = tree.create_html_element("html");
    tree.append_child(NodeId::ROOT, html);
    let host = tree.create_html_element("div");
    tree.append_child(html, host);
    let root = tree.attach_shadow(host).expect("shadow root");
    let inner = tree.create_html_element("span");
    tree.append_child(root, inner);
    let _ = engine.add_sheet(
        Arc::new(Stylesheet::parse(
            "@keyframes hide { from { visibility: hidden } to { visibility: hidden } } \
             span { animation: hide 1s }",
            None,
        )),
        Some(root),
    );
    let style = engine.compute_style(&tree, inner, None).expect("style");
    assert!(style.property(PropertyId::Visibility).is_keyword(Keyword::Hidden));
}

#[test]
fn test_removed_element_cancels_its_transitions() {
    let mut page = Page::new(FADE_TRANSITION, "opacity: 1");
    page.restyle_with("opacity: 0");
    page.advance_to(100.0);
    let _ = page.event_kinds();

    page.engine.element_removed(&page.tree, page.target);
    assert!(page.engine.style(page.target, None).is_none());
    assert_eq!(page.event_kinds(), [AnimationEventKind::TransitionCancel]);
}
