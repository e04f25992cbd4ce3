//! Integration tests for the cascade: origins, layers, importance, shadow
//! trees, defaulting keywords and logical properties.

use std::sync::Arc;

use wombat_css::{Color, Keyword, PropertyId, StyleValue, Stylesheet};
use wombat_dom::{DomTree, NodeId};
use wombat_style::{ComputedProperties, StyleConfig, StyleEngine};

/// A document with `<html><body></body></html>`.
fn document() -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let html = tree.create_html_element("html");
    tree.append_child(NodeId::ROOT, html);
    let body = tree.create_html_element("body");
    tree.append_child(html, body);
    (tree, body)
}

fn engine(css: &str) -> StyleEngine {
    let mut engine = StyleEngine::new(StyleConfig::default());
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse(css, None)), None);
    engine
}

fn append(tree: &mut DomTree, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
    let element = tree.create_html_element(tag);
    for (name, value) in attributes {
        let _ = tree.set_attribute(element, name, value);
    }
    tree.append_child(parent, element);
    element
}

fn style_of(engine: &mut StyleEngine, tree: &DomTree, element: NodeId) -> Arc<ComputedProperties> {
    engine.compute_style(tree, element, None).expect("element style")
}

fn color(style: &ComputedProperties) -> Color {
    style.color_value(PropertyId::Color).expect("computed color")
}

const RED: Color = Color::rgb(255, 0, 0);
const GREEN: Color = Color::rgb(0, 128, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

#[test]
fn test_later_rule_wins_at_equal_specificity() {
    let mut engine = engine("p { color: red } p { color: blue }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), BLUE);
}

#[test]
fn test_unlayered_beats_layered_for_normal_declarations() {
    let mut engine = engine("@layer a { p { color: red } } p { color: blue }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), BLUE);
}

#[test]
fn test_layers_win_in_reverse_for_important_declarations() {
    let mut engine = engine("@layer a { p { color: red !important } } p { color: blue !important }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), RED);
}

#[test]
fn test_later_layer_wins_for_normal_declarations() {
    let mut engine = engine("@layer base, theme; @layer theme { p { color: blue } } @layer base { p { color: red } }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), BLUE);
}

#[test]
fn test_specificity_beats_order() {
    let mut engine = engine("#x { color: red } p { color: blue }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[("id", "x")]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), RED);
}

#[test]
fn test_inline_style_beats_author_rules() {
    let mut engine = engine("#x { color: red }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[("id", "x"), ("style", "color: blue")]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), BLUE);
}

#[test]
fn test_important_author_rule_beats_inline_style() {
    let mut engine = engine("p { color: red !important }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[("style", "color: blue")]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), RED);
}

#[test]
fn test_user_origin_sits_between_user_agent_and_author() {
    let mut engine = engine("p { color: blue } p { background-color: blue !important }");
    engine.set_user_style_sheet(Some("p { color: green; background-color: green !important }".to_string()));
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    let style = style_of(&mut engine, &tree, p);
    assert_eq!(color(&style), BLUE);
    assert_eq!(style.color_value(PropertyId::BackgroundColor), Some(GREEN));
}

#[test]
fn test_author_rules_beat_presentational_hints() {
    let mut engine = engine("img.sized { width: 50px }");
    let (mut tree, body) = document();
    let hinted = append(&mut tree, body, "img", &[("width", "100")]);
    let sized = append(&mut tree, body, "img", &[("width", "100"), ("class", "sized")]);
    assert_eq!(style_of(&mut engine, &tree, hinted).property(PropertyId::Width), &StyleValue::px(100.0));
    assert_eq!(style_of(&mut engine, &tree, sized).property(PropertyId::Width), &StyleValue::px(50.0));
}

#[test]
fn test_revert_rolls_back_to_user_agent_value() {
    let mut engine = engine("p { display: inline } p.x { display: revert }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[("class", "x")]);
    assert_eq!(style_of(&mut engine, &tree, p).display(), Keyword::Block);
}

#[test]
fn test_revert_layer_falls_back_to_lower_layer() {
    let mut engine = engine("@layer base { p { color: green } } @layer top { p { color: red } p { color: revert-layer } }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), GREEN);
}

#[test]
fn test_inherit_takes_parent_computed_value() {
    let mut engine = engine("div { width: 30px } p { width: inherit }");
    let (mut tree, body) = document();
    let div = append(&mut tree, body, "div", &[]);
    let p = append(&mut tree, div, "p", &[]);
    assert_eq!(style_of(&mut engine, &tree, p).property(PropertyId::Width), &StyleValue::px(30.0));
}

#[test]
fn test_unset_inherits_or_resets() {
    let mut engine = engine("div { color: blue; width: 30px } p { color: red; width: 10px } p.u { color: unset; width: unset }");
    let (mut tree, body) = document();
    let div = append(&mut tree, body, "div", &[]);
    let p = append(&mut tree, div, "p", &[("class", "u")]);
    let style = style_of(&mut engine, &tree, p);
    assert_eq!(color(&style), BLUE);
    assert_eq!(style.property(PropertyId::Width), &PropertyId::Width.initial_value());
}

#[test]
fn test_logical_margin_follows_direction() {
    let mut engine = engine("p { margin-inline-start: 7px } .rtl { direction: rtl }");
    let (mut tree, body) = document();
    let ltr = append(&mut tree, body, "p", &[]);
    let div = append(&mut tree, body, "div", &[("class", "rtl")]);
    let rtl = append(&mut tree, div, "p", &[]);

    let style = style_of(&mut engine, &tree, ltr);
    assert_eq!(style.property(PropertyId::MarginLeft), &StyleValue::px(7.0));

    let style = style_of(&mut engine, &tree, rtl);
    assert_eq!(style.property(PropertyId::MarginRight), &StyleValue::px(7.0));
    assert_ne!(style.property(PropertyId::MarginLeft), &StyleValue::px(7.0));
}

#[test]
fn test_shadow_tree_rules_stay_inside_their_scope() {
    let mut engine = engine("span { color: red }");
    let (mut tree, body) = document();
    let host = append(&mut tree, body, "div", &[]);
    let root = tree.attach_shadow(host).expect("shadow root");
    let inner = tree.create_html_element("span");
    tree.append_child(root, inner);
    let outer = append(&mut tree, body, "span", &[]);
    let _ = engine.add_sheet(
        Arc::new(Stylesheet::parse(":host { width: 10px } span { color: blue }", None)),
        Some(root),
    );

    assert_eq!(color(&style_of(&mut engine, &tree, inner)), BLUE);
    assert_eq!(color(&style_of(&mut engine, &tree, outer)), RED);
    assert_eq!(style_of(&mut engine, &tree, host).property(PropertyId::Width), &StyleValue::px(10.0));
}

#[test]
fn test_document_rules_beat_host_rules_for_normal_declarations() {
    let mut engine = engine("div { width: 20px }");
    let (mut tree, body) = document();
    let host = append(&mut tree, body, "div", &[]);
    let root = tree.attach_shadow(host).expect("shadow root");
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse(":host { width: 10px }", None)), Some(root));
    assert_eq!(style_of(&mut engine, &tree, host).property(PropertyId::Width), &StyleValue::px(20.0));
}

#[test]
fn test_important_inline_style_beats_important_rules_in_shadow_tree() {
    let mut engine = engine("");
    let (mut tree, body) = document();
    let host = append(&mut tree, body, "div", &[]);
    let root = tree.attach_shadow(host).expect("shadow root");
    let inner = tree.create_html_element("span");
    let _ = tree.set_attribute(inner, "style", "color: blue !important");
    tree.append_child(root, inner);
    let plain = tree.create_html_element("span");
    tree.append_child(root, plain);
    let _ = engine.add_sheet(
        Arc::new(Stylesheet::parse("span { color: red !important; width: 5px !important }", None)),
        Some(root),
    );

    let style = style_of(&mut engine, &tree, inner);
    assert_eq!(color(&style), BLUE);
    assert_eq!(style.property(PropertyId::Width), &StyleValue::px(5.0));
    assert_eq!(color(&style_of(&mut engine, &tree, plain)), RED);
}

#[test]
fn test_shadow_layer_important_beats_important_inline_style() {
    let mut engine = engine("");
    let (mut tree, body) = document();
    let host = append(&mut tree, body, "div", &[]);
    let root = tree.attach_shadow(host).expect("shadow root");
    let inner = tree.create_html_element("span");
    let _ = tree.set_attribute(inner, "style", "color: blue !important");
    tree.append_child(root, inner);
    let _ = engine.add_sheet(
        Arc::new(Stylesheet::parse("@layer base { span { color: green !important } }", None)),
        Some(root),
    );
    assert_eq!(color(&style_of(&mut engine, &tree, inner)), GREEN);
}

#[test]
fn test_compute_style_is_idempotent() {
    let mut engine = engine(":root { --gap: 3px } p { margin-top: var(--gap); color: red } p:first-child { width: 5em }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    let first = style_of(&mut engine, &tree, p);
    let second = style_of(&mut engine, &tree, p);
    assert_eq!(first, second);
}

#[test]
fn test_invalidated_rule_cache_matches_fresh_engine() {
    let css = "@layer a { p { color: red } } p.x { width: 4px } @media (min-width: 100px) { p { height: 2px } }";
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[("class", "x")]);

    let mut reused = engine(css);
    let _ = style_of(&mut reused, &tree, p);
    reused.invalidate_rule_cache();
    let rebuilt = style_of(&mut reused, &tree, p);

    let mut fresh = engine(css);
    assert_eq!(rebuilt, style_of(&mut fresh, &tree, p));
}

#[test]
fn test_removed_sheet_stops_applying() {
    let mut engine = StyleEngine::new(StyleConfig::default());
    let id = engine.add_sheet(Arc::new(Stylesheet::parse("p { color: red }", None)), None);
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", &[]);
    assert_eq!(color(&style_of(&mut engine, &tree, p)), RED);

    assert!(engine.replace_sheet(id, Arc::new(Stylesheet::parse("p { color: blue }", None))));
    assert_eq!(color(&style_of(&mut engine, &tree, p)), BLUE);

    assert!(engine.remove_sheet(id));
    assert_eq!(color(&style_of(&mut engine, &tree, p)), Color::rgb(0, 0, 0));
}
