//! Integration tests for computed value resolution.

use std::sync::Arc;

use quickcheck_macros::quickcheck;
use wombat_css::{AbsolutizeContext, Color, Keyword, PropertyId, StyleValue, Stylesheet};
use wombat_dom::{DomTree, NodeId};
use wombat_style::{ComputedProperties, StyleConfig, StyleEngine};

fn document() -> (DomTree, NodeId, NodeId) {
    let mut tree = DomTree::new();
    let html = tree.create_html_element("html");
    tree.append_child(NodeId::ROOT, html);
    let body = tree.create_html_element("body");
    tree.append_child(html, body);
    (tree, html, body)
}

fn engine(css: &str) -> StyleEngine {
    let mut engine = StyleEngine::new(StyleConfig::default());
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse(css, None)), None);
    engine
}

fn append(tree: &mut DomTree, parent: NodeId, tag: &str, class: Option<&str>) -> NodeId {
    let element = tree.create_html_element(tag);
    if let Some(class) = class {
        let _ = tree.set_attribute(element, "class", class);
    }
    tree.append_child(parent, element);
    element
}

fn style_of(engine: &mut StyleEngine, tree: &DomTree, element: NodeId) -> Arc<ComputedProperties> {
    engine.compute_style(tree, element, None).expect("element style")
}

fn px(style: &ComputedProperties, property: PropertyId) -> f32 {
    style
        .property(property)
        .as_px()
        .unwrap_or_else(|| panic!("{property} is not absolute: {:?}", style.property(property)))
}

#[test]
fn test_math_font_size_scales_by_depth() {
    let mut engine = engine("div { font-size: 16px; math-depth: 0 } span { math-depth: 2; font-size: math }");
    let (mut tree, _, body) = document();
    let div = append(&mut tree, body, "div", None);
    let span = append(&mut tree, div, "span", None);
    let size = style_of(&mut engine, &tree, span).font_size();
    assert!((size - 16.0 * 0.71 * 0.71).abs() < 0.01, "got {size}");
    assert!((size - 8.07).abs() < 0.01);
}

#[test]
fn test_em_and_rem_units() {
    let mut engine = engine("html { font-size: 20px } div { font-size: 10px } p { font-size: 2em; width: 2rem; height: 3em }");
    let (mut tree, _, body) = document();
    let div = append(&mut tree, body, "div", None);
    let p = append(&mut tree, div, "p", None);
    let style = style_of(&mut engine, &tree, p);
    assert!((style.font_size() - 20.0).abs() < f32::EPSILON);
    assert!((px(&style, PropertyId::Width) - 40.0).abs() < f32::EPSILON);
    assert!((px(&style, PropertyId::Height) - 60.0).abs() < f32::EPSILON);
}

#[test]
fn test_font_size_keywords_follow_config() {
    let config = StyleConfig {
        default_user_font_size: 20.0,
        ..StyleConfig::default()
    };
    let mut engine = StyleEngine::new(config);
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse("p { font-size: x-large } code { font-family: monospace }", None)), None);
    let (mut tree, html, body) = document();
    let p = append(&mut tree, body, "p", None);
    let code = append(&mut tree, body, "code", None);
    assert!((style_of(&mut engine, &tree, html).font_size() - 20.0).abs() < f32::EPSILON);
    assert!((style_of(&mut engine, &tree, p).font_size() - 30.0).abs() < f32::EPSILON);
    // A lone `monospace` family rescales `medium`.
    assert!((style_of(&mut engine, &tree, code).font_size() - 13.0).abs() < f32::EPSILON);
}

#[test]
fn test_unset_ancestor_font_size_restarts_monospace_recascade() {
    let mut engine = engine("body { font-size: 20px } div.u { font-size: unset } code { font-family: monospace }");
    let (mut tree, _, body) = document();
    let div = append(&mut tree, body, "div", Some("u"));
    let code = append(&mut tree, div, "code", None);
    let sibling = append(&mut tree, body, "code", None);
    // `unset` still inherits for the div itself.
    assert!((style_of(&mut engine, &tree, div).font_size() - 20.0).abs() < f32::EPSILON);
    assert!((style_of(&mut engine, &tree, code).font_size() - 13.0).abs() < f32::EPSILON);
    assert!((style_of(&mut engine, &tree, sibling).font_size() - 20.0).abs() < f32::EPSILON);
}

#[test]
fn test_custom_properties_inherit_and_substitute() {
    let mut engine = engine(":root { --gap: 4px; --accent: blue } p { margin-top: var(--gap); color: var(--accent) }");
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    let style = style_of(&mut engine, &tree, p);
    assert_eq!(style.property(PropertyId::MarginTop), &StyleValue::px(4.0));
    assert_eq!(style.color_value(PropertyId::Color), Some(Color::rgb(0, 0, 255)));
    assert!(style.custom_property("--gap").is_some());
}

#[test]
fn test_custom_property_revert_layer_falls_back_to_lower_layer() {
    let mut engine = engine(
        "@layer base { p { --x: 1px } } @layer top { p { --x: 2px } p { --x: revert-layer } } \
         p { margin-top: var(--x) }",
    );
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    assert_eq!(style_of(&mut engine, &tree, p).property(PropertyId::MarginTop), &StyleValue::px(1.0));
}

#[test]
fn test_custom_property_revert_drops_author_values() {
    let mut engine = engine("body { --y: 3px } p { --y: 5px } p.r { --y: revert } p { padding-left: var(--y, 7px) }");
    let (mut tree, _, body) = document();
    let reverted = append(&mut tree, body, "p", Some("r"));
    let plain = append(&mut tree, body, "p", None);
    // Reverting leaves nothing cascaded, so the body's value is inherited.
    assert_eq!(style_of(&mut engine, &tree, reverted).property(PropertyId::PaddingLeft), &StyleValue::px(3.0));
    assert_eq!(style_of(&mut engine, &tree, plain).property(PropertyId::PaddingLeft), &StyleValue::px(5.0));
}

#[test]
fn test_invalid_at_computed_value_time_falls_back_to_unset() {
    let mut engine = engine("p { --a: var(--b); --b: var(--a); width: var(--a); color: var(--missing) } body { color: blue }");
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    let style = style_of(&mut engine, &tree, p);
    assert_eq!(style.property(PropertyId::Width), &PropertyId::Width.initial_value());
    assert_eq!(style.color_value(PropertyId::Color), Some(Color::rgb(0, 0, 255)));
    assert!(style.custom_property("--a").is_none());
}

#[test]
fn test_var_fallback_is_used() {
    let mut engine = engine("p { padding-left: var(--missing, 6px) }");
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    assert_eq!(style_of(&mut engine, &tree, p).property(PropertyId::PaddingLeft), &StyleValue::px(6.0));
}

#[test]
fn test_currentcolor_in_color_inherits() {
    let mut engine = engine("div { color: red } p { color: currentcolor }");
    let (mut tree, _, body) = document();
    let div = append(&mut tree, body, "div", None);
    let p = append(&mut tree, div, "p", None);
    assert_eq!(
        style_of(&mut engine, &tree, p).color_value(PropertyId::Color),
        Some(Color::rgb(255, 0, 0))
    );
}

#[test]
fn test_absolutely_positioned_boxes_are_blockified() {
    let mut engine = engine("span { position: absolute; float: left; display: inline-block }");
    let (mut tree, _, body) = document();
    let span = append(&mut tree, body, "span", None);
    let style = style_of(&mut engine, &tree, span);
    assert_eq!(style.display(), Keyword::Block);
    assert!(style.property(PropertyId::Float).is_keyword(Keyword::None));
}

#[test]
fn test_border_width_is_zero_without_style() {
    let mut engine = engine("p { border-top-width: 5px } p.styled { border-top-style: solid }");
    let (mut tree, _, body) = document();
    let plain = append(&mut tree, body, "p", None);
    let styled = append(&mut tree, body, "p", Some("styled"));
    assert_eq!(style_of(&mut engine, &tree, plain).property(PropertyId::BorderTopWidth), &StyleValue::px(0.0));
    assert_eq!(style_of(&mut engine, &tree, styled).property(PropertyId::BorderTopWidth), &StyleValue::px(5.0));
}

#[test]
fn test_viewport_units_use_engine_viewport() {
    let mut engine = engine("p { width: 50vw; height: 10vh }");
    engine.set_viewport(1000.0, 500.0);
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    let style = style_of(&mut engine, &tree, p);
    assert!((px(&style, PropertyId::Width) - 500.0).abs() < 1e-3);
    assert!((px(&style, PropertyId::Height) - 50.0).abs() < 1e-3);
}

#[test]
fn test_document_style_covers_viewport() {
    let mut engine = engine("");
    engine.set_viewport(640.0, 480.0);
    let style = engine.create_document_style();
    assert_eq!(style.property(PropertyId::Width), &StyleValue::px(640.0));
    assert_eq!(style.display(), Keyword::Block);
}

#[test]
fn test_computed_styles_serialize_to_json() {
    let mut engine = engine("p { color: red }");
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    let style = style_of(&mut engine, &tree, p);
    let json = serde_json::to_value(style.as_ref()).expect("serializable style");
    assert!(json.get("color").is_some());
}

/// Computed lengths are already absolute: absolutizing them again is a
/// no-op.
#[quickcheck]
fn absolutized_lengths_are_fixed_points(em: u8, px_value: u16, percent: u8) -> bool {
    let css = format!(
        "p {{ font-size: {}px; width: {em}em; margin-left: {px_value}px; padding-top: {percent}%; height: calc(1em + {px_value}px) }}",
        u16::from(em) + 1
    );
    let mut engine = engine(&css);
    let (mut tree, _, body) = document();
    let p = append(&mut tree, body, "p", None);
    let style = style_of(&mut engine, &tree, p);
    let context = AbsolutizeContext {
        viewport: engine.viewport(),
        font_metrics: *style.font_metrics(),
        root_font_metrics: *style.font_metrics(),
    };
    [
        PropertyId::Width,
        PropertyId::MarginLeft,
        PropertyId::PaddingTop,
        PropertyId::Height,
        PropertyId::FontSize,
    ]
    .into_iter()
    .all(|property| style.property(property).absolutize(&context) == *style.property(property))
}
