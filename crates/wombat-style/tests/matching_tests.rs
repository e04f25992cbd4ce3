//! Integration tests for rule bucketing, selector matching and the
//! ancestor bloom filter.

use std::sync::Arc;

use wombat_css::{Color, MediaEnvironment, PropertyId, PseudoClassKind, Stylesheet};
use wombat_dom::{DomTree, ElementState, NodeId};
use wombat_style::rule_cache::RuleBucket;
use wombat_style::rule_store::SheetEntry;
use wombat_style::{CascadeOrigin, ComputedProperties, RuleCache, StyleConfig, StyleEngine};

fn cache(css: &str) -> RuleCache {
    let entry = SheetEntry {
        sheet: Arc::new(Stylesheet::parse(css, None)),
        origin: CascadeOrigin::Author,
        scope: None,
        index: 0,
    };
    RuleCache::build(&[entry], &MediaEnvironment::default(), false)
}

fn document() -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let html = tree.create_html_element("html");
    tree.append_child(NodeId::ROOT, html);
    let body = tree.create_html_element("body");
    tree.append_child(html, body);
    (tree, body)
}

fn append(tree: &mut DomTree, parent: NodeId, tag: &str, class: Option<&str>) -> NodeId {
    let element = tree.create_html_element(tag);
    if let Some(class) = class {
        let _ = tree.set_attribute(element, "class", class);
    }
    tree.append_child(parent, element);
    element
}

fn engine(css: &str) -> StyleEngine {
    let mut engine = StyleEngine::new(StyleConfig::default());
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse(css, None)), None);
    engine
}

fn is_red(style: &ComputedProperties) -> bool {
    style.color_value(PropertyId::Color) == Some(Color::rgb(255, 0, 0))
}

#[test]
fn test_is_selector_is_bucketed_by_class() {
    let cache = cache(":is(.a) { color: red }");
    assert_eq!(cache.bucket(&RuleBucket::Class("a".into())).len(), 1);

    let (mut tree, body) = document();
    let with_class = append(&mut tree, body, "div", Some("a"));
    let sibling = append(&mut tree, body, "div", None);
    let data = tree.as_element(with_class).expect("element");
    assert_eq!(cache.collect_matching_rules(data, false, None, None).len(), 1);
    let data = tree.as_element(sibling).expect("element");
    assert!(cache.collect_matching_rules(data, false, None, None).is_empty());
}

#[test]
fn test_candidates_filtered_by_layer() {
    let cache = cache("@layer base { p { color: red } } p { color: blue }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", None);
    let data = tree.as_element(p).expect("element");
    assert_eq!(cache.collect_matching_rules(data, false, None, None).len(), 2);
    assert_eq!(cache.collect_matching_rules(data, false, None, Some("base")).len(), 1);
}

#[test]
fn test_combinators() {
    let mut engine = engine("section > p { color: red } h1 + p { color: red } h2 ~ span { color: red }");
    let (mut tree, body) = document();
    let section = append(&mut tree, body, "section", None);
    let child = append(&mut tree, section, "p", None);
    let nested = append(&mut tree, section, "div", None);
    let grandchild = append(&mut tree, nested, "p", None);
    let _h1 = append(&mut tree, body, "h1", None);
    let adjacent = append(&mut tree, body, "p", None);
    let _h2 = append(&mut tree, body, "h2", None);
    let _between = append(&mut tree, body, "div", None);
    let general = append(&mut tree, body, "span", None);

    for (element, expected) in [(child, true), (grandchild, false), (adjacent, true), (general, true)] {
        let style = engine.compute_style(&tree, element, None).expect("style");
        assert_eq!(is_red(&style), expected, "{element:?}");
    }
}

#[test]
fn test_negation_and_attribute_selectors() {
    let mut engine = engine("p:not(.x) { color: red } a[href^='https'] { color: red }");
    let (mut tree, body) = document();
    let plain = append(&mut tree, body, "p", None);
    let excluded = append(&mut tree, body, "p", Some("x"));
    let secure = append(&mut tree, body, "a", None);
    let _ = tree.set_attribute(secure, "href", "https://example.com");
    let insecure = append(&mut tree, body, "a", None);
    let _ = tree.set_attribute(insecure, "href", "http://example.com");

    assert!(is_red(&engine.compute_style(&tree, plain, None).expect("style")));
    assert!(!is_red(&engine.compute_style(&tree, excluded, None).expect("style")));
    assert!(is_red(&engine.compute_style(&tree, secure, None).expect("style")));
    assert!(!is_red(&engine.compute_style(&tree, insecure, None).expect("style")));
}

#[test]
fn test_dynamic_state_restyles_through_invalidation() {
    let mut engine = engine(".menu:hover .item { color: red }");
    let (mut tree, body) = document();
    let menu = append(&mut tree, body, "div", Some("menu"));
    let item = append(&mut tree, menu, "span", Some("item"));
    let _ = engine.compute_document_styles(&mut tree);
    assert!(!is_red(engine.style(item, None).expect("style")));

    tree.set_element_state(menu, ElementState::HOVER, true);
    assert!(engine.state_changed(&mut tree, menu, PseudoClassKind::Hover));
    assert!(tree.needs_style_update(item));
    let _ = engine.compute_document_styles(&mut tree);
    assert!(is_red(engine.style(item, None).expect("style")));
}

#[test]
fn test_attempted_pseudo_classes_are_stored_on_the_style() {
    let mut engine = engine("p:focus { color: red }");
    let (mut tree, body) = document();
    let p = append(&mut tree, body, "p", None);
    let style = engine.compute_style(&tree, p, None).expect("style");
    assert!(style.attempted_pseudo_classes().contains(PseudoClassKind::Focus));
    assert!(!style.attempted_pseudo_classes().contains(PseudoClassKind::Hover));
}

#[test]
fn test_bloom_filter_does_not_change_results() {
    let css = ".outer .inner p { color: red } .missing p { width: 3px }";
    let (mut tree, body) = document();
    let outer = append(&mut tree, body, "div", Some("outer"));
    let inner = append(&mut tree, outer, "div", Some("inner"));
    let p = append(&mut tree, inner, "p", None);

    let mut filtered = engine(css);
    let _ = filtered.compute_document_styles(&mut tree);
    let with_filter = Arc::clone(filtered.style(p, None).expect("style"));

    let mut unfiltered = engine(css);
    let without_filter = unfiltered.compute_style(&tree, p, None).expect("style");

    assert!(is_red(&with_filter));
    assert_eq!(with_filter, without_filter);
}

#[test]
fn test_has_selector_matches_parent() {
    let mut engine = engine("div:has(> .x) { color: red }");
    let (mut tree, body) = document();
    let parent = append(&mut tree, body, "div", None);
    let _child = append(&mut tree, parent, "span", Some("x"));
    let other = append(&mut tree, body, "div", None);
    assert!(is_red(&engine.compute_style(&tree, parent, None).expect("style")));
    assert!(!is_red(&engine.compute_style(&tree, other, None).expect("style")));
}

#[test]
fn test_inserted_element_marks_following_siblings() {
    let mut engine = engine("li:first-child { color: red }");
    let (mut tree, body) = document();
    let list = append(&mut tree, body, "ul", None);
    let first = append(&mut tree, list, "li", None);
    let _ = engine.compute_document_styles(&mut tree);

    let inserted = tree.create_html_element("li");
    tree.append_child(list, inserted);
    engine.element_inserted(&mut tree, inserted);
    assert!(tree.needs_style_update(inserted));
    assert!(!tree.needs_style_update(first));

    let _ = engine.compute_document_styles(&mut tree);
    assert!(is_red(engine.style(first, None).expect("style")));
    assert!(!is_red(engine.style(inserted, None).expect("style")));
}
