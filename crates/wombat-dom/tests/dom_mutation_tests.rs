//! Tests for tree mutation, shadow roots, attributes and dirty tracking.

use wombat_dom::{DomTree, ElementState, NodeId, namespace};

fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.create_html_element(tag);
    tree.append_child(parent, id);
    id
}

// ========== remove_child / insert_before ==========

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "div");
    let a = element(&mut tree, parent, "a");
    let b = element(&mut tree, parent, "b");
    let c = element(&mut tree, parent, "c");

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.prev_sibling(b), None);
    assert_eq!(tree.next_sibling(b), None);
}

#[test]
fn test_remove_non_child_is_noop() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "div");
    let stray = tree.create_html_element("span");
    tree.remove_child(parent, stray);
    assert!(tree.children(parent).is_empty());
}

#[test]
fn test_insert_before_links_siblings() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "ul");
    let a = element(&mut tree, parent, "li");
    let c = element(&mut tree, parent, "li");
    let b = tree.create_html_element("li");

    tree.insert_before(parent, b, Some(c));

    assert_eq!(tree.children(parent), &[a, b, c]);
    assert_eq!(tree.preceding_siblings(c).collect::<Vec<_>>(), vec![b, a]);
    assert_eq!(tree.following_siblings(a).collect::<Vec<_>>(), vec![b, c]);
}

// ========== attributes ==========

#[test]
fn test_id_and_classes_follow_attributes() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "DIV");
    let _ = tree.set_attribute(div, "ID", "main");
    let _ = tree.set_attribute(div, "class", "a  b a");

    let data = tree.as_element(div).unwrap();
    assert_eq!(data.local_name(), "div");
    assert_eq!(data.id(), Some("main"));
    assert_eq!(data.classes(), &["a".to_string(), "b".to_string()]);
    assert_eq!(data.attributes()[0].name, "id");

    let old = tree.remove_attribute(div, "class");
    assert_eq!(old.as_deref(), Some("a  b a"));
    assert!(tree.as_element(div).unwrap().classes().is_empty());
}

#[test]
fn test_svg_names_keep_case() {
    let mut tree = DomTree::new();
    let svg = tree.create_element("foreignObject", Some(namespace::SVG));
    assert_eq!(tree.as_element(svg).unwrap().local_name(), "foreignObject");
    assert!(!tree.as_element(svg).unwrap().is_html());
}

// ========== shadow trees ==========

#[test]
fn test_shadow_root_linkage() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let host = element(&mut tree, html, "my-widget");
    let shadow = tree.attach_shadow(host).unwrap();
    let inner = element(&mut tree, shadow, "span");

    assert_eq!(tree.shadow_root_of(host), Some(shadow));
    assert_eq!(tree.shadow_host(shadow), Some(host));
    assert_eq!(tree.containing_shadow_root(inner), Some(shadow));
    assert_eq!(tree.containing_shadow_root(host), None);
    assert_eq!(tree.parent_element(inner), None);
    assert_eq!(tree.parent_or_shadow_host_element(inner), Some(host));
    assert_eq!(tree.attach_shadow(host), Some(shadow));
}

// ========== dirty tracking ==========

#[test]
fn test_dirty_bits_propagate_to_ancestors() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let body = element(&mut tree, html, "body");
    let p = element(&mut tree, body, "p");
    for id in [NodeId::ROOT, html, body, p] {
        tree.clear_style_dirty(id);
    }

    tree.mark_style_dirty(p);

    assert!(tree.needs_style_update(p));
    assert!(!tree.needs_style_update(body));
    assert!(tree.child_needs_style_update(body));
    assert!(tree.child_needs_style_update(html));
    assert!(tree.child_needs_style_update(NodeId::ROOT));
}

#[test]
fn test_element_state_flags() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, NodeId::ROOT, "a");
    tree.set_element_state(a, ElementState::HOVER, true);
    assert!(tree.as_element(a).unwrap().state.contains(ElementState::HOVER));
    tree.set_element_state(a, ElementState::HOVER, false);
    assert!(tree.as_element(a).unwrap().state.is_empty());
}
