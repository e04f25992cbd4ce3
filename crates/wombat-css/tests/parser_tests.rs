//! Stylesheet interpretation tests: nesting, conditional rules, layers and
//! style attributes.

use wombat_css::media::MediaEnvironment;
use wombat_css::stylesheet::{CssRule, DeclarationBlock, StyleRule, Stylesheet};
use wombat_css::{Color, PropertyId, StyleValue};

fn only_style_rule(sheet: &Stylesheet) -> &StyleRule {
    match sheet.rules.as_slice() {
        [CssRule::Style(rule)] => rule,
        other => panic!("expected a single style rule, got {other:?}"),
    }
}

#[test]
fn test_invalid_selector_drops_only_that_rule() {
    let sheet = Stylesheet::parse("p:banana { color: red } div { color: blue }", None);
    let rule = only_style_rule(&sheet);
    assert_eq!(rule.selectors.len(), 1);
    assert_eq!(rule.declarations.declarations[0].property, PropertyId::Color);
}

#[test]
fn test_important_flag() {
    let sheet = Stylesheet::parse("p { color: red !important; margin-top: 1px }", None);
    let rule = only_style_rule(&sheet);
    let important: Vec<bool> = rule.declarations.declarations.iter().map(|d| d.important).collect();
    assert_eq!(important, vec![true, false]);
}

#[test]
fn test_nested_rule_absolutizes_against_parent() {
    let sheet = Stylesheet::parse(".card { &:hover { color: red } .title { color: blue } }", None);
    let outer = only_style_rule(&sheet);
    assert_eq!(outer.child_rules.len(), 2);
    let CssRule::Style(hover) = &outer.child_rules[0] else {
        panic!("expected nested style rule");
    };
    assert_eq!(hover.absolutized_selectors[0].specificity().to_string(), "(0, 2, 0)");
    let CssRule::Style(title) = &outer.child_rules[1] else {
        panic!("expected nested style rule");
    };
    assert_eq!(title.absolutized_selectors[0].specificity().to_string(), "(0, 2, 0)");
}

#[test]
fn test_media_rule_keeps_queries() {
    let sheet = Stylesheet::parse("@media (min-width: 600px) { p { color: red } }", None);
    let CssRule::Media(media) = &sheet.rules[0] else {
        panic!("expected @media");
    };
    assert!(media.queries.matches(&MediaEnvironment { width: 800.0, height: 600.0 }));
    assert!(!media.queries.matches(&MediaEnvironment { width: 400.0, height: 600.0 }));
    assert_eq!(media.rules.len(), 1);
}

#[test]
fn test_supports_is_decided_at_parse_time() {
    let sheet = Stylesheet::parse(
        "@supports (display: flex) { a {} } @supports (display: banana) { b {} } @supports not (color: red) { c {} }",
        None,
    );
    let decided: Vec<bool> = sheet
        .rules
        .iter()
        .map(|rule| match rule {
            CssRule::Supports(supports) => supports.matches,
            other => panic!("expected @supports, got {other:?}"),
        })
        .collect();
    assert_eq!(decided, vec![true, false, false]);
}

#[test]
fn test_media_inside_style_rule_wraps_declarations() {
    let sheet = Stylesheet::parse(".a { color: red; @media (min-width: 1px) { color: blue } }", None);
    let outer = only_style_rule(&sheet);
    let CssRule::Media(media) = &outer.child_rules[0] else {
        panic!("expected nested @media");
    };
    let CssRule::NestedDeclarations(nested) = &media.rules[0] else {
        panic!("expected nested declarations inside @media");
    };
    assert_eq!(
        nested.declarations.declarations[0].value,
        StyleValue::Color(Color::from_named("blue").expect("known colour"))
    );
    assert_eq!(nested.parent_selectors.len(), 1);
}

#[test]
fn test_anonymous_layers_never_merge() {
    let sheet = Stylesheet::parse("@layer { a {} } @layer { b {} }", None);
    let names: Vec<&str> = sheet
        .rules
        .iter()
        .map(|rule| match rule {
            CssRule::LayerBlock(layer) => layer.name.as_str(),
            other => panic!("expected @layer block, got {other:?}"),
        })
        .collect();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
    assert!(names.iter().all(|name| name.starts_with("#anonymous-")));
}

#[test]
fn test_import_with_layer_and_media() {
    let sheet = Stylesheet::parse(
        "@import url(theme.css) layer(base) screen;",
        Some("https://example.com/styles/main.css"),
    );
    let CssRule::Import(import) = &sheet.rules[0] else {
        panic!("expected @import");
    };
    assert_eq!(import.url, "https://example.com/styles/theme.css");
    assert_eq!(import.layer.as_deref(), Some("base"));
    assert!(import.media.matches(&MediaEnvironment::default()));
}

#[test]
fn test_unknown_at_rule_is_dropped() {
    let sheet = Stylesheet::parse("@page { margin: 1in } p {}", None);
    assert_eq!(sheet.rules.len(), 1);
}

#[test]
fn test_style_attribute_parsing() {
    let block = DeclarationBlock::parse_style_attribute("color: red; --gap: 4px; margin: 0 auto");
    assert_eq!(block.declarations.len(), 2);
    assert_eq!(block.custom_properties.len(), 1);
    assert_eq!(block.custom_properties[0].name, "--gap");
    assert!(!block.is_empty());
    assert!(DeclarationBlock::parse_style_attribute("   ").is_empty());
}

#[test]
fn test_var_values_stay_unresolved() {
    let block = DeclarationBlock::parse_style_attribute("margin: var(--m) 2px");
    assert!(matches!(block.declarations[0].value, StyleValue::Unresolved(_)));
    assert_eq!(block.declarations[0].property, PropertyId::Margin);
}
