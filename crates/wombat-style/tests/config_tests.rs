//! Integration tests for engine configuration.

use std::sync::Arc;

use wombat_css::Stylesheet;
use wombat_dom::{DomTree, NodeId};
use wombat_style::{ConfigError, StyleConfig, StyleEngine, Viewport};

#[test]
fn test_partial_json_keeps_defaults() {
    let config = StyleConfig::from_json_str(r#"{ "default_user_font_size": 18, "viewport": { "width": 1024, "height": 768 } }"#)
        .expect("valid config");
    assert!((config.default_user_font_size - 18.0).abs() < f32::EPSILON);
    assert_eq!(
        config.viewport,
        Viewport {
            width: 1024.0,
            height: 768.0
        }
    );
    let defaults = StyleConfig::default();
    assert_eq!(config.generic_families, defaults.generic_families);
    assert_eq!(config.default_monospace_font_size, defaults.default_monospace_font_size);
}

#[test]
fn test_empty_object_is_the_default_config() {
    assert_eq!(StyleConfig::from_json_str("{}").expect("valid config"), StyleConfig::default());
}

#[test]
fn test_non_positive_size_is_rejected() {
    let error = StyleConfig::from_json_str(r#"{ "default_user_font_size": -4 }"#).unwrap_err();
    match error {
        ConfigError::InvalidValue { field, .. } => assert_eq!(field, "default_user_font_size"),
        ConfigError::Json(error) => panic!("unexpected JSON error: {error}"),
    }
}

#[test]
fn test_decreasing_size_ratios_are_rejected() {
    let mut config = StyleConfig::default();
    config.absolute_size_ratios.swap(0, 7);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "absolute_size_ratios",
            ..
        })
    ));
}

#[test]
fn test_malformed_json_is_reported() {
    let error = StyleConfig::from_json_str("{ default_user_font_size: 18").unwrap_err();
    assert!(matches!(error, ConfigError::Json(_)));
    assert!(error.to_string().starts_with("invalid style configuration"));
}

#[test]
fn test_config_round_trips_through_json() {
    let config = StyleConfig {
        default_font: "Georgia".to_string(),
        ..StyleConfig::default()
    };
    let json = serde_json::to_string(&config).expect("serializable config");
    assert_eq!(StyleConfig::from_json_str(&json).expect("valid config"), config);
}

#[test]
fn test_engine_honours_configured_sizes_and_viewport() {
    let config = StyleConfig::from_json_str(r#"{ "default_user_font_size": 12, "viewport": { "width": 400, "height": 300 } }"#)
        .expect("valid config");
    let mut engine = StyleEngine::new(config);
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse("p { width: 100vw; font-size: larger }", None)), None);
    assert_eq!(engine.viewport(), (400.0, 300.0));

    let mut tree = DomTree::new();
    let html = tree.create_html_element("html");
    tree.append_child(NodeId::ROOT, html);
    let p = tree.create_html_element("p");
    tree.append_child(html, p);

    let root_style = engine.compute_style(&tree, html, None).expect("style");
    assert!((root_style.font_size() - 12.0).abs() < f32::EPSILON);
    let style = engine.compute_style(&tree, p, None).expect("style");
    assert!((style.font_size() - 14.4).abs() < 1e-4);
    assert_eq!(style.property(wombat_css::PropertyId::Width).as_px(), Some(400.0));
}
