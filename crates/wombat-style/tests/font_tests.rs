//! Integration tests for font family resolution and `@font-face` loading.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wombat_common::fetch::{CompletedFetch, Destination, FetchError, FetchRequest, ResourceFetcher};
use wombat_css::Stylesheet;
use wombat_dom::{DomTree, NodeId};
use wombat_style::font::FontSource;
use wombat_style::font::loader::FontLoadState;
use wombat_style::{StyleConfig, StyleEngine};

#[derive(Clone, Default)]
struct RecordingFetcher {
    requests: Rc<RefCell<Vec<FetchRequest>>>,
    cancelled: Rc<RefCell<Vec<u64>>>,
}

impl ResourceFetcher for RecordingFetcher {
    fn fetch(&self, request: FetchRequest) {
        self.requests.borrow_mut().push(request);
    }

    fn cancel(&self, token: u64) {
        self.cancelled.borrow_mut().push(token);
    }
}

fn page(css: &str) -> (StyleEngine, DomTree, NodeId) {
    let mut engine = StyleEngine::new(StyleConfig::default());
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse(css, None)), None);
    let mut tree = DomTree::new();
    let html = tree.create_html_element("html");
    tree.append_child(NodeId::ROOT, html);
    let p = tree.create_html_element("p");
    tree.append_child(html, p);
    (engine, tree, p)
}

fn families(engine: &mut StyleEngine, tree: &DomTree, element: NodeId) -> Vec<String> {
    let style = engine.compute_style(tree, element, None).expect("style");
    style.font_list().families().map(str::to_string).collect()
}

#[test]
fn test_generic_families_map_through_config() {
    let (mut engine, tree, p) = page("p { font-family: monospace }");
    assert_eq!(families(&mut engine, &tree, p), ["Courier New", "Times New Roman", "Noto Color Emoji"]);
}

#[test]
fn test_configured_generic_family_is_used() {
    let mut config = StyleConfig::default();
    let _ = config.generic_families.insert("serif".to_string(), "Georgia".to_string());
    config.system_fonts.push(wombat_style::config::SystemFontFace::regular("Georgia"));
    let mut engine = StyleEngine::new(config);
    let _ = engine.add_sheet(Arc::new(Stylesheet::parse("p { font-family: serif }", None)), None);
    let (_, tree, p) = page("");
    let style = engine.compute_style(&tree, p, None).expect("style");
    let primary = style.font_list().primary().expect("primary font");
    assert_eq!(primary.family, "Georgia");
    assert_eq!(primary.source, FontSource::System);
}

#[test]
fn test_unknown_family_is_skipped() {
    let (mut engine, tree, p) = page("p { font-family: \"No Such Font\", sans-serif }");
    let list = families(&mut engine, &tree, p);
    assert_eq!(list.first().map(String::as_str), Some("Arial"));
    assert!(!list.iter().any(|family| family == "No Such Font"));
}

#[test]
fn test_bold_request_picks_bold_face() {
    let (mut engine, tree, p) = page("p { font-family: Arial; font-weight: bold }");
    let style = engine.compute_style(&tree, p, None).expect("style");
    assert_eq!(style.font_list().primary().map(|font| font.weight), Some(700));
}

#[test]
fn test_undecodable_data_url_falls_back() {
    let (mut engine, tree, p) = page(
        "@font-face { font-family: Broken; src: url(data:font/ttf;base64,AAAA) } \
         p { font-family: Broken, serif }",
    );
    assert_eq!(families(&mut engine, &tree, p)[0], "Times New Roman");
    let loaders = engine.fonts().loaders();
    assert_eq!(loaders.len(), 1);
    assert!(matches!(loaders[0].state(), FontLoadState::Failed));
}

#[test]
fn test_web_font_is_fetched_through_the_fetcher() {
    let fetcher = RecordingFetcher::default();
    let (mut engine, mut tree, p) = page(
        "@font-face { font-family: Web; src: url(https://fonts.example/a.woff), url(https://fonts.example/b.ttf) } \
         p { font-family: Web, serif }",
    );
    engine.set_resource_fetcher(Some(Box::new(fetcher.clone())));

    // Not ready yet: the family is skipped.
    assert_eq!(families(&mut engine, &tree, p)[0], "Times New Roman");
    let first = fetcher.requests.borrow()[0].clone();
    assert_eq!(first.url, "https://fonts.example/a.woff");
    assert_eq!(first.destination, Destination::Font);

    // A stale token is ignored.
    let stale = CompletedFetch {
        token: first.token + 100,
        result: Err(FetchError::Status(404)),
    };
    assert!(!engine.did_complete_fetch(&mut tree, stale));

    // A failure moves on to the next source.
    let failed = CompletedFetch {
        token: first.token,
        result: Err(FetchError::Network("connection reset".to_string())),
    };
    assert!(!engine.did_complete_fetch(&mut tree, failed));
    let requests = fetcher.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].url, "https://fonts.example/b.ttf");
    assert!(engine.fonts().loaders()[0].is_loading());
}

#[test]
fn test_replacing_the_fetcher_cancels_outstanding_loads() {
    let fetcher = RecordingFetcher::default();
    let (mut engine, tree, p) = page("@font-face { font-family: Web; src: url(https://fonts.example/a.woff) }");
    engine.set_resource_fetcher(Some(Box::new(fetcher.clone())));
    let _ = engine.compute_style(&tree, p, None);
    let token = fetcher.requests.borrow()[0].token;

    engine.set_resource_fetcher(None);
    assert_eq!(*fetcher.cancelled.borrow(), [token]);
    assert!(matches!(engine.fonts().loaders()[0].state(), FontLoadState::Idle));

    // The cancelled source is retried on the next fetcher.
    let replacement = RecordingFetcher::default();
    engine.set_resource_fetcher(Some(Box::new(replacement.clone())));
    assert_eq!(replacement.requests.borrow()[0].url, "https://fonts.example/a.woff");
}
