//! Tests for the fetch collaborator that don't touch the network.

use wombat_common::fetch::{
    DataUrl, Destination, FetchError, FetchRequest, HttpFetcher, RequestMode, ResourceFetcher,
};

#[test]
fn test_data_url_base64() {
    let url = DataUrl::parse("data:font/ttf;base64,AAEAAA==").unwrap();
    assert_eq!(url.mime_type, "font/ttf");
    assert!(url.base64);
    assert_eq!(url.decode().unwrap(), vec![0, 1, 0, 0]);
}

#[test]
fn test_data_url_percent_encoded() {
    let url = DataUrl::parse("data:,a%20b").unwrap();
    assert_eq!(url.mime_type, "");
    assert_eq!(url.decode().unwrap(), b"a b".to_vec());
}

#[test]
fn test_data_url_missing_comma() {
    assert!(matches!(
        DataUrl::parse("data:font/ttf;base64"),
        Err(FetchError::InvalidDataUrl(_))
    ));
}

#[test]
fn test_http_fetcher_queues_data_url_results() {
    let fetcher = HttpFetcher::new();
    fetcher.fetch(FetchRequest {
        token: 7,
        url: "data:font/otf;base64,T1RUTw==".to_string(),
        destination: Destination::Font,
        mode: RequestMode::Cors,
    });
    let completed = fetcher.drain_completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].token, 7);
    let response = completed[0].result.as_ref().unwrap();
    assert_eq!(response.mime_type.as_deref(), Some("font/otf"));
    assert_eq!(response.body, b"OTTO".to_vec());
    assert!(fetcher.drain_completed().is_empty());
}
