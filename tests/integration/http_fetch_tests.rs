//! HTTP fetcher integration tests.
//!
//! Runs a local asset host on an ephemeral port and exercises
//! `HttpFetcher` and the full service over real HTTP.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;

use deck_streamer::error::FetchError;
use deck_streamer::{
    AssetFetcher, DeckService, HttpFetcher, ResolveRequest, SlideTemplate, SuffixOrder,
};

use super::test_utils::{create_slide_png, is_valid_jpeg};

type Assets = Arc<HashMap<String, Bytes>>;

async fn serve_asset(State(assets): State<Assets>, Path(name): Path<String>) -> impl IntoResponse {
    match assets.get(&name) {
        Some(data) => (StatusCode::OK, data.clone()),
        None => (StatusCode::NOT_FOUND, Bytes::new()),
    }
}

async fn slow_asset() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Start an asset host and return its base URL.
async fn start_asset_host(files: &[(&str, Vec<u8>)]) -> String {
    let assets: Assets = Arc::new(
        files
            .iter()
            .map(|(name, data)| (name.to_string(), Bytes::from(data.clone())))
            .collect(),
    );

    let app = Router::new()
        .route("/deck/{name}", get(serve_asset))
        .route("/slow.png", get(slow_asset))
        .route("/empty.png", get(no_content))
        .with_state(assets);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_check_and_fetch() {
    let base = start_asset_host(&[("s.001.png", b"hello".to_vec())]).await;
    let fetcher = HttpFetcher::new().unwrap();

    let present = format!("{}/deck/s.001.png", base);
    let missing = format!("{}/deck/s.002.png", base);

    assert!(fetcher.check(&present).await.is_ok());
    assert_eq!(fetcher.fetch(&present).await.unwrap(), Bytes::from_static(b"hello"));

    match fetcher.check(&missing).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {:?}", other),
    }
    assert!(fetcher.fetch(&missing).await.is_err());
}

#[tokio::test]
async fn test_check_requires_200() {
    let base = start_asset_host(&[]).await;
    let fetcher = HttpFetcher::new().unwrap();
    let url = format!("{}/empty.png", base);

    // 204 is a success for fetch, but not an existing asset
    assert!(matches!(
        fetcher.check(&url).await,
        Err(FetchError::Status { status: 204, .. })
    ));
    assert!(fetcher.fetch(&url).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout() {
    let base = start_asset_host(&[]).await;
    let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();

    let result = fetcher.check(&format!("{}/slow.png", base)).await;
    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_service_over_http() {
    let png = create_slide_png();
    let base = start_asset_host(&[
        ("F25_Ch01.001.png", png.clone()),
        ("F25_Ch01.002a.png", png.clone()),
        ("F25_Ch01.004.png", png),
    ])
    .await;

    let template = SlideTemplate::new(&format!("{}/deck/", base), "F25_Ch01.", ".png").unwrap();
    let order = SuffixOrder::parse(&["a", ""]).unwrap();
    let request = ResolveRequest::new(template, 1, 5, order).unwrap();
    let service = DeckService::new(Arc::new(HttpFetcher::new().unwrap()), request);

    let deck = service.deck().await.unwrap();
    assert_eq!(
        deck.names(),
        vec!["F25_Ch01.001.png", "F25_Ch01.002a.png", "F25_Ch01.004.png"]
    );
    assert_eq!(deck.get(0).unwrap().url, format!("{}/deck/F25_Ch01.001.png", base));

    let thumbnail = service.thumbnail_at(1, Some(200)).await.unwrap();
    assert!(!thumbnail.cache_hit);
    assert!(is_valid_jpeg(&thumbnail.data));

    let img = image::load_from_memory(&thumbnail.data).unwrap();
    assert_eq!((img.width(), img.height()), (200, 150));
}
