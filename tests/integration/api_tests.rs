//! API integration tests.
//!
//! Tests verify:
//! - Slide listing and the empty-deck error
//! - Thumbnail retrieval, cache headers and error codes
//! - The session navigation flow

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use super::test_utils::{
    create_png, host_with_slides, is_valid_jpeg, request, router, slide_name, MockAssetHost,
};

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(router, method, uri).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Open a session and return its id.
async fn open_session(router: &Router) -> String {
    let (status, json) = send_json(router, "POST", "/sessions").await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health & Slides
// =============================================================================

#[tokio::test]
async fn test_health() {
    let router = router(&MockAssetHost::new(), request(1, 3, &[""]));

    let (status, json) = send_json(&router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_slides_listing_skips_gaps() {
    let host = host_with_slides(&[(1, ""), (2, "a"), (4, "")]);
    let router = router(&host, request(1, 5, &["a", ""]));

    let (status, json) = send_json(&router, "GET", "/slides").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);

    let slides = json["slides"].as_array().unwrap();
    let names: Vec<&str> = slides
        .iter()
        .map(|s| s["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["F25_Ch01.001.png", "F25_Ch01.002a.png", "F25_Ch01.004.png"]
    );

    let positions: Vec<u64> = slides
        .iter()
        .map(|s| s["position"].as_u64().unwrap())
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_slides_empty_deck() {
    let router = router(&MockAssetHost::new(), request(1, 5, &["a", ""]));

    let (status, json) = send_json(&router, "GET", "/slides").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "no_slides");
    assert_eq!(json["status"], 404);

    let (status, json) = send_json(&router, "POST", "/sessions").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "no_slides");
}

// =============================================================================
// Thumbnails
// =============================================================================

#[tokio::test]
async fn test_thumbnail_success_and_cache_header() {
    let host = host_with_slides(&[(1, ""), (2, "")]);
    let router = router(&host, request(1, 2, &[""]));

    let request = Request::builder()
        .uri("/thumbnails/2.jpg")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
    assert!(response.headers().contains_key("cache-control"));
    assert_eq!(
        response.headers().get("x-thumbnail-cache-hit").unwrap(),
        "false"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_jpeg(&body));

    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (280, 210));

    // Second request is served from cache
    let request = Request::builder()
        .uri("/thumbnails/2")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-thumbnail-cache-hit").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_thumbnail_width_parameter() {
    let host = host_with_slides(&[(1, "")]);
    let router = router(&host, request(1, 1, &[""]));

    let (status, body) = send(&router, "GET", "/thumbnails/1.jpg?width=400").await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (400, 300));

    // Wider than the source: kept at source size
    let (status, body) = send(&router, "GET", "/thumbnails/1.jpg?width=2000").await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (800, 600));
}

#[tokio::test]
async fn test_thumbnail_bad_requests() {
    let host = host_with_slides(&[(1, "")]);
    let router = router(&host, request(1, 1, &[""]));

    let (status, json) = send_json(&router, "GET", "/thumbnails/abc.jpg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_path");

    let (status, _) = send_json(&router, "GET", "/thumbnails/0.jpg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send_json(&router, "GET", "/thumbnails/1.jpg?width=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_width");

    let (status, json) = send_json(&router, "GET", "/thumbnails/9.jpg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_thumbnail_undecodable_asset() {
    let host = MockAssetHost::new().with_file(&slide_name(1, ""), b"not an image".to_vec());
    let router = router(&host, request(1, 1, &[""]));

    let (status, json) = send_json(&router, "GET", "/thumbnails/1.jpg").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "decode_error");
}

#[tokio::test]
async fn test_thumbnail_asset_vanished() {
    let host = host_with_slides(&[(1, "")]);
    let router = router(&host, request(1, 1, &[""]));

    let (status, _) = send_json(&router, "GET", "/slides").await;
    assert_eq!(status, StatusCode::OK);

    // Existence is memoized, so the deck still lists the slide
    host.remove(&slide_name(1, ""));
    let (status, json) = send_json(&router, "GET", "/thumbnails/1.jpg").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "fetch_error");
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_session_navigation_wraps() {
    let host = host_with_slides(&[(1, ""), (2, ""), (3, "")]);
    let router = router(&host, request(1, 3, &[""]));
    let id = open_session(&router).await;

    let (status, json) = send_json(&router, "GET", &format!("/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_number"], 1);
    assert_eq!(json["slide_count"], 3);
    assert_eq!(json["caption"], "Slide 1 / 3 · F25_Ch01.001.png");

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/previous", id)).await;
    assert_eq!(json["applied"], true);
    assert_eq!(json["session"]["current_number"], 3);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/next", id)).await;
    assert_eq!(json["session"]["current_number"], 1);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/next", id)).await;
    assert_eq!(json["session"]["current_number"], 2);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/first", id)).await;
    assert_eq!(json["session"]["current_number"], 1);
}

#[tokio::test]
async fn test_session_jump_and_select() {
    let host = host_with_slides(&[(1, ""), (2, ""), (3, "")]);
    let router = router(&host, request(1, 3, &[""]));
    let id = open_session(&router).await;

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/jump/3", id)).await;
    assert_eq!(json["applied"], true);
    assert_eq!(json["session"]["current_number"], 3);

    // Out of range is ignored
    let (status, json) = send_json(&router, "POST", &format!("/sessions/{}/jump/4", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["applied"], false);
    assert_eq!(json["session"]["current_number"], 3);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/jump/0", id)).await;
    assert_eq!(json["applied"], false);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/select/1", id)).await;
    assert_eq!(json["applied"], true);
    assert_eq!(json["session"]["current_number"], 2);
}

#[tokio::test]
async fn test_session_fit_mode() {
    let host = host_with_slides(&[(1, "")]);
    let router = router(&host, request(1, 1, &[""]));
    let id = open_session(&router).await;

    let (_, json) = send_json(&router, "GET", &format!("/sessions/{}", id)).await;
    assert_eq!(json["fit_mode"], "fit_height");
    assert_eq!(json["fit_param"], 88);

    // Clamped into 60..=95
    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/fit?value=40", id)).await;
    assert_eq!(json["session"]["fit_param"], 60);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/fit/toggle", id)).await;
    assert_eq!(json["session"]["fit_mode"], "fixed_width");
    assert_eq!(json["session"]["fit_param"], 1000);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/fit?value=5000", id)).await;
    assert_eq!(json["session"]["fit_param"], 1400);

    // Each mode remembers its own parameter
    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/fit/toggle", id)).await;
    assert_eq!(json["session"]["fit_mode"], "fit_height");
    assert_eq!(json["session"]["fit_param"], 60);
}

#[tokio::test]
async fn test_session_pages_and_thumbnails() {
    let slides: Vec<(u32, &str)> = (1..=14).map(|slot| (slot, "")).collect();
    let host = host_with_slides(&slides);
    host.put(&slide_name(13, ""), b"broken".to_vec());
    let router = router(&host, request(1, 14, &[""]));
    let id = open_session(&router).await;

    let (_, json) = send_json(&router, "GET", &format!("/sessions/{}", id)).await;
    assert_eq!(json["page_count"], 2);
    assert_eq!(json["page_slides"].as_array().unwrap().len(), 12);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/page/3", id)).await;
    assert_eq!(json["applied"], false);
    assert_eq!(json["session"]["thumbnail_page"], 1);

    let (_, json) = send_json(&router, "POST", &format!("/sessions/{}/page/2", id)).await;
    assert_eq!(json["applied"], true);
    assert_eq!(json["session"]["thumbnail_page"], 2);

    let (status, json) = send_json(&router, "GET", &format!("/sessions/{}/thumbnails", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], 2);

    let thumbnails = json["thumbnails"].as_array().unwrap();
    assert_eq!(thumbnails.len(), 2);
    assert_eq!(thumbnails[0]["position"], 12);
    assert_eq!(thumbnails[0]["path"], "/thumbnails/13.jpg");
    assert!(thumbnails[0]["error"].is_string());
    assert!(thumbnails[1]["bytes"].as_u64().unwrap() > 0);
    assert!(thumbnails[1].get("error").is_none());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let host = host_with_slides(&[(1, ""), (2, "")]);
    let router = router(&host, request(1, 2, &[""]));

    let first = open_session(&router).await;
    let second = open_session(&router).await;
    assert_ne!(first, second);

    send_json(&router, "POST", &format!("/sessions/{}/next", first)).await;

    let (_, json) = send_json(&router, "GET", &format!("/sessions/{}", first)).await;
    assert_eq!(json["current_number"], 2);
    let (_, json) = send_json(&router, "GET", &format!("/sessions/{}", second)).await;
    assert_eq!(json["current_number"], 1);
}

#[tokio::test]
async fn test_unknown_session() {
    let host = host_with_slides(&[(1, "")]);
    let router = router(&host, request(1, 1, &[""]));

    let (status, json) = send_json(&router, "GET", "/sessions/00000000000000ff").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "session_not_found");

    let (status, _) = send_json(&router, "POST", "/sessions/not-hex/next").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transparent_slide_thumbnail() {
    let host = MockAssetHost::new().with_file(&slide_name(1, ""), create_png(100, 50, [0, 0, 0, 0]));
    let router = router(&host, request(1, 1, &[""]));

    let (status, body) = send(&router, "GET", "/thumbnails/1.jpg").await;
    assert_eq!(status, StatusCode::OK);

    // Fully transparent pixels come out white
    let img = image::load_from_memory(&body).unwrap().to_rgb8();
    assert_eq!((img.width(), img.height()), (100, 50));
    let pixel = img.get_pixel(50, 25);
    assert!(pixel.0.iter().all(|&c| c > 245), "got {:?}", pixel);
}
