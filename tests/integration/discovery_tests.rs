//! Discovery integration tests.
//!
//! Tests verify:
//! - Suffix priority and gap skipping across a whole range
//! - Memoization of existence probes and resolved decks
//! - Expiry and refresh behaviour

use std::sync::Arc;
use std::time::Duration;

use deck_streamer::{
    DeckOptions, DeckService, ExistenceProber, ResolveError, SlideResolver,
};

use super::test_utils::{host_with_slides, request, service, slide_name, MockAssetHost};

#[tokio::test]
async fn test_first_matching_suffix_wins() {
    // Slot 2 exists in both variants; slot 3 only bare
    let host = host_with_slides(&[(1, "a"), (2, "a"), (2, ""), (3, "")]);
    let service = service(&host, request(1, 3, &["a", ""]));

    let deck = service.deck().await.unwrap();
    assert_eq!(
        deck.names(),
        vec!["F25_Ch01.001a.png", "F25_Ch01.002a.png", "F25_Ch01.003.png"]
    );
    assert_eq!(deck.get(1).unwrap().slot, 2);
}

#[tokio::test]
async fn test_bare_first_priority() {
    let host = host_with_slides(&[(1, "a"), (1, "")]);
    let service = service(&host, request(1, 1, &["", "a"]));

    let deck = service.deck().await.unwrap();
    assert_eq!(deck.names(), vec!["F25_Ch01.001.png"]);
}

#[tokio::test]
async fn test_dense_positions_over_sparse_slots() {
    let host = host_with_slides(&[(3, ""), (17, ""), (40, "")]);
    let service = service(&host, request(1, 40, &[""]));

    let deck = service.deck().await.unwrap();
    let slides = deck.slides();
    assert_eq!(slides.len(), 3);
    for (i, slide) in slides.iter().enumerate() {
        assert_eq!(slide.position, i);
    }
    let slots: Vec<u32> = slides.iter().map(|s| s.slot).collect();
    assert_eq!(slots, vec![3, 17, 40]);
    assert_eq!(
        slides[2].url,
        "https://assets.example.com/deck/F25_Ch01.040.png"
    );
}

#[tokio::test]
async fn test_empty_range_reports_pattern() {
    let host = MockAssetHost::new();
    let service = service(&host, request(5, 9, &["a", ""]));

    match service.deck().await {
        Err(ResolveError::EmptyResultSet { pattern, start, end }) => {
            assert!(pattern.contains("F25_Ch01.###.png"));
            assert_eq!((start, end), (5, 9));
        }
        other => panic!("expected EmptyResultSet, got {:?}", other),
    }

    // Every candidate was probed exactly once
    assert_eq!(host.check_count(), 10);
}

#[tokio::test]
async fn test_resolution_is_memoized() {
    let host = host_with_slides(&[(1, ""), (2, "")]);
    let service = service(&host, request(1, 3, &["a", ""]));

    let first = service.deck().await.unwrap();
    let probes = host.check_count();
    assert_eq!(probes, 6);

    let second = service.deck().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(host.check_count(), probes);
}

#[tokio::test]
async fn test_refresh_reuses_fresh_probes() {
    let host = host_with_slides(&[(1, "")]);
    let service = service(&host, request(1, 2, &[""]));

    assert_eq!(service.deck().await.unwrap().len(), 1);
    let probes = host.check_count();

    // A new upload is not visible while the cached "missing" answer is fresh
    host.put(&slide_name(2, ""), super::test_utils::create_slide_png());
    let deck = service.refresh().await.unwrap();
    assert_eq!(deck.len(), 1);
    assert_eq!(host.check_count(), probes);

    // Dropping the probe answer makes it visible
    let url = service.request().template.candidate(2, deck_streamer::SuffixVariant::Bare).url;
    service.resolver().prober().invalidate(&url).await;
    let deck = service.refresh().await.unwrap();
    assert_eq!(deck.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_probe_results_expire() {
    let host = host_with_slides(&[(1, "")]);
    let options = DeckOptions {
        cache_ttl: Duration::from_secs(60),
        ..DeckOptions::default()
    };
    let service = DeckService::with_options(Arc::new(host.clone()), request(1, 2, &[""]), options);

    assert_eq!(service.deck().await.unwrap().len(), 1);

    host.put(&slide_name(2, ""), super::test_utils::create_slide_png());
    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(service.deck().await.unwrap().len(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(service.deck().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_prober_treats_errors_as_missing() {
    let host = host_with_slides(&[(1, "")]);
    let prober = ExistenceProber::new(Arc::new(host.clone()));

    let present = "https://assets.example.com/deck/F25_Ch01.001.png";
    let missing = "https://assets.example.com/deck/F25_Ch01.002.png";

    assert!(prober.exists(present).await);
    assert!(!prober.exists(missing).await);
    assert!(!prober.exists(missing).await);

    assert_eq!(host.check_count(), 2);
    assert_eq!(prober.cached_count().await, 2);
}

#[tokio::test]
async fn test_resolvers_share_a_prober() {
    let host = host_with_slides(&[(1, ""), (2, "")]);
    let prober = Arc::new(ExistenceProber::new(Arc::new(host.clone())));

    let wide = SlideResolver::new(Arc::clone(&prober));
    let narrow = SlideResolver::new(prober);

    assert_eq!(wide.resolve(&request(1, 4, &[""])).await.unwrap().len(), 2);
    let probes = host.check_count();

    // Overlapping range hits only cached probes
    assert_eq!(narrow.resolve(&request(1, 2, &[""])).await.unwrap().len(), 2);
    assert_eq!(host.check_count(), probes);
}
