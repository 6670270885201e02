//! Deck Streamer - serves numbered slide decks from a remote image host.
//!
//! This binary starts the HTTP server or runs a one-off resolution pass.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deck_streamer::{
    config::{Cli, Command, DeckArgs, ResolveConfig, ServeConfig},
    create_router, DeckService, HttpFetcher, RouterConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Resolve(config) => run_resolve(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let service = match build_service(&config.deck, config.cache_sessions) {
        Ok(service) => service,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_banner();

    let request = service.request();
    info!("Configuration:");
    info!("  Pattern: {}", request.template.pattern());
    info!(
        "  Slots: {}-{}, suffixes: {}",
        request.start_slot, request.end_slot, request.suffix_order
    );
    info!(
        "  Probes: timeout {}s, concurrency {}, TTL {}s",
        config.deck.probe_timeout, config.deck.probe_concurrency, config.deck.cache_ttl
    );
    info!(
        "  Thumbnails: {}px, quality {}, {}MB cache",
        config.deck.thumbnail_width,
        config.deck.thumbnail_quality,
        config.deck.cache_thumbnails / (1024 * 1024)
    );

    // Warm the deck cache; an empty deck is reported but not fatal since the
    // host may be populated later
    info!("");
    info!("Resolving slides...");
    match service.deck().await {
        Ok(deck) => info!("  Found {} slide(s)", deck.len()),
        Err(e) => {
            warn!("  {}", e);
            warn!("  /slides will answer 404 until slides appear");
        }
    }

    let router = create_router(service, build_router_config(&config));
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/slides", addr);
    info!("    curl -o 1.jpg http://{}/thumbnails/1.jpg", addr);
    info!("    curl -X POST http://{}/sessions", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("██████╗ ███████╗ ██████╗██╗  ██╗");
    info!("██╔══██╗██╔════╝██╔════╝██║ ██╔╝");
    info!("██║  ██║█████╗  ██║     █████╔╝ ");
    info!("██║  ██║██╔══╝  ██║     ██╔═██╗ ");
    info!("██████╔╝███████╗╚██████╗██║  ██╗");
    info!("╚═════╝ ╚══════╝ ╚═════╝╚═╝  ╚═╝");
    info!("");
    info!("         deck-streamer v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "deck_streamer=debug,tower_http=debug"
    } else {
        "deck_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

fn build_service(deck: &DeckArgs, max_sessions: usize) -> Result<DeckService<HttpFetcher>, String> {
    let request = deck.resolve_request()?;
    let fetcher = HttpFetcher::with_timeout(deck.probe_timeout()).map_err(|e| e.to_string())?;
    Ok(DeckService::with_options(
        Arc::new(fetcher),
        request,
        deck.deck_options(max_sessions),
    ))
}

// =============================================================================
// Resolve Command
// =============================================================================

async fn run_resolve(config: ResolveConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let service = match build_service(&config.deck, 1) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let deck = match service.deck().await {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        match serde_json::to_string_pretty(deck.as_ref()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        let request = service.request();
        println!("Deck: {}", request.template.pattern());
        println!("═════════════════════════════════");
        for slide in deck.slides() {
            println!("  {:>3}  {}", slide.position + 1, slide.display_name);
        }
        println!();
        println!(
            "✓ {} of {} slot(s) resolved",
            deck.len(),
            request.slot_count()
        );
    }

    if config.thumbnails {
        let session = match service.new_session().await {
            Ok(session) => session,
            Err(e) => {
                eprintln!("✗ {}", e);
                return ExitCode::FAILURE;
            }
        };

        println!();
        println!("Thumbnails (page 1 of {}):", session.navigation().page_count());
        println!("─────────────────");

        let mut failures = 0;
        for thumbnail in session.page_thumbnails().await {
            let name = deck
                .get(thumbnail.position)
                .map(|s| s.display_name.as_str())
                .unwrap_or("?");
            match thumbnail.result {
                Ok(data) => println!("  ✓ {} ({} bytes)", name, data.len()),
                Err(e) => {
                    failures += 1;
                    println!("  ✗ {}: {}", name, e);
                }
            }
        }

        if failures > 0 {
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
