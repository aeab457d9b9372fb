// Examples are allowed to use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Tripwire Circuit Breaker Example
//!
//! Guards a flaky dependency and walks the breaker through a full
//! Closed → Open → HalfOpen → Closed cycle, printing every transition from a
//! feed subscriber.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example breaker
//!
//! # Use a TOML settings file instead of the built-in config
//! cargo run --example breaker -- --config tripwire.toml
//!
//! # More log detail
//! RUST_LOG=debug cargo run --example breaker
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tripwire::prelude::*;

/// Error returned by the simulated dependency.
#[derive(Debug)]
struct Unavailable;

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("inventory service unavailable")
    }
}

impl std::error::Error for Unavailable {}

/// A dependency that can be switched between healthy and down.
struct FlakyInventory {
    healthy: AtomicBool,
    hits: AtomicU64,
}

impl FlakyInventory {
    fn new() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            hits: AtomicU64::new(0),
        }
    }

    async fn stock(&self, sku: u32) -> Result<u32, Unavailable> {
        self.hits.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(5)).await;
        if self.healthy.load(Ordering::Relaxed) {
            Ok(sku % 17)
        } else {
            Err(Unavailable)
        }
    }
}

async fn drive(breaker: &CircuitBreaker, inventory: &FlakyInventory, calls: u32) {
    let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
    for sku in 0..calls {
        match breaker.call_async(&ctx, || inventory.stock(sku)).await {
            Ok(n) => println!("  sku {sku:>3}: {n} in stock      [{}]", breaker.state()),
            Err(BreakerError::Operation(e)) => {
                println!("  sku {sku:>3}: {e}  [{}]", breaker.state());
            }
            Err(e) => println!("  sku {sku:>3}: rejected ({e})  [{}]", breaker.state()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Tripwire Circuit Breaker Example");
        println!();
        println!("Usage: breaker [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <FILE>  Load breaker settings from a TOML file");
        println!("  --help           Show this help");
        return Ok(());
    }

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).ok_or("--config needs a file path")?;
            BreakerSettings::load(path)?.into_config()
        }
        None => Config::new()
            .with_name("inventory")
            .with_max_requests(2)
            .with_timeout(Duration::from_millis(300))
            .with_ready_to_trip(|m: &Metrics| m.consecutive_failures >= 3),
    };

    let feed = TransitionFeed::default();
    let log = TransitionLog::default();
    let mut events = feed.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!(">> {}: {}", event.breaker, event.transition);
        }
    });

    let breaker = Arc::new(CircuitBreaker::new(
        config.with_hook(compose(vec![feed.hook(), log.hook()])),
    ));
    let inventory = FlakyInventory::new();

    println!("Phase 1: dependency healthy");
    drive(&breaker, &inventory, 3).await;

    println!("Phase 2: dependency down");
    inventory.healthy.store(false, Ordering::Relaxed);
    drive(&breaker, &inventory, 6).await;

    println!("Phase 3: dependency back, waiting out the timeout");
    inventory.healthy.store(true, Ordering::Relaxed);
    tokio::time::sleep(breaker.timeout() + Duration::from_millis(50)).await;
    drive(&breaker, &inventory, 3).await;

    println!();
    println!("Dependency hits: {}", inventory.hits.load(Ordering::Relaxed));
    println!("Transitions:     {}", log.len());
    println!("Report:          {}", BreakerReport::capture(&breaker).to_json()?);

    drop(breaker);
    drop(feed);
    printer.await?;
    Ok(())
}
