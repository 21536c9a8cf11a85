//! Basic scan example demonstrating the coordinator round trip.
//!
//! This example shows how to:
//! - Build a ScanCoordinator against the scripted mock backend
//! - Log in and mirror the website list
//! - Start a scan and watch results arrive through background polling
//!
//! Run with: cargo run --example basic_scan

use sentinel_client::backends::{MockApi, MockTick};
use sentinel_client::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Sentinel Client Basic Scan Example ===\n");

    // Create a mock backend with one monitored website and a scripted scan
    let api = Arc::new(MockApi::new());
    let site = api.seed_website("https://example.com");

    let mut scanned = site.clone();
    scanned.status = WebsiteStatus::Scanned;
    scanned.scan_results = Some(vec![
        CheckResult::new("HSTS", CheckStatus::Present, "max-age=31536000"),
        CheckResult::new("CSP", CheckStatus::Missing, "header absent"),
    ]);
    api.push_script(vec![
        MockTick::Progress("Analyzing headers...".into()),
        MockTick::Progress("Analyzing SSL/TLS...".into()),
        MockTick::Succeed(scanned),
    ]);

    // Build the coordinator with a fast poll cadence for the demo
    let coordinator = Arc::new(
        ScanCoordinator::builder()
            .with_arc_api(api)
            .with_config(CoordinatorConfig::new().with_poll_interval(Duration::from_millis(100)))
            .build()?,
    );

    // Log in; the website list is mirrored as part of the call
    coordinator
        .login(&Credentials::new("user@example.com", "secret"))
        .await?;
    println!("Monitoring {} website(s)", coordinator.websites().len());

    // Start the scan; this returns as soon as the backend accepts it
    coordinator.start_scan(&site.id).await?;
    println!("Scan started, polling in the background...\n");

    // Wait for the background poller to drive the scan to completion
    while coordinator.is_scanning(&site.id) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // The mirror now holds the merged results
    let finished = coordinator
        .website(&site.id)
        .ok_or("website missing from the mirror")?;

    println!("=== Scan Results ===");
    println!("Website: {}", finished.url);
    println!("Status: {}", finished.status);
    if let Some(results) = &finished.scan_results {
        for check in results {
            println!("  {:?} {} - {}", check.status, check.name, check.value);
        }
    }
    if let Some(at) = finished.last_scanned_at {
        println!("Last scanned: {at}");
    }

    coordinator.teardown();
    Ok(())
}
