//! Startup banner and URL display

use std::path::Path;

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;

/// Print the startup banner with the API URL, topics and database path
pub fn print_banner(config: &AppConfig, db_path: &Path) {
    let host = config.server.host.as_str();
    let port = config.server.port;

    // Use localhost for display when binding to all interfaces
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    // Label width: "Merge policy:" plus padding
    const W: usize = 15;

    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api",
        "API:", display_host, port
    );
    if config.server.static_dir.is_some() {
        println!(
            "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/",
            "Dashboard:", display_host, port
        );
    }
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/publish/<topic>",
        "Publish:", display_host, port
    );

    for (label, topic) in [
        ("Temperature:", &config.ingestion.topics.temperature),
        ("Humidity:", &config.ingestion.topics.humidity),
        ("Air quality:", &config.ingestion.topics.air_quality),
        ("Status:", &config.ingestion.topics.status),
    ] {
        println!("  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}", label, topic);
    }

    println!(
        "  \x1b[90m➜  {:<W$} {}\x1b[0m",
        "Merge policy:",
        config.ingestion.merge_policy.as_str()
    );
    if let Some(days) = config.retention.max_age_days {
        println!("  \x1b[90m➜  {:<W$} {} days\x1b[0m", "Retention:", days);
    }
    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Database:", db_path.display());

    println!();
}
