// SPDX-License-Identifier: MIT OR Apache-2.0
//! `StageCue` demo player.
//!
//! Plays the built-in whiteboard timeline against a simulated recorder:
//!
//! ```text
//! stagecue_player [config.ron]
//! ```
//!
//! Log verbosity follows `RUST_LOG` on top of the defaults below.

mod config;
mod demo;
mod player;
mod recorder;

use config::PlayerConfig;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_DIRECTIVES: [&str; 3] = [
    "stagecue_player=debug",
    "stagecue_timeline=info",
    "stagecue_recorder=info",
];

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in LOG_DIRECTIVES {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive `{directive}`: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StageCue player v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => match PlayerConfig::load(Path::new(&path)) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PlayerConfig::default(),
    };

    match player::run(&config) {
        Ok(summary) if summary.failures > 0 => {
            tracing::warn!("Finished with {} executor failures", summary.failures);
        }
        Ok(_) => tracing::info!("Done"),
        Err(e) => {
            tracing::error!("Player failed: {}", e);
            std::process::exit(1);
        }
    }
}
