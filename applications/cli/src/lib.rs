//! Cadence CLI Library
//!
//! Configuration, logging setup and service bootstrap for the `cadence`
//! binary. Exposed as a library so the bootstrap can be tested.

pub mod config;
pub mod error;
pub mod services;

pub use config::CadenceConfig;
pub use error::{CliError, Result};
pub use services::{Services, Stores};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
