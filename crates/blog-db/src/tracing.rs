//! Subscriber setup for processes that use the store without installing one
//! of their own. [`crate::connect`] calls [`init_tracing`] before opening the
//! pool.
//!
//! The default filter keeps `blog_db` spans one level more verbose than the
//! rest of the process and holds sqlx's per-statement logs at `warn`.
//! `RUST_LOG`, when set, replaces it entirely.

use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

const DEVELOPMENT_DIRECTIVES: &str = "info,blog_db=debug,sqlx=warn";
const PRODUCTION_DIRECTIVES: &str = "warn,blog_db=info,sqlx=warn";

/// Filter directives used when `RUST_LOG` is unset.
pub const fn default_directives(env: Environment) -> &'static str {
    match env {
        Environment::Development => DEVELOPMENT_DIRECTIVES,
        Environment::Production => PRODUCTION_DIRECTIVES,
    }
}

fn env_filter(env: Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(env)))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn output_layer(env: Environment) -> BoxedLayer {
    match env {
        // Compact lines with source location for a terminal
        Environment::Development => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .compact()
            .boxed(),
        // One JSON object per event, span fields flattened in
        Environment::Production => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .boxed(),
    }
}

/// Install the global subscriber for `env`.
///
/// Returns `false` when a subscriber was already in place; the existing one
/// is left alone.
pub fn init_tracing(env: Environment) -> bool {
    let installed = tracing_subscriber::registry()
        .with(output_layer(env).with_filter(env_filter(env)))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(?env, "Tracing subscriber installed");
    }
    installed
}
