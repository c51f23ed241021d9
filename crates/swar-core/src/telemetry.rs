//! Tracing setup for the `swar` binary.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! because the global subscriber can only be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events follow the requested level; everything else logs
/// warnings only.
pub const LOG_TARGETS: [&str; 2] = ["swar_core", "swar"];

/// Filter directive used when `RUST_LOG` is unset, e.g.
/// `warn,swar_core=debug,swar=debug`.
pub fn default_directive(level: Level) -> String {
    let mut directive = String::from("warn");
    for target in LOG_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive.to_lowercase()
}

/// Install the global subscriber: `RUST_LOG` when set, otherwise
/// [`default_directive`] for `level`. Logs go to stderr so they never mix
/// with command output on stdout; `json` switches to one JSON object per line.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let layer = fmt::layer().with_target(json).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if installed.is_ok() {
        tracing::debug!(%level, json, "swar tracing initialised");
    }
}
