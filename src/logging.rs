//! Subscriber setup for the host process.
//!
//! The library crates only emit through the `log` facade; installing the
//! subscriber here also installs the `log` → `tracing` forwarder.

use crate::config::BridgeConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns `false` when one was already
/// installed (by an earlier bridge or by the host), which is not an error.
pub fn init(config: &BridgeConfig) -> bool {
    let (filter, bad_directive) = match EnvFilter::try_from_default_env() {
        Ok(from_env) => (from_env, None),
        Err(_) => match EnvFilter::try_new(&config.log_filter) {
            Ok(filter) => (filter, None),
            Err(e) => (EnvFilter::new("info"), Some(e)),
        },
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = if config.log_json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if let Some(e) = bad_directive {
        tracing::warn!("log filter '{}' rejected ({e}), using 'info'", config.log_filter);
    }
    if installed {
        tracing::debug!(json = config.log_json, "logging initialised");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_a_no_op() {
        let config = BridgeConfig::default();
        let _ = init(&config);
        assert!(!init(&config));
    }
}
