//! Logging configuration and initialization
//!
//! jdyn reports what it does through the `tracing` crate:
//!
//! - **trace**: every codec call, with the input length or message kind
//! - **debug**: every failed codec call, with the error as a structured field,
//!   and every `id`/`params` member dropped while decoding a request
//!
//! Nothing is printed unless the application installs a subscriber. Use
//! [`init_observability`] for a ready-made one, or install your own.
//!
//! # Usage Pattern
//!
//! ```rust,no_run
//! use jdyn_core::ObservabilityConfig;
//!
//! let config = ObservabilityConfig::default()
//!     .with_log_level("jdyn_core=debug")
//!     .with_json(true);
//!
//! jdyn_core::init_observability(config).expect("Failed to init observability");
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: default log filter (e.g., "info", "jdyn_core=trace")

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
///
/// # Defaults
///
/// - Log level: `$RUST_LOG` or "info"
/// - Human-readable output (not JSON)
/// - Module path included, line numbers omitted
///
/// # Examples
///
/// ```rust
/// use jdyn_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::default()
///     .with_log_level("debug")
///     .with_json(true)
///     .with_line_number(true);
/// assert!(config.json);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Filter directives in `EnvFilter` syntax
    ///
    /// Plain levels ("error", "warn", "info", "debug", "trace") as well as
    /// per-target directives such as "jdyn_core=trace" are accepted.
    pub log_level: String,

    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,

    /// Include the event's target (module path)
    pub with_target: bool,

    /// Include the source line number
    pub with_line_number: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json: false,
            with_target: true,
            with_line_number: false,
        }
    }
}

impl ObservabilityConfig {
    /// Set the log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable JSON output
    pub fn with_json(mut self, enable: bool) -> Self {
        self.json = enable;
        self
    }

    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    pub fn with_line_number(mut self, enable: bool) -> Self {
        self.with_line_number = enable;
        self
    }
}

/// Install a global `tracing` subscriber built from `config`
///
/// # Errors
///
/// - The log filter cannot be parsed
/// - A global subscriber is already installed (including by an earlier call)
///
/// # Examples
///
/// ```rust,no_run
/// use jdyn_core::ObservabilityConfig;
///
/// jdyn_core::init_observability(ObservabilityConfig::default()).unwrap();
/// tracing::info!("Application started");
/// ```
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_new(&config.log_level)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_line_number(config.with_line_number);

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    tracing::debug!(
        log_level = %config.log_level,
        json = config.json,
        "Observability initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(!config.json);
        assert!(config.with_target);
        assert!(!config.with_line_number);
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = ObservabilityConfig::default()
            .with_log_level("trace")
            .with_json(true)
            .with_target(false)
            .with_line_number(true);

        assert_eq!(config.log_level, "trace");
        assert!(config.json);
        assert!(!config.with_target);
        assert!(config.with_line_number);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = ObservabilityConfig::default().with_log_level("jdyn_core=loudest");
        assert!(init_observability(config).is_err());
    }

    #[test]
    fn test_second_init_fails() {
        let config = ObservabilityConfig::default().with_log_level("warn");
        // Another test may already have installed a subscriber
        let _ = init_observability(config.clone());
        assert!(init_observability(config).is_err());
    }
}
