//! Logging setup for service-registry
//!
//! Registry events are emitted through `tracing` under the
//! [`TARGET`] target: registrations, clears and singleton promotions at
//! `DEBUG`, individual resolutions and factory calls at `TRACE`. This module
//! installs a `tracing-subscriber` for them.
//!
//! # Features
//!
//! - `logging` - emit events (default)
//! - `logging-json` - JSON subscriber output
//! - `logging-pretty` - human-readable subscriber output
//!
//! # Example
//!
//! ```rust,ignore
//! use service_registry::logging;
//!
//! // JSON if logging-json is enabled, pretty otherwise
//! logging::init();
//!
//! // Or configure explicitly
//! logging::builder()
//!     .trace()
//!     .registry_only()
//!     .compact()
//!     .init();
//! ```
//!
//! `RUST_LOG`, when set, takes precedence over the builder's level and target.

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "service_registry";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
}

/// Builder for the logging subscriber
#[derive(Debug, Clone)]
#[cfg_attr(
    not(any(feature = "logging-json", feature = "logging-pretty")),
    allow(dead_code)
)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a builder with `DEBUG` level and the default format
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Include per-resolution events
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Registrations, clears and promotions only
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Hide registration and resolution events
    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Failed resolutions only
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show registry events
    pub fn registry_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Include source file names
    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    /// Include source line numbers
    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Include thread IDs
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    /// JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Multi-line human-readable output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Single-line output
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive derived from level and target, e.g. `service_registry=debug`
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_ascii_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber globally.
    ///
    /// Does nothing if a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directive()));

        let base = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let layer = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => base.json().boxed(),
            // Without logging-json, JSON falls back to the default formatter
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => base.boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init();
    }

    /// No-op: requires `logging-json` or `logging-pretty`
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings.
///
/// JSON when `logging-json` is enabled, pretty otherwise.
pub fn init() {
    if cfg!(feature = "logging-json") {
        init_json();
    } else {
        init_pretty();
    }
}

/// Initialize JSON structured logging at `DEBUG`.
///
/// # Example output
/// ```json
/// {"timestamp":"2024-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering service","service":"u32","kind":"instance"},"target":"service_registry"}
/// ```
pub fn init_json() {
    builder().json().debug().init();
}

/// Initialize pretty logging at `DEBUG`.
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// Initialize logging for registry events only.
pub fn init_registry_only() {
    builder().registry_only().debug().init();
}
