//! Integration tests for logging system

use bridge_traits::logging::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_init_logging_installs_once() {
    // The global subscriber can only be installed once per process, so
    // both calls live in this one test.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);
    assert!(init_logging(config.clone()).is_ok());

    tracing::warn!(target: "core_playback", track_id = 3, "Play request rejected");

    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Compact);
}

#[test]
fn test_custom_filter_replaces_defaults() {
    let config = LoggingConfig::default()
        .with_level(LogLevel::Trace)
        .with_filter("core_service=debug,core_playback=trace");

    assert_eq!(
        config.filter_directives(),
        "core_service=debug,core_playback=trace"
    );
}

#[test]
fn test_default_level_is_info() {
    let directives = LoggingConfig::default().filter_directives();
    assert!(directives.contains("core_service=info"));
    assert!(directives.contains("core_library=info"));
    assert!(!directives.contains("debug"));
}

#[test]
fn test_csrf_values_are_redacted() {
    assert_eq!(redact_if_sensitive("csrftoken", "Zx81"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("title", "Night Drive"), "Night Drive");
}
