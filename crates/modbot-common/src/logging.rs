//! Tracing initialization and error formatting helpers

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceCell<()> = OnceCell::new();

/// Initialize the global tracing subscriber.
///
/// Uses `filter` when given, otherwise the `RUST_LOG` environment variable,
/// otherwise `info`. Safe to call more than once; only the first call wins.
pub fn init(filter: Option<&str>) {
    INIT.get_or_init(|| {
        let env_filter = match filter {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };
        // try_init so embedding hosts that installed their own subscriber win
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init();
    });
}

/// Render an error with its full cause chain on one line.
pub fn format_error(error: &dyn std::error::Error) -> String {
    format_error_recursive(error, 0)
}

fn format_error_recursive(error: &dyn std::error::Error, depth: usize) -> String {
    const MAX_DEPTH: usize = 10;

    if depth >= MAX_DEPTH {
        return error.to_string();
    }

    let base = error.to_string();
    if let Some(source) = error.source() {
        format!(
            "{} Caused by: {}",
            base,
            format_error_recursive(source, depth + 1)
        )
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_init_is_idempotent() {
        init(Some("debug"));
        init(None);
    }

    #[test]
    fn test_format_error_single() {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(format_error(&err), "missing");
    }

    #[test]
    fn test_format_error_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] io::Error);

        let err = Outer(io::Error::new(io::ErrorKind::Other, "inner"));
        let formatted = format_error(&err);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by: inner"));
    }
}
