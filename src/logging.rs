//! Log filter resolution shared by the env_logger and tracing back ends.

/// Linker-specific filter variable; wins over `RUST_LOG`.
pub const LOG_ENV: &str = "BUILDING_LINKER_LOG";

const DEFAULT_FILTER: &str = "info";

/// First non-blank of the linker filter, `RUST_LOG`, then `info`.
pub fn resolve_log_filter(app: Option<String>, rust_log: Option<String>) -> String {
    [app, rust_log]
        .into_iter()
        .flatten()
        .map(|f| f.trim().to_string())
        .find(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

pub fn log_filter() -> String {
    resolve_log_filter(std::env::var(LOG_ENV).ok(), std::env::var("RUST_LOG").ok())
}

pub fn init_env_logger() {
    env_logger::Builder::new().parse_filters(&log_filter()).init();
}

pub fn init_tracing_from_env() {
    // log:: macros from the linker modules go through tracing
    let _ = tracing_log::LogTracer::init();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true)
        .with_level(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// True when `BUILDING_LINKER_TRACING` asks for the tracing subscriber instead of env_logger.
pub fn tracing_requested() -> bool {
    std::env::var("BUILDING_LINKER_TRACING")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linker_filter_beats_rust_log() {
        assert_eq!(
            resolve_log_filter(Some("building_linker=debug".into()), Some("warn".into())),
            "building_linker=debug"
        );
        assert_eq!(resolve_log_filter(None, Some("warn".into())), "warn");
    }

    #[test]
    fn blank_or_missing_filters_fall_back_to_info() {
        assert_eq!(resolve_log_filter(None, None), "info");
        assert_eq!(resolve_log_filter(Some("  ".into()), None), "info");
        assert_eq!(resolve_log_filter(Some("".into()), Some("trace".into())), "trace");
    }
}
