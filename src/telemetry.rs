use tracing_subscriber::EnvFilter;

fn log_level_from_env() -> &'static str {
    match std::env::var("DOCSIGHT_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

fn http_debug_enabled() -> bool {
    matches!(
        std::env::var("DOCSIGHT_HTTP_DEBUG")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn filter_directives(level: &str, http_debug: bool) -> String {
    if http_debug {
        level.to_string()
    } else {
        format!("{level},reqwest=warn,hyper=warn,hyper_util=warn")
    }
}

/// Installs the stderr subscriber. A second call is a no-op.
pub fn init_tracing() {
    let directives = filter_directives(log_level_from_env(), http_debug_enabled());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::filter_directives;

    #[test]
    fn caps_http_noise_unless_requested() {
        assert_eq!(filter_directives("debug", false), "debug,reqwest=warn,hyper=warn,hyper_util=warn");
        assert_eq!(filter_directives("trace", true), "trace");
    }
}
