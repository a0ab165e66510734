pub fn init_tracing(verbose: bool) {
    // Only enable logging when explicitly requested.
    // - stdout is reserved for JSON when `--json` is used
    // - tracing-subscriber defaults to stderr

    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty());
    let enable =
        filter.is_some() || verbose || std::env::var_os("LITTLEFS_LOADER_LOG").is_some();

    if !enable {
        return;
    }

    let filter = filter.unwrap_or_else(|| default_filter(verbose).to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "littlefs_loader=debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_default_filter() {
        assert_eq!(default_filter(true), "littlefs_loader=debug");
        assert_eq!(default_filter(false), "info");
    }
}
