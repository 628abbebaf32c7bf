use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Console logging to stderr, so stdout stays clean for JSON output.
///
/// `RUST_LOG` wins; otherwise `info` with debug for our own crates.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let core_level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!(
            "warn,velvet_core={core_level},velvet_lobby={core_level}"
        ))
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .compact()
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
