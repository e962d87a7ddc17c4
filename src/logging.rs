use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Stderr logging at INFO unless overridden through `RUST_LOG`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}
