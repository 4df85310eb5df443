use tracing::dispatcher::DefaultGuard;

pub(crate) fn setup_fmt_tracing(level: &str) -> DefaultGuard {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::new(level))
        .set_default()
}
