use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt as _,
};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "thor_controller.log";

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Keep the returned guard alive until exit, otherwise buffered file output
/// is lost.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    if config.json {
        layers.push(console.json().boxed());
    } else {
        layers.push(console.with_ansi(true).boxed());
    }

    let guard = config.directory.as_ref().map(|directory| {
        let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::Layer::new()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
        );
        guard
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(layers).with(filter);

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global subscriber");

    guard
}
