use std::fs;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("court_sync=info"))
}

/// Console layer on stderr, plus a JSON file layer when `file_writer` is set.
fn subscriber(
    filter: EnvFilter,
    file_writer: Option<NonBlocking>,
) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = file_writer.map(|writer| fmt::layer().json().with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
}

/// Initializes the logging system with both console and file output.
///
/// The returned guard flushes the file writer when dropped, so the caller
/// keeps it alive for the life of the process.
pub fn init_logging() -> Option<WorkerGuard> {
    // Logs go to the console only if the directory can't be created
    let (file_writer, guard) = match fs::create_dir_all("logs") {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily("logs", "court_sync.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(writer), Some(guard))
        }
        Err(_) => (None, None),
    };

    subscriber(default_filter(), file_writer).init();
    guard
}
