//! Entry point for the Language Server Protocol implementation.

use qt_linguist_language_server::Backend;
use tower_lsp::{
    LspService,
    Server,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

/// Directory for daily rolling log files, in addition to stderr.
const LOG_DIR_ENV: &str = "QT_LINGUIST_LS_LOG_DIR";

/// Installs the subscriber. stdout carries the protocol, so logs go to
/// stderr and optionally to a file.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_ansi(false);

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender =
                tracing_appender::rolling::daily(dir, "qt-linguist-language-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();
    guard
}

#[tokio::main]
async fn main() {
    let _guard = init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Qt Linguist language server");

    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
