//! Entry point for the Language Server Protocol implementation.

use tower_lsp::{
    LspService,
    Server,
};
use tracing_subscriber::EnvFilter;
use ts_i18n_language_server::Backend;

#[tokio::main]
async fn main() {
    // stdout は LSP のメッセージで使うため、ログは stderr に出す
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting ts-i18n-language-server");

    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
