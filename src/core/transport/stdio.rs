//! STDIO transport implementation.
//!
//! Line-delimited envelopes over stdin/stdout. Logs go to stderr.

use std::sync::Arc;
use tracing::info;

use super::TransportResult;
use super::lines::serve_lines;
use crate::server::Dispatcher;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes.
    pub async fn run(dispatcher: Arc<Dispatcher>) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        serve_lines(dispatcher, tokio::io::stdin(), tokio::io::stdout()).await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
