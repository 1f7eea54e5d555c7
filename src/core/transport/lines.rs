//! Line-delimited envelope framing shared by the STDIO and TCP transports.
//!
//! One JSON envelope per line in each direction. Every inbound line is
//! dispatched on its own task and responses are written as they complete,
//! so a slow tool never holds up the responses queued behind it.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::{TransportError, TransportResult};
use crate::protocol::{Envelope, ErrorCode, ErrorObject, encode};
use crate::server::Dispatcher;

/// Serve `dispatcher` over a line-delimited stream until the reader closes.
///
/// Responses still in flight when the reader closes are written before this
/// returns.
pub async fn serve_lines<R, W>(dispatcher: Arc<Dispatcher>, reader: R, writer: W) -> TransportResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(e) => {
                warn!("Rejected line that is not valid UTF-8: {}", e);
                let response = unreadable_line();
                if let Ok(text) = encode(&response) {
                    let _ = tx.send(text);
                }
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let dispatcher = Arc::clone(&dispatcher);
        let tx = tx.clone();
        tokio::spawn(async move {
            let Some(response) = dispatcher.handle_raw(&line).await else {
                return;
            };
            match encode(&response) {
                Ok(text) => {
                    if tx.send(text).is_err() {
                        debug!("Writer closed before response {} was sent", response.id);
                    }
                }
                Err(e) => error!("Failed to encode response {}: {}", response.id, e),
            }
        });
    }

    drop(tx);
    writer_task
        .await
        .map_err(|e| TransportError::connection(e.to_string()))??;
    Ok(())
}

/// Parse error response for bytes that cannot be JSON text at all.
fn unreadable_line() -> Envelope {
    Envelope::failure_for("", "", ErrorObject::from_code(ErrorCode::ParseError))
}
