//! JSON-lines framing for running a participant over a byte stream.
//!
//! One [`Delivery`] per input line, one [`Reply`] per output line. The
//! binary wires these to stdin/stdout; tests use in-memory buffers.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Delivery, Reply, TransportError};

/// Decode deliveries from `reader` and forward them to the participant.
///
/// Blank lines are ignored. Lines that fail to decode are logged and skipped
/// so one bad message does not take the participant down.
///
/// Returns when the reader hits EOF or the participant stops listening.
///
/// # Errors
///
/// Returns [`TransportError::Io`] when reading fails.
pub async fn read_deliveries<R>(
    reader: R,
    deliveries: mpsc::Sender<Delivery>,
) -> Result<usize, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded: usize = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let delivery: Delivery = match serde_json::from_str(line) {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(error = %e, "skipping undecodable delivery");
                continue;
            }
        };

        debug!(kind = delivery.kind(), "decoded delivery");
        if deliveries.send(delivery).await.is_err() {
            info!("participant stopped listening, closing reader");
            return Ok(forwarded);
        }
        forwarded = forwarded.saturating_add(1);
    }

    info!(forwarded, "delivery stream ended");
    Ok(forwarded)
}

/// Encode replies as JSON lines onto `writer` until every sender is gone.
///
/// Flushes after each reply so the engine sees it immediately.
///
/// # Errors
///
/// Returns [`TransportError::Codec`] or [`TransportError::Io`] when a reply
/// cannot be written.
pub async fn write_replies<W>(
    mut replies: mpsc::UnboundedReceiver<Reply>,
    mut writer: W,
) -> Result<usize, TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut written: usize = 0;

    while let Some(reply) = replies.recv().await {
        let mut line = serde_json::to_vec(&reply)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
        written = written.saturating_add(1);
    }

    debug!(written, "reply stream closed");
    Ok(written)
}
