//! Newline-delimited framing over arbitrary async byte streams.
//!
//! Reads accept `\n` or `\r\n` and yield the line without its terminator.
//! Writes terminate every line with `\n` and flush immediately – a relayed
//! line must never sit in a write buffer waiting for more traffic.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

/// Wraps the read half of a stream in a buffered line reader.
///
/// The returned [`Lines`] yields one line per `next_line().await`, with the
/// terminating `\n` (and a preceding `\r`, if any) stripped.  `Ok(None)`
/// signals that the peer closed its end of the stream.
pub fn line_reader<R>(read_half: R) -> Lines<BufReader<R>>
where
    R: AsyncRead + Unpin,
{
    BufReader::new(read_half).lines()
}

/// Writes `line`, a terminating newline, and flushes.
///
/// # Errors
///
/// Returns the underlying I/O error.  Whether the failure is fatal is the
/// caller's decision: the server treats a failed relay write as a
/// per-recipient loss, not as its own failure.
pub async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
