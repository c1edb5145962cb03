//! Full-duplex byte relay between a client connection and its backend.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const COPY_BUF_BYTES: usize = 8192;

/// Relay a client connection to `target` (host:port).
///
/// Dials the backend, replays the already-consumed probe bytes so the
/// backend sees a byte-identical handshake start, then copies both
/// directions concurrently. Whichever direction finishes first, by EOF
/// or error, ends the session and both sockets are shut down so the
/// other direction unblocks. Dial and probe-replay failures are
/// returned; a copy error is logged and does not affect the close path.
///
/// Returns bytes copied client-to-upstream (excluding the probe) and
/// upstream-to-client.
pub async fn relay(mut client: TcpStream, probe: &[u8], target: &str) -> io::Result<(u64, u64)> {
    let mut upstream = TcpStream::connect(target).await?;
    upstream.write_all(probe).await?;

    let to_upstream = AtomicU64::new(0);
    let from_upstream = AtomicU64::new(0);

    {
        let (mut client_read, mut client_write) = client.split();
        let (mut upstream_read, mut upstream_write) = upstream.split();

        let finished: io::Result<()> = tokio::select! {
            r = copy_counted(&mut client_read, &mut upstream_write, &to_upstream) => r,
            r = copy_counted(&mut upstream_read, &mut client_write, &from_upstream) => r,
        };

        if let Err(e) = finished {
            debug!(error = %e, "relay stream error");
        }
    }

    // Propagate end of session to whichever side is still open.
    let _ = client.shutdown().await;
    let _ = upstream.shutdown().await;

    Ok((
        to_upstream.load(Ordering::Relaxed),
        from_upstream.load(Ordering::Relaxed),
    ))
}

/// Copy until EOF, adding to `total` as bytes are written through.
async fn copy_counted<R, W>(reader: &mut R, writer: &mut W, total: &AtomicU64) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUF_BYTES];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        total.fetch_add(n as u64, Ordering::Relaxed);
    }
}
