//! SNI hostname extraction from the first bytes of a TCP connection.
//!
//! Extraction is a heuristic anchor search, not a TLS parser: in the
//! common ClientHello layout (one SNI entry of type host_name, no
//! preceding padding) a run of five zero bytes sits immediately before
//! the one-byte hostname length. ClientHellos whose extension ordering
//! or padding defeats that assumption are reported as not found, which
//! is accepted behavior. Malformed input is never an error.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Maximum bytes captured from a fresh connection when probing for SNI.
pub const MAX_PROBE_BYTES: usize = 2048;

/// Capture the initial probe from a fresh connection.
///
/// Performs a single read; whatever arrived in the first segment is all
/// the extractor gets to work with. EOF yields an empty probe. The
/// caller must replay these bytes to the backend verbatim.
pub async fn read_probe<R: AsyncRead + Unpin>(stream: &mut R) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; MAX_PROBE_BYTES];
    let n = stream.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

/// Extract the SNI hostname from a probe buffer.
///
/// Scans for five consecutive zero bytes; the byte after the run is
/// taken as the hostname length and the hostname follows it. The first
/// run with a length that fits inside the buffer wins and the scan
/// stops there. Returns `None` if no run yields a satisfiable length
/// or the extracted name is empty.
pub fn extract_sni(buf: &[u8]) -> Option<String> {
    let n = buf.len();
    for i in 0..n {
        // Need the five-byte run plus the length byte in bounds.
        if i + 5 >= n {
            break;
        }
        if buf[i..i + 5] != [0, 0, 0, 0, 0] {
            continue;
        }
        let offset = i + 5;
        let length = buf[offset] as usize;
        if offset + length < n {
            let name = String::from_utf8_lossy(&buf[offset + 1..offset + 1 + length]);
            if name.is_empty() {
                return None;
            }
            return Some(name.into_owned());
        }
    }
    None
}
