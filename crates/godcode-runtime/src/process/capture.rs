//! Bounded capture of a child's output streams.
//!
//! Each stream gets its own buffer and its own reader task. Buffers live
//! behind a shared handle so whatever arrived before a kill can still be
//! collected afterwards.

use std::sync::{Arc, Mutex, PoisonError};

use godcode_core::TRUNCATION_MARKER;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::warn;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Default)]
struct Inner {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Byte buffer that stops growing at `limit` and remembers that it did.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Inner>>,
    limit: usize,
}

impl CaptureBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            limit,
        }
    }

    /// Append a chunk, keeping at most `limit` bytes.
    pub fn push(&self, chunk: &[u8]) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let room = self.limit.saturating_sub(inner.bytes.len());
        if chunk.len() <= room {
            inner.bytes.extend_from_slice(chunk);
        } else {
            inner.bytes.extend_from_slice(&chunk[..room]);
            inner.truncated = true;
        }
    }

    /// Copy out the bytes captured so far. A truncated buffer ends with the
    /// truncation marker.
    pub fn snapshot(&self) -> (Vec<u8>, bool) {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut bytes = inner.bytes.clone();
        if inner.truncated {
            bytes.extend_from_slice(TRUNCATION_MARKER);
        }
        (bytes, inner.truncated)
    }
}

/// Drain `stream` into `buffer` until EOF or a read error.
///
/// Reading continues past the cap so the child never blocks on a full pipe.
pub fn spawn_capture<R>(stream: R, buffer: CaptureBuffer, label: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut stream = stream;
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.push(&chunk[..n]),
                Err(e) => {
                    warn!(stream = label, error = %e, "Failed to read child output");
                    break;
                }
            }
        }
    })
}
