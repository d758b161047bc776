//! Reliable in-process pipe.
//!
//! A bounded chunk channel with `AsyncWrite` on one end and `AsyncRead` on
//! the other. Unlike a plain duplex stream, the writer can close the pipe
//! *with an error*, and the reader sees that error instead of a clean EOF:
//!
//! - `shutdown()` on the writer: reader drains buffered chunks, then EOF
//! - `close_with_error(e)`: reader drains buffered chunks, then `Err(e)`
//! - writer dropped without either: reader gets `BrokenPipe`
//!
//! Dropping the reader makes further writes fail with `BrokenPipe`.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::PollSender;

/// Create a pipe holding at most `capacity` unread chunks.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (fault_tx, fault_rx) = oneshot::channel();
    (
        PipeWriter {
            tx: PollSender::new(tx),
            fault: Some(fault_tx),
        },
        PipeReader {
            rx,
            fault: fault_rx,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

/// Write end of a [`pipe`].
pub struct PipeWriter {
    tx: PollSender<Vec<u8>>,
    /// Taken on any deliberate close; still present means abandoned.
    fault: Option<oneshot::Sender<io::Error>>,
}

impl PipeWriter {
    /// Close the pipe, making the reader fail with `error` once it has
    /// consumed everything written so far.
    pub fn close_with_error(mut self, error: io::Error) {
        if let Some(fault) = self.fault.take() {
            // The reader may already be gone; nobody left to tell.
            let _ = fault.send(error);
        }
        self.tx.close();
    }
}

fn reader_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed")
}

impl AsyncWrite for PipeWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        ready!(self.tx.poll_reserve(cx)).map_err(|_| reader_gone())?;
        self.tx.send_item(buf.to_vec()).map_err(|_| reader_gone())?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // Dropping the fault sender unsent is the clean-EOF signal.
        self.fault.take();
        self.tx.close();
        Poll::Ready(Ok(()))
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if let Some(fault) = self.fault.take() {
            let _ = fault.send(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe writer dropped without closing",
            ));
        }
    }
}

impl std::fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeWriter")
            .field("open", &self.fault.is_some())
            .finish()
    }
}

/// Read end of a [`pipe`].
pub struct PipeReader {
    rx: mpsc::Receiver<Vec<u8>>,
    fault: oneshot::Receiver<io::Error>,
    pending: Vec<u8>,
    offset: usize,
}

impl AsyncRead for PipeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        loop {
            if this.offset < this.pending.len() {
                let n = (this.pending.len() - this.offset).min(buf.remaining());
                buf.put_slice(&this.pending[this.offset..this.offset + n]);
                this.offset += n;
                return Poll::Ready(Ok(()));
            }

            match ready!(this.rx.poll_recv(cx)) {
                Some(chunk) => {
                    this.pending = chunk;
                    this.offset = 0;
                }
                // All senders gone: clean EOF unless the writer left an error.
                None => {
                    return Poll::Ready(match this.fault.try_recv() {
                        Ok(error) => Err(error),
                        Err(_) => Ok(()),
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeReader")
            .field("buffered", &(self.pending.len() - self.offset))
            .finish()
    }
}
