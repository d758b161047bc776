//! Transfer bridge: moving document bytes in and out of the store.
//!
//! Two strategies, chosen per open by [`ProviderFlags::buffer_locally`]:
//!
//! - **Streaming** (default): a [`pipe`] is created and one end returned at
//!   once. A spawned drain task feeds it from the store (read) or drains it
//!   into the store (write). The open call returns before the task finishes;
//!   the task's outcome travels only through the pipe's close-with-error
//!   (read) or the write handle's completion channel (write).
//! - **Buffered**: the payload is staged in a local temp file. No task is
//!   spawned; reads return once the file is fully written, writes commit
//!   when the handle is finished.
//!
//! Drain tasks honor a [`CancellationToken`]: a cancelled read closes the
//! pipe with `Interrupted`, a cancelled write commits nothing.

mod buffered;
mod pipe;

use std::io;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub use buffered::BufferedUpload;
pub use pipe::{PipeReader, PipeWriter, pipe};

use crate::config::{ProviderFlags, TransferSettings};
use crate::error::{StoreError, StoreResult};
use crate::store::PathStore;

/// Direction of a transfer, parsed from the platform's mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Read,
    Write,
}

impl FromStr for TransferMode {
    type Err = StoreError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            other => Err(StoreError::unsupported_mode(other)),
        }
    }
}

/// A handle returned by [`TransferBridge::open`].
#[derive(Debug)]
pub enum DocumentHandle {
    Read(ReadHandle),
    Write(WriteHandle),
}

impl DocumentHandle {
    pub fn mode(&self) -> TransferMode {
        match self {
            Self::Read(_) => TransferMode::Read,
            Self::Write(_) => TransferMode::Write,
        }
    }

    pub fn into_reader(self) -> StoreResult<ReadHandle> {
        match self {
            Self::Read(reader) => Ok(reader),
            Self::Write(_) => Err(StoreError::invalid_operation("handle is open for write")),
        }
    }

    pub fn into_writer(self) -> StoreResult<WriteHandle> {
        match self {
            Self::Write(writer) => Ok(writer),
            Self::Read(_) => Err(StoreError::invalid_operation("handle is open for read")),
        }
    }
}

/// Readable document contents.
#[derive(Debug)]
pub enum ReadHandle {
    /// Fed concurrently by a drain task.
    Pipe(PipeReader),
    /// A temp file already holding the full payload.
    File(File),
}

impl ReadHandle {
    /// Read everything until EOF.
    ///
    /// An abnormal close of the pipe surfaces as `TransferFailure`.
    pub async fn read_all(&mut self) -> StoreResult<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to_end(&mut out).await?;
        Ok(out)
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl AsyncRead for ReadHandle {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(reader) => Pin::new(reader).poll_read(cx, buf),
            Self::File(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}

/// Writable document contents.
///
/// Call [`WriteHandle::finish`] when done writing; dropping the handle
/// instead abandons the upload.
#[derive(Debug)]
pub enum WriteHandle {
    /// Drained concurrently into the store by a spawned task.
    Pipe {
        writer: PipeWriter,
        outcome: oneshot::Receiver<StoreResult<()>>,
    },
    /// A temp file committed on finish.
    File(BufferedUpload),
}

impl WriteHandle {
    /// Close the handle and wait until the bytes are in the store.
    ///
    /// For the streaming strategy this returns the drain task's outcome, so a
    /// failed or cancelled commit is reported here. The buffered strategy logs
    /// commit failures instead and always returns `Ok`.
    pub async fn finish(self) -> StoreResult<()> {
        match self {
            Self::Pipe {
                mut writer,
                outcome,
            } => {
                writer.shutdown().await?;
                match outcome.await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::TransferFailure(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "drain task ended without reporting",
                    ))),
                }
            }
            Self::File(upload) => {
                upload.finish().await;
                Ok(())
            }
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl AsyncWrite for WriteHandle {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Pipe { writer, .. } => Pin::new(writer).poll_write(cx, buf),
            Self::File(upload) => Pin::new(upload).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe { writer, .. } => Pin::new(writer).poll_flush(cx),
            Self::File(upload) => Pin::new(upload).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe { writer, .. } => Pin::new(writer).poll_shutdown(cx),
            Self::File(upload) => Pin::new(upload).poll_shutdown(cx),
        }
    }
}

/// Opens document handles against a shared store.
#[derive(Debug, Clone)]
pub struct TransferBridge {
    store: Arc<PathStore>,
    flags: Arc<ProviderFlags>,
    settings: TransferSettings,
}

impl TransferBridge {
    /// Zero-sized pipes or chunks are raised to one.
    pub fn new(store: Arc<PathStore>, flags: Arc<ProviderFlags>, settings: TransferSettings) -> Self {
        Self {
            store,
            flags,
            settings: TransferSettings {
                pipe_capacity: settings.pipe_capacity.max(1),
                chunk_size: settings.chunk_size.max(1),
            },
        }
    }

    /// Open `path` with a platform mode string (`"r"` or `"w"`).
    ///
    /// The mode is validated before anything else happens.
    pub async fn open(
        &self,
        path: &str,
        mode: &str,
        cancel: CancellationToken,
    ) -> StoreResult<DocumentHandle> {
        match mode.parse::<TransferMode>()? {
            TransferMode::Read => Ok(DocumentHandle::Read(self.open_read(path, cancel).await?)),
            TransferMode::Write => Ok(DocumentHandle::Write(self.open_write(path, cancel)?)),
        }
    }

    /// Open `path` for reading.
    ///
    /// Fails with `NotFound` or `InvalidOperation` before any pipe or temp
    /// file is allocated.
    pub async fn open_read(&self, path: &str, cancel: CancellationToken) -> StoreResult<ReadHandle> {
        let data = self.store.download(path).await?;

        if self.flags.buffer_locally() {
            let file = buffered::stage_download(&data).await?;
            tracing::debug!(path, bytes = data.len(), "staged download");
            return Ok(ReadHandle::File(file));
        }

        let (writer, reader) = pipe(self.settings.pipe_capacity);
        tokio::spawn(drain_to_pipe(
            path.to_string(),
            data,
            writer,
            self.settings.chunk_size,
            cancel,
        ));
        Ok(ReadHandle::Pipe(reader))
    }

    /// Open `path` for writing. The path need not exist yet.
    pub fn open_write(&self, path: &str, cancel: CancellationToken) -> StoreResult<WriteHandle> {
        if self.flags.buffer_locally() {
            let upload = BufferedUpload::create(self.store.clone(), path)?;
            return Ok(WriteHandle::File(upload));
        }

        let (writer, reader) = pipe(self.settings.pipe_capacity);
        let (outcome_tx, outcome) = oneshot::channel();
        tokio::spawn(drain_to_store(
            self.store.clone(),
            path.to_string(),
            reader,
            cancel,
            outcome_tx,
        ));
        Ok(WriteHandle::Pipe { writer, outcome })
    }
}

fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "transfer cancelled")
}

/// Feed a snapshot of a file's payload into the pipe, then close it.
async fn drain_to_pipe(
    path: String,
    data: Arc<[u8]>,
    mut writer: PipeWriter,
    chunk_size: usize,
    cancel: CancellationToken,
) {
    for chunk in data.chunks(chunk_size) {
        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(path = %path, "download cancelled");
                writer.close_with_error(cancelled());
                return;
            }
            res = writer.write_all(chunk) => res,
        };
        if let Err(e) = written {
            // Reader went away; there is nobody to report to.
            tracing::warn!(path = %path, error = %e, "download aborted");
            return;
        }
    }

    match writer.shutdown().await {
        Ok(()) => tracing::info!(path = %path, bytes = data.len(), "written successfully"),
        Err(e) => tracing::warn!(path = %path, error = %e, "failed to close download pipe"),
    }
}

/// Drain the pipe to EOF and commit the bytes to `path`.
async fn drain_to_store(
    store: Arc<PathStore>,
    path: String,
    mut reader: PipeReader,
    cancel: CancellationToken,
    outcome: oneshot::Sender<StoreResult<()>>,
) {
    let mut data = Vec::new();
    let drained = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled()),
        res = reader.read_to_end(&mut data) => res,
    };

    let result = match drained {
        Ok(bytes) => match store.replace_content(&path, data).await {
            Ok(()) => {
                tracing::info!(path = %path, bytes, "upload committed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "upload rejected by store");
                Err(e)
            }
        },
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "upload failed, nothing committed");
            Err(StoreError::TransferFailure(e))
        }
    };

    // The writer may have been dropped without waiting; the result is moot then.
    let _ = outcome.send(result);
}
