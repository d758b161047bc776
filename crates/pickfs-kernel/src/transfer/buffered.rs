//! Buffered transfer strategy.
//!
//! Stages the whole payload in a local temp file instead of streaming it.
//! Reads materialize the file before the caller gets a handle; writes hand
//! the caller a temp file and commit its final contents on [`BufferedUpload::finish`].

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::error::StoreResult;
use crate::store::PathStore;

/// Copy `data` into an anonymous temp file, rewound for reading.
///
/// The file has no name on disk; it disappears when the handle is dropped.
pub(crate) async fn stage_download(data: &[u8]) -> io::Result<File> {
    let mut file = File::from_std(tempfile::tempfile()?);
    file.write_all(data).await?;
    file.flush().await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(file)
}

/// A pending upload backed by a named temp file.
///
/// The temp file is deleted when this value drops, whether or not the
/// upload was committed.
pub struct BufferedUpload {
    file: File,
    temp: TempPath,
    store: Arc<PathStore>,
    path: String,
    finished: bool,
}

impl BufferedUpload {
    pub(crate) fn create(store: Arc<PathStore>, path: &str) -> io::Result<Self> {
        let named = tempfile::Builder::new()
            .prefix("upload")
            .suffix(".tmp")
            .tempfile()?;
        let (file, temp) = named.into_parts();
        tracing::debug!(path, temp = %temp.display(), "staging upload");
        Ok(Self {
            file: File::from_std(file),
            temp,
            store,
            path: path.to_string(),
            finished: false,
        })
    }

    /// Document path this upload commits to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Close the handle and commit the temp file's contents.
    ///
    /// Commit failures are logged, not returned; the temp file is removed
    /// either way.
    pub async fn finish(mut self) {
        self.finished = true;
        match self.commit().await {
            Ok(bytes) => tracing::info!(path = %self.path, bytes, "buffered upload committed"),
            Err(e) => tracing::warn!(path = %self.path, error = %e, "buffered upload failed"),
        }
    }

    async fn commit(&mut self) -> StoreResult<usize> {
        self.file.flush().await?;
        let data = tokio::fs::read(&*self.temp).await?;
        let bytes = data.len();
        self.store.replace_content(&self.path, data).await?;
        Ok(bytes)
    }
}

impl Drop for BufferedUpload {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(path = %self.path, "upload handle dropped without finish, discarding");
        }
    }
}

impl AsyncWrite for BufferedUpload {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.file).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_shutdown(cx)
    }
}

impl std::fmt::Debug for BufferedUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedUpload")
            .field("path", &self.path)
            .field("temp", &self.temp)
            .finish()
    }
}
