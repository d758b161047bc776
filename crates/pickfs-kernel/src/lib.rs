//! pickfs-kernel: a volatile document store for poking at file pickers.
//!
//! This crate provides:
//!
//! - **Store**: path-keyed node map with depth-derived children
//! - **Notify**: change sinks that hear about every mutated path and its parent
//! - **Transfer**: streaming (pipe + drain task) and buffered (temp file) byte transfer
//! - **Provider**: request dispatcher with an optional authentication gate
//!
//! Nothing is persisted. A fresh store holds only the root folder `/`.

pub mod config;
pub mod error;
pub mod notify;
pub mod paths;
pub mod provider;
pub mod store;
pub mod transfer;

pub use config::{ProviderConfig, ProviderFlags, TransferSettings};
pub use error::{StoreError, StoreResult};
pub use notify::{Change, ChangeLog, ChangeSink, ChannelSink, NullSink};
pub use provider::{DocumentProvider, Request, Response};
pub use store::{Node, NodeKind, PathStore, SeedReport};
pub use transfer::{DocumentHandle, ReadHandle, TransferBridge, TransferMode, WriteHandle};
pub use tokio_util::sync::CancellationToken;
