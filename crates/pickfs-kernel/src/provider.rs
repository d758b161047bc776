//! Document provider: the request-facing surface over the store.
//!
//! Translates platform-style document requests (create under a parent,
//! copy into a target folder, rename in place) into [`PathStore`] calls and
//! routes open requests through the [`TransferBridge`]. Every protected
//! request is logged and checked against the authentication gate first.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{ProviderConfig, ProviderFlags};
use crate::error::{StoreError, StoreResult};
use crate::notify::ChangeSink;
use crate::store::{self, Node, PathStore, SeedReport};
use crate::transfer::{DocumentHandle, TransferBridge};

/// A document request, one per operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Create {
        parent: String,
        name: String,
        folder: bool,
    },
    Open {
        path: String,
        mode: String,
    },
    Copy {
        source: String,
        target_parent: String,
    },
    Move {
        source: String,
        target_parent: String,
    },
    Rename {
        path: String,
        name: String,
    },
    Delete {
        path: String,
    },
    Get {
        path: String,
    },
    List {
        path: String,
    },
    Search {
        scope: String,
        query: String,
    },
    Recent,
}

/// Result of a [`Request`].
#[derive(Debug)]
pub enum Response {
    /// Path of the created, copied, moved or renamed document.
    Path(String),
    Node(Node),
    Nodes(Vec<Node>),
    Handle(DocumentHandle),
    Done,
}

/// Owns the store and everything that reaches it.
#[derive(Debug)]
pub struct DocumentProvider {
    store: Arc<PathStore>,
    bridge: TransferBridge,
    flags: Arc<ProviderFlags>,
    recent_limit: usize,
    seed_count: usize,
}

impl DocumentProvider {
    pub fn new(config: &ProviderConfig, sink: Arc<dyn ChangeSink>) -> Self {
        let store = Arc::new(PathStore::new(sink));
        let flags = Arc::new(ProviderFlags::from_config(config));
        let bridge = TransferBridge::new(store.clone(), flags.clone(), config.transfer_settings());
        Self {
            store,
            bridge,
            flags,
            recent_limit: config.recent_limit,
            seed_count: config.seed_count,
        }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<PathStore> {
        &self.store
    }

    /// Runtime toggles.
    pub fn flags(&self) -> &Arc<ProviderFlags> {
        &self.flags
    }

    /// Seed size used when none is given.
    pub fn seed_count(&self) -> usize {
        self.seed_count
    }

    /// Dispatch a request. Open requests are not cancellable through here;
    /// use [`DocumentProvider::open_document`] for that.
    pub async fn handle(&self, request: Request) -> StoreResult<Response> {
        match request {
            Request::Create {
                parent,
                name,
                folder,
            } => self
                .create_document(&parent, &name, folder)
                .await
                .map(Response::Path),
            Request::Open { path, mode } => self
                .open_document(&path, &mode, CancellationToken::new())
                .await
                .map(Response::Handle),
            Request::Copy {
                source,
                target_parent,
            } => self
                .copy_document(&source, &target_parent)
                .await
                .map(Response::Path),
            Request::Move {
                source,
                target_parent,
            } => self
                .move_document(&source, &target_parent)
                .await
                .map(Response::Path),
            Request::Rename { path, name } => self
                .rename_document(&path, &name)
                .await
                .map(Response::Path),
            Request::Delete { path } => {
                self.delete_document(&path).await?;
                Ok(Response::Done)
            }
            Request::Get { path } => self.query_document(&path).await.map(Response::Node),
            Request::List { path } => self.query_children(&path).await.map(Response::Nodes),
            Request::Search { scope, query } => {
                self.query_search(&scope, &query).await.map(Response::Nodes)
            }
            Request::Recent => self.query_recent().await.map(Response::Nodes),
        }
    }

    /// Create a folder or empty file named `name` inside `parent`.
    pub async fn create_document(
        &self,
        parent: &str,
        name: &str,
        folder: bool,
    ) -> StoreResult<String> {
        self.operation("createDocument", &[parent, name])?;
        let path = store::join(parent, name);
        self.store.create(&path, folder).await?;
        Ok(path)
    }

    /// Open `path` for `"r"` or `"w"`.
    pub async fn open_document(
        &self,
        path: &str,
        mode: &str,
        cancel: CancellationToken,
    ) -> StoreResult<DocumentHandle> {
        self.operation("openDocument", &[path, mode])?;
        let handle = self.bridge.open(path, mode, cancel).await;
        if let Err(StoreError::UnsupportedMode(m)) = &handle {
            tracing::warn!(path, mode = %m, "unrecognized mode");
        }
        handle
    }

    /// Copy `source` into the folder `target_parent`, keeping its name.
    pub async fn copy_document(&self, source: &str, target_parent: &str) -> StoreResult<String> {
        self.operation("copyDocument", &[source, target_parent])?;
        let target = store::join(target_parent, store::name(source));
        self.store.copy(source, &target).await
    }

    /// Move `source` into the folder `target_parent`, keeping its name.
    pub async fn move_document(&self, source: &str, target_parent: &str) -> StoreResult<String> {
        self.operation("moveDocument", &[source, target_parent])?;
        let target = store::join(target_parent, store::name(source));
        self.store.move_node(source, &target).await
    }

    /// Give `path` a new final segment within the same parent.
    pub async fn rename_document(&self, path: &str, name: &str) -> StoreResult<String> {
        self.operation("renameDocument", &[path, name])?;
        let target = store::join(store::parent(path), name);
        self.store.move_node(path, &target).await
    }

    pub async fn delete_document(&self, path: &str) -> StoreResult<()> {
        self.operation("deleteDocument", &[path])?;
        self.store.delete(path).await
    }

    pub async fn query_document(&self, path: &str) -> StoreResult<Node> {
        self.operation("queryDocument", &[path])?;
        self.store.get(path).await
    }

    pub async fn query_children(&self, path: &str) -> StoreResult<Vec<Node>> {
        self.operation("queryChildDocuments", &[path])?;
        Ok(self.store.children(path).await)
    }

    /// The first `recent_limit` documents in insertion order.
    pub async fn query_recent(&self) -> StoreResult<Vec<Node>> {
        self.operation("queryRecentDocuments", &[])?;
        Ok(self.store.recent(self.recent_limit).await)
    }

    pub async fn query_search(&self, scope: &str, query: &str) -> StoreResult<Vec<Node>> {
        self.operation("querySearchDocuments", &[scope, query])?;
        Ok(self.store.search(query, scope).await)
    }

    /// Wipe the store back to a lone root. Not gated.
    pub async fn reset_all(&self) {
        tracing::info!("resetAll()");
        self.store.reset().await;
    }

    /// Generate a random tree of `count` nodes. Not gated.
    pub async fn seed_synthetic_tree(&self, count: usize) -> SeedReport {
        tracing::info!(count, "seedSyntheticTree()");
        self.store.seed_synthetic_tree(count).await
    }

    fn operation(&self, name: &str, args: &[&str]) -> StoreResult<()> {
        tracing::info!("{name}({})", args.join(", "));
        if self.flags.authenticated() {
            Ok(())
        } else {
            tracing::warn!(operation = name, "rejected, not authenticated");
            Err(StoreError::authentication_required(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullSink;

    fn provider() -> DocumentProvider {
        DocumentProvider::new(&ProviderConfig::default(), Arc::new(NullSink))
    }

    #[tokio::test]
    async fn test_create_joins_parent_and_name() {
        let p = provider();
        let path = p.create_document("/", "notes", true).await.unwrap();
        assert_eq!(path, "/notes");
        let path = p.create_document("/notes", "a.txt", false).await.unwrap();
        assert_eq!(path, "/notes/a.txt");
        assert!(p.query_document("/notes/a.txt").await.unwrap().is_file());
    }

    #[tokio::test]
    async fn test_rename_stays_in_parent() {
        let p = provider();
        p.create_document("/dir", "old.txt", false).await.unwrap();
        let path = p.rename_document("/dir/old.txt", "new.txt").await.unwrap();
        assert_eq!(path, "/dir/new.txt");
        assert!(p.query_document("/dir/old.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_gate_blocks_before_store() {
        let p = provider();
        p.flags().set_authenticated(false);
        let err = p.create_document("/", "x", false).await.unwrap_err();
        assert!(matches!(err, StoreError::AuthenticationRequired(op) if op == "createDocument"));
        assert!(!p.store().exists("/x").await);
    }

    #[tokio::test]
    async fn test_handle_dispatches() {
        let p = provider();
        let resp = p
            .handle(Request::Create {
                parent: "/".into(),
                name: "a".into(),
                folder: false,
            })
            .await
            .unwrap();
        assert!(matches!(resp, Response::Path(ref path) if path == "/a"));

        let resp = p.handle(Request::Delete { path: "/a".into() }).await.unwrap();
        assert!(matches!(resp, Response::Done));

        let resp = p.handle(Request::Recent).await.unwrap();
        match resp {
            Response::Nodes(nodes) => assert_eq!(nodes.len(), 1),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_root_requests_are_refused() {
        let p = provider();
        p.create_document("/", "a", true).await.unwrap();

        for err in [
            p.delete_document("/").await.unwrap_err(),
            p.move_document("/", "/a").await.unwrap_err(),
            p.rename_document("/", "x").await.unwrap_err(),
            p.create_document("/", "", false).await.unwrap_err(),
        ] {
            assert!(matches!(err, StoreError::InvalidOperation(_)));
        }
        assert!(p.query_document("/").await.unwrap().is_folder());
        assert_eq!(p.store().len().await, 2);
    }
}
