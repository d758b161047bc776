//! In-memory path store.
//!
//! A path-keyed node map. Insertion order is preserved: replacing an existing
//! key keeps its position, removing a key closes the gap. All data is lost
//! when the store is dropped.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Mutex;

use super::node::{self, Node, ROOT};
use crate::error::{StoreError, StoreResult};
use crate::notify::{Change, ChangeSink, NullSink};

/// The in-memory document store.
///
/// Every read and write goes through one async mutex. Change notifications
/// are sent after the guard is released.
pub struct PathStore {
    nodes: Mutex<IndexMap<String, Node>>,
    sink: Arc<dyn ChangeSink>,
}

impl std::fmt::Debug for PathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathStore")
            .field("nodes", &"<locked>")
            .finish()
    }
}

impl Default for PathStore {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

impl PathStore {
    /// Create a store holding only the root folder.
    pub fn new(sink: Arc<dyn ChangeSink>) -> Self {
        let mut nodes = IndexMap::new();
        nodes.insert(ROOT.to_string(), Node::folder(ROOT));
        Self {
            nodes: Mutex::new(nodes),
            sink,
        }
    }

    /// Look up the node at `path`.
    pub async fn get(&self, path: &str) -> StoreResult<Node> {
        let nodes = self.nodes.lock().await;
        nodes
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(path))
    }

    pub async fn exists(&self, path: &str) -> bool {
        self.nodes.lock().await.contains_key(path)
    }

    /// Number of stored nodes, root included.
    pub async fn len(&self) -> usize {
        self.nodes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Nodes one segment deeper than `path`, in insertion order.
    ///
    /// This is a depth relation only: the parent need not exist, and nodes
    /// under a different prefix at the same depth are included.
    pub async fn children(&self, path: &str) -> Vec<Node> {
        let wanted = node::depth(path) + 1;
        let nodes = self.nodes.lock().await;
        nodes
            .values()
            .filter(|n| node::depth(n.path()) == wanted)
            .cloned()
            .collect()
    }

    /// Insert a folder or an empty file at `path`, replacing whatever was there.
    pub async fn create(&self, path: &str, is_folder: bool) -> StoreResult<()> {
        guard_root(path, "create")?;
        let node = if is_folder {
            Node::folder(path)
        } else {
            Node::empty_file(path)
        };
        self.update(path, node).await;
        Ok(())
    }

    /// Insert or overwrite a file at `path` with `data`.
    pub async fn replace_content(
        &self,
        path: &str,
        data: impl Into<Arc<[u8]>>,
    ) -> StoreResult<()> {
        guard_root(path, "write")?;
        self.update(path, Node::file(path, data)).await;
        Ok(())
    }

    /// Payload of the file at `path`.
    ///
    /// Folders cannot be downloaded.
    pub async fn download(&self, path: &str) -> StoreResult<Arc<[u8]>> {
        match self.get(path).await? {
            Node::File { data, .. } => Ok(data),
            Node::Folder { .. } => Err(StoreError::invalid_operation(format!(
                "cannot download folder: {path}"
            ))),
        }
    }

    /// Remove the node at `path`. Removing a missing path is not an error.
    pub async fn delete(&self, path: &str) -> StoreResult<()> {
        guard_root(path, "delete")?;
        let removed = self.nodes.lock().await.shift_remove(path);
        tracing::debug!(path, existed = removed.is_some(), "deleted");
        self.notify_path(path);
        Ok(())
    }

    /// Write a copy of the node at `from` to `to`. Returns `to`.
    pub async fn copy(&self, from: &str, to: &str) -> StoreResult<String> {
        guard_root(to, "copy onto")?;
        let source = self.get(from).await?;
        self.update(to, source).await;
        Ok(to.to_string())
    }

    /// Move the node at `from` to `to`. Returns `to`.
    ///
    /// Removal and insertion happen under one lock. Only the node itself moves;
    /// nodes stored beneath `from` keep their paths.
    pub async fn move_node(&self, from: &str, to: &str) -> StoreResult<String> {
        guard_root(from, "move")?;
        guard_root(to, "move onto")?;
        {
            let mut nodes = self.nodes.lock().await;
            let node = nodes
                .shift_remove(from)
                .ok_or_else(|| StoreError::not_found(from))?;
            let moved = node.repath(to);
            tracing::debug!(from, to, "moved");
            nodes.insert(to.to_string(), moved);
        }
        self.notify_path(to);
        self.notify_path(from);
        Ok(to.to_string())
    }

    /// Nodes whose path starts with `scope` and contains `query` literally.
    ///
    /// Case-sensitive substring match with no ranking. An empty query matches
    /// everything under `scope`.
    pub async fn search(&self, query: &str, scope: &str) -> Vec<Node> {
        let nodes = self.nodes.lock().await;
        nodes
            .values()
            .filter(|n| n.path().starts_with(scope) && n.path().contains(query))
            .cloned()
            .collect()
    }

    /// The first `limit` nodes in insertion order.
    ///
    /// Not access recency: this is the oldest surviving entries, the root first.
    pub async fn recent(&self, limit: usize) -> Vec<Node> {
        let nodes = self.nodes.lock().await;
        nodes.values().take(limit).cloned().collect()
    }

    /// Drop every node and reseed the root.
    ///
    /// Notifies every path that existed before, then the roots.
    pub async fn reset(&self) {
        let previous: Vec<String> = {
            let mut nodes = self.nodes.lock().await;
            let keys = nodes.keys().cloned().collect();
            nodes.clear();
            nodes.insert(ROOT.to_string(), Node::folder(ROOT));
            keys
        };
        tracing::debug!(cleared = previous.len(), "store reset");
        for path in &previous {
            self.notify_path(path);
        }
        self.sink.notify(Change::Roots);
    }

    /// Insert a batch of nodes under one lock, without notifying.
    ///
    /// Callers are expected to send a single summary notification afterwards.
    pub(crate) async fn insert_quietly(&self, batch: Vec<Node>) {
        let mut nodes = self.nodes.lock().await;
        for node in batch {
            nodes.insert(node.path().to_string(), node);
        }
    }

    /// Notify `path` and its parent.
    pub(crate) fn notify_path(&self, path: &str) {
        let parent = node::parent(path);
        self.sink.notify(Change::Document(path.to_string()));
        self.sink.notify(Change::Document(parent.to_string()));
        tracing::debug!(path, parent, "notified change");
    }

    async fn update(&self, path: &str, node: Node) {
        let node = if node.path() == path {
            node
        } else {
            node.repath(path)
        };
        {
            let mut nodes = self.nodes.lock().await;
            tracing::debug!(path, kind = ?node.kind(), size = ?node.size(), "stored");
            nodes.insert(path.to_string(), node);
        }
        self.notify_path(path);
    }
}

/// The root entry may only be replaced by [`PathStore::reset`].
fn guard_root(path: &str, op: &str) -> StoreResult<()> {
    if path == ROOT {
        Err(StoreError::invalid_operation(format!("cannot {op} the root")))
    } else {
        Ok(())
    }
}
