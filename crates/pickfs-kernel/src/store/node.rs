//! Nodes and path arithmetic.
//!
//! Paths are `/`-separated strings. The root is the single path `/`, every
//! other path starts with `/` and has no trailing slash. Hierarchy is derived
//! purely from the string: there are no parent pointers.

use std::sync::Arc;
use std::time::SystemTime;

/// The root path.
pub const ROOT: &str = "/";

/// Parent of `path`: everything before the last `/`.
///
/// Top-level paths and the root itself have `/` as their parent.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT,
        Some(idx) => &path[..idx],
    }
}

/// Join a leaf name onto a base path.
pub fn join(base: &str, leaf: &str) -> String {
    if base == ROOT {
        format!("/{leaf}")
    } else {
        format!("{base}/{leaf}")
    }
}

/// Number of `/`-separated segments. The root has depth 1.
pub fn depth(path: &str) -> usize {
    if path == ROOT {
        1
    } else {
        path.split('/').count()
    }
}

/// Final path segment. Empty for the root.
pub fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Kind of node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

/// An entry in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A file with an immutable payload.
    File {
        path: String,
        data: Arc<[u8]>,
        modified: SystemTime,
    },
    /// A folder. Carries no payload.
    Folder { path: String },
}

impl Node {
    /// Create a file node stamped with the current time.
    pub fn file(path: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::File {
            path: path.into(),
            data: data.into(),
            modified: SystemTime::now(),
        }
    }

    /// Create an empty file node.
    pub fn empty_file(path: impl Into<String>) -> Self {
        Self::file(path, Vec::<u8>::new())
    }

    /// Create a folder node.
    pub fn folder(path: impl Into<String>) -> Self {
        Self::Folder { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Folder { path } => path,
        }
    }

    /// Display name: the final path segment.
    pub fn name(&self) -> &str {
        name(self.path())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::File { .. } => NodeKind::File,
            Self::Folder { .. } => NodeKind::Folder,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Payload, for files.
    pub fn data(&self) -> Option<&Arc<[u8]>> {
        match self {
            Self::File { data, .. } => Some(data),
            Self::Folder { .. } => None,
        }
    }

    /// Payload length in bytes, for files.
    pub fn size(&self) -> Option<usize> {
        self.data().map(|d| d.len())
    }

    /// Last modification time, for files.
    pub fn modified(&self) -> Option<SystemTime> {
        match self {
            Self::File { modified, .. } => Some(*modified),
            Self::Folder { .. } => None,
        }
    }

    /// The same node at a different path.
    ///
    /// Files keep their payload and get a fresh modification time, as any
    /// newly written file would.
    pub(crate) fn repath(&self, to: &str) -> Self {
        match self {
            Self::File { data, .. } => Self::file(to, Arc::clone(data)),
            Self::Folder { .. } => Self::folder(to),
        }
    }
}
