//! Synthetic test data.
//!
//! Fills the store with a randomized tree for manual and exploratory testing
//! of pickers against large listings.

use rand::Rng;
use rand::distributions::Alphanumeric;

use super::memory::PathStore;
use super::node::{self, Node, ROOT};

/// Default number of descendants generated under the synthetic folder.
pub const DEFAULT_SEED_COUNT: usize = 3000;

/// Fraction of generated nodes that are folders.
const FOLDER_RATIO: f64 = 0.2;

/// What a seeding run created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Path of the generated top-level folder.
    pub root: String,
    /// Folders created beneath `root`, not counting `root` itself.
    pub folders: usize,
    /// Files created beneath `root`.
    pub files: usize,
}

/// Plan a tree of `count` descendants under a fresh `/generated-*` folder.
///
/// Each node lands under a uniformly chosen folder generated before it.
/// Returns the nodes in insertion order, top-level folder first.
pub fn plan_tree<R: Rng + ?Sized>(count: usize, rng: &mut R) -> (SeedReport, Vec<Node>) {
    let suffix: String = (0..6)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    let root = node::join(ROOT, &format!("generated-{suffix}"));

    let mut folders = vec![root.clone()];
    let mut nodes = Vec::with_capacity(count + 1);
    nodes.push(Node::folder(root.clone()));
    let mut files = 0;

    for i in 0..count {
        let parent = &folders[rng.gen_range(0..folders.len())];
        if rng.gen_bool(FOLDER_RATIO) {
            let path = node::join(parent, &format!("folder-{i}"));
            nodes.push(Node::folder(path.clone()));
            folders.push(path);
        } else {
            let path = node::join(parent, &format!("file-{i}.txt"));
            let body = format!("generated file {i}\n").into_bytes();
            nodes.push(Node::file(path, body));
            files += 1;
        }
    }

    let report = SeedReport {
        root,
        folders: folders.len() - 1,
        files,
    };
    (report, nodes)
}

impl PathStore {
    /// Generate a synthetic tree of `count` descendants.
    ///
    /// Inserts skip per-node notification; one notification is sent for the
    /// generated folder once everything is in place.
    pub async fn seed_synthetic_tree(&self, count: usize) -> SeedReport {
        let (report, nodes) = {
            let mut rng = rand::thread_rng();
            plan_tree(count, &mut rng)
        };
        self.seed_planned(report, nodes).await
    }

    /// Insert a tree produced by [`plan_tree`].
    pub async fn seed_planned(&self, report: SeedReport, nodes: Vec<Node>) -> SeedReport {
        self.insert_quietly(nodes).await;
        self.notify_path(&report.root);
        tracing::info!(
            root = %report.root,
            folders = report.folders,
            files = report.files,
            "generated synthetic tree"
        );
        report
    }
}
