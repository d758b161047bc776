//! The path store.
//!
//! - [`PathStore`] - insertion-ordered, path-keyed node map behind one lock
//! - [`Node`] - a file (immutable payload) or a folder
//! - path helpers - [`parent`], [`join`], [`depth`], [`name`]
//! - [`plan_tree`] / [`PathStore::seed_synthetic_tree`] - synthetic test data

mod memory;
mod node;
mod seed;

pub use memory::PathStore;
pub use node::{Node, NodeKind, ROOT, depth, join, name, parent};
pub use seed::{DEFAULT_SEED_COUNT, SeedReport, plan_tree};
