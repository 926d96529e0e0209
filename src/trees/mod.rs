//! Random cut tree variants and their shared machinery.
//!
//! Two tree shapes implement the same contract. [`RandomCutTree`] stores
//! full d-dimensional points at its leaves and recomputes descent boxes
//! from scratch. [`ShingledTree`] stores ring-buffer windows and keeps a
//! bit-packed incremental box encoding on every branch. For the same seed
//! and operation sequence the two render byte-identical trees.

pub mod bounds;
pub mod cut;
pub mod general;
pub mod node;
pub(crate) mod render;
pub mod shingled;

pub use bounds::{BoundingBox, BranchBounds};
pub use cut::Cut;
pub use general::RandomCutTree;
pub use node::{Branch, Leaf, Node, NodeArena, NodeId};
pub use shingled::ShingledTree;

/// Errors surfaced by public tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A point's dimensionality does not match the tree's.
    #[error("point dimension {got} does not match tree dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// `forget_point` named a point no leaf stores (including any call on
    /// an empty tree).
    #[error("no leaf stores the given point")]
    NotFound,
}
