//! rrcf: robust random cut forests for streaming anomaly detection.
//!
//! This crate maintains an ensemble of randomized binary space-partition
//! trees over a sliding window of a scalar stream and scores each new
//! sample by its collusive displacement: how structurally disruptive the
//! sample is to the current model. Two tree variants share one contract,
//! a general tree over dense points and a memory-optimized shingled tree
//! that reconstructs points from a shared ring buffer, and they render
//! byte-identical trees under identical seeds and inputs.

pub mod buffer;
pub mod forest;
pub mod point;
pub mod testing;
pub mod trees;

pub use buffer::{RingBuffer, SharedBuffer};
pub use forest::{ShingledForest, ShingledForestBuilder};
pub use point::{Point, ShingledPoint};
pub use trees::{Cut, NodeId, RandomCutTree, ShingledTree, TreeError};
