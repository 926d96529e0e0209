//! Shingled random cut forest.
//!
//! The forest owns the scalar ring buffer and an ensemble of
//! independently seeded shingled trees. Each observed scalar slides the
//! window forward one position: the oldest window is forgotten from every
//! tree before its first scalar is evicted, the new window is inserted
//! into every tree, and the sample's anomaly score is the mean collusive
//! displacement of the freshly inserted leaves.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::buffer::{RingBuffer, SharedBuffer};
use crate::point::ShingledPoint;
use crate::trees::ShingledTree;

/// Ensemble of shingled random cut trees over one scalar stream.
pub struct ShingledForest {
    trees: Vec<ShingledTree>,
    buffer: SharedBuffer,
    shingle_size: usize,
    tree_size: usize,
}

impl ShingledForest {
    /// Create a forest of `num_trees` trees over windows of
    /// `shingle_size` scalars, each tree holding at most `tree_size`
    /// windows. Per-tree seeds are drawn from a master generator seeded
    /// with `seed`, so one seed reproduces the whole ensemble.
    ///
    /// # Panics
    /// Panics if any of the sizes is zero.
    pub fn new(seed: u64, shingle_size: usize, num_trees: usize, tree_size: usize) -> Self {
        assert!(shingle_size > 0, "shingle size must be positive");
        assert!(num_trees > 0, "forest needs at least one tree");
        assert!(tree_size > 0, "trees must hold at least one window");
        let mut master = Xoshiro256PlusPlus::seed_from_u64(seed);
        let trees = (0..num_trees)
            .map(|_| ShingledTree::from_seed(master.gen::<u64>(), shingle_size))
            .collect();
        // Exactly the scalars of `tree_size` consecutive windows.
        let capacity = tree_size + shingle_size - 1;
        Self {
            trees,
            buffer: Rc::new(RefCell::new(RingBuffer::with_capacity(capacity))),
            shingle_size,
            tree_size,
        }
    }

    /// Number of trees in the ensemble.
    #[inline]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Maximum number of windows each tree holds.
    #[inline]
    pub fn tree_size(&self) -> usize {
        self.tree_size
    }

    /// Window width.
    #[inline]
    pub fn shingle_size(&self) -> usize {
        self.shingle_size
    }

    /// Number of windows currently held by each tree.
    pub fn len(&self) -> usize {
        self.trees[0].len()
    }

    /// Returns true if no window has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.trees[0].is_empty()
    }

    /// Observe one scalar and return its anomaly score.
    ///
    /// Returns `0.0` until the stream has produced a full window. A
    /// forget that cannot find its window would mean the forest broke its
    /// own bookkeeping, and panics.
    pub fn add_point(&mut self, value: f32) -> f64 {
        let (full, oldest_start) = {
            let buffer = self.buffer.borrow();
            (buffer.is_full(), buffer.first_index())
        };
        // Drop the oldest window while its scalars are still readable.
        if full {
            for tree in &mut self.trees {
                let point =
                    ShingledPoint::new(self.buffer.clone(), oldest_start, self.shingle_size);
                tree.forget_point(&point)
                    .expect("forest forgets only windows it inserted");
            }
        }

        self.buffer.borrow_mut().push(value);

        let (len, next) = {
            let buffer = self.buffer.borrow();
            (buffer.len(), buffer.next_index())
        };
        if len < self.shingle_size {
            return 0.0;
        }

        let start = next - self.shingle_size as u64;
        let mut total = 0.0f64;
        for tree in &mut self.trees {
            let point = ShingledPoint::new(self.buffer.clone(), start, self.shingle_size);
            let leaf = tree
                .insert_point(&point)
                .expect("window width matches tree dimension");
            total += tree.collusive_displacement(leaf) as f64;
        }
        total / self.trees.len() as f64
    }

    /// Borrow the ensemble's trees.
    pub fn trees(&self) -> &[ShingledTree] {
        &self.trees
    }
}

impl fmt::Display for ShingledForest {
    /// Every tree's rendering in order, one after another.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tree in &self.trees {
            write!(f, "{tree}")?;
        }
        Ok(())
    }
}

/// Builder for [`ShingledForest`] with the usual ensemble defaults.
///
/// ```
/// use rrcf::ShingledForestBuilder;
///
/// let mut forest = ShingledForestBuilder::new(4)
///     .num_trees(10)
///     .tree_size(64)
///     .seed(17)
///     .build();
/// let score = forest.add_point(1.5);
/// assert_eq!(score, 0.0); // no full window yet
/// ```
pub struct ShingledForestBuilder {
    shingle_size: usize,
    num_trees: usize,
    tree_size: usize,
    seed: u64,
}

impl ShingledForestBuilder {
    /// Start a builder for windows of `shingle_size` scalars.
    ///
    /// Defaults: 50 trees of up to 256 windows, seed 0.
    pub fn new(shingle_size: usize) -> Self {
        Self {
            shingle_size,
            num_trees: 50,
            tree_size: 256,
            seed: 0,
        }
    }

    /// Set the number of trees in the ensemble.
    pub fn num_trees(mut self, num_trees: usize) -> Self {
        self.num_trees = num_trees;
        self
    }

    /// Set the maximum number of windows per tree.
    pub fn tree_size(mut self, tree_size: usize) -> Self {
        self.tree_size = tree_size;
        self
    }

    /// Set the master seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the forest.
    pub fn build(self) -> ShingledForest {
        ShingledForest::new(self.seed, self.shingle_size, self.num_trees, self.tree_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let forest = ShingledForestBuilder::new(3).build();
        assert_eq!(forest.shingle_size(), 3);
        assert_eq!(forest.num_trees(), 50);
        assert_eq!(forest.tree_size(), 256);
    }

    #[test]
    fn scores_are_zero_until_first_window() {
        let mut forest = ShingledForest::new(1, 4, 2, 8);
        for i in 0..3 {
            assert_eq!(forest.add_point(i as f32), 0.0);
            assert!(forest.is_empty());
        }
        forest.add_point(3.0);
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn tree_population_is_bounded_by_tree_size() {
        let mut forest = ShingledForest::new(2, 3, 2, 5);
        for i in 0..40 {
            forest.add_point((i * 13 % 17) as f32);
        }
        assert_eq!(forest.len(), 5);
        for tree in forest.trees() {
            assert_eq!(tree.len(), 5);
        }
    }
}
