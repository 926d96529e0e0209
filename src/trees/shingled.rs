//! Shingled random cut tree over ring-buffer windows.
//!
//! The memory-optimized variant: a leaf stores a window of the shared
//! scalar stream instead of a coordinate vector, and every branch carries
//! the bit-packed box metadata of [`BranchBounds`], so a descent
//! reconstructs child boxes in O(d) per level instead of touching the
//! leaves. Structural changes rebuild the metadata and the cached root box
//! by post-order recompute; the decoded boxes must match a from-leaves
//! recompute after every public operation, and the box-tightness tests
//! hold the variant to that.

use std::fmt;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::point::{Point, ShingledPoint};
use crate::trees::bounds::{BoundingBox, BranchBounds};
use crate::trees::cut::random_cut;
use crate::trees::node::{Branch, Leaf, Node, NodeArena, NodeId};
use crate::trees::render::render_tree;
use crate::trees::TreeError;

/// Random cut tree whose leaves are shingled windows of a scalar stream.
#[derive(Debug)]
pub struct ShingledTree {
    pub(crate) arena: NodeArena<ShingledPoint, BranchBounds>,
    pub(crate) root: Option<NodeId>,
    pub(crate) root_box: Option<BoundingBox>,
    dimension: usize,
    rng: Xoshiro256PlusPlus,
}

impl ShingledTree {
    /// Create an empty tree over windows of `shingle_size` scalars.
    pub fn new(rng: Xoshiro256PlusPlus, shingle_size: usize) -> Self {
        assert!(shingle_size > 0, "shingle size must be positive");
        Self {
            arena: NodeArena::new(),
            root: None,
            root_box: None,
            dimension: shingle_size,
            rng,
        }
    }

    /// Create an empty tree seeded from a 64-bit value.
    pub fn from_seed(seed: u64, shingle_size: usize) -> Self {
        Self::new(Xoshiro256PlusPlus::seed_from_u64(seed), shingle_size)
    }

    /// Window width; the tree's dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Total number of points held, duplicates included.
    pub fn len(&self) -> usize {
        self.root.map_or(0, |root| self.arena.get(root).num() as usize)
    }

    /// Returns true if the tree holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of distinct leaves.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.map_leaves(|_, _| count += 1);
        count
    }

    /// Borrow a leaf by handle, if still live.
    pub fn leaf(&self, id: NodeId) -> Option<&Leaf<ShingledPoint>> {
        self.arena.try_get(id).and_then(Node::as_leaf)
    }

    /// Coordinate-wise minimum over all stored windows; `None` when empty.
    pub fn min_box(&self) -> Option<&[f32]> {
        self.root_box.as_ref().map(|bbox| &*bbox.min)
    }

    /// Coordinate-wise maximum over all stored windows; `None` when empty.
    pub fn max_box(&self) -> Option<&[f32]> {
        self.root_box.as_ref().map(|bbox| &*bbox.max)
    }

    /// Insert one occurrence of `point`.
    ///
    /// A window already stored (same logical start) increments the
    /// existing leaf's count and every ancestor's. Otherwise a new leaf
    /// splits off some subtree under a freshly drawn random cut, and the
    /// branch metadata is rebuilt.
    pub fn insert_point(&mut self, point: &ShingledPoint) -> Result<NodeId, TreeError> {
        self.check_dimension(point)?;

        let Some(root) = self.root else {
            let bbox = BoundingBox::from_point(point);
            let id = self.arena.insert(Node::Leaf(Leaf {
                point: point.clone(),
                depth: 0,
                num: 1,
                parent: None,
            }));
            self.root = Some(id);
            self.root_box = Some(bbox);
            return Ok(id);
        };
        // root_box is Some whenever root is; the recompute arm is the
        // non-panicking fallback.
        let mut bbox = match &self.root_box {
            Some(root_box) => root_box.clone(),
            None => self.arena.subtree_box(root, self.dimension),
        };

        if let Some(duplicate) = self.find_leaf(point) {
            self.arena.update_counts_upwards(Some(duplicate), 1);
            return Ok(duplicate);
        }

        let mut node = root;
        let mut parent: Option<NodeId> = None;
        let mut depth = 0u32;
        let (leaf_id, branch_id, displaced) = loop {
            let cut = random_cut(&mut self.rng, point, &bbox);
            let leaf_left = if cut.value < bbox.min[cut.dim] {
                Some(true)
            } else if cut.value >= bbox.max[cut.dim] && point.coord(cut.dim) > cut.value {
                Some(false)
            } else if self.arena.get(node).is_leaf() {
                // The cut grazed a degenerate box; split by the descend rule.
                Some(point.coord(cut.dim) <= cut.value)
            } else {
                None
            };

            match leaf_left {
                Some(leaf_left) => {
                    let num = self.arena.get(node).num() + 1;
                    let leaf_box = BoundingBox::from_point(point);
                    let leaf_id = self.arena.insert(Node::Leaf(Leaf {
                        point: point.clone(),
                        depth: depth + 1,
                        num: 1,
                        parent: None,
                    }));
                    let (left, right, bounds) = if leaf_left {
                        let (bounds, _) = BranchBounds::encode(&leaf_box, &bbox);
                        (leaf_id, node, bounds)
                    } else {
                        let (bounds, _) = BranchBounds::encode(&bbox, &leaf_box);
                        (node, leaf_id, bounds)
                    };
                    let branch_id = self.arena.insert(Node::Branch(Branch {
                        cut,
                        left,
                        right,
                        num,
                        parent,
                        bounds,
                    }));
                    break (leaf_id, branch_id, node);
                }
                None => {
                    let branch = self.arena.branch(node);
                    parent = Some(node);
                    let use_left = point.coord(branch.cut.dim) <= branch.cut.value;
                    let child_box = branch.bounds.decode_child(&bbox, use_left);
                    node = if use_left { branch.left } else { branch.right };
                    bbox = child_box;
                    depth += 1;
                }
            }
        };

        self.arena.set_parent(displaced, Some(branch_id));
        self.arena.set_parent(leaf_id, Some(branch_id));
        match parent {
            Some(parent) => self.arena.replace_child(parent, displaced, branch_id),
            None => self.root = Some(branch_id),
        }
        self.arena.update_counts_upwards(parent, 1);
        self.arena.adjust_leaf_depths(displaced, 1);
        self.rebuild_bounds();
        Ok(leaf_id)
    }

    /// Remove one occurrence of `point`.
    ///
    /// Returns the affected leaf's handle; the handle is retired when the
    /// last occurrence goes, with the sibling spliced into the
    /// grandparent's slot and the branch metadata rebuilt.
    pub fn forget_point(&mut self, point: &ShingledPoint) -> Result<NodeId, TreeError> {
        self.check_dimension(point)?;
        let leaf = self.find_leaf(point).ok_or(TreeError::NotFound)?;

        if self.arena.get(leaf).num() > 1 {
            self.arena.update_counts_upwards(Some(leaf), -1);
            return Ok(leaf);
        }

        let parent = match self.arena.get(leaf).parent() {
            Some(parent) => parent,
            None => {
                self.arena.remove(leaf);
                self.root = None;
                self.root_box = None;
                return Ok(leaf);
            }
        };

        let sibling = self.arena.sibling(leaf);
        let grandparent = self.arena.get(parent).parent();
        self.arena.set_parent(sibling, grandparent);
        match grandparent {
            Some(grandparent) => self.arena.replace_child(grandparent, parent, sibling),
            None => self.root = Some(sibling),
        }
        self.arena.remove(leaf);
        self.arena.remove(parent);
        self.arena.update_counts_upwards(grandparent, -1);
        self.arena.adjust_leaf_depths(sibling, -1);
        self.rebuild_bounds();
        Ok(leaf)
    }

    /// Descend by cut comparisons to the leaf `point` routes to.
    ///
    /// The returned leaf need not store a window equal to `point`.
    pub fn query(&self, point: &ShingledPoint) -> Option<NodeId> {
        self.root.map(|root| self.arena.descend(root, point))
    }

    /// The leaf storing `point`'s window, when the query descent lands on
    /// it.
    pub fn find_leaf(&self, point: &ShingledPoint) -> Option<NodeId> {
        let candidate = self.query(point)?;
        let leaf = self.arena.get(candidate).as_leaf()?;
        (leaf.point == *point).then_some(candidate)
    }

    /// Maximum sibling-to-self count ratio on the leaf-to-root walk,
    /// floor-divided; 0 for the root.
    pub fn collusive_displacement(&self, leaf: NodeId) -> u32 {
        self.arena.collusive_displacement(leaf)
    }

    /// Visit every leaf, left to right.
    pub fn map_leaves<F>(&self, mut f: F)
    where
        F: FnMut(NodeId, &Leaf<ShingledPoint>),
    {
        if let Some(root) = self.root {
            self.arena.map_leaves_from(root, &mut f);
        }
    }

    /// Visit every branch in post-order.
    pub fn map_branches<F>(&self, mut f: F)
    where
        F: FnMut(NodeId, &Branch<BranchBounds>),
    {
        if let Some(root) = self.root {
            self.arena.map_branches_from(root, &mut f);
        }
    }

    fn check_dimension(&self, point: &ShingledPoint) -> Result<(), TreeError> {
        if point.dimension() != self.dimension {
            return Err(TreeError::DimensionMismatch {
                expected: self.dimension,
                got: point.dimension(),
            });
        }
        Ok(())
    }

    /// Rebuild every branch's metadata and the root box bottom-up.
    fn rebuild_bounds(&mut self) {
        self.root_box = self.root.map(|root| self.rebuild_node(root));
    }

    fn rebuild_node(&mut self, id: NodeId) -> BoundingBox {
        let (left, right) = match self.arena.get(id) {
            Node::Leaf(leaf) => return BoundingBox::from_point(&leaf.point),
            Node::Branch(branch) => (branch.left, branch.right),
        };
        let left_box = self.rebuild_node(left);
        let right_box = self.rebuild_node(right);
        let (bounds, merged) = BranchBounds::encode(&left_box, &right_box);
        self.arena.branch_mut(id).bounds = bounds;
        merged
    }

    /// Per-branch boxes decoded top-down from the root box.
    fn branch_boxes(&self) -> Vec<Option<BoundingBox>> {
        let mut boxes = vec![None; self.arena.capacity()];
        if let (Some(root), Some(root_box)) = (self.root, &self.root_box) {
            self.fill_boxes(root, root_box.clone(), &mut boxes);
        }
        boxes
    }

    fn fill_boxes(&self, id: NodeId, bbox: BoundingBox, boxes: &mut [Option<BoundingBox>]) {
        if let Node::Branch(branch) = self.arena.get(id) {
            let (left_box, right_box) = branch.bounds.decode(&bbox);
            let (left, right) = (branch.left, branch.right);
            boxes[id.index()] = Some(bbox);
            self.fill_boxes(left, left_box, boxes);
            self.fill_boxes(right, right_box, boxes);
        }
    }
}

impl fmt::Display for ShingledTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_tree(&self.arena, self.root, &self.branch_boxes()))
    }
}
