//! General random cut tree over dense points.
//!
//! Leaves own their full coordinate vectors. This variant carries no box
//! metadata; every descent step recomputes the current subtree's box from
//! its leaves, trading work for simplicity. It is the semantic baseline
//! the shingled variant is validated against.

use std::fmt;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::trees::bounds::BoundingBox;
use crate::trees::cut::random_cut;
use crate::trees::node::{Branch, Leaf, Node, NodeArena, NodeId};
use crate::trees::render::render_tree;
use crate::trees::TreeError;

/// Random cut tree storing full d-dimensional points at its leaves.
#[derive(Debug)]
pub struct RandomCutTree {
    pub(crate) arena: NodeArena<Box<[f32]>, ()>,
    pub(crate) root: Option<NodeId>,
    dimension: usize,
    rng: Xoshiro256PlusPlus,
}

impl RandomCutTree {
    /// Create an empty tree over `dimension`-dimensional points.
    pub fn new(rng: Xoshiro256PlusPlus, dimension: usize) -> Self {
        assert!(dimension > 0, "tree dimension must be positive");
        Self {
            arena: NodeArena::new(),
            root: None,
            dimension,
            rng,
        }
    }

    /// Create an empty tree seeded from a 64-bit value.
    pub fn from_seed(seed: u64, dimension: usize) -> Self {
        Self::new(Xoshiro256PlusPlus::seed_from_u64(seed), dimension)
    }

    /// Dimensionality of stored points.
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
    pub fn leaf(&self, id: NodeId) -> Option<&Leaf<Box<[f32]>>> {
        self.arena.try_get(id).and_then(Node::as_leaf)
    }

    /// Insert one occurrence of `point`.
    ///
    /// A duplicate of an existing leaf increments that leaf's count (and
    /// every ancestor's) and returns the existing handle. Otherwise a new
    /// leaf splits off some subtree under a freshly drawn random cut.
    pub fn insert_point(&mut self, point: &[f32]) -> Result<NodeId, TreeError> {
        self.check_dimension(point)?;

        let Some(root) = self.root else {
            let id = self.arena.insert(Node::Leaf(Leaf {
                point: point.into(),
                depth: 0,
                num: 1,
                parent: None,
            }));
            self.root = Some(id);
            return Ok(id);
        };

        if let Some(duplicate) = self.find_leaf(point) {
            self.arena.update_counts_upwards(Some(duplicate), 1);
            return Ok(duplicate);
        }

        let mut node = root;
        let mut parent: Option<NodeId> = None;
        let mut depth = 0u32;
        let (leaf_id, branch_id, displaced) = loop {
            let bbox = self.arena.subtree_box(node, self.dimension);
            let cut = random_cut(&mut self.rng, point, &bbox);
            let leaf_left = if cut.value < bbox.min[cut.dim] {
                Some(true)
            } else if cut.value >= bbox.max[cut.dim] && point[cut.dim] > cut.value {
                Some(false)
            } else if self.arena.get(node).is_leaf() {
                // The cut grazed a degenerate box; split by the descend rule.
                Some(point[cut.dim] <= cut.value)
            } else {
                None
            };

            match leaf_left {
                Some(leaf_left) => {
                    let num = self.arena.get(node).num() + 1;
                    let leaf_id = self.arena.insert(Node::Leaf(Leaf {
                        point: point.into(),
                        depth: depth + 1,
                        num: 1,
                        parent: None,
                    }));
                    let (left, right) = if leaf_left {
                        (leaf_id, node)
                    } else {
                        (node, leaf_id)
                    };
                    let branch_id = self.arena.insert(Node::Branch(Branch {
                        cut,
                        left,
                        right,
                        num,
                        parent,
                        bounds: (),
                    }));
                    break (leaf_id, branch_id, node);
                }
                None => {
                    let branch = self.arena.branch(node);
                    parent = Some(node);
                    node = if point[branch.cut.dim] <= branch.cut.value {
                        branch.left
                    } else {
                        branch.right
                    };
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
        Ok(leaf_id)
    }

    /// Remove one occurrence of `point`.
    ///
    /// Returns the affected leaf's handle; the handle is retired when the
    /// last occurrence goes. The leaf's former parent is discarded and its
    /// sibling spliced into the grandparent's slot.
    pub fn forget_point(&mut self, point: &[f32]) -> Result<NodeId, TreeError> {
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
        Ok(leaf)
    }

    /// Descend by cut comparisons to the leaf `point` routes to.
    ///
    /// The returned leaf need not store a point equal to `point`.
    pub fn query(&self, point: &[f32]) -> Option<NodeId> {
        self.root.map(|root| self.arena.descend(root, point))
    }

    /// The leaf storing a point equal to `point`, when the query descent
    /// lands on it.
    pub fn find_leaf(&self, point: &[f32]) -> Option<NodeId> {
        let candidate = self.query(point)?;
        let leaf = self.arena.get(candidate).as_leaf()?;
        (&*leaf.point == point).then_some(candidate)
    }

    /// Maximum sibling-to-self count ratio on the leaf-to-root walk,
    /// floor-divided; 0 for the root.
    pub fn collusive_displacement(&self, leaf: NodeId) -> u32 {
        self.arena.collusive_displacement(leaf)
    }

    /// Visit every leaf, left to right.
    pub fn map_leaves<F>(&self, mut f: F)
    where
        F: FnMut(NodeId, &Leaf<Box<[f32]>>),
    {
        if let Some(root) = self.root {
            self.arena.map_leaves_from(root, &mut f);
        }
    }

    /// Visit every branch in post-order.
    pub fn map_branches<F>(&self, mut f: F)
    where
        F: FnMut(NodeId, &Branch<()>),
    {
        if let Some(root) = self.root {
            self.arena.map_branches_from(root, &mut f);
        }
    }

    fn check_dimension(&self, point: &[f32]) -> Result<(), TreeError> {
        if point.len() != self.dimension {
            return Err(TreeError::DimensionMismatch {
                expected: self.dimension,
                got: point.len(),
            });
        }
        Ok(())
    }

    /// Per-branch boxes recomputed bottom-up from the leaves.
    fn branch_boxes(&self) -> Vec<Option<BoundingBox>> {
        let mut boxes = vec![None; self.arena.capacity()];
        if let Some(root) = self.root {
            self.fill_boxes(root, &mut boxes);
        }
        boxes
    }

    fn fill_boxes(&self, id: NodeId, boxes: &mut [Option<BoundingBox>]) -> BoundingBox {
        match self.arena.get(id) {
            Node::Leaf(leaf) => BoundingBox::from_point(&leaf.point),
            Node::Branch(branch) => {
                let (left, right) = (branch.left, branch.right);
                let merged = self
                    .fill_boxes(left, boxes)
                    .merge(&self.fill_boxes(right, boxes));
                boxes[id.index()] = Some(merged.clone());
                merged
            }
        }
    }
}

impl fmt::Display for RandomCutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_tree(&self.arena, self.root, &self.branch_boxes()))
    }
}
