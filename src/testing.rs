//! Invariant checkers shared by unit and integration tests.
//!
//! These walk a tree after a public operation and panic with context when
//! a structural invariant is broken: parent/child links, subtree counts,
//! partition correctness of every cut, leaf depths, and (shingled) the
//! tightness of every decoded bounding box against a from-leaves
//! recompute.
//!
//! The strict right-side partition check (`coord > cut`) presumes
//! general-position input; index-distinct windows with equal content
//! legitimately share their cut coordinate.

use crate::point::Point;
use crate::trees::bounds::BoundingBox;
use crate::trees::node::{Node, NodeArena, NodeId};
use crate::trees::{RandomCutTree, ShingledTree};

/// Check every structural invariant of a general tree.
pub fn check_general_invariants(tree: &RandomCutTree) {
    check_structure(&tree.arena, tree.root, tree.dimension());
}

/// Check every structural invariant of a shingled tree, including box
/// tightness of the bit-packed branch metadata.
pub fn check_shingled_invariants(tree: &ShingledTree) {
    check_structure(&tree.arena, tree.root, tree.dimension());
    match (tree.root, &tree.root_box) {
        (None, None) => {}
        (Some(root), Some(root_box)) => check_boxes(tree, root, root_box),
        _ => panic!("root handle and root box disagree about emptiness"),
    }
}

fn check_structure<P: Point, B>(arena: &NodeArena<P, B>, root: Option<NodeId>, dimension: usize) {
    let Some(root) = root else {
        assert_eq!(arena.len(), 0, "empty tree with live arena nodes");
        return;
    };
    assert_eq!(arena.get(root).parent(), None, "root must not have a parent");
    let total = check_node(arena, root, 0, dimension);
    assert_eq!(total, arena.get(root).num(), "root count out of sync");
}

fn check_node<P: Point, B>(
    arena: &NodeArena<P, B>,
    id: NodeId,
    depth: u32,
    dimension: usize,
) -> u32 {
    match arena.get(id) {
        Node::Leaf(leaf) => {
            assert!(leaf.num >= 1, "leaf with zero count");
            assert_eq!(leaf.depth, depth, "leaf depth out of sync");
            assert_eq!(leaf.point.dimension(), dimension);
            leaf.num
        }
        Node::Branch(branch) => {
            assert_eq!(
                arena.get(branch.left).parent(),
                Some(id),
                "left child does not point back at its branch"
            );
            assert_eq!(
                arena.get(branch.right).parent(),
                Some(id),
                "right child does not point back at its branch"
            );
            assert!(branch.cut.dim < dimension, "cut dimension out of range");

            let left_num = check_node(arena, branch.left, depth + 1, dimension);
            let right_num = check_node(arena, branch.right, depth + 1, dimension);
            assert_eq!(
                branch.num,
                left_num + right_num,
                "branch count is not the sum of its children"
            );

            let cut = branch.cut;
            arena.map_leaves_from(branch.left, &mut |_, leaf| {
                assert!(
                    leaf.point.coord(cut.dim) <= cut.value,
                    "left leaf violates cut ({}, {})",
                    cut.dim,
                    cut.value
                );
            });
            arena.map_leaves_from(branch.right, &mut |_, leaf| {
                assert!(
                    leaf.point.coord(cut.dim) > cut.value,
                    "right leaf violates cut ({}, {})",
                    cut.dim,
                    cut.value
                );
            });
            branch.num
        }
    }
}

fn check_boxes(tree: &ShingledTree, id: NodeId, bbox: &BoundingBox) {
    let exact = tree.arena.subtree_box(id, tree.dimension());
    assert_eq!(
        *bbox, exact,
        "decoded box is not the exact min/max over the subtree's leaves"
    );
    if let Node::Branch(branch) = tree.arena.get(id) {
        let (left_box, right_box) = branch.bounds.decode(bbox);
        check_boxes(tree, branch.left, &left_box);
        check_boxes(tree, branch.right, &right_box);
    }
}
