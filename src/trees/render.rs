//! Textual tree rendering.
//!
//! The rendered string is a correctness artifact, not just debug output:
//! the general and shingled variants must produce byte-identical text for
//! the same seed and operation sequence, and golden tests compare the two.
//! Branch lines carry the cut and the branch's box; leaves print their
//! coordinates; the skeleton uses U+2500/U+2502/U+251C/U+2514 glyphs.

use crate::point::Point;
use crate::trees::bounds::BoundingBox;
use crate::trees::node::{Node, NodeArena, NodeId};

/// Render the tree under `root`; the empty tree renders as `""`.
///
/// `branch_boxes` is indexed by arena slot and must hold a box for every
/// live branch. Each variant supplies it its own way: the general tree
/// recomputes boxes from leaves, the shingled tree decodes its bit-packed
/// metadata top-down.
pub(crate) fn render_tree<P, B>(
    arena: &NodeArena<P, B>,
    root: Option<NodeId>,
    branch_boxes: &[Option<BoundingBox>],
) -> String
where
    P: Point,
{
    let mut out = String::new();
    if let Some(root) = root {
        let mut prefix = String::new();
        render_node(arena, root, branch_boxes, &mut prefix, &mut out);
    }
    out
}

fn render_node<P, B>(
    arena: &NodeArena<P, B>,
    id: NodeId,
    branch_boxes: &[Option<BoundingBox>],
    prefix: &mut String,
    out: &mut String,
) where
    P: Point,
{
    match arena.get(id) {
        Node::Leaf(leaf) => {
            out.push_str(&format!("({:?})\n", leaf.point.to_vec()));
        }
        Node::Branch(branch) => {
            match &branch_boxes[id.index()] {
                Some(bbox) => out.push_str(&format!(
                    "─+ cut: ({}, {:?}), box: ({:?}, {:?})\n",
                    branch.cut.dim, branch.cut.value, bbox.min, bbox.max
                )),
                None => out.push_str("─+\n"),
            }

            out.push_str(prefix);
            out.push_str(" ├──");
            let frame = prefix.len();
            prefix.push_str(" │  ");
            render_node(arena, branch.left, branch_boxes, prefix, out);
            prefix.truncate(frame);

            out.push_str(prefix);
            out.push_str(" └──");
            prefix.push_str("    ");
            render_node(arena, branch.right, branch_boxes, prefix, out);
            prefix.truncate(frame);
        }
    }
}
