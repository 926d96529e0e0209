//! Axis-aligned bounding boxes and the bit-packed per-branch encoding.
//!
//! The shingled tree never stores both child boxes on a branch. Per
//! dimension it keeps one direction bit naming the child whose bound is
//! *looser* (larger min / smaller max) plus that looser bound; the tighter
//! child shares the parent's bound. Given the parent box, either child box
//! decodes in O(d) on the way down.

use fixedbitset::FixedBitSet;

use crate::point::Point;

/// Coordinate-wise min/max over a set of points.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Box<[f32]>,
    pub max: Box<[f32]>,
}

impl BoundingBox {
    /// The degenerate box covering a single point.
    pub fn from_point<P: Point + ?Sized>(point: &P) -> Self {
        let coords: Box<[f32]> = point.to_vec().into();
        Self {
            min: coords.clone(),
            max: coords,
        }
    }

    /// Number of dimensions.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    /// The smallest box covering `self` and `other`.
    pub fn merge(&self, other: &Self) -> Self {
        debug_assert_eq!(self.dimension(), other.dimension());
        let min = self
            .min
            .iter()
            .zip(other.min.iter())
            .map(|(&a, &b)| a.min(b))
            .collect();
        let max = self
            .max
            .iter()
            .zip(other.max.iter())
            .map(|(&a, &b)| a.max(b))
            .collect();
        Self { min, max }
    }

    /// Grow the box in place to cover `point`.
    pub fn extend<P: Point + ?Sized>(&mut self, point: &P) {
        debug_assert_eq!(self.dimension(), point.dimension());
        for i in 0..self.min.len() {
            let c = point.coord(i);
            if c < self.min[i] {
                self.min[i] = c;
            }
            if c > self.max[i] {
                self.max[i] = c;
            }
        }
    }
}

/// Bit-packed child-box metadata carried by every shingled branch.
///
/// Tie-break is deterministic: on an equal bound the left child supplies
/// the parent's value, so the direction bit points at the right child.
#[derive(Debug, Clone)]
pub struct BranchBounds {
    /// Bit `i` set: the left child's min along `i` is the looser (larger).
    min_loose_left: FixedBitSet,
    /// Bit `i` set: the left child's max along `i` is the looser (smaller).
    max_loose_left: FixedBitSet,
    /// The looser child's min per dimension.
    min_values: Box<[f32]>,
    /// The looser child's max per dimension.
    max_values: Box<[f32]>,
}

impl BranchBounds {
    /// Encode the metadata for a branch whose children cover exactly
    /// `left` and `right`. Also returns the branch's own (merged) box.
    pub fn encode(left: &BoundingBox, right: &BoundingBox) -> (Self, BoundingBox) {
        let d = left.dimension();
        debug_assert_eq!(d, right.dimension());
        let mut min_loose_left = FixedBitSet::with_capacity(d);
        let mut max_loose_left = FixedBitSet::with_capacity(d);
        let mut min_values = vec![0.0f32; d].into_boxed_slice();
        let mut max_values = vec![0.0f32; d].into_boxed_slice();
        let mut merged_min = vec![0.0f32; d].into_boxed_slice();
        let mut merged_max = vec![0.0f32; d].into_boxed_slice();
        for i in 0..d {
            if left.min[i] > right.min[i] {
                min_loose_left.insert(i);
                min_values[i] = left.min[i];
                merged_min[i] = right.min[i];
            } else {
                min_values[i] = right.min[i];
                merged_min[i] = left.min[i];
            }
            if left.max[i] < right.max[i] {
                max_loose_left.insert(i);
                max_values[i] = left.max[i];
                merged_max[i] = right.max[i];
            } else {
                max_values[i] = right.max[i];
                merged_max[i] = left.max[i];
            }
        }
        (
            Self {
                min_loose_left,
                max_loose_left,
                min_values,
                max_values,
            },
            BoundingBox {
                min: merged_min,
                max: merged_max,
            },
        )
    }

    /// Reconstruct both child boxes from the branch's own box.
    pub fn decode(&self, parent: &BoundingBox) -> (BoundingBox, BoundingBox) {
        (
            self.decode_child(parent, true),
            self.decode_child(parent, false),
        )
    }

    /// Reconstruct one child box from the branch's own box in O(d).
    ///
    /// The tighter child inherits the parent's bound; the looser child
    /// takes the stored value.
    pub fn decode_child(&self, parent: &BoundingBox, left_side: bool) -> BoundingBox {
        let d = parent.dimension();
        debug_assert_eq!(d, self.min_values.len());
        let mut min = vec![0.0f32; d].into_boxed_slice();
        let mut max = vec![0.0f32; d].into_boxed_slice();
        for i in 0..d {
            min[i] = if self.min_loose_left.contains(i) == left_side {
                self.min_values[i]
            } else {
                parent.min[i]
            };
            max[i] = if self.max_loose_left.contains(i) == left_side {
                self.max_values[i]
            } else {
                parent.max[i]
            };
        }
        BoundingBox { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(min: &[f32], max: &[f32]) -> BoundingBox {
        BoundingBox {
            min: min.into(),
            max: max.into(),
        }
    }

    #[test]
    fn merge_covers_both() {
        let a = boxed(&[0.0, 5.0], &[1.0, 6.0]);
        let b = boxed(&[-1.0, 5.5], &[0.5, 7.0]);
        let m = a.merge(&b);
        assert_eq!(&*m.min, &[-1.0, 5.0]);
        assert_eq!(&*m.max, &[1.0, 7.0]);
    }

    #[test]
    fn extend_with_point() {
        let mut b = boxed(&[0.0, 0.0], &[1.0, 1.0]);
        b.extend(&[-2.0f32, 0.5][..]);
        assert_eq!(&*b.min, &[-2.0, 0.0]);
        assert_eq!(&*b.max, &[1.0, 1.0]);
    }

    #[test]
    fn encode_decode_round_trip() {
        let left = boxed(&[0.0, 2.0, -1.0], &[3.0, 4.0, 0.0]);
        let right = boxed(&[1.0, 1.0, -3.0], &[2.0, 5.0, 2.0]);
        let (bounds, merged) = BranchBounds::encode(&left, &right);
        assert_eq!(&*merged.min, &[0.0, 1.0, -3.0]);
        assert_eq!(&*merged.max, &[3.0, 5.0, 2.0]);
        let (dl, dr) = bounds.decode(&merged);
        assert_eq!(dl, left);
        assert_eq!(dr, right);
    }

    #[test]
    fn tie_break_is_deterministic() {
        // Both children share every bound; the left child supplies the
        // parent's value and the stored (looser) value names the right.
        let shared = boxed(&[1.0, 2.0], &[3.0, 4.0]);
        let (bounds, merged) = BranchBounds::encode(&shared, &shared);
        let (dl, dr) = bounds.decode(&merged);
        assert_eq!(dl, shared);
        assert_eq!(dr, shared);
        for i in 0..2 {
            assert!(!bounds.min_loose_left.contains(i));
            assert!(!bounds.max_loose_left.contains(i));
        }
    }

    #[test]
    fn decode_single_child_matches_pairwise_decode() {
        let left = boxed(&[0.0, 0.0], &[2.0, 1.0]);
        let right = boxed(&[1.0, -1.0], &[3.0, 0.5]);
        let (bounds, merged) = BranchBounds::encode(&left, &right);
        let (dl, dr) = bounds.decode(&merged);
        assert_eq!(bounds.decode_child(&merged, true), dl);
        assert_eq!(bounds.decode_child(&merged, false), dr);
    }
}
