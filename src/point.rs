//! Point views over sample coordinates.
//!
//! Trees never care where coordinates live; they read them through the
//! [`Point`] accessor. The dense shape is a plain `f32` slice. The shingled
//! shape is a window into the shared scalar ring buffer: it stores a start
//! index and a width, and materializes coordinates lazily on read.

use crate::buffer::SharedBuffer;

/// Read-only accessor over a d-dimensional coordinate vector.
pub trait Point {
    /// Number of coordinates.
    fn dimension(&self) -> usize;

    /// Coordinate `i`, `0 <= i < dimension()`.
    fn coord(&self, i: usize) -> f32;

    /// Materialize all coordinates into an owned vector.
    fn to_vec(&self) -> Vec<f32> {
        (0..self.dimension()).map(|i| self.coord(i)).collect()
    }
}

impl Point for [f32] {
    #[inline]
    fn dimension(&self) -> usize {
        self.len()
    }

    #[inline]
    fn coord(&self, i: usize) -> f32 {
        self[i]
    }

    fn to_vec(&self) -> Vec<f32> {
        self.into()
    }
}

impl Point for Box<[f32]> {
    #[inline]
    fn dimension(&self) -> usize {
        self.len()
    }

    #[inline]
    fn coord(&self, i: usize) -> f32 {
        self[i]
    }

    fn to_vec(&self) -> Vec<f32> {
        self[..].into()
    }
}

/// A sliding window of the scalar stream viewed as a d-dimensional point.
///
/// Coordinate `i` reads logical index `start + i` of the shared ring
/// buffer. Two shingled points are equal iff they name the same logical
/// window of the same buffer; the coordinate values never enter the
/// comparison, so index-distinct windows with equal content stay distinct
/// points.
#[derive(Debug, Clone)]
pub struct ShingledPoint {
    buffer: SharedBuffer,
    start: u64,
    width: usize,
}

impl ShingledPoint {
    /// View `width` scalars of `buffer` starting at logical index `start`.
    pub fn new(buffer: SharedBuffer, start: u64, width: usize) -> Self {
        debug_assert!(width > 0, "shingle width must be positive");
        Self {
            buffer,
            start,
            width,
        }
    }

    /// Logical index of the window's first scalar.
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }
}

impl Point for ShingledPoint {
    #[inline]
    fn dimension(&self) -> usize {
        self.width
    }

    /// Reads through the shared buffer.
    ///
    /// # Panics
    /// Panics if the underlying scalar has been evicted; the forest keeps
    /// referenced windows live by forgetting them before eviction.
    #[inline]
    fn coord(&self, i: usize) -> f32 {
        debug_assert!(i < self.width);
        self.buffer.borrow().get(self.start + i as u64)
    }
}

impl PartialEq for ShingledPoint {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.width == other.width
            && std::rc::Rc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl Eq for ShingledPoint {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RingBuffer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stream(values: &[f32], capacity: usize) -> SharedBuffer {
        let mut buf = RingBuffer::with_capacity(capacity);
        for &v in values {
            buf.push(v);
        }
        Rc::new(RefCell::new(buf))
    }

    #[test]
    fn dense_point_reads_slice() {
        let p = [1.0f32, 2.0, 3.0];
        assert_eq!(p[..].dimension(), 3);
        assert_eq!(p[..].coord(1), 2.0);
        assert_eq!(p[..].to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn shingled_point_reads_window() {
        let buf = stream(&[0.0, 1.0, 2.0, 3.0, 4.0], 10);
        let p = ShingledPoint::new(buf, 2, 3);
        assert_eq!(p.dimension(), 3);
        assert_eq!(p.to_vec(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn shingled_point_reads_across_ring_seam() {
        // Capacity 4, six values pushed: physical storage wraps but logical
        // indices do not.
        let buf = stream(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 4);
        let p = ShingledPoint::new(buf, 3, 3);
        assert_eq!(p.to_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn equality_is_by_window_not_content() {
        let buf = stream(&[7.0, 7.0, 7.0, 7.0], 10);
        let a = ShingledPoint::new(buf.clone(), 0, 2);
        let b = ShingledPoint::new(buf.clone(), 1, 2);
        let c = ShingledPoint::new(buf, 0, 2);
        // Same content, different windows.
        assert_eq!(a.to_vec(), b.to_vec());
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
