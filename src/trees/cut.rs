//! Random cut selection.
//!
//! A cut is drawn from the box covering the current subtree *and* the
//! candidate point. Dimensions are weighted by their span in that extended
//! box, so a dimension along which every coordinate agrees is never cut.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::point::Point;
use crate::trees::bounds::BoundingBox;

/// An axis-aligned hyperplane splitting a subtree: points with
/// `coord[dim] <= value` descend left, the rest right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut {
    /// Dimension the hyperplane is orthogonal to.
    pub dim: usize,
    /// Split threshold along `dim`.
    pub value: f32,
}

impl Cut {
    pub fn new(dim: usize, value: f32) -> Self {
        Self { dim, value }
    }
}

/// Draw a cut for inserting `point` below a subtree covered by `bbox`.
///
/// Extends `bbox` with `point`, draws `r ~ U[0, total_span)` and walks the
/// cumulative spans to the first dimension whose prefix sum reaches `r`.
/// The cut value lands inside that dimension's extended extent.
pub(crate) fn random_cut<P: Point + ?Sized>(
    rng: &mut Xoshiro256PlusPlus,
    point: &P,
    bbox: &BoundingBox,
) -> Cut {
    let d = bbox.dimension();
    debug_assert_eq!(d, point.dimension());
    let mut ext_min = vec![0.0f32; d];
    let mut span_sum = vec![0.0f32; d];
    let mut total = 0.0f32;
    for i in 0..d {
        let c = point.coord(i);
        ext_min[i] = bbox.min[i].min(c);
        let ext_max = bbox.max[i].max(c);
        total += ext_max - ext_min[i];
        span_sum[i] = total;
    }
    let r = rng.gen::<f32>() * total;
    // The last prefix sum equals `total >= r`, so the scan always lands;
    // the fallback only matters if rounding in the sums says otherwise.
    let mut dim = d - 1;
    for (i, &sum) in span_sum.iter().enumerate() {
        if sum >= r {
            dim = i;
            break;
        }
    }
    Cut::new(dim, ext_min[dim] + span_sum[dim] - r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn boxed(min: &[f32], max: &[f32]) -> BoundingBox {
        BoundingBox {
            min: min.into(),
            max: max.into(),
        }
    }

    #[test]
    fn cut_lands_in_extended_extent() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let bbox = boxed(&[0.0, 10.0], &[1.0, 12.0]);
        let point = [2.0f32, 9.0];
        for _ in 0..200 {
            let cut = random_cut(&mut rng, &point[..], &bbox);
            let lo = bbox.min[cut.dim].min(point[cut.dim]);
            let hi = bbox.max[cut.dim].max(point[cut.dim]);
            assert!(cut.value >= lo && cut.value <= hi, "cut {cut:?} outside [{lo}, {hi}]");
        }
    }

    #[test]
    fn zero_span_dimension_is_never_chosen() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        // Dimension 0 has no extent even after extension.
        let bbox = boxed(&[5.0, 0.0], &[5.0, 2.0]);
        let point = [5.0f32, 1.0];
        for _ in 0..200 {
            let cut = random_cut(&mut rng, &point[..], &bbox);
            assert_eq!(cut.dim, 1);
        }
    }

    #[test]
    fn spans_weight_dimension_choice() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        // Dimension 1 carries 99% of the total span.
        let bbox = boxed(&[0.0, 0.0], &[1.0, 99.0]);
        let point = [0.5f32, 50.0];
        let picks = (0..1000)
            .filter(|_| random_cut(&mut rng, &point[..], &bbox).dim == 1)
            .count();
        assert!(picks > 950, "dimension 1 picked only {picks}/1000 times");
    }

    #[test]
    fn same_seed_same_cuts() {
        let bbox = boxed(&[0.0], &[1.0]);
        let point = [0.25f32];
        let mut a = Xoshiro256PlusPlus::seed_from_u64(11);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(11);
        for _ in 0..32 {
            assert_eq!(
                random_cut(&mut a, &point[..], &bbox),
                random_cut(&mut b, &point[..], &bbox)
            );
        }
    }
}
