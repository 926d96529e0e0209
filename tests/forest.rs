//! Forest-level streaming behavior.

use approx::assert_abs_diff_eq;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use rrcf::{ShingledForest, ShingledForestBuilder};

#[test]
fn same_seed_reproduces_the_score_sequence() {
    let mut a = ShingledForest::new(9, 3, 5, 20);
    let mut b = ShingledForest::new(9, 3, 5, 20);
    let mut stream = Xoshiro256PlusPlus::seed_from_u64(77);

    for _ in 0..120 {
        let value = stream.gen::<f32>() * 100.0;
        let score_a = a.add_point(value);
        let score_b = b.add_point(value);
        assert!(score_a.is_finite());
        assert!(score_a >= 0.0);
        assert_abs_diff_eq!(score_a, score_b, epsilon = 1e-12);
    }
    assert_eq!(a.to_string(), b.to_string());
}

#[test]
fn window_bookkeeping_over_a_long_stream() {
    let mut forest = ShingledForest::new(3, 4, 3, 12);
    let mut stream = Xoshiro256PlusPlus::seed_from_u64(5);

    for _ in 0..200 {
        forest.add_point(stream.gen::<f32>() * 10.0);
    }
    assert_eq!(forest.len(), 12);
    for tree in forest.trees() {
        assert_eq!(tree.dimension(), 4);
        assert_eq!(tree.len(), 12);
        rrcf::testing::check_shingled_invariants(tree);
    }
}

#[test]
fn scores_start_at_zero_then_stay_at_least_one() {
    let mut forest = ShingledForestBuilder::new(2)
        .num_trees(4)
        .tree_size(16)
        .seed(42)
        .build();
    let mut stream = Xoshiro256PlusPlus::seed_from_u64(13);

    // No full window yet.
    assert_eq!(forest.add_point(stream.gen::<f32>()), 0.0);
    // The first window lands in empty trees: its leaf is the root.
    assert_eq!(forest.add_point(stream.gen::<f32>()), 0.0);
    // From the second window on, every fresh leaf has a sibling, so each
    // tree reports a displacement of at least 1.
    for _ in 0..30 {
        let score = forest.add_point(stream.gen::<f32>());
        assert!(score >= 1.0, "score {score} below the structural floor");
    }
}

#[test]
fn rendering_covers_every_tree() {
    let mut forest = ShingledForestBuilder::new(2)
        .num_trees(3)
        .tree_size(8)
        .seed(21)
        .build();
    let mut stream = Xoshiro256PlusPlus::seed_from_u64(2);
    for _ in 0..20 {
        forest.add_point(stream.gen::<f32>() * 50.0);
    }
    let rendered = forest.to_string();
    // Each tree holds 8 distinct windows: 8 leaf lines and 7 branch lines,
    // every branch line carrying its cut.
    let branch_lines = rendered.lines().filter(|l| l.contains("cut:")).count();
    let leaf_lines = rendered.lines().filter(|l| !l.contains("cut:")).count();
    assert_eq!(branch_lines, 3 * 7);
    assert_eq!(leaf_lines, 3 * 8);
}
