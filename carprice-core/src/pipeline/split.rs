//! Seeded train/held-out split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shuffle with a seeded RNG and hold out `test_fraction` of the items.
///
/// The held-out size is `ceil(n * test_fraction)`, clamped so that at least
/// one item stays in the training partition when `n > 0`. The same seed and
/// input always give the same partitions.
pub fn train_test_split<T: Clone>(items: &[T], test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let n = items.len();
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let fraction = if test_fraction.is_finite() {
        test_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let n_test = ((n as f64 * fraction).ceil() as usize).min(n - 1);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let (test_idx, train_idx) = order.split_at(n_test);
    let pick = |idx: &[usize]| idx.iter().map(|&i| items[i].clone()).collect::<Vec<_>>();
    (pick(train_idx), pick(test_idx))
}
