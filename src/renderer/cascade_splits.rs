use smallvec::SmallVec;

use super::MAX_SHADOW_CASCADES;

/// Smallest near plane the split scheme accepts; the logarithmic term is undefined at zero.
pub const MIN_NEAR_PLANE: f32 = 1e-4;
const SPLIT_EPS: f32 = 0.01;

pub type CascadeSplits = SmallVec<[f32; MAX_SHADOW_CASCADES]>;

/// Practical split scheme: blends logarithmic and uniform partitioning of `[near, far]`.
///
/// Returns one far distance per cascade, strictly increasing, with the last equal to `far`
/// (after `far` is pushed out to leave room for every cascade). `lambda` of 0 is uniform,
/// 1 is logarithmic.
pub fn compute_cascade_splits(near: f32, far: f32, cascade_count: usize, lambda: f32) -> CascadeSplits {
    let cascade_count = cascade_count.clamp(1, MAX_SHADOW_CASCADES);
    let near = if near.is_finite() { near.max(MIN_NEAR_PLANE) } else { MIN_NEAR_PLANE };
    let min_far = near + SPLIT_EPS * cascade_count as f32;
    let far = if far.is_finite() { far.max(min_far) } else { min_far };
    let lambda = if lambda.is_nan() { 0.5 } else { lambda.clamp(0.0, 1.0) };

    let mut splits = CascadeSplits::new();
    for cascade in 1..=cascade_count {
        let p = cascade as f32 / cascade_count as f32;
        let log_split = near * (far / near).powf(p);
        let uniform_split = near + (far - near) * p;
        splits.push(lambda * log_split + (1.0 - lambda) * uniform_split);
    }
    if let Some(last) = splits.last_mut() {
        *last = far;
    }
    splits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn default_settings_follow_the_blend_formula() {
        let splits = compute_cascade_splits(0.1, 200.0, 4, 0.5);
        assert_eq!(splits.len(), 4);
        for (idx, split) in splits.iter().enumerate() {
            let p = (idx + 1) as f32 / 4.0;
            let expected = 0.5 * (0.1 * 2000.0f32.powf(p)) + 0.5 * (0.1 + 199.9 * p);
            assert!(approx(*split, expected, 1e-2), "split {idx}: {split} vs {expected}");
        }
        assert_eq!(splits[3], 200.0);
    }

    #[test]
    fn zero_near_is_clamped() {
        let splits = compute_cascade_splits(0.0, 50.0, 3, 1.0);
        assert!(splits.iter().all(|s| s.is_finite() && *s > 0.0));
        assert_eq!(*splits.last().unwrap(), 50.0);
    }

    #[test]
    fn inverted_range_still_increases() {
        let splits = compute_cascade_splits(10.0, 5.0, 4, 0.5);
        for pair in splits.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert!(*splits.last().unwrap() > 10.0);
    }
}
