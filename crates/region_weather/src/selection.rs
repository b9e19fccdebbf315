//! Weighted random selection shared by weather patterns, wind patterns and events.

use crate::rng::WeatherRng;

/// Pick an index from `entries` with probability proportional to `here_chance`.
///
/// Draws `r = next_float() * total` and walks the entries subtracting each
/// weight; the first positive-weight entry that takes `r` to `<= 0` wins. If
/// rounding lets `r` survive the walk, the last entry is returned. When every
/// weight is zero the pick is uniform. Always consumes exactly one draw and
/// returns 0 for an empty slice.
pub fn pick_weighted<T>(
    entries: &[T],
    rng: &mut WeatherRng,
    mut here_chance: impl FnMut(&T) -> f32,
) -> usize {
    if entries.is_empty() {
        rng.next_float();
        return 0;
    }

    let weights: Vec<f32> = entries
        .iter()
        .map(|e| {
            let w = here_chance(e);
            if w.is_finite() && w > 0.0 {
                w
            } else {
                0.0
            }
        })
        .collect();
    let total: f32 = weights.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        return rng.next_int(entries.len() as u32) as usize;
    }

    let mut r = rng.next_float() * total;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        r -= w;
        if r <= 0.0 {
            return i;
        }
    }
    entries.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_frequencies_converge_to_weights() {
        let weights = [1.0f32, 3.0, 0.5, 2.5, 3.0];
        let total: f32 = weights.iter().sum();
        let mut counts = [0u32; 5];
        let mut draws = 0u32;

        // Fixed seed set
        let mut seeds = ChaCha8Rng::seed_from_u64(20_240_601);
        for _ in 0..20 {
            let mut rng = WeatherRng::for_region(seeds.gen(), seeds.gen(), seeds.gen());
            for _ in 0..5_000 {
                counts[pick_weighted(&weights, &mut rng, |w| *w)] += 1;
                draws += 1;
            }
        }

        for (i, w) in weights.iter().enumerate() {
            let expected = w / total;
            let observed = counts[i] as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.02,
                "entry {}: observed {} expected {}",
                i,
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let weights = [0.0f32, 1.0, 0.0, 1.0];
        let mut rng = WeatherRng::for_region(1, 2, 3);
        for _ in 0..5_000 {
            let i = pick_weighted(&weights, &mut rng, |w| *w);
            assert!(i == 1 || i == 3, "zero-weight entry {} picked", i);
        }
    }

    #[test]
    fn test_all_zero_weights_pick_uniformly() {
        let weights = [0.0f32; 4];
        let mut rng = WeatherRng::for_region(8, 8, 8);
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            seen[pick_weighted(&weights, &mut rng, |w| *w)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_negative_and_nan_weights_ignored() {
        let weights = [-5.0f32, f32::NAN, 2.0];
        let mut rng = WeatherRng::for_region(4, 4, 4);
        for _ in 0..500 {
            assert_eq!(pick_weighted(&weights, &mut rng, |w| *w), 2);
        }
    }

    #[test]
    fn test_single_entry_and_empty() {
        let mut rng = WeatherRng::for_region(0, 0, 0);
        assert_eq!(pick_weighted(&[7.0f32], &mut rng, |w| *w), 0);
        let empty: [f32; 0] = [];
        assert_eq!(pick_weighted(&empty, &mut rng, |w| *w), 0);
    }

    #[test]
    fn test_consumes_exactly_one_draw() {
        let weights = [1.0f32, 2.0];
        let mut a = WeatherRng::for_region(6, 6, 6);
        let mut b = WeatherRng::for_region(6, 6, 6);
        pick_weighted(&weights, &mut a, |w| *w);
        b.next_float();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rounding_overrun_falls_back_to_last_entry() {
        // Top 24 bits all set: the first draw is the largest float below 1.
        let mut rng = WeatherRng::from_seeds(0, 0, u64::MAX);
        let weights = [0.3f32, 0.9, 0.35, 0.0];
        assert_eq!(pick_weighted(&weights, &mut rng, |w| *w), 3);
    }

    #[test]
    fn test_same_seed_same_picks() {
        let weights = [1.0f32, 1.0, 1.0, 1.0];
        let mut a = WeatherRng::for_region(9, -1, 2);
        let mut b = WeatherRng::for_region(9, -1, 2);
        for _ in 0..100 {
            assert_eq!(
                pick_weighted(&weights, &mut a, |w| *w),
                pick_weighted(&weights, &mut b, |w| *w)
            );
        }
    }
}
