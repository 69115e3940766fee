//! Uniform sampling of distinct unordered pixel pairs.
//!
//! Pairs `(i, j)` with `i < j` over a point set of size `n` are enumerated as
//! `k = j·(j−1)/2 + i`, so drawing `k` without replacement from
//! `0..C(n, 2)` yields distinct pairs of distinct pixels. The random source is
//! always passed in; nothing here touches thread-local randomness.
use rand::seq::index;
use rand::Rng;

/// Number of unordered pairs of distinct points, `C(n, 2)`.
#[inline]
pub fn pair_count(n: usize) -> usize {
    if n < 2 {
        0
    } else if n % 2 == 0 {
        (n / 2).saturating_mul(n - 1)
    } else {
        n.saturating_mul((n - 1) / 2)
    }
}

/// Inverse of the pair enumeration: linear index → `(i, j)` with `i < j`.
pub fn decode_pair(k: usize) -> (usize, usize) {
    let mut j = ((1.0 + (1.0 + 8.0 * k as f64).sqrt()) / 2.0) as usize;
    j = j.max(1);
    // Float rounding can land one off for large k.
    while j > 1 && pair_count(j) > k {
        j -= 1;
    }
    while pair_count(j + 1) <= k {
        j += 1;
    }
    (k - pair_count(j), j)
}

/// Append `min(max_pairs, C(n, 2))` distinct pairs to `out`.
///
/// Returns the number of pairs appended.
pub fn sample_pairs<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    max_pairs: usize,
    out: &mut Vec<(usize, usize)>,
) -> usize {
    let total = pair_count(n);
    let amount = max_pairs.min(total);
    if amount == 0 {
        return 0;
    }
    out.extend(index::sample(rng, total, amount).into_iter().map(decode_pair));
    amount
}
