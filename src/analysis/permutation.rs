//! Index-addressable permutations.
//!
//! Permutation `k` of `0..n` is decoded from the factorial number system (Lehmer code), so
//! the whole space `0..n!` can be split across worker threads without shared iterators.

/// `n!`, or `None` on overflow.
pub fn factorial(n: usize) -> Option<usize> {
    (1..=n).try_fold(1usize, |acc, i| acc.checked_mul(i))
}

/// Writes the `k`-th lexicographic permutation of `0..n` into `out`.
///
/// `pool` is scratch space; both buffers are cleared first.
///
/// # Panics
/// Panics if `k >= n!`.
pub fn nth_permutation(n: usize, mut k: usize, pool: &mut Vec<usize>, out: &mut Vec<usize>) {
    pool.clear();
    pool.extend(0..n);
    out.clear();

    let mut radix = factorial(n.saturating_sub(1)).unwrap_or(usize::MAX);
    assert!(n == 0 || k / radix < n, "permutation index out of range");
    for remaining in (1..=n).rev() {
        let idx = k / radix;
        k %= radix;
        out.push(pool.remove(idx));
        if remaining > 1 {
            radix /= remaining - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), Some(1));
        assert_eq!(factorial(5), Some(120));
        assert_eq!(factorial(200), None);
    }

    #[test]
    fn test_permutations_are_lexicographic_and_distinct() {
        let (mut pool, mut out) = (Vec::new(), Vec::new());
        let mut all = Vec::new();
        for k in 0..6 {
            nth_permutation(3, k, &mut pool, &mut out);
            all.push(out.clone());
        }
        assert_eq!(
            all,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
    }

    #[test]
    fn test_single_and_empty() {
        let (mut pool, mut out) = (Vec::new(), Vec::new());
        nth_permutation(1, 0, &mut pool, &mut out);
        assert_eq!(out, vec![0]);
        nth_permutation(0, 0, &mut pool, &mut out);
        assert!(out.is_empty());
    }
}
