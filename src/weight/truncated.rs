use super::{TransitionMatrixCache, WeightParameters};
use crate::math;

/// Returns the ratio of the number of words of length `length` to the number of words of length at
/// most `eta`, over an alphabet with `k` symbols. For `k > 1` this is `k^i (k - 1) / (k^(eta + 1) - 1)`,
/// which is evaluated as `(k - 1) / (k^(eta + 1 - i) - k^(-i))` so that it stays finite for any `eta`.
fn plateau_ratio(k: usize, eta: usize, length: usize) -> f64 {
    debug_assert!(length <= eta);
    if k == 1 {
        return 1.0 / (eta as f64 + 1.0);
    }
    let k = k as f64;
    (k - 1.0) / (math::pow(k, eta + 1 - length) - math::pow(k.recip(), length))
}

/// Computes the weight of the language restricted to a window of word lengths, in two regimes.
///
/// The plateau covers the lengths `0..=eta`. It receives the total mass `1 - λ^(eta + 1)`, which is
/// distributed uniformly over all words of these lengths, so that every accepted word of the plateau
/// contributes the same amount. Per length this is the mass times the accepted fraction of the words
/// of that length times their share among all plateau words, which avoids forming the (possibly huge)
/// number of plateau words.
///
/// The tail covers the lengths `eta + 1..up_to`, where the words of length `i` jointly weigh
/// `(1 - λ) · λ^i`, of which the accepted ones contribute their [`TransitionMatrixCache::get_share`].
/// If `up_to` does not exceed `eta + 1`, in particular for `up_to = 0`, the tail is empty and
/// only the plateau is computed.
///
/// # Panics
/// Panics if `eta` exceeds [`WeightParameters::MAX_ETA`].
pub fn truncated_weight(
    cache: &mut TransitionMatrixCache,
    eta: usize,
    lambda: f64,
    up_to: usize,
) -> f64 {
    assert!(
        eta <= WeightParameters::MAX_ETA,
        "threshold {eta} exceeds the largest supported threshold"
    );
    let plateau_mass = 1.0 - math::pow(lambda, eta + 1);
    let k = cache.alphabet_size();

    let mut weight = 0.0;
    for i in 0..=eta {
        let fraction = cache.accepted_fraction(i);
        if fraction > 0.0 {
            weight += plateau_mass * fraction * plateau_ratio(k, eta, i);
        }
    }

    let mut tail = 0.0;
    for i in (eta + 1)..up_to {
        tail += cache.get_share(i) * math::pow(lambda, i + 1);
    }
    // (1 - λ) / λ turns λ^(i + 1) into the geometric weight (1 - λ) λ^i
    weight + tail * ((1.0 - lambda) / lambda)
}

#[cfg(test)]
mod tests {
    use super::plateau_ratio;
    use crate::prelude::*;

    fn toggle_dfa() -> Dfa {
        Dfa::builder()
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
            .into_dfa(0)
            .unwrap()
    }

    fn universal(symbols: &[char]) -> Dfa {
        Dfa::builder()
            .with_state_colors([true])
            .with_edges(symbols.iter().map(|&s| (0, s, 0)))
            .into_dfa(0)
            .unwrap()
    }

    #[test]
    fn plateau_ratios() {
        // one of the three words of length at most one is empty
        assert!((plateau_ratio(2, 1, 0) - 1.0 / 3.0).abs() < 1e-15);
        assert!((plateau_ratio(2, 1, 1) - 2.0 / 3.0).abs() < 1e-15);
        // 27 of the 40 words over three symbols with length at most 3 have length 3
        assert!((plateau_ratio(3, 3, 3) - 27.0 / 40.0).abs() < 1e-15);
        assert_eq!(plateau_ratio(1, 4, 2), 0.2);

        // the ratios of all lengths sum to one, even where k^(eta + 1) overflows
        for (k, eta) in [(2, 10), (2, 1100), (26, 300)] {
            let sum: f64 = (0..=eta).map(|i| plateau_ratio(k, eta, i)).sum();
            assert!((sum - 1.0).abs() < 1e-12, "{k} {eta}: {sum}");
        }
    }

    #[test]
    fn plateau_of_toggle_automaton() {
        let mut cache = TransitionMatrixCache::new(&toggle_dfa()).unwrap();
        // three words of length at most one share the mass 0.75, only `b` is accepted
        assert!((truncated_weight(&mut cache, 1, 0.5, 0) - 0.25).abs() < 1e-15);
        // the geometric weight of length one is 0.5 * 0.5 * share(1)
        assert!((truncated_weight(&mut cache, 0, 0.5, 2) - 0.125).abs() < 1e-15);
    }

    #[test]
    fn empty_plateau_and_tail() {
        let mut cache = TransitionMatrixCache::new(&universal(&['a', 'b'])).unwrap();
        for lambda in [0.2, 0.5, 0.8] {
            // eta = 0 only covers the empty word, which receives 1 - λ
            let weight = truncated_weight(&mut cache, 0, lambda, 0);
            assert!((weight - (1.0 - lambda)).abs() < 1e-15);
            // tail bounds that do not exceed eta + 1 add nothing
            let plateau = truncated_weight(&mut cache, 3, lambda, 0);
            assert_eq!(truncated_weight(&mut cache, 3, lambda, 4), plateau);
        }
        assert_eq!(cache.cached_lengths(), 1);
    }

    #[test]
    fn universal_language_fills_plateau_and_tail() {
        let mut cache = TransitionMatrixCache::new(&universal(&['a', 'b', 'c'])).unwrap();
        for eta in 0..6 {
            for lambda in [0.25, 0.5, 0.9] {
                let plateau = truncated_weight(&mut cache, eta, lambda, 0);
                assert!((plateau - (1.0 - lambda.powi(eta as i32 + 1))).abs() < 1e-12);

                // plateau plus a long tail approaches the full mass
                let window = truncated_weight(&mut cache, eta, lambda, 500);
                assert!((window - 1.0).abs() < 1e-12, "{eta} {lambda}: {window}");
            }
        }
    }

    #[test]
    fn unary_alphabet() {
        let dfa = Dfa::builder()
            .with_state_colors([true, false])
            .with_edges([(0, 'a', 1), (1, 'a', 0)])
            .into_dfa(0)
            .unwrap();
        let mut cache = TransitionMatrixCache::new(&dfa).unwrap();
        // words of even length up to 3 are ε and aa, each of the four lengths gets 1/4 of 1 - λ^4
        let weight = truncated_weight(&mut cache, 3, 0.5, 0);
        assert!((weight - 2.0 * (1.0 - 0.0625) / 4.0).abs() < 1e-15);
    }

    #[test_log::test]
    fn plateau_of_large_thresholds() {
        let letters = CharAlphabet::of_size(26);
        for (symbols, eta, lambda) in [
            (&['a', 'b'][..], 1023, 0.999),
            (&['a', 'b'][..], 1100, 0.999),
            (letters.symbols(), 218, 0.99),
        ] {
            let mut cache = TransitionMatrixCache::new(&universal(symbols)).unwrap();
            let plateau = truncated_weight(&mut cache, eta, lambda, 0);
            let expected = 1.0 - lambda.powi(eta as i32 + 1);
            assert!((plateau - expected).abs() < 1e-10, "{eta}: {plateau}");
        }
    }

    #[test]
    #[should_panic]
    fn threshold_beyond_maximum() {
        let mut cache = TransitionMatrixCache::new(&universal(&['a'])).unwrap();
        truncated_weight(&mut cache, usize::MAX, 0.5, 0);
    }
}
