use bit_set::BitSet;
use itertools::Itertools;
use ndarray::Array2;
use tracing::{trace, warn};

use super::WeightError;
use crate::{
    alphabet::Alphabet,
    automaton::{FiniteAutomaton, StateIndex},
    math,
};

/// Holds the normalized one-step transition matrix `M` of a deterministic and total automaton,
/// where `M[q][p]` is the fraction of symbols that lead from `q` to `p`. As every state has one
/// transition per symbol, `M` is a stochastic matrix: it describes the Markov chain that reads
/// uniformly random symbols.
///
/// Powers of `M` are computed on demand and memoized. The `i`-th power is always obtained from
/// the `(i - 1)`-th one by multiplying with `M`, so the cache grows strictly in order and is never
/// evicted. Next to the matrices, the cache keeps exact counts of the words of each length that
/// lead from the initial state into each state, see [`TransitionMatrixCache::accepted_words`].
///
/// The cache copies everything it needs out of the automaton, it holds no reference to it.
#[derive(Debug, Clone)]
pub struct TransitionMatrixCache {
    alphabet_size: usize,
    initial: StateIndex,
    finals: Vec<StateIndex>,
    transition_counts: Array2<u64>,
    /// `powers[i - 1]` is the `i`-th power of the one-step matrix.
    powers: Vec<Array2<f64>>,
    /// `word_counts[i][q]` is the number of words of length `i` leading from the initial state to `q`.
    word_counts: Vec<Vec<u128>>,
    counting_overflowed: bool,
}

impl TransitionMatrixCache {
    /// Builds the one-step transition matrix of `automaton`. This verifies that the automaton
    /// has a nonempty alphabet, exactly one initial state and precisely one transition per state
    /// and symbol, all of which are required for the weight to be well-defined.
    pub fn new<A: FiniteAutomaton>(automaton: &A) -> Result<Self, WeightError> {
        let alphabet = automaton.alphabet();
        let alphabet_size = alphabet.size();
        if alphabet_size == 0 {
            return Err(WeightError::EmptyAlphabet);
        }
        let size = automaton.number_of_states();

        let mut transition_counts = Array2::<u64>::zeros((size, size));
        for q in 0..size {
            let mut seen = BitSet::with_capacity(alphabet_size);
            for (p, symbol) in automaton.successors_with_letter(q) {
                if p >= size {
                    return Err(WeightError::UnknownState { state: p, size });
                }
                let Some(position) = alphabet.position(symbol) else {
                    return Err(WeightError::UnknownSymbol {
                        state: q,
                        symbol: format!("{symbol:?}"),
                    });
                };
                if !seen.insert(position) {
                    return Err(WeightError::NotDeterministic {
                        state: q,
                        symbol: format!("{symbol:?}"),
                    });
                }
                transition_counts[[q, p]] += 1;
            }
            if let Some(missing) = alphabet
                .universe()
                .enumerate()
                .find_map(|(position, symbol)| (!seen.contains(position)).then_some(symbol))
            {
                return Err(WeightError::NotTotal {
                    state: q,
                    symbol: format!("{missing:?}"),
                });
            }
        }

        let initials = automaton.initial_states();
        let initial = match initials.iter().copied().exactly_one() {
            Ok(initial) => initial,
            Err(_) if initials.is_empty() => return Err(WeightError::NoInitialState),
            Err(_) => {
                return Err(WeightError::AmbiguousInitialState {
                    initials: initials.iter().copied().sorted().collect(),
                })
            }
        };
        if initial >= size {
            return Err(WeightError::UnknownState {
                state: initial,
                size,
            });
        }

        let finals: Vec<_> = automaton.final_states().into_iter().sorted().collect();
        if let Some(&state) = finals.iter().find(|&&f| f >= size) {
            return Err(WeightError::UnknownState { state, size });
        }

        let one_step = transition_counts.mapv(|count| count as f64 / alphabet_size as f64);
        let mut start = vec![0u128; size];
        start[initial] = 1;

        trace!(
            "built one-step transition matrix for {size} states over {alphabet_size} symbols"
        );
        Ok(Self {
            alphabet_size,
            initial,
            finals,
            transition_counts,
            powers: vec![one_step],
            word_counts: vec![start],
            counting_overflowed: false,
        })
    }

    /// Returns the number of states, which is the dimension of the matrices.
    pub fn dimension(&self) -> usize {
        self.transition_counts.nrows()
    }

    /// Returns the number of symbols `k` in the alphabet of the automaton.
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Returns the final states in ascending order.
    pub fn finals(&self) -> &[StateIndex] {
        &self.finals
    }

    /// Returns true if `state` is final.
    pub fn is_final(&self, state: StateIndex) -> bool {
        self.finals.binary_search(&state).is_ok()
    }

    /// Returns true if the empty word is accepted, i.e. if the initial state is final.
    pub fn accepts_empty_word(&self) -> bool {
        self.is_final(self.initial)
    }

    /// Returns the matrix whose entry `(q, p)` is the number of symbols leading from `q` to `p`.
    pub fn transition_counts(&self) -> &Array2<u64> {
        &self.transition_counts
    }

    /// Returns the one-step matrix `M`.
    pub fn one_step(&self) -> &Array2<f64> {
        &self.powers[0]
    }

    /// Returns the largest word length for which the matrix power is currently cached.
    pub fn cached_lengths(&self) -> usize {
        self.powers.len()
    }

    fn extend_powers(&mut self, length: usize) {
        while self.powers.len() < length {
            let next = self.powers[self.powers.len() - 1].dot(&self.powers[0]);
            self.powers.push(next);
            trace!("cached transition matrix for words of length {}", self.powers.len());
        }
    }

    /// Returns the `length`-th power of the one-step matrix, computing all missing smaller powers first.
    ///
    /// # Panics
    /// Panics if `length` is zero, use [`TransitionMatrixCache::get_share`] for a guarded access.
    pub fn get_matrix(&mut self, length: usize) -> &Array2<f64> {
        assert!(length >= 1, "transition matrices are indexed from word length 1");
        self.extend_powers(length);
        &self.powers[length - 1]
    }

    /// Returns the probability that a uniformly random word of the given length leads from
    /// the initial state into a final state. Words of length zero contribute nothing, so `0`
    /// is returned for them.
    pub fn get_share(&mut self, length: usize) -> f64 {
        if length < 1 {
            return 0.0;
        }
        self.extend_powers(length);
        let matrix = &self.powers[length - 1];
        self.finals.iter().map(|&f| matrix[[self.initial, f]]).sum()
    }

    /// Returns the number of accepted words of the given length. The count is computed exactly with
    /// integer arithmetic as long as it fits into a `u128`, beyond that it is recovered from
    /// [`TransitionMatrixCache::get_share`] by scaling with `k^length` and rounding, which becomes
    /// infinite once `k^length` exceeds the range of an `f64`.
    pub fn accepted_words(&mut self, length: usize) -> f64 {
        match self.exact_accepted_words(length) {
            Some(count) => count as f64,
            None => {
                let words = math::pow(self.alphabet_size as f64, length);
                (self.get_share(length) * words).round()
            }
        }
    }

    /// Returns the fraction of words of the given length that are accepted, i.e. the number of
    /// [`TransitionMatrixCache::accepted_words`] divided by `k^length`. Unlike that count, the
    /// fraction stays finite for every length: once `k^length` no longer fits into an `f64`, the
    /// rounding to a whole number of words is meaningless and the share is returned as is.
    pub fn accepted_fraction(&mut self, length: usize) -> f64 {
        if length == 0 {
            return if self.accepts_empty_word() { 1.0 } else { 0.0 };
        }
        let words = math::pow(self.alphabet_size as f64, length);
        match self.exact_accepted_words(length) {
            Some(count) => count as f64 / words,
            None if words.is_finite() => (self.get_share(length) * words).round() / words,
            None => self.get_share(length),
        }
    }

    fn exact_accepted_words(&mut self, length: usize) -> Option<u128> {
        while self.word_counts.len() <= length {
            if self.counting_overflowed {
                return None;
            }
            match self.count_successors(self.word_counts.len() - 1) {
                Some(next) => self.word_counts.push(next),
                None => {
                    warn!(
                        "number of words of length {} exceeds exact range, falling back to rounded shares",
                        self.word_counts.len()
                    );
                    self.counting_overflowed = true;
                    return None;
                }
            }
        }
        let counts = &self.word_counts[length];
        self.finals
            .iter()
            .try_fold(0u128, |acc, &f| acc.checked_add(counts[f]))
    }

    fn count_successors(&self, length: usize) -> Option<Vec<u128>> {
        let current = &self.word_counts[length];
        let mut next = vec![0u128; current.len()];
        for (q, &words) in current.iter().enumerate() {
            if words == 0 {
                continue;
            }
            for (p, &symbols) in self.transition_counts.row(q).indexed_iter() {
                if symbols > 0 {
                    next[p] = next[p].checked_add(words.checked_mul(symbols as u128)?)?;
                }
            }
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    fn assert_close(left: &Array2<f64>, right: &Array2<f64>) {
        let difference = left - right;
        assert!(
            difference.iter().all(|d| d.abs() < 1e-12),
            "{left} differs from {right}"
        );
    }

    use crate::prelude::*;

    fn toggle_dfa() -> Dfa {
        Dfa::builder()
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
            .into_dfa(0)
            .unwrap()
    }

    /// Accepts words whose second to last symbol is an `a`.
    fn second_to_last_a() -> Dfa {
        Dfa::builder()
            .with_state_colors([false, false, true, true])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 3),
                (1, 'b', 2),
                (2, 'a', 1),
                (2, 'b', 0),
                (3, 'a', 3),
                (3, 'b', 2),
            ])
            .into_dfa(0)
            .unwrap()
    }

    fn power_by_squaring(matrix: &Array2<f64>, mut exponent: usize) -> Array2<f64> {
        let mut result = Array2::eye(matrix.nrows());
        let mut base = matrix.clone();
        while exponent > 0 {
            if exponent % 2 == 1 {
                result = result.dot(&base);
            }
            base = base.dot(&base);
            exponent /= 2;
        }
        result
    }

    #[test]
    fn one_step_matrix_is_stochastic() {
        let cache = TransitionMatrixCache::new(&second_to_last_a()).unwrap();
        assert_eq!(cache.dimension(), 4);
        assert_eq!(cache.alphabet_size(), 2);
        for row in cache.one_step().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-15);
        }
        assert_eq!(cache.transition_counts().row(0).sum(), 2);

        let cache = TransitionMatrixCache::new(&toggle_dfa()).unwrap();
        assert_eq!(cache.one_step(), &array![[0.5, 0.5], [0.5, 0.5]]);
    }

    #[test_log::test]
    fn cache_grows_in_order() {
        let mut cache = TransitionMatrixCache::new(&second_to_last_a()).unwrap();
        assert_eq!(cache.cached_lengths(), 1);
        assert_eq!(cache.get_share(0), 0.0);
        assert_eq!(cache.cached_lengths(), 1);

        let tenth = cache.get_matrix(10).clone();
        assert_eq!(cache.cached_lengths(), 10);
        let expected = power_by_squaring(cache.one_step(), 10);
        assert_close(&tenth, &expected);

        // asking for a smaller length does not recompute anything
        let third = cache.get_matrix(3).clone();
        assert_eq!(cache.cached_lengths(), 10);
        assert_close(&third, &power_by_squaring(cache.one_step(), 3));
    }

    #[test]
    #[should_panic]
    fn matrix_of_length_zero_is_not_stored() {
        let mut cache = TransitionMatrixCache::new(&toggle_dfa()).unwrap();
        cache.get_matrix(0);
    }

    #[test]
    #[cfg(feature = "random")]
    fn matrix_powers_agree_with_repeated_squaring() {
        for _ in 0..5 {
            let dfa = crate::random::generate_random_dfa(3, 6);
            let mut cache = TransitionMatrixCache::new(&dfa).unwrap();
            let one_step = cache.one_step().clone();
            for i in 1..=10 {
                let expected = power_by_squaring(&one_step, i);
                assert_close(cache.get_matrix(i), &expected);
            }
        }
    }

    #[test]
    #[cfg(feature = "random")]
    fn shares_are_probabilities() {
        for _ in 0..5 {
            let dfa = crate::random::generate_random_dfa(2, 8);
            let mut cache = TransitionMatrixCache::new(&dfa).unwrap();
            for i in 1..=20 {
                let share = cache.get_share(i);
                assert!((-1e-12..=1.0 + 1e-12).contains(&share), "{share}");
            }
        }
    }

    #[test]
    fn shares_count_accepted_words() {
        let mut cache = TransitionMatrixCache::new(&second_to_last_a()).unwrap();
        assert_eq!(cache.get_share(1), 0.0);
        assert_eq!(cache.accepted_words(1), 0.0);
        for i in 2..=12 {
            // half of all words have an `a` at the second to last position
            assert!((cache.get_share(i) - 0.5).abs() < 1e-12);
            assert_eq!(cache.accepted_words(i), 2f64.powi(i as i32 - 1));
        }
        assert!(!cache.accepts_empty_word());
        assert_eq!(cache.finals(), &[2, 3]);
    }

    #[test_log::test]
    fn accepted_words_fall_back_to_rounding() {
        let all = Dfa::builder()
            .with_state_colors([true])
            .with_edges([(0, 'a', 0), (0, 'b', 0), (0, 'c', 0), (0, 'd', 0)])
            .into_dfa(0)
            .unwrap();
        let mut cache = TransitionMatrixCache::new(&all).unwrap();
        assert_eq!(cache.accepted_words(10), 4f64.powi(10));
        // 4^64 = 2^128 no longer fits into an u128
        assert_eq!(cache.accepted_words(64), 4f64.powi(64));
        assert_eq!(cache.accepted_words(70), 4f64.powi(70));
    }

    #[test_log::test]
    fn accepted_fractions_stay_finite() {
        let mut cache = TransitionMatrixCache::new(&second_to_last_a()).unwrap();
        assert_eq!(cache.accepted_fraction(0), 0.0);
        assert_eq!(cache.accepted_fraction(1), 0.0);
        assert_eq!(cache.accepted_fraction(5), 0.5);
        // 2^1100 overflows an f64, the fraction does not
        let fraction = cache.accepted_fraction(1100);
        assert!((fraction - 0.5).abs() < 1e-9, "{fraction}");
        assert!(cache.accepted_words(1100).is_infinite());
    }
}
