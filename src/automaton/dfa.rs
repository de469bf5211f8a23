use std::collections::VecDeque;

use bit_set::BitSet;
use itertools::Itertools;

use super::{DfaBuilder, FiniteAutomaton, StateIndex};
use crate::{
    alphabet::{Alphabet, CharAlphabet},
    math::Set,
};

/// A deterministic finite automaton (DFA) with a single initial state. It is always total,
/// i.e. every state has precisely one outgoing transition for each symbol of the alphabet.
/// Transitions are stored in a flat table, the successor of state `q` on the `j`-th symbol
/// of the alphabet is found at position `q * k + j`, where `k` is the alphabet size.
///
/// Use [`DfaBuilder`] to construct instances.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Dfa {
    alphabet: CharAlphabet,
    table: Vec<StateIndex>,
    accepting: BitSet,
    initial: StateIndex,
}

/// Iterator over the outgoing transitions of a state of a [`Dfa`].
pub type Successors<'a> = std::iter::Zip<
    std::iter::Copied<std::slice::Iter<'a, StateIndex>>,
    std::iter::Copied<std::slice::Iter<'a, char>>,
>;

impl Dfa {
    /// Returns a new [`DfaBuilder`].
    pub fn builder() -> DfaBuilder {
        DfaBuilder::default()
    }

    /// Assembles a DFA from its parts. The caller ensures that `table` has `k` entries per state
    /// which all point to existing states and that `initial` exists.
    pub(crate) fn from_parts(
        alphabet: CharAlphabet,
        table: Vec<StateIndex>,
        accepting: BitSet,
        initial: StateIndex,
    ) -> Self {
        debug_assert!(!alphabet.is_empty());
        debug_assert_eq!(table.len() % alphabet.size(), 0);
        Self {
            alphabet,
            table,
            accepting,
            initial,
        }
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.table.len() / self.alphabet.size()
    }

    /// Returns the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Returns true if `state` is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.accepting.contains(state)
    }

    /// Returns the accepting states in ascending order.
    pub fn accepting_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.accepting.iter()
    }

    /// Renders the accepting states as `{q0, q1, ...}`, mainly useful for logging.
    pub fn show_accepting(&self) -> String {
        format!("{{{}}}", self.accepting.iter().join(", "))
    }

    pub(crate) fn row(&self, state: StateIndex) -> &[StateIndex] {
        let k = self.alphabet.size();
        &self.table[state * k..(state + 1) * k]
    }

    /// Returns the state reached from `state` on `symbol`, or `None` if either the state
    /// or the symbol do not exist.
    pub fn successor(&self, state: StateIndex, symbol: char) -> Option<StateIndex> {
        if state >= self.size() {
            return None;
        }
        let position = self.alphabet.position(symbol)?;
        Some(self.row(state)[position])
    }

    /// Runs `word` from the initial state and returns the state that is reached. Returns `None`
    /// if the word contains a symbol which is not part of the alphabet.
    pub fn reached_state<W: IntoIterator<Item = char>>(&self, word: W) -> Option<StateIndex> {
        word.into_iter()
            .try_fold(self.initial, |state, symbol| self.successor(state, symbol))
    }

    /// Returns true if `word` leads from the initial state into an accepting state.
    ///
    /// ```
    /// use wofa::prelude::*;
    ///
    /// let dfa = Dfa::builder()
    ///     .with_state_colors([false, true])
    ///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
    ///     .into_dfa(0)
    ///     .unwrap();
    /// assert!(dfa.accepts("abaa".chars()));
    /// assert!(!dfa.accepts("bb".chars()));
    /// ```
    pub fn accepts<W: IntoIterator<Item = char>>(&self, word: W) -> bool {
        self.reached_state(word)
            .is_some_and(|state| self.is_accepting(state))
    }

    /// Returns the states that are reachable from the initial state in breadth-first order.
    pub fn reachable_states(&self) -> Vec<StateIndex> {
        let mut seen = BitSet::with_capacity(self.size());
        let mut queue = VecDeque::from([self.initial]);
        let mut order = vec![];
        seen.insert(self.initial);

        while let Some(q) = queue.pop_front() {
            order.push(q);
            for &p in self.row(q) {
                if seen.insert(p) {
                    queue.push_back(p);
                }
            }
        }
        order
    }

    /// Returns true if and only if no accepting state is reachable from the initial state.
    pub fn is_empty_language(&self) -> bool {
        !self
            .reachable_states()
            .into_iter()
            .any(|q| self.is_accepting(q))
    }

    /// Computes the complement of `self` by swapping accepting and rejecting states.
    pub fn negation(&self) -> Self {
        let accepting = (0..self.size())
            .filter(|&q| !self.is_accepting(q))
            .collect();
        Self {
            accepting,
            ..self.clone()
        }
    }

    /// Returns a string representation of the transition table.
    pub fn transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            ["State".to_string(), "Accepting".to_string()]
                .into_iter()
                .chain(self.alphabet.universe().map(|s| format!("{:?}", s))),
        );
        for q in 0..self.size() {
            let state = if q == self.initial {
                format!("-> {q}")
            } else {
                q.to_string()
            };
            let accepting = if self.is_accepting(q) { "+" } else { "-" };
            builder.push_record(
                [state, accepting.to_string()]
                    .into_iter()
                    .chain(self.row(q).iter().map(|p| p.to_string())),
            );
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl std::fmt::Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.transition_table())
    }
}

impl FiniteAutomaton for Dfa {
    type Alphabet = CharAlphabet;

    type Successors<'this> = Successors<'this>;

    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn number_of_states(&self) -> usize {
        self.size()
    }

    /// # Panics
    /// Panics if `state` does not exist.
    fn successors_with_letter(&self, state: StateIndex) -> Successors<'_> {
        self.row(state)
            .iter()
            .copied()
            .zip(self.alphabet.symbols().iter().copied())
    }

    fn initial_states(&self) -> Set<StateIndex> {
        Set::from_iter([self.initial])
    }

    fn final_states(&self) -> Set<StateIndex> {
        self.accepting.iter().collect()
    }

    fn is_empty(&self) -> bool {
        self.is_empty_language()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn toggle_dfa() -> Dfa {
        Dfa::builder()
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
            .into_dfa(0)
            .unwrap()
    }

    #[test]
    fn dfa_runs_words() {
        let dfa = toggle_dfa();
        assert_eq!(dfa.size(), 2);
        assert_eq!(dfa.reached_state("abab".chars()), Some(0));
        assert_eq!(dfa.reached_state("abc".chars()), None);
        assert!(dfa.accepts("b".chars()));
        assert!(dfa.accepts("aaabbb".chars()));
        assert!(!dfa.accepts("".chars()));
        assert!(!dfa.accepts("bab".chars().chain(['c'])));
    }

    #[test]
    fn collaborator_view() {
        let dfa = toggle_dfa();
        assert_eq!(dfa.number_of_states(), 2);
        assert_eq!(
            dfa.successors_with_letter(1).collect::<Vec<_>>(),
            vec![(1, 'a'), (0, 'b')]
        );
        assert_eq!(dfa.initial_states(), math::Set::from_iter([0]));
        assert_eq!(dfa.final_states(), math::Set::from_iter([1]));
        assert!(!dfa.is_empty());
        assert_eq!(dfa.show_accepting(), "{1}");
    }

    #[test]
    fn negation_and_emptiness() {
        let dfa = toggle_dfa();
        let negated = dfa.negation();
        for word in ["", "a", "b", "ab", "bb", "bab"] {
            assert_ne!(dfa.accepts(word.chars()), negated.accepts(word.chars()));
        }

        // the accepting state 2 is not reachable
        let unreachable = Dfa::builder()
            .with_state_colors([false, false, true])
            .with_edges([(0, 'a', 1), (1, 'a', 0), (2, 'a', 2)])
            .into_dfa(0)
            .unwrap();
        assert_eq!(unreachable.reachable_states(), vec![0, 1]);
        assert!(unreachable.is_empty_language());
        assert!(!unreachable.negation().is_empty_language());
    }

    #[test]
    fn transition_table_lists_all_states() {
        let table = toggle_dfa().to_string();
        assert!(table.contains("State"));
        assert!(table.contains("-> 0"));
        assert!(table.contains("'b'"));
    }
}
