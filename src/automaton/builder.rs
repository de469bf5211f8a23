use bit_set::BitSet;

use super::{AutomatonError, Dfa, StateIndex};
use crate::{
    alphabet::{Alphabet, CharAlphabet},
    math::{Map, Set},
};

/// Helper struct for the construction of [`Dfa`]s. It collects a list of transitions and a list of
/// state colors (where `true` marks an accepting state) and checks upon conversion that the
/// result is deterministic and total.
///
/// # Example
///
/// We want to create a DFA with two states 0 and 1 over the alphabet `['a', 'b']`. We want to add the following transitions:
/// - From state 0 to state 0 on symbol 'a'
/// - From state 0 to state 1 on symbol 'b'
/// - From state 1 to state 1 on symbol 'a'
/// - From state 1 to state 0 on symbol 'b'
///
/// Further, state 0 should be initial and rejecting, while state 1 should be accepting.
/// ```
/// use wofa::prelude::*;
///
/// let dfa = DfaBuilder::default()
///     .with_state_colors([false, true]) // colors given in the order of the states
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
///     .into_dfa(0) // 0 is the initial state
///     .unwrap();
/// assert_eq!(dfa.size(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DfaBuilder {
    symbols: Set<char>,
    edges: Vec<(StateIndex, char, StateIndex)>,
    colors: Map<StateIndex, bool>,
}

impl DfaBuilder {
    /// By default, the only alphabet symbols in the automaton that is built are the ones that
    /// appear on at least one transition. This method can be used to force
    /// additional alphabet symbols to appear, which then need transitions as well.
    pub fn with_alphabet_symbols<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        self.symbols.extend(symbols);
        self
    }

    /// Adds a list of colors to `self`. The colors are assigned to the states in the order in which they are given.
    /// States that never receive a color are rejecting.
    pub fn with_state_colors<I: IntoIterator<Item = bool>>(self, iter: I) -> Self {
        iter.into_iter()
            .enumerate()
            .fold(self, |acc, (q, accepting)| acc.color(q, accepting))
    }

    /// Assigns the given color to the state `state`, overwriting a previously assigned color.
    pub fn color(mut self, state: StateIndex, accepting: bool) -> Self {
        self.colors.insert(state, accepting);
        self
    }

    /// Adds a list of transitions `(origin, symbol, target)` to `self`.
    pub fn with_edges<I: IntoIterator<Item = (StateIndex, char, StateIndex)>>(
        mut self,
        edges: I,
    ) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Builds the [`Dfa`] with initial state `initial`. The states of the automaton are
    /// `0..n`, where `n - 1` is the largest state mentioned in a transition, a color or as the
    /// initial state. Fails if the alphabet is empty, if some state has two different targets
    /// on one symbol or if some state lacks a transition.
    pub fn into_dfa(self, initial: StateIndex) -> Result<Dfa, AutomatonError> {
        let alphabet: CharAlphabet = self
            .edges
            .iter()
            .map(|(_, c, _)| *c)
            .chain(self.symbols)
            .collect();
        if alphabet.is_empty() {
            return Err(AutomatonError::EmptyAlphabet);
        }
        let k = alphabet.size();

        let size = self
            .edges
            .iter()
            .flat_map(|(q, _, p)| [*q, *p])
            .chain(self.colors.keys().copied())
            .chain([initial])
            .max()
            .map_or(0, |max| max + 1);

        let mut table: Vec<Option<StateIndex>> = vec![None; size * k];
        for (q, symbol, p) in self.edges {
            // every symbol on an edge is part of the alphabet by construction
            let Some(position) = alphabet.position(symbol) else {
                continue;
            };
            match table[q * k + position] {
                Some(existing) if existing != p => {
                    return Err(AutomatonError::NondeterministicEdge { state: q, symbol });
                }
                _ => table[q * k + position] = Some(p),
            }
        }

        let table = table
            .into_iter()
            .enumerate()
            .map(|(i, target)| {
                target.ok_or(AutomatonError::MissingTransition {
                    state: i / k,
                    symbol: alphabet[i % k],
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let accepting: BitSet = self
            .colors
            .into_iter()
            .filter_map(|(q, accepting)| accepting.then_some(q))
            .collect();

        Ok(Dfa::from_parts(alphabet, table, accepting, initial))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn builds_sink_state_automaton() {
        let dfa = DfaBuilder::default()
            .with_state_colors([true])
            .color(1, false)
            .with_edges([(0, 'a', 1), (0, 'b', 1), (1, 'a', 1), (1, 'b', 1)])
            .into_dfa(0)
            .unwrap();
        assert_eq!(dfa.size(), 2);
        assert!(dfa.accepts("".chars()));
        assert!(!dfa.accepts("a".chars()));
        assert_eq!(dfa.alphabet(), &CharAlphabet::of_size(2));
    }

    #[test]
    fn recoloring_overwrites() {
        let dfa = DfaBuilder::default()
            .with_state_colors([true, true])
            .color(0, false)
            .color(1, false)
            .color(1, true)
            .with_edges([(0, 'a', 1), (1, 'a', 0)])
            .into_dfa(0)
            .unwrap();
        assert_eq!(dfa.show_accepting(), "{1}");
    }

    #[test]
    fn colors_many_states() {
        let size = 20_000;
        let dfa = DfaBuilder::default()
            .with_state_colors((0..size).map(|q| q % 3 == 0))
            .with_edges((0..size).map(|q| (q, 'a', (q + 1) % size)))
            .into_dfa(0)
            .unwrap();
        assert_eq!(dfa.size(), size);
        assert_eq!(dfa.accepting_states().count(), (size + 2) / 3);
        assert!(dfa.accepts("aaa".chars()));
        assert!(!dfa.accepts("a".chars()));
    }

    #[test]
    fn rejects_partial_automata() {
        let result = DfaBuilder::default()
            .with_edges([(0, 'a', 1), (0, 'b', 0), (1, 'a', 1)])
            .into_dfa(0);
        assert_eq!(
            result,
            Err(AutomatonError::MissingTransition {
                state: 1,
                symbol: 'b'
            })
        );

        // the additional symbol 'c' needs transitions as well
        let result = DfaBuilder::default()
            .with_alphabet_symbols(['c'])
            .with_edges([(0, 'a', 0)])
            .into_dfa(0);
        assert!(matches!(
            result,
            Err(AutomatonError::MissingTransition { symbol: 'c', .. })
        ));
    }

    #[test]
    fn rejects_nondeterministic_automata() {
        let result = DfaBuilder::default()
            .with_edges([(0, 'a', 0), (0, 'a', 1), (1, 'a', 1)])
            .into_dfa(0);
        assert_eq!(
            result,
            Err(AutomatonError::NondeterministicEdge {
                state: 0,
                symbol: 'a'
            })
        );
    }

    #[test]
    fn rejects_empty_alphabet() {
        assert_eq!(
            DfaBuilder::default().with_state_colors([true]).into_dfa(0),
            Err(AutomatonError::EmptyAlphabet)
        );
    }
}
