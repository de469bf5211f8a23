use thiserror::Error;

use crate::{
    alphabet::{Alphabet, CharAlphabet},
    math::Set,
};

mod builder;
pub use builder::DfaBuilder;

mod dfa;
pub use dfa::{Dfa, Successors};

mod product;

/// States are identified by their position, i.e. an automaton with `n` states has the
/// states `0, 1, ..., n - 1`.
pub type StateIndex = usize;

/// Type alias for the symbols of the alphabet over which the automaton `A` operates.
pub type SymbolOf<A> = <<A as FiniteAutomaton>::Alphabet as Alphabet>::Symbol;

/// Errors that can occur when constructing or combining automata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    /// An automaton needs at least one symbol to read.
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,
    /// Two different targets were given for the same state and symbol.
    #[error("state {state} has more than one transition on {symbol:?}")]
    NondeterministicEdge {
        /// Origin of the conflicting transitions.
        state: StateIndex,
        /// Symbol of the conflicting transitions.
        symbol: char,
    },
    /// A state has no outgoing transition on some symbol.
    #[error("state {state} has no transition on {symbol:?}")]
    MissingTransition {
        /// The state lacking a transition.
        state: StateIndex,
        /// The symbol on which no transition exists.
        symbol: char,
    },
    /// A product construction was attempted on automata over different alphabets.
    #[error("alphabets {left} and {right} do not match")]
    AlphabetMismatch {
        /// Alphabet of the left operand.
        left: CharAlphabet,
        /// Alphabet of the right operand.
        right: CharAlphabet,
    },
}

/// The view on a finite automaton that the weight computation consumes. Implementors are
/// expected to be deterministic and total, meaning that [`FiniteAutomaton::successors_with_letter`]
/// yields exactly one transition for every symbol of the alphabet. This is checked
/// before weights are computed, see [`crate::weight::TransitionMatrixCache::new`].
pub trait FiniteAutomaton {
    /// The alphabet over which the automaton reads words.
    type Alphabet: Alphabet;

    /// Iterator over the outgoing transitions of a state.
    type Successors<'this>: Iterator<Item = (StateIndex, SymbolOf<Self>)>
    where
        Self: 'this;

    /// Returns a reference to the alphabet. Its size determines how the probability
    /// mass of a word is distributed over its successors.
    fn alphabet(&self) -> &Self::Alphabet;

    /// Returns the number of states.
    fn number_of_states(&self) -> usize;

    /// Returns an iterator over pairs `(target, symbol)`, one for each outgoing transition of `state`.
    fn successors_with_letter(&self, state: StateIndex) -> Self::Successors<'_>;

    /// Returns the set of initial states.
    fn initial_states(&self) -> Set<StateIndex>;

    /// Returns the set of final (accepting) states.
    fn final_states(&self) -> Set<StateIndex>;

    /// Returns true if and only if the automaton accepts no word at all.
    fn is_empty(&self) -> bool;
}

/// Automata whose languages can be split along their symmetric difference.
pub trait SymmetricDifference: FiniteAutomaton + Sized {
    /// Returns a pair of automata. The first one accepts exactly the words that are accepted
    /// by `self` but not by `other`, the second one those accepted by `other` but not by `self`.
    fn subsets_symmetric_difference(&self, other: &Self) -> Result<(Self, Self), AutomatonError>;

    /// Returns an automaton accepting the words that are accepted by precisely one of
    /// `self` and `other`.
    fn symmetric_difference(&self, other: &Self) -> Result<Self, AutomatonError>;
}
