//! Library for measuring the size of regular languages, and thereby the distance between them.
//!
//! The size of a language $L$ accepted by a deterministic finite automaton (DFA) is expressed as its *weight*, which
//! depends on two parameters: a threshold $\eta$ and a decay rate $\lambda \in (0, 1]$. The words of length at most $\eta$
//! jointly receive the mass $1 - \lambda^{\eta + 1}$, which is distributed uniformly over all of them. The words of any longer length $i$
//! jointly receive the mass $(1 - \lambda) \lambda^i$, again distributed uniformly. The weight of $L$ is the sum of the weights of the
//! words in $L$, so the language of all words has weight one and the empty language has weight zero.
//!
//! Comparing automata, e.g. ones produced by different learning or minimization procedures, then amounts to computing the weight of
//! the symmetric difference of their languages, see [`weight::weight_diff`].
//!
//! The computation never sums the infinite series explicitly. Instead, it combines
//! - the solution of a linear system, which yields the weight under pure geometric decay (see [`weight::exact_weight`]),
//! - the powers of the transition matrix of the automaton, which is the Markov chain that reads uniformly random symbols. These
//!   are memoized in a [`weight::TransitionMatrixCache`] and give the fraction of words of each length that is accepted.
//!   From them the weight of the short words is computed and the geometric weight that the linear system assigned
//!   to short words is removed again (see [`weight::truncated_weight`]).
//!
//! Automata are consumed through the [`automaton::FiniteAutomaton`] trait, which only requires access to the states,
//! transitions, initial and final states as well as the alphabet. The crate comes with [`automaton::Dfa`], a
//! compact representation of total DFAs that also implements the product constructions needed by [`weight::weight_diff`].
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use wofa::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, CharAlphabet, Symbol},
        automaton::{
            AutomatonError, Dfa, DfaBuilder, FiniteAutomaton, StateIndex, SymbolOf,
            SymmetricDifference,
        },
        math,
        weight::{
            exact_state_weights, exact_weight, lambda_grid, truncated_weight, weight,
            weight_diff, weight_diff_values, weight_values, TransitionMatrixCache,
            WeightDifference, WeightDifferenceValues, WeightEngine, WeightError,
            WeightParameters,
        },
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets.
pub mod alphabet;

/// Defines the view on finite automata that the weight computation needs, together with a
/// concrete implementation for deterministic finite automata.
pub mod automaton;

/// Computation of the weight of a language and of the distance between two languages.
pub mod weight;

/// Implements the generation of random automata.
#[cfg(feature = "random")]
pub mod random;
