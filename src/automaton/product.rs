use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::trace;

use super::{AutomatonError, Dfa, FiniteAutomaton, StateIndex, SymmetricDifference};
use crate::{alphabet::Alphabet, math::Map};

/// A state of the product of two automata, which is a pair of states of the left and right automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ProductIndex(StateIndex, StateIndex);

/// Builds the product of `left` and `right`, restricted to the pairs of states that are reachable from
/// the pair of initial states. A pair is accepting if `accepting` returns true for the acceptance of its
/// components. States of the result are numbered in breadth-first order, so the initial pair is state 0.
fn product<F>(left: &Dfa, right: &Dfa, accepting: F) -> Result<Dfa, AutomatonError>
where
    F: Fn(bool, bool) -> bool,
{
    let alphabet = left.alphabet();
    if alphabet != right.alphabet() {
        return Err(AutomatonError::AlphabetMismatch {
            left: alphabet.clone(),
            right: right.alphabet().clone(),
        });
    }

    let start = ProductIndex(left.initial(), right.initial());
    let mut indices: Map<ProductIndex, StateIndex> = Map::from_iter([(start, 0)]);
    let mut queue = VecDeque::from([start]);
    let mut table = Vec::with_capacity(left.size() * alphabet.size());
    let mut accepting_states = BitSet::new();

    // pairs are dequeued in the order in which they received their index, so rows are pushed in order
    while let Some(pair @ ProductIndex(l, r)) = queue.pop_front() {
        if accepting(left.is_accepting(l), right.is_accepting(r)) {
            accepting_states.insert(indices[&pair]);
        }
        for (&lp, &rp) in left.row(l).iter().zip(right.row(r)) {
            let target = ProductIndex(lp, rp);
            let next = indices.len();
            let index = *indices.entry(target).or_insert_with(|| {
                queue.push_back(target);
                next
            });
            table.push(index);
        }
    }

    trace!(
        "built product of automata with {} and {} states, it has {} reachable states",
        left.size(),
        right.size(),
        indices.len()
    );
    Ok(Dfa::from_parts(alphabet.clone(), table, accepting_states, 0))
}

impl Dfa {
    /// Computes the intersection of `self` with `other` through a simple product construction.
    pub fn intersection(&self, other: &Dfa) -> Result<Dfa, AutomatonError> {
        product(self, other, |a, b| a && b)
    }

    /// Computes the union of `self` with `other` through a simple product construction.
    pub fn union(&self, other: &Dfa) -> Result<Dfa, AutomatonError> {
        product(self, other, |a, b| a || b)
    }

    /// Computes an automaton that accepts the words which are accepted by `self` but not by `other`.
    pub fn difference(&self, other: &Dfa) -> Result<Dfa, AutomatonError> {
        product(self, other, |a, b| a && !b)
    }

    /// Checks whether `self` and `other` accept the same language, which is the case if and only
    /// if their symmetric difference is empty.
    pub fn equivalent(&self, other: &Dfa) -> Result<bool, AutomatonError> {
        Ok(self.symmetric_difference(other)?.is_empty_language())
    }
}

impl SymmetricDifference for Dfa {
    fn subsets_symmetric_difference(&self, other: &Self) -> Result<(Self, Self), AutomatonError> {
        Ok((self.difference(other)?, other.difference(self)?))
    }

    fn symmetric_difference(&self, other: &Self) -> Result<Self, AutomatonError> {
        product(self, other, |a, b| a != b)
    }
}
