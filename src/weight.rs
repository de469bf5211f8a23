use itertools::Itertools;
use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

use crate::automaton::{AutomatonError, FiniteAutomaton, StateIndex, SymmetricDifference};

mod exact;
pub use exact::{exact_state_weights, exact_weight};

mod matrix;
pub use matrix::TransitionMatrixCache;

mod truncated;
pub use truncated::truncated_weight;

/// Errors that can occur when computing weights.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    /// The decay rate has to lie in the interval `(0, 1]`.
    #[error("decay rate must lie in (0, 1], got {lambda}")]
    InvalidDecay {
        /// The rejected decay rate.
        lambda: f64,
    },
    /// The threshold is too large to be evaluated.
    #[error("threshold {eta} exceeds the largest supported threshold {max}", max = WeightParameters::MAX_ETA)]
    InvalidThreshold {
        /// The rejected threshold.
        eta: usize,
    },
    /// Weights are only defined over a nonempty alphabet.
    #[error("alphabet of the automaton is empty")]
    EmptyAlphabet,
    /// A state that does not exist was referenced.
    #[error("state {state} is referenced, but the automaton only has {size} states")]
    UnknownState {
        /// The referenced state.
        state: StateIndex,
        /// Number of states of the automaton.
        size: usize,
    },
    /// A transition is labeled with a symbol that does not belong to the alphabet.
    #[error("state {state} has a transition on {symbol}, which is not part of the alphabet")]
    UnknownSymbol {
        /// Origin of the transition.
        state: StateIndex,
        /// The symbol, rendered with its `Debug` representation.
        symbol: String,
    },
    /// The automaton is not deterministic.
    #[error("automaton is not deterministic, state {state} has more than one transition on {symbol}")]
    NotDeterministic {
        /// The state with multiple transitions.
        state: StateIndex,
        /// The symbol, rendered with its `Debug` representation.
        symbol: String,
    },
    /// The automaton is not total.
    #[error("automaton is not total, state {state} has no transition on {symbol}")]
    NotTotal {
        /// The state that lacks a transition.
        state: StateIndex,
        /// The symbol, rendered with its `Debug` representation.
        symbol: String,
    },
    /// The automaton has no initial state.
    #[error("automaton has no initial state")]
    NoInitialState,
    /// Weights are only defined for automata with exactly one initial state, as distinct initial
    /// states may accept languages of different weight.
    #[error("weights require exactly one initial state, found {initials:?}")]
    AmbiguousInitialState {
        /// All initial states, in ascending order.
        initials: Vec<StateIndex>,
    },
    /// The linear system for the exact weight has no unique solution.
    #[error("linear system of {states} states has no unique solution for decay rate {lambda}")]
    SingularSystem {
        /// Number of states, i.e. the dimension of the system.
        states: usize,
        /// The decay rate for which the system was set up.
        lambda: f64,
    },
    /// An operation on the underlying automata failed.
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}

/// The two parameters of the weight. Words of length at most `eta` all receive the same weight,
/// longer words decay geometrically with rate `lambda`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightParameters {
    eta: usize,
    lambda: f64,
}

impl WeightParameters {
    /// The largest admissible threshold. Exponents up to `eta + 1` then fit into an `i32`.
    pub const MAX_ETA: usize = i32::MAX as usize - 1;

    /// Creates a new set of parameters, failing if `eta` exceeds [`WeightParameters::MAX_ETA`]
    /// or if `lambda` does not lie in `(0, 1]`.
    pub fn new(eta: usize, lambda: f64) -> Result<Self, WeightError> {
        if eta > Self::MAX_ETA {
            return Err(WeightError::InvalidThreshold { eta });
        }
        if !(lambda > 0.0 && lambda <= 1.0) {
            return Err(WeightError::InvalidDecay { lambda });
        }
        Ok(Self { eta, lambda })
    }

    /// Threshold up to which (inclusively) words are weighted uniformly.
    pub fn eta(&self) -> usize {
        self.eta
    }

    /// Decay rate of the weight of words longer than `eta`.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

/// Weight of the symmetric difference of two languages, split into its two halves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightDifference {
    /// Weight of the words accepted only by the left automaton.
    pub left_only: f64,
    /// Weight of the words accepted only by the right automaton.
    pub right_only: f64,
    /// Weight of the whole symmetric difference, the sum of both halves.
    pub total: f64,
}

impl From<WeightDifference> for (f64, f64, f64) {
    fn from(value: WeightDifference) -> Self {
        (value.left_only, value.right_only, value.total)
    }
}

/// Sweep matrices of a [`WeightDifference`], see [`weight_diff_values`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightDifferenceValues {
    /// Weights of the words accepted only by the left automaton.
    pub left_only: Array2<f64>,
    /// Weights of the words accepted only by the right automaton.
    pub right_only: Array2<f64>,
    /// Weights of the whole symmetric difference.
    pub total: Array2<f64>,
}

/// Computes weights of the language of one automaton. The engine owns a [`TransitionMatrixCache`],
/// so repeated evaluations for different parameters reuse the matrix powers computed so far.
///
/// The weight for parameters `eta` and `λ` is assembled from three parts:
/// - the exact weight under pure geometric decay ([`exact_weight`]), which covers all lengths,
/// - plus the plateau weight of the lengths `0..=eta` ([`truncated_weight`] without tail),
/// - minus the geometric weight that the exact solution assigned to the lengths `0..=eta`
///   ([`truncated_weight`] with `eta = 0` and a tail up to `eta + 1`).
///
/// # Example
/// ```
/// use wofa::prelude::*;
///
/// let dfa = Dfa::builder()
///     .with_state_colors([false, true])
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
///     .into_dfa(0)
///     .unwrap();
/// let mut engine = WeightEngine::new(&dfa).unwrap();
/// let weight = engine.weight(WeightParameters::new(1, 0.5).unwrap()).unwrap();
/// assert!((weight - 0.375).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct WeightEngine {
    cache: TransitionMatrixCache,
}

impl WeightEngine {
    /// Creates an engine for `automaton`, which must be deterministic and total and have exactly
    /// one initial state.
    pub fn new<A: FiniteAutomaton>(automaton: &A) -> Result<Self, WeightError> {
        Ok(Self::from_cache(TransitionMatrixCache::new(automaton)?))
    }

    /// Creates an engine that continues with an existing cache.
    pub fn from_cache(cache: TransitionMatrixCache) -> Self {
        Self { cache }
    }

    /// Returns a reference to the underlying cache.
    pub fn cache(&self) -> &TransitionMatrixCache {
        &self.cache
    }

    /// Consumes the engine and returns its cache.
    pub fn into_cache(self) -> TransitionMatrixCache {
        self.cache
    }

    /// Computes the weight of the language for the given parameters.
    pub fn weight(&mut self, parameters: WeightParameters) -> Result<f64, WeightError> {
        let WeightParameters { eta, lambda } = parameters;

        let exact = exact_weight(&self.cache, lambda)?;
        let plateau = truncated_weight(&mut self.cache, eta, lambda, 0);
        let geometric_head = truncated_weight(&mut self.cache, 0, lambda, eta + 1);
        let weight = exact + plateau - geometric_head;

        debug!(
            "weight for eta {eta} and lambda {lambda} is {weight} (exact {exact}, plateau {plateau}, replaced {geometric_head})"
        );
        Ok(weight)
    }

    /// Computes the weights for all combinations of the given values. The entry in row `i` and
    /// column `j` of the result is the weight for `lambdas[i]` and `etas[j]`.
    pub fn weight_values(
        &mut self,
        etas: &[usize],
        lambdas: &[f64],
    ) -> Result<Array2<f64>, WeightError> {
        let mut values = Array2::zeros((lambdas.len(), etas.len()));
        for (row, &lambda) in lambdas.iter().enumerate() {
            for (column, &eta) in etas.iter().enumerate() {
                values[[row, column]] = self.weight(WeightParameters::new(eta, lambda)?)?;
            }
        }
        Ok(values)
    }
}

/// Computes the weight of the language of the deterministic and total automaton `automaton`.
/// Words up to length `eta` all receive the same weight, longer words decay geometrically with
/// rate `lambda`. The weight of the language of all words is one.
pub fn weight<A: FiniteAutomaton>(
    automaton: &A,
    eta: usize,
    lambda: f64,
) -> Result<f64, WeightError> {
    let parameters = WeightParameters::new(eta, lambda)?;
    WeightEngine::new(automaton)?.weight(parameters)
}

/// Returns an engine for `automaton`, or `None` if it accepts no word. Empty languages have weight
/// zero, and automata without final states need not satisfy the preconditions of the engine.
fn engine_unless_empty<A: FiniteAutomaton>(
    automaton: &A,
) -> Result<Option<WeightEngine>, WeightError> {
    if automaton.is_empty() {
        return Ok(None);
    }
    WeightEngine::new(automaton).map(Some)
}

/// Computes the weight of the symmetric difference of the languages of `left` and `right`, which
/// measures how far apart the two languages are. The result is split into the weight of the
/// words accepted only by `left` and the weight of those accepted only by `right`.
pub fn weight_diff<A: SymmetricDifference>(
    left: &A,
    right: &A,
    eta: usize,
    lambda: f64,
) -> Result<WeightDifference, WeightError> {
    let parameters = WeightParameters::new(eta, lambda)?;
    let (only_left, only_right) = left.subsets_symmetric_difference(right)?;

    let weight_of = |automaton: &A| -> Result<f64, WeightError> {
        match engine_unless_empty(automaton)? {
            Some(mut engine) => engine.weight(parameters),
            None => Ok(0.0),
        }
    };
    let left_only = weight_of(&only_left)?;
    let right_only = weight_of(&only_right)?;

    Ok(WeightDifference {
        left_only,
        right_only,
        total: left_only + right_only,
    })
}

/// Determines the weight of `automaton` for all combinations of `etas` and `lambdas`, with one
/// row per decay rate and one column per threshold. All evaluations share one cache.
pub fn weight_values<A: FiniteAutomaton>(
    automaton: &A,
    etas: &[usize],
    lambdas: &[f64],
) -> Result<Array2<f64>, WeightError> {
    WeightEngine::new(automaton)?.weight_values(etas, lambdas)
}

/// Determines [`weight_diff`] for all combinations of `etas` and `lambdas`, laid out as in
/// [`weight_values`]. The symmetric difference is computed only once.
pub fn weight_diff_values<A: SymmetricDifference>(
    left: &A,
    right: &A,
    etas: &[usize],
    lambdas: &[f64],
) -> Result<WeightDifferenceValues, WeightError> {
    let (only_left, only_right) = left.subsets_symmetric_difference(right)?;
    let shape = (lambdas.len(), etas.len());

    let values_of = |automaton: &A| -> Result<Array2<f64>, WeightError> {
        match engine_unless_empty(automaton)? {
            Some(mut engine) => engine.weight_values(etas, lambdas),
            None => {
                // parameters are validated even if no weight needs to be computed
                for (&lambda, &eta) in lambdas.iter().cartesian_product(etas) {
                    WeightParameters::new(eta, lambda)?;
                }
                Ok(Array2::zeros(shape))
            }
        }
    };
    let left_only = values_of(&only_left)?;
    let right_only = values_of(&only_right)?;
    let total = &left_only + &right_only;

    Ok(WeightDifferenceValues {
        left_only,
        right_only,
        total,
    })
}

/// Returns `n` evenly spaced decay rates, starting at `0.5` and staying below `1`. This is the
/// default range of decay rates for sweeps with [`weight_values`].
pub fn lambda_grid(n: usize) -> Vec<f64> {
    (0..n).map(|j| 0.5 + 0.5 * j as f64 / n as f64).collect()
}
