use ndarray::{Array1, Array2};
use tracing::debug;

use super::{TransitionMatrixCache, WeightError};
use crate::math;

/// Computes for every state `q` the weight `x_q` of the language accepted from `q`, where each word
/// `w` contributes `(1 - λ) · λ^|w| / k^|w|`. There is no plateau for short words, every length
/// decays geometrically.
///
/// Instead of summing the infinite series, this solves the linear system given by the recurrence
/// ```text
/// x_q = λ/k · Σ_p count(q, p) · x_p + (1 - λ) · [q is final]
/// ```
/// which has a unique solution for `0 < λ < 1`, as the spectral radius of `λ · M` is then below one.
/// For `λ = 1` the system is singular and [`WeightError::SingularSystem`] is returned.
pub fn exact_state_weights(
    cache: &TransitionMatrixCache,
    lambda: f64,
) -> Result<Array1<f64>, WeightError> {
    let states = cache.dimension();
    let weight_of_transition = lambda / cache.alphabet_size() as f64;

    let mut system: Array2<f64> = cache
        .transition_counts()
        .mapv(|count| count as f64 * weight_of_transition);
    system.diag_mut().mapv_inplace(|entry| entry - 1.0);

    let constants = Array1::from_shape_fn(states, |q| {
        if cache.is_final(q) {
            -(1.0 - lambda)
        } else {
            0.0
        }
    });

    debug!("solving linear system for {states} states with decay rate {lambda}");
    math::solve(system, constants).ok_or(WeightError::SingularSystem { states, lambda })
}

/// Returns the exact weight of the language under pure geometric decay with rate `lambda`, which is
/// the entry of [`exact_state_weights`] that belongs to the initial state.
pub fn exact_weight(cache: &TransitionMatrixCache, lambda: f64) -> Result<f64, WeightError> {
    Ok(exact_state_weights(cache, lambda)?[cache.initial()])
}
