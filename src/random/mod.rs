use tracing::debug;

use crate::prelude::*;

/// Generate a random [`Dfa`] with `size` states over an alphabet with `symbols` symbols by randomly
/// drawing transitions. The algorithm is as follows:
/// 1. Start with `size` states and no transitions.
/// 2. For each state, for each symbol draw a target state uniformly and add the corresponding edge.
/// 3. Decide for each state with probability one half whether it is accepting.
///
/// State `0` is initial. Depending on the drawn transitions, there may be unreachable states.
///
/// # Panics
/// Panics if `symbols` or `size` is zero, or if there are more than 26 symbols.
pub fn generate_random_dfa(symbols: usize, size: usize) -> Dfa {
    assert!(symbols > 0 && size > 0, "cannot generate an empty automaton");
    let alphabet = CharAlphabet::of_size(symbols);

    let edges: Vec<_> = (0..size)
        .flat_map(|q| alphabet.universe().map(move |sym| (q, sym)))
        .map(|(q, sym)| (q, sym, fastrand::usize(..size)))
        .collect();
    let colors: Vec<_> = (0..size).map(|_| fastrand::bool()).collect();
    debug!(
        "generated random automaton with {size} states and {} accepting states",
        colors.iter().filter(|&&c| c).count()
    );

    match Dfa::builder()
        .with_state_colors(colors)
        .with_edges(edges)
        .into_dfa(0)
    {
        Ok(dfa) => dfa,
        Err(e) => unreachable!("every state has one transition per symbol: {e}"),
    }
}
