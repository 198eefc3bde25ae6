use itertools::Itertools;
use tracing::debug;

use crate::prelude::*;

/// Generates a random DFA with `size` states over the alphabet consisting of the first `symbols`
/// lowercase letters. For every state and symbol a target state is drawn uniformly, and every
/// state is accepting with probability one half. The initial state is `0`.
///
/// Depending on the drawn transitions some states may be unreachable or equivalent, so the
/// accepted language may be recognized by a smaller automaton, see [`Dfa::minimize`].
/// Passing the same `seed` always yields the same automaton.
pub fn generate_random_dfa(symbols: usize, size: usize, seed: u64) -> Result<Dfa<char>> {
    if symbols == 0 {
        return Err(LearningError::EmptyAlphabet);
    }
    if symbols > 26 {
        return Err(LearningError::InvalidTransitions(format!(
            "random DFAs use at most 26 symbols, {symbols} were requested"
        )));
    }
    if size == 0 {
        return Err(LearningError::InvalidTransitions(
            "a DFA needs at least one state".into(),
        ));
    }
    let alphabet = CharAlphabet::new((0..symbols).map(|i| (b'a' + i as u8) as char))?;
    let mut rng = fastrand::Rng::with_seed(seed);

    let accepting = (0..size).map(|_| rng.bool()).collect_vec();
    let transitions = (0..size)
        .map(|_| (0..symbols).map(|_| rng.usize(..size)).collect_vec())
        .collect_vec();

    let dfa = Dfa::from_parts(alphabet, 0, accepting, transitions)?;
    debug!("generated random DFA with {} states from seed {seed}", dfa.size());
    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::generate_random_dfa;

    #[test]
    fn random_dfa_is_reproducible() {
        let left = generate_random_dfa(2, 6, 17).unwrap();
        let right = generate_random_dfa(2, 6, 17).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.size(), 6);
        assert_eq!(left.alphabet().size(), 2);
        assert!(generate_random_dfa(0, 3, 1).is_err());
        assert!(generate_random_dfa(2, 0, 1).is_err());
    }
}
