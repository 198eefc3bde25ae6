use itertools::Itertools;
use tracing::trace;

use crate::{alphabet::Symbol, math::Map};

use super::{Dfa, StateIndex};

impl<S: Symbol> Dfa<S> {
    /// Returns the unique (up to renaming of states) minimal DFA that accepts the same language
    /// as `self`. Unreachable states are dropped first, then the remaining states are merged by
    /// Moore's partition refinement. States of the result are numbered in breadth-first order
    /// from the initial state.
    pub fn minimize(&self) -> Dfa<S> {
        let reachable = self.reachable_state_indices().collect_vec();

        // class[q] is the index of the block that q currently belongs to
        let mut class: Map<StateIndex, usize> = reachable
            .iter()
            .map(|q| (*q, usize::from(self.is_accepting(*q))))
            .collect();
        let mut blocks = class.values().unique().count();

        loop {
            let mut signatures: Map<(usize, Vec<usize>), usize> = Map::default();
            let mut refined = Map::default();
            for q in &reachable {
                let signature = (
                    class[q],
                    self.alphabet()
                        .universe()
                        .map(|sym| class[&self.successor(*q, sym).expect("DFA is complete")])
                        .collect_vec(),
                );
                let next = signatures.len();
                refined.insert(*q, *signatures.entry(signature).or_insert(next));
            }
            class = refined;
            trace!("partition refinement produced {} blocks", signatures.len());
            if signatures.len() == blocks {
                break;
            }
            blocks = signatures.len();
        }

        // renumber blocks in the order in which they are first reached
        let mut renaming: Map<usize, StateIndex> = Map::default();
        let mut representatives = vec![];
        for q in &reachable {
            if !renaming.contains_key(&class[q]) {
                renaming.insert(class[q], representatives.len());
                representatives.push(*q);
            }
        }

        let accepting = representatives
            .iter()
            .map(|q| self.is_accepting(*q))
            .collect_vec();
        let transitions = representatives
            .iter()
            .map(|q| {
                self.alphabet()
                    .universe()
                    .map(|sym| renaming[&class[&self.successor(*q, sym).expect("DFA is complete")]])
                    .collect_vec()
            })
            .collect_vec();

        Dfa::from_parts(
            self.alphabet().clone(),
            renaming[&class[&self.initial()]],
            accepting,
            transitions,
        )
        .expect("quotient of a complete DFA is complete")
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::tests::angluin_dfa;

    #[test_log::test]
    fn minimize_merges_equivalent_states() {
        // states 1 and 2 are equivalent, state 3 is unreachable
        let dfa = Dfa::builder(CharAlphabet::characters('a', 'b').unwrap())
            .with_state_colors([false, true, true, false])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 2),
                (1, 'a', 0),
                (1, 'b', 2),
                (2, 'a', 0),
                (2, 'b', 1),
                (3, 'a', 3),
                (3, 'b', 0),
            ])
            .into_dfa(0)
            .unwrap();
        let min = dfa.minimize();
        assert_eq!(min.size(), 2);
        assert!(min.equivalent(&dfa));
    }

    #[test]
    fn minimal_stays_minimal() {
        let dfa = angluin_dfa();
        let min = dfa.minimize();
        assert_eq!(min.size(), 5);
        assert!(min.equivalent(&dfa));
    }
}
