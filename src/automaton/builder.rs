use crate::{
    alphabet::{Alphabet, Symbol},
    error::{LearningError, Result},
};

use super::{Dfa, StateIndex};

/// Helper struct for the construction of a [`Dfa`]. It stores the colors of the states, which
/// determine whether a state is accepting, and a list of edges.
///
/// # Example
///
/// We want to create a DFA with two states 0 and 1 over the alphabet `['a', 'b']`, which accepts
/// all words that end with `b`:
/// ```
/// use lstar::prelude::*;
///
/// let dfa = Dfa::builder(CharAlphabet::characters('a', 'b').unwrap())
///     .with_state_colors([false, true]) // colors given in the order of the states
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 0), (1, 'b', 1)])
///     .into_dfa(0) // 0 is the initial state
///     .unwrap();
/// assert!(dfa.accepts(&['a', 'b']));
/// ```
#[derive(Debug, Clone)]
pub struct DfaBuilder<S: Symbol> {
    alphabet: Alphabet<S>,
    colors: Vec<bool>,
    edges: Vec<(StateIndex, S, StateIndex)>,
}

impl<S: Symbol> DfaBuilder<S> {
    /// Creates an empty builder for automata over `alphabet`.
    pub fn new(alphabet: Alphabet<S>) -> Self {
        Self {
            alphabet,
            colors: vec![],
            edges: vec![],
        }
    }

    /// Adds states with the given colors, the `i`-th color belongs to the `i`-th state.
    pub fn with_state_colors<I: IntoIterator<Item = bool>>(mut self, colors: I) -> Self {
        self.colors.extend(colors);
        self
    }

    /// Adds edges given as `(source, symbol, target)`.
    pub fn with_edges<I: IntoIterator<Item = (StateIndex, S, StateIndex)>>(
        mut self,
        edges: I,
    ) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Builds the automaton with the given `initial` state. Fails if some edge mentions an unknown
    /// state or symbol, if there are two edges for the same state and symbol or if some state
    /// lacks an outgoing edge for some symbol.
    pub fn into_dfa(self, initial: StateIndex) -> Result<Dfa<S>> {
        let size = self.colors.len();
        let mut transitions: Vec<Vec<Option<StateIndex>>> =
            vec![vec![None; self.alphabet.size()]; size];

        for (source, sym, target) in self.edges {
            let Some(i) = self.alphabet.index_of(sym) else {
                return Err(LearningError::UnknownSymbol(sym.show()));
            };
            if source >= size || target >= size {
                return Err(LearningError::InvalidTransitions(format!(
                    "edge ({source}, {}, {target}) mentions a state that does not exist",
                    sym.show()
                )));
            }
            if transitions[source][i].replace(target).is_some() {
                return Err(LearningError::InvalidTransitions(format!(
                    "state {source} has more than one transition on {}",
                    sym.show()
                )));
            }
        }

        let transitions = transitions
            .into_iter()
            .enumerate()
            .map(|(q, targets)| {
                targets
                    .into_iter()
                    .enumerate()
                    .map(|(i, target)| {
                        target.ok_or_else(|| {
                            LearningError::InvalidTransitions(format!(
                                "state {q} has no transition on {}",
                                self.alphabet.nth(i).map(|s| s.show()).unwrap_or_default()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Dfa::from_parts(self.alphabet, initial, self.colors, transitions)
    }
}
