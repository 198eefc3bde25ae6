use std::collections::{BTreeMap, BTreeSet, VecDeque};

use itertools::Itertools;
use owo_colors::OwoColorize;
use tabled::{builder::Builder, settings::Style};

use crate::{
    alphabet::{Alphabet, Symbol},
    error::{LearningError, Result},
    math::Set,
    word::Word,
    Show,
};

use super::{DfaBuilder, MinimalRepresentatives};

/// States of a [`Dfa`] are simply numbered consecutively, starting at zero.
pub type StateIndex = usize;

/// A complete deterministic finite automaton (DFA). Every state has precisely one outgoing
/// transition for each symbol of the alphabet, and a finite word is accepted if the state it
/// reaches from the initial state is accepting.
///
/// The automaton is immutable once constructed, it can be built with a [`DfaBuilder`] (see
/// [`Dfa::builder`]) or from its raw parts through [`Dfa::from_parts`].
#[derive(Clone, PartialEq, Eq)]
pub struct Dfa<S: Symbol> {
    alphabet: Alphabet<S>,
    initial: StateIndex,
    accepting: Vec<bool>,
    // transitions[q][i] is the successor of q on the i-th symbol of the alphabet
    transitions: Vec<Vec<StateIndex>>,
}

/// A plain view on a [`Dfa`], intended for consumers that print or visualize an automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaExport<S: Symbol> {
    pub states: Vec<StateIndex>,
    pub alphabet: Vec<S>,
    pub initial: StateIndex,
    pub accepting: BTreeSet<StateIndex>,
    pub transitions: BTreeMap<(StateIndex, S), StateIndex>,
}

impl<S: Symbol> Dfa<S> {
    /// Returns a [`DfaBuilder`] for automata over the given alphabet.
    pub fn builder(alphabet: Alphabet<S>) -> DfaBuilder<S> {
        DfaBuilder::new(alphabet)
    }

    /// Assembles a DFA from its parts. `accepting[q]` determines whether `q` is accepting and
    /// `transitions[q][i]` is the state reached from `q` on the `i`-th symbol of `alphabet`.
    /// Fails if the transition table is not total or points to non-existent states.
    pub fn from_parts(
        alphabet: Alphabet<S>,
        initial: StateIndex,
        accepting: Vec<bool>,
        transitions: Vec<Vec<StateIndex>>,
    ) -> Result<Self> {
        let size = accepting.len();
        if initial >= size {
            return Err(LearningError::InvalidTransitions(format!(
                "initial state {initial} does not exist"
            )));
        }
        if transitions.len() != size {
            return Err(LearningError::InvalidTransitions(format!(
                "expected transitions for {size} states, got {}",
                transitions.len()
            )));
        }
        for (q, targets) in transitions.iter().enumerate() {
            if targets.len() != alphabet.size() {
                return Err(LearningError::InvalidTransitions(format!(
                    "state {q} has {} instead of {} transitions",
                    targets.len(),
                    alphabet.size()
                )));
            }
            if let Some(p) = targets.iter().find(|p| **p >= size) {
                return Err(LearningError::InvalidTransitions(format!(
                    "state {q} has a transition to non-existent state {p}"
                )));
            }
        }
        Ok(Self {
            alphabet,
            initial,
            accepting,
            transitions,
        })
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        &self.alphabet
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.accepting.len()
    }

    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Iterates over the indices of all states.
    pub fn state_indices(&self) -> std::ops::Range<StateIndex> {
        0..self.size()
    }

    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.accepting.get(state).copied().unwrap_or(false)
    }

    /// Returns the indices of all accepting states.
    pub fn accepting_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.state_indices().filter(|q| self.accepting[*q])
    }

    /// Gives the state reached from `state` on `symbol`, or `None` if either of them is unknown.
    pub fn successor(&self, state: StateIndex, symbol: S) -> Option<StateIndex> {
        let i = self.alphabet.index_of(symbol)?;
        self.transitions.get(state).map(|targets| targets[i])
    }

    /// Runs `word` starting in `origin` and returns the reached state. Returns `None` if the word
    /// contains a symbol that does not belong to the alphabet.
    pub fn reached_state_from(&self, origin: StateIndex, word: &[S]) -> Option<StateIndex> {
        word.iter()
            .try_fold(origin, |q, sym| self.successor(q, *sym))
    }

    /// Runs `word` from the initial state, see [`Dfa::reached_state_from`].
    pub fn reached_state(&self, word: &[S]) -> Option<StateIndex> {
        self.reached_state_from(self.initial, word)
    }

    /// Decides whether `word` is accepted. Words containing symbols that are not part of the
    /// alphabet are never accepted, use [`Alphabet::validate`] to reject them beforehand.
    pub fn accepts(&self, word: &[S]) -> bool {
        self.reached_state(word)
            .map(|q| self.accepting[q])
            .unwrap_or(false)
    }

    /// Returns an iterator over the length-lexicographically minimal access words of all
    /// reachable states, in breadth-first order starting with the initial state.
    pub fn minimal_representatives(&self) -> MinimalRepresentatives<'_, S> {
        MinimalRepresentatives::new(self, self.initial)
    }

    /// Returns the indices of all states that are reachable from the initial state.
    pub fn reachable_state_indices(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.minimal_representatives().map(|(_, q)| q)
    }

    /// Attempts to separate the state `left` from the state `right` by finding a shortest word
    /// that is accepted from one of them but not the other.
    pub fn separate(&self, left: StateIndex, right: StateIndex) -> Option<Word<S>> {
        if left >= self.size() || right >= self.size() || left == right {
            return None;
        }
        shortest_difference(self, left, self, right)
    }

    /// Computes a shortest word (length-lexicographically minimal with respect to the alphabet
    /// of `self`) on which `self` and `other` disagree, or `None` if they accept the same language.
    pub fn find_difference(&self, other: &Dfa<S>) -> Option<Word<S>> {
        shortest_difference(self, self.initial, other, other.initial)
    }

    /// Checks whether `self` and `other` accept the same language.
    pub fn equivalent(&self, other: &Dfa<S>) -> bool {
        self.find_difference(other).is_none()
    }

    /// Gives a plain representation of `self` to be consumed by printing or visualization.
    pub fn export(&self) -> DfaExport<S> {
        let mut transitions = BTreeMap::new();
        for q in self.state_indices() {
            for (i, sym) in self.alphabet.universe().enumerate() {
                transitions.insert((q, sym), self.transitions[q][i]);
            }
        }
        DfaExport {
            states: self.state_indices().collect(),
            alphabet: self.alphabet.universe().collect(),
            initial: self.initial,
            accepting: self.accepting_states().collect(),
            transitions,
        }
    }
}

/// Breadth-first search through the product of `left` and `right`, starting in the pair
/// `(p, q)`. Symbols are tried in the order of the alphabet of `left`, so the first pair that
/// disagrees on acceptance is reached through a length-lexicographically minimal word.
fn shortest_difference<S: Symbol>(
    left: &Dfa<S>,
    p: StateIndex,
    right: &Dfa<S>,
    q: StateIndex,
) -> Option<Word<S>> {
    let mut seen = Set::from_iter([(p, q)]);
    let mut queue = VecDeque::from([(Word::epsilon(), p, q)]);

    while let Some((access, l, r)) = queue.pop_front() {
        if left.is_accepting(l) != right.is_accepting(r) {
            return Some(access);
        }
        for sym in left.alphabet.universe() {
            let Some(rr) = right.successor(r, sym) else {
                // the right automaton cannot read this symbol, so it rejects the extension
                if left.is_accepting(left.successor(l, sym)?) {
                    return Some(access.append(sym));
                }
                continue;
            };
            let ll = left.successor(l, sym)?;
            if seen.insert((ll, rr)) {
                queue.push_back((access.append(sym), ll, rr));
            }
        }
    }
    None
}

impl<S: Symbol> std::fmt::Display for Dfa<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(
            ["DFA".to_string(), "acc".to_string()]
                .into_iter()
                .chain(self.alphabet.universe().map(|sym| sym.show())),
        );
        for q in self.state_indices() {
            let name = if q == self.initial {
                format!("→q{q}").bold().to_string()
            } else {
                format!("q{q}")
            };
            builder.push_record(
                [name, self.accepting[q].show()]
                    .into_iter()
                    .chain(self.transitions[q].iter().map(|p| format!("q{p}"))),
            );
        }
        let mut table = builder.build();
        table.with(Style::modern());
        write!(f, "{table}")
    }
}

impl<S: Symbol> std::fmt::Debug for Dfa<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DFA with {} states over {}, initial q{}, accepting {}",
            self.size(),
            self.alphabet.show(),
            self.initial,
            self.accepting_states().map(|q| format!("q{q}")).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::tests::{angluin_dfa, even_even_dfa};

    #[test]
    fn run_words() {
        let dfa = angluin_dfa();
        assert_eq!(dfa.size(), 5);
        assert!(dfa.accepts(&['a']));
        assert!(dfa.accepts(&['b']));
        assert!(!dfa.accepts(&[]));
        assert!(!dfa.accepts(&['a', 'b']));
        assert!(dfa.accepts(&['a', 'b', 'a', 'a']));
        assert_eq!(dfa.reached_state(&['a', 'b', 'a']), Some(0));
        assert_eq!(dfa.reached_state(&['a', 'x']), None);
        assert!(!dfa.accepts(&['x']));
    }

    #[test]
    fn from_parts_validation() {
        let alphabet = CharAlphabet::characters('a', 'b').unwrap();
        assert!(Dfa::from_parts(alphabet.clone(), 0, vec![true], vec![vec![0, 0]]).is_ok());
        assert!(matches!(
            Dfa::from_parts(alphabet.clone(), 1, vec![true], vec![vec![0, 0]]),
            Err(LearningError::InvalidTransitions(_))
        ));
        assert!(matches!(
            Dfa::from_parts(alphabet.clone(), 0, vec![true], vec![vec![0]]),
            Err(LearningError::InvalidTransitions(_))
        ));
        assert!(matches!(
            Dfa::from_parts(alphabet, 0, vec![true], vec![vec![0, 3]]),
            Err(LearningError::InvalidTransitions(_))
        ));
    }

    #[test]
    fn separation_and_equivalence() {
        let dfa = even_even_dfa();
        assert_eq!(dfa.separate(0, 1), Some(Word::epsilon()));
        assert_eq!(dfa.separate(1, 2), Some(Word::from("a")));
        assert_eq!(dfa.separate(1, 1), None);

        assert!(dfa.equivalent(&dfa.clone()));
        let angluin = angluin_dfa();
        assert_eq!(dfa.find_difference(&angluin), Some(Word::epsilon()));
        assert_eq!(angluin.find_difference(&angluin), None);
    }

    #[test]
    fn export() {
        let export = angluin_dfa().export();
        assert_eq!(export.states, vec![0, 1, 2, 3, 4]);
        assert_eq!(export.alphabet, vec!['a', 'b']);
        assert_eq!(export.initial, 0);
        assert_eq!(export.accepting.into_iter().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(export.transitions.len(), 10);
        assert_eq!(export.transitions[&(2, 'a')], 0);
    }

    #[test]
    fn display() {
        let shown = even_even_dfa().to_string();
        assert!(shown.contains("q3"));
        assert!(shown.contains("acc"));
    }
}
