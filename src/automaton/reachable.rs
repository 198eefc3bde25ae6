use std::collections::VecDeque;

use crate::{alphabet::Symbol, math::Set, word::Word};

use super::{Dfa, StateIndex};

/// Struct that can return the minimal representatives of a [`Dfa`]. A minimal representative
/// for a state `q` is the length-lexicographically minimal word with which `q` can be reached
/// from a given origin. The order of the symbols is the order of the alphabet.
#[derive(Debug, Clone)]
pub struct MinimalRepresentatives<'a, S: Symbol> {
    dfa: &'a Dfa<S>,
    seen: Set<StateIndex>,
    queue: VecDeque<(Word<S>, StateIndex)>,
}

impl<'a, S: Symbol> MinimalRepresentatives<'a, S> {
    pub fn new(dfa: &'a Dfa<S>, origin: StateIndex) -> Self {
        let seen = Set::from_iter([origin]);
        let queue = [(Word::epsilon(), origin)].into_iter().collect();
        Self { dfa, seen, queue }
    }
}

impl<'a, S: Symbol> Iterator for MinimalRepresentatives<'a, S> {
    type Item = (Word<S>, StateIndex);

    fn next(&mut self) -> Option<Self::Item> {
        let (access, q) = self.queue.pop_front()?;
        for sym in self.dfa.alphabet().universe() {
            let Some(p) = self.dfa.successor(q, sym) else {
                continue;
            };
            if self.seen.insert(p) {
                self.queue.push_back((access.append(sym), p));
            }
        }
        Some((access, q))
    }
}
