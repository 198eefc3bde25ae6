use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

use crate::{
    error::{LearningError, Result},
    math::Set,
    word::Word,
    Show,
};

/// A symbol is an atomic letter of an [`Alphabet`]. It must be cheap to copy, comparable and
/// hashable, which is the case for `char`, `u8`, `usize` and the like. Symbols can be sent
/// across threads, so batches of queries may be answered in parallel.
pub trait Symbol: Copy + Eq + Ord + Hash + Debug + Show + Send + Sync {}

impl<S: Copy + Eq + Ord + Hash + Debug + Show + Send + Sync> Symbol for S {}

/// An alphabet is an ordered set of unique [`Symbol`]s. The order is significant, it determines
/// the order in which transitions of hypotheses and words of a given length are enumerated.
///
/// # Example
/// ```
/// use lstar::prelude::*;
///
/// let alphabet = CharAlphabet::characters('a', 'c').unwrap();
/// assert_eq!(alphabet.universe().collect::<Vec<_>>(), vec!['a', 'b', 'c']);
/// assert!(Alphabet::new(['a', 'a']).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Alphabet<S: Symbol> {
    symbols: Vec<S>,
}

/// An [`Alphabet`] where each [`Symbol`] is a single `char`.
pub type CharAlphabet = Alphabet<char>;

impl<S: Symbol> Alphabet<S> {
    /// Creates a new alphabet from the given symbols, preserving their order. Fails if no symbol
    /// is given or if some symbol occurs more than once.
    pub fn new<I: IntoIterator<Item = S>>(symbols: I) -> Result<Self> {
        let symbols = symbols.into_iter().collect_vec();
        if symbols.is_empty() {
            return Err(LearningError::EmptyAlphabet);
        }
        let mut seen = Set::default();
        for sym in &symbols {
            if !seen.insert(*sym) {
                return Err(LearningError::DuplicateSymbol(sym.show()));
            }
        }
        Ok(Self { symbols })
    }

    /// Returns the number of symbols.
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Iterates over all symbols in their declared order.
    pub fn universe(&self) -> impl Iterator<Item = S> + '_ {
        self.symbols.iter().copied()
    }

    /// Gives the symbol at position `index`, if it exists.
    pub fn nth(&self, index: usize) -> Option<S> {
        self.symbols.get(index).copied()
    }

    /// Returns the position of `symbol` in the alphabet or `None` if it is not part of it.
    pub fn index_of(&self, symbol: S) -> Option<usize> {
        self.symbols.iter().position(|s| *s == symbol)
    }

    pub fn contains(&self, symbol: S) -> bool {
        self.index_of(symbol).is_some()
    }

    /// Ensures that `word` only consists of symbols of `self`.
    pub fn validate(&self, word: &[S]) -> Result<()> {
        match word.iter().find(|sym| !self.contains(**sym)) {
            Some(sym) => Err(LearningError::UnknownSymbol(sym.show())),
            None => Ok(()),
        }
    }

    /// Returns all words of exactly the given `length`, ordered lexicographically with respect
    /// to the order of the alphabet.
    pub fn words_of_length(&self, length: usize) -> Vec<Word<S>> {
        let mut words = vec![Word::epsilon()];
        for _ in 0..length {
            words = words
                .iter()
                .flat_map(|w| self.universe().map(move |sym| w.append(sym)))
                .collect();
        }
        words
    }

    /// Returns all words of length at most `length` in length-lexicographic order, starting with
    /// the empty word.
    pub fn words_up_to(&self, length: usize) -> Vec<Word<S>> {
        (0..=length)
            .flat_map(|len| self.words_of_length(len))
            .collect()
    }
}

impl Alphabet<char> {
    /// Creates the alphabet consisting of all characters from `first` up to and including `last`.
    pub fn characters(first: char, last: char) -> Result<Self> {
        Self::new(first..=last)
    }
}

impl<S: Symbol> Show for Alphabet<S> {
    fn show(&self) -> String {
        format!("{{{}}}", self.symbols.iter().map(Show::show).join(", "))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn alphabet_construction() {
        let alphabet = CharAlphabet::characters('a', 'c').unwrap();
        assert_eq!(alphabet.size(), 3);
        assert_eq!(alphabet.index_of('c'), Some(2));
        assert_eq!(alphabet.index_of('d'), None);
        assert_eq!(alphabet.show(), "{a, b, c}");

        assert_eq!(
            Alphabet::<char>::new([]).unwrap_err(),
            LearningError::EmptyAlphabet
        );
        assert_eq!(
            CharAlphabet::characters('b', 'a').unwrap_err(),
            LearningError::EmptyAlphabet
        );
        assert_eq!(
            Alphabet::new(['x', 'y', 'x']).unwrap_err(),
            LearningError::DuplicateSymbol("x".into())
        );
    }

    #[test]
    fn order_is_kept() {
        let alphabet = Alphabet::new(['b', 'a']).unwrap();
        assert_eq!(alphabet.nth(0), Some('b'));
        assert_eq!(
            alphabet.words_of_length(2),
            vec![
                Word::from("bb"),
                Word::from("ba"),
                Word::from("ab"),
                Word::from("aa")
            ]
        );
    }

    #[test]
    fn validation() {
        let alphabet = CharAlphabet::characters('a', 'b').unwrap();
        assert!(alphabet.validate(&['a', 'b', 'a']).is_ok());
        assert_eq!(
            alphabet.validate(&['a', 'c']),
            Err(LearningError::UnknownSymbol("c".into()))
        );
    }

    #[test]
    fn enumerate_words() {
        let alphabet = CharAlphabet::characters('a', 'b').unwrap();
        let words = alphabet.words_up_to(3);
        assert_eq!(words.len(), 1 + 2 + 4 + 8);
        assert_eq!(words[0], Word::epsilon());
        assert_eq!(words[1], Word::from("a"));
        assert_eq!(words[3], Word::from("aa"));
        assert_eq!(words.last(), Some(&Word::from("bbb")));
    }
}
