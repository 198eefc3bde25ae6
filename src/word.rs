use std::{borrow::Borrow, ops::Deref};

use itertools::Itertools;

use crate::{alphabet::Symbol, Show};

/// A finite word, i.e. a finite sequence of [`Symbol`]s. Prefixes and suffixes of observation
/// tables, counterexamples and test words are all represented as words.
///
/// Words are immutable values; operations such as [`Word::concat`] or [`Word::append`] produce
/// new words.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Word<S>(Vec<S>);

impl<S: Symbol> Word<S> {
    /// Creates the empty word ε.
    pub fn epsilon() -> Self {
        Self(vec![])
    }

    /// Creates a word of length one.
    pub fn letter(symbol: S) -> Self {
        Self(vec![symbol])
    }

    pub fn symbols(&self) -> impl DoubleEndedIterator<Item = S> + '_ {
        self.0.iter().copied()
    }

    /// Concatenates `self` and `other` into a new word.
    pub fn concat(&self, other: &[S]) -> Self {
        Self(self.0.iter().chain(other.iter()).copied().collect())
    }

    /// Extends `self` by a single `symbol`.
    pub fn append(&self, symbol: S) -> Self {
        let mut out = self.0.clone();
        out.push(symbol);
        Self(out)
    }

    /// Returns the prefix consisting of the first `length` symbols. If `length` exceeds the length
    /// of `self`, the whole word is returned.
    pub fn prefix(&self, length: usize) -> Self {
        Self(self.0[..length.min(self.len())].to_vec())
    }

    /// Returns the suffix that starts at position `offset`, which is empty if `offset` is not
    /// smaller than the length of `self`.
    pub fn skip(&self, offset: usize) -> Self {
        Self(self.0[offset.min(self.len())..].to_vec())
    }

    /// All prefixes of `self` ordered by length, starting with ε and ending with `self`.
    pub fn prefixes(&self) -> impl Iterator<Item = Word<S>> + '_ {
        (0..=self.len()).map(|i| self.prefix(i))
    }

    /// All suffixes of `self` ordered by decreasing length, starting with `self` and ending with ε.
    pub fn suffixes(&self) -> impl Iterator<Item = Word<S>> + '_ {
        (0..=self.len()).map(|i| self.skip(i))
    }

    pub fn into_vec(self) -> Vec<S> {
        self.0
    }
}

impl<S> Deref for Word<S> {
    type Target = [S];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> AsRef<[S]> for Word<S> {
    fn as_ref(&self) -> &[S] {
        &self.0
    }
}

impl<S> Borrow<[S]> for Word<S> {
    fn borrow(&self) -> &[S] {
        &self.0
    }
}

impl<S> From<Vec<S>> for Word<S> {
    fn from(value: Vec<S>) -> Self {
        Self(value)
    }
}

impl<S: Symbol> From<&[S]> for Word<S> {
    fn from(value: &[S]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&str> for Word<char> {
    fn from(value: &str) -> Self {
        Self(value.chars().collect())
    }
}

impl<S> FromIterator<S> for Word<S> {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<S: Symbol> Show for Word<S> {
    fn show(&self) -> String {
        if self.is_empty() {
            "ε".to_string()
        } else {
            S::show_collection(self.0.iter())
        }
    }

    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("{{{}}}", iter.into_iter().map(|w| w.show()).join(", "))
    }
}

impl<S: Symbol> std::fmt::Debug for Word<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.show())
    }
}

impl<S: Symbol> std::fmt::Display for Word<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.show())
    }
}

#[cfg(test)]
mod tests {
    use super::Word;
    use crate::Show;

    #[test]
    fn decomposition() {
        let w = Word::from("abb");
        assert_eq!(w.len(), 3);
        assert_eq!(w.prefix(1), Word::from("a"));
        assert_eq!(w.prefix(7), w);
        assert_eq!(w.skip(1), Word::from("bb"));
        assert_eq!(w.skip(3), Word::epsilon());
        assert_eq!(w.concat(&Word::from("a")), Word::from("abba"));
        assert_eq!(w.append('a'), Word::from("abba"));
        assert_eq!(Word::epsilon().concat(&w), w);
        assert_eq!(w.concat(&Word::epsilon()), w);
    }

    #[test]
    fn prefixes_and_suffixes() {
        let w = Word::from("ab");
        assert_eq!(
            w.prefixes().map(|p| p.show()).collect::<Vec<_>>(),
            vec!["ε", "a", "ab"]
        );
        assert_eq!(
            w.suffixes().map(|p| p.show()).collect::<Vec<_>>(),
            vec!["ab", "b", "ε"]
        );
    }
}
