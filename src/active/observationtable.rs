use std::ops::Deref;

use itertools::Itertools;
use owo_colors::OwoColorize;
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, trace};

use crate::{math::Set, prelude::*};

/// The outputs of one prefix on all suffixes of an [`ObservationTable`], in the order in which
/// the suffixes were added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Row(Vec<bool>);

impl Row {
    pub fn outputs(&self) -> &[bool] {
        &self.0
    }
}

impl Deref for Row {
    type Target = [bool];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Show for Row {
    fn show(&self) -> String {
        self.0.iter().map(|b| b.show()).join("")
    }
}

/// Result of attempting to close an [`ObservationTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closedness<S: Symbol> {
    /// Every long prefix already has the row of some short prefix.
    Closed,
    /// The contained long prefix had a row that no short prefix has, it was moved to the short
    /// prefixes.
    Promoted(Word<S>),
}

/// Witness for a table that is not consistent: `left` and `right` are short prefixes with the
/// same row, but their extensions by `symbol` differ on the suffix `suffix` with its first
/// symbol removed. Hence `suffix` distinguishes `left` from `right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency<S: Symbol> {
    pub left: Word<S>,
    pub right: Word<S>,
    pub symbol: S,
    pub suffix: Word<S>,
}

/// The working memory of L*-style learners. Rows are indexed by prefixes, which are partitioned
/// into short prefixes (the candidate states) and long prefixes (their one-symbol extensions that
/// are not short themselves). Columns are indexed by suffixes, the first of which is always ε.
/// The cell for prefix `u` and suffix `v` holds whether `uv` is accepted by the system under
/// learning.
///
/// Prefixes and suffixes are only ever added, never removed, and a cell never changes once it is
/// written. Every answer of the oracle is stored in a permanent cache, so no word is queried
/// twice. Cells are filled in batches, and a batch only becomes visible in the table once the
/// oracle answered all of its queries. If the oracle fails, the table is left as it was before.
#[derive(Clone)]
pub struct ObservationTable<S: Symbol> {
    alphabet: Alphabet<S>,
    short_prefixes: Vec<Word<S>>,
    long_prefixes: Vec<Word<S>>,
    suffixes: Vec<Word<S>>,
    rows: math::Map<Word<S>, Row>,
    cache: math::Map<Word<S>, bool>,
}

impl<S: Symbol> ObservationTable<S> {
    /// Creates an empty table over the given alphabet, it has to be initialized through
    /// [`ObservationTable::initialize`] before it can be used.
    pub fn new(alphabet: Alphabet<S>) -> Self {
        Self {
            alphabet,
            short_prefixes: vec![],
            long_prefixes: vec![],
            suffixes: vec![],
            rows: math::Map::default(),
            cache: math::Map::default(),
        }
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        &self.alphabet
    }

    pub fn short_prefixes(&self) -> &[Word<S>] {
        &self.short_prefixes
    }

    pub fn long_prefixes(&self) -> &[Word<S>] {
        &self.long_prefixes
    }

    pub fn suffixes(&self) -> &[Word<S>] {
        &self.suffixes
    }

    /// Iterates over all prefixes, short ones first.
    pub fn prefixes(&self) -> impl Iterator<Item = &Word<S>> + '_ {
        self.short_prefixes.iter().chain(self.long_prefixes.iter())
    }

    /// Gives the row of `prefix`, if it is a prefix of the table.
    pub fn row(&self, prefix: &[S]) -> Option<&Row> {
        self.rows.get(prefix)
    }

    /// Gives the cell of `prefix` and the suffix at position `suffix`.
    pub fn cell(&self, prefix: &[S], suffix: usize) -> Option<bool> {
        self.row(prefix)?.get(suffix).copied()
    }

    /// The number of distinct words that have been sent to the oracle.
    pub fn query_count(&self) -> usize {
        self.cache.len()
    }

    pub fn is_initialized(&self) -> bool {
        !self.short_prefixes.is_empty()
    }

    fn row_of(&self, prefix: &[S]) -> &Row {
        self.rows
            .get(prefix)
            .expect("every prefix of the table has a filled row")
    }

    fn is_prefix(&self, word: &[S]) -> bool {
        self.rows.contains_key(word)
    }

    /// Makes sure that the answer for every given word is cached. The words that are not yet
    /// known are deduplicated and sent to the oracle as a single batch, the cache is only
    /// updated if the whole batch is answered.
    fn resolve<O, I>(&mut self, words: I, oracle: &O) -> Result<()>
    where
        O: MembershipOracle<S>,
        I: IntoIterator<Item = Word<S>>,
    {
        let mut seen = Set::default();
        let missing = words
            .into_iter()
            .filter(|word| !self.cache.contains_key(word) && seen.insert(word.clone()))
            .collect_vec();
        if missing.is_empty() {
            return Ok(());
        }
        let answers = oracle.batch_query(&missing)?;
        if answers.len() != missing.len() {
            return Err(LearningError::OracleUnavailable(format!(
                "asked {} queries but received {} answers",
                missing.len(),
                answers.len()
            )));
        }
        trace!("resolved a batch of {} queries", missing.len());
        self.cache.extend(missing.into_iter().zip(answers));
        Ok(())
    }

    /// Computes complete rows for the given prefixes without inserting them.
    fn compute_rows<O: MembershipOracle<S>>(
        &mut self,
        prefixes: &[Word<S>],
        oracle: &O,
    ) -> Result<Vec<(Word<S>, Row)>> {
        let words = prefixes
            .iter()
            .flat_map(|p| self.suffixes.iter().map(move |e| p.concat(e)))
            .collect_vec();
        self.resolve(words, oracle)?;
        Ok(prefixes
            .iter()
            .map(|p| {
                let row = self
                    .suffixes
                    .iter()
                    .map(|e| self.cache[&p.concat(e)])
                    .collect();
                (p.clone(), Row(row))
            })
            .collect())
    }

    /// Answers a single membership query through the cache.
    pub fn membership<O: MembershipOracle<S>>(&mut self, word: &[S], oracle: &O) -> Result<bool> {
        if let Some(answer) = self.cache.get(word) {
            return Ok(*answer);
        }
        let answer = oracle.query(word)?;
        trace!("queried {} with answer {}", word.show(), answer.show());
        self.cache.insert(Word::from(word), answer);
        Ok(answer)
    }

    /// Seeds the table with ε as the only short prefix, the one-symbol words as long prefixes and
    /// ε as the only suffix, then fills all cells. Calling this on an already initialized table
    /// has no effect.
    pub fn initialize<O: MembershipOracle<S>>(&mut self, oracle: &O) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let short = vec![Word::epsilon()];
        let long = self.alphabet.universe().map(Word::letter).collect_vec();
        self.suffixes = vec![Word::epsilon()];
        match self.compute_rows(&short.iter().chain(long.iter()).cloned().collect_vec(), oracle) {
            Ok(rows) => {
                self.rows.extend(rows);
                self.short_prefixes = short;
                self.long_prefixes = long;
                debug!(
                    "initialized table over {} with {} queries",
                    self.alphabet.show(),
                    self.query_count()
                );
                Ok(())
            }
            Err(e) => {
                self.suffixes.clear();
                Err(e)
            }
        }
    }

    /// Returns the first long prefix whose row does not occur among the rows of the short
    /// prefixes, or `None` if the table is closed.
    pub fn find_unclosed_row(&self) -> Option<&Word<S>> {
        let short_rows: Set<&Row> = self.short_prefixes.iter().map(|p| self.row_of(p)).collect();
        self.long_prefixes
            .iter()
            .find(|p| !short_rows.contains(self.row_of(p)))
    }

    pub fn is_closed(&self) -> bool {
        self.find_unclosed_row().is_none()
    }

    /// Performs one step of closing the table: if some long prefix has a row that matches no
    /// short prefix, the first such prefix is promoted.
    pub fn make_closed<O: MembershipOracle<S>>(&mut self, oracle: &O) -> Result<Closedness<S>> {
        let Some(unclosed) = self.find_unclosed_row().cloned() else {
            return Ok(Closedness::Closed);
        };
        self.promote(&unclosed, oracle)?;
        Ok(Closedness::Promoted(unclosed))
    }

    /// The one-symbol extensions of `word` that are not yet prefixes of the table.
    fn new_extensions(&self, word: &Word<S>) -> Vec<Word<S>> {
        self.alphabet
            .universe()
            .map(|sym| word.append(sym))
            .filter(|ext| !self.is_prefix(ext))
            .collect()
    }

    /// Moves the long prefix `word` to the short prefixes and adds its extensions.
    fn promote<O: MembershipOracle<S>>(&mut self, word: &Word<S>, oracle: &O) -> Result<()> {
        let extensions = self.new_extensions(word);
        let rows = self.compute_rows(&extensions, oracle)?;
        self.long_prefixes.retain(|p| p != word);
        self.short_prefixes.push(word.clone());
        self.long_prefixes.extend(extensions);
        self.rows.extend(rows);
        debug!(
            "promoted {}, table has {} short and {} long prefixes",
            word.show(),
            self.short_prefixes.len(),
            self.long_prefixes.len()
        );
        Ok(())
    }

    /// Makes `word` a short prefix. If it is a long prefix it is promoted, otherwise it is added
    /// together with all of its one-symbol extensions.
    pub fn add_short_prefix<O: MembershipOracle<S>>(
        &mut self,
        word: &Word<S>,
        oracle: &O,
    ) -> Result<()> {
        self.alphabet.validate(word)?;
        if self.short_prefixes.contains(word) {
            return Ok(());
        }
        if self.long_prefixes.contains(word) {
            return self.promote(word, oracle);
        }
        let extensions = self.new_extensions(word);
        let fresh = std::iter::once(word.clone())
            .chain(extensions.iter().cloned())
            .collect_vec();
        let rows = self.compute_rows(&fresh, oracle)?;
        self.short_prefixes.push(word.clone());
        self.long_prefixes.extend(extensions);
        self.rows.extend(rows);
        debug!("added short prefix {}", word.show());
        Ok(())
    }

    /// Searches for two short prefixes that have the same row, but whose extensions by some
    /// symbol have different rows. Pairs are considered in the order of the short prefixes,
    /// symbols in the order of the alphabet.
    pub fn find_inconsistency(&self) -> Option<Inconsistency<S>> {
        for (i, left) in self.short_prefixes.iter().enumerate() {
            for right in self.short_prefixes.iter().skip(i + 1) {
                if self.row_of(left) != self.row_of(right) {
                    continue;
                }
                for sym in self.alphabet.universe() {
                    let l = self.row_of(&left.append(sym));
                    let r = self.row_of(&right.append(sym));
                    if let Some(pos) = (0..self.suffixes.len()).find(|k| l[*k] != r[*k]) {
                        return Some(Inconsistency {
                            left: left.clone(),
                            right: right.clone(),
                            symbol: sym,
                            suffix: Word::letter(sym).concat(&self.suffixes[pos]),
                        });
                    }
                }
            }
        }
        None
    }

    pub fn is_consistent(&self) -> bool {
        self.find_inconsistency().is_none()
    }

    /// Adds a new column for `suffix` and fills it for every prefix. Returns `false` without
    /// touching the table if `suffix` already is a column.
    pub fn add_suffix<O: MembershipOracle<S>>(
        &mut self,
        suffix: &Word<S>,
        oracle: &O,
    ) -> Result<bool> {
        self.alphabet.validate(suffix)?;
        if self.suffixes.contains(suffix) {
            return Ok(false);
        }
        let words = self.prefixes().map(|p| p.concat(suffix)).collect_vec();
        self.resolve(words, oracle)?;

        let prefixes = self.prefixes().cloned().collect_vec();
        for p in prefixes {
            let answer = self.cache[&p.concat(suffix)];
            self.rows
                .get_mut(&p)
                .expect("every prefix of the table has a filled row")
                .0
                .push(answer);
        }
        self.suffixes.push(suffix.clone());
        debug!(
            "added suffix {}, table has {} columns",
            suffix.show(),
            self.suffixes.len()
        );
        Ok(true)
    }

    /// Processes a counterexample in the manner of Rivest and Schapire. Writing `u_i` for the
    /// prefix of length `i` and `v_i` for the remaining suffix, the answers to the queries
    /// `rep(u_i) v_i` differ for `i = 0` and `i = |cex|`, where `rep(u)` is the representative of
    /// the hypothesis state reached by `u`. A binary search finds a position `i` at which the
    /// answer flips, so `v_i` distinguishes two rows the hypothesis identified and is added as a
    /// suffix. Returns the added suffix.
    pub fn add_counterexample<O: MembershipOracle<S>>(
        &mut self,
        counterexample: &Word<S>,
        hypothesis: &Hypothesis<S>,
        oracle: &O,
    ) -> Result<Word<S>> {
        self.alphabet.validate(counterexample)?;
        let expected = self.membership(counterexample, oracle)?;
        if hypothesis.accepts(counterexample) == expected {
            return Err(LearningError::NotACounterexample(counterexample.show()));
        }

        let (mut lo, mut hi) = (0, counterexample.len());
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            let query = hypothesis
                .state_of(&counterexample[..mid])
                .and_then(|q| hypothesis.representative(q))
                .expect("validated words reach a state with a representative")
                .concat(&counterexample[mid..]);
            if self.membership(&query, oracle)? == expected {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let suffix = counterexample.skip(hi);
        trace!(
            "decomposed counterexample {} at position {hi}, distinguishing suffix {}",
            counterexample.show(),
            suffix.show()
        );
        self.add_suffix(&suffix, oracle)?;
        Ok(suffix)
    }
}

impl<S: Symbol> std::fmt::Display for ObservationTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(
            std::iter::once(String::new()).chain(self.suffixes.iter().map(|e| e.show())),
        );
        for p in &self.short_prefixes {
            builder.push_record(
                std::iter::once(p.show().bold().to_string())
                    .chain(self.row_of(p).iter().map(|b| b.show())),
            );
        }
        for p in &self.long_prefixes {
            builder.push_record(
                std::iter::once(p.show()).chain(self.row_of(p).iter().map(|b| b.show())),
            );
        }
        let mut table = builder.build();
        table.with(Style::modern());
        write!(f, "{table}")
    }
}

impl<S: Symbol> std::fmt::Debug for ObservationTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ObservationTable with {} short prefixes, {} long prefixes and suffixes {}",
            self.short_prefixes.len(),
            self.long_prefixes.len(),
            Word::show_collection(self.suffixes.iter())
        )
    }
}
