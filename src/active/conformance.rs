use std::{fmt::Debug, marker::PhantomData};

use itertools::Itertools;
use tracing::{debug, info};

use crate::{math::Set, prelude::*};

/// Approximates equivalence queries. Given a hypothesis, the oracle searches for a word on which
/// the hypothesis and the system under learning disagree. Not finding one does not imply that
/// both are equivalent, unless the oracle is exact.
pub trait EquivalenceOracle<S: Symbol> {
    /// Returns a counterexample for `hypothesis`, or `None` if none was found.
    fn find_counterexample(&mut self, hypothesis: &Hypothesis<S>) -> Result<Option<Word<S>>>;

    /// The number of queries posed to the system under learning so far.
    fn query_count(&self) -> usize;

    /// The depth up to which hypotheses are explored, `None` if the oracle is not depth-bounded.
    fn exploration_depth(&self) -> Option<usize> {
        None
    }
}

/// Decides which characterizing suffixes are appended to a test word that reaches `state` of the
/// hypothesis. `in_cover` is true if the test word starts with an access word of the state cover
/// and false if it starts with a word of the remaining transition cover.
pub trait SuffixSelection<S: Symbol>: Debug {
    /// Name of the method, used for logging.
    const NAME: &'static str;

    fn suffixes_for(
        &self,
        hypothesis: &Hypothesis<S>,
        state: StateIndex,
        in_cover: bool,
    ) -> Vec<Word<S>>;
}

/// The W-method always appends the full characterizing set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WMethod;

impl<S: Symbol> SuffixSelection<S> for WMethod {
    const NAME: &'static str = "W-method";

    fn suffixes_for(
        &self,
        hypothesis: &Hypothesis<S>,
        _state: StateIndex,
        _in_cover: bool,
    ) -> Vec<Word<S>> {
        hypothesis.characterizing_set().to_vec()
    }
}

/// The Wp-method appends the full characterizing set only to words starting in the state cover.
/// For the rest of the transition cover it suffices to append the local suffixes that identify
/// the reached state, see [`Hypothesis::local_suffixes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WpMethod;

impl<S: Symbol> SuffixSelection<S> for WpMethod {
    const NAME: &'static str = "Wp-method";

    fn suffixes_for(
        &self,
        hypothesis: &Hypothesis<S>,
        state: StateIndex,
        in_cover: bool,
    ) -> Vec<Word<S>> {
        if in_cover {
            hypothesis.characterizing_set().to_vec()
        } else {
            hypothesis.local_suffixes(state)
        }
    }
}

/// Equivalence oracle that performs conformance testing against the system under learning. The
/// test words are of the form `uvw` where `u` is taken from the transition cover of the
/// hypothesis, `v` is any word of length at most `depth` and `w` is a characterizing suffix
/// selected by the method `M`.
///
/// If the system under learning has at most `depth` states more than the hypothesis, the test
/// suite is guaranteed to find a counterexample whenever the two are not equivalent.
#[derive(Debug)]
pub struct ConformanceOracle<S: Symbol, O: MembershipOracle<S>, M: SuffixSelection<S>> {
    sul: O,
    depth: usize,
    method: M,
    queries: usize,
    _symbol: PhantomData<S>,
}

/// Conformance testing with the [`WMethod`].
pub type WMethodOracle<S, O> = ConformanceOracle<S, O, WMethod>;
/// Conformance testing with the [`WpMethod`].
pub type WpMethodOracle<S, O> = ConformanceOracle<S, O, WpMethod>;

impl<S: Symbol, O: MembershipOracle<S>, M: SuffixSelection<S> + Default> ConformanceOracle<S, O, M> {
    /// Creates an oracle that tests with middle parts of length up to `depth`.
    pub fn new(sul: O, depth: usize) -> Self {
        Self::with_method(sul, depth, M::default())
    }
}

impl<S: Symbol, O: MembershipOracle<S>, M: SuffixSelection<S>> ConformanceOracle<S, O, M> {
    pub fn with_method(sul: O, depth: usize, method: M) -> Self {
        Self {
            sul,
            depth,
            method,
            queries: 0,
            _symbol: PhantomData,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn sul(&self) -> &O {
        &self.sul
    }

    /// Enumerates the test suite for `hypothesis`. Each word occurs once, words are ordered by
    /// length and words of equal length by the order in which they were generated.
    pub fn test_suite(&self, hypothesis: &Hypothesis<S>) -> Vec<Word<S>> {
        let prefixes = hypothesis
            .access_words()
            .into_iter()
            .map(|(word, _)| (word, true))
            .chain(
                hypothesis
                    .transition_cover()
                    .into_iter()
                    .map(|word| (word, false)),
            )
            .collect_vec();
        let middles = hypothesis.alphabet().words_up_to(self.depth);

        let mut seen = Set::default();
        let mut suite = vec![];
        for (prefix, in_cover) in &prefixes {
            for middle in &middles {
                let word = prefix.concat(middle);
                let state = hypothesis
                    .state_of(&word)
                    .expect("test words only use symbols of the hypothesis");
                for suffix in self.method.suffixes_for(hypothesis, state, *in_cover) {
                    let test = word.concat(&suffix);
                    if seen.insert(test.clone()) {
                        suite.push(test);
                    }
                }
            }
        }
        suite.sort_by_key(|word| word.len());
        suite
    }
}

impl<S: Symbol, O: MembershipOracle<S>, M: SuffixSelection<S>> EquivalenceOracle<S>
    for ConformanceOracle<S, O, M>
{
    /// Runs the test suite length by length. All words of one length are posed as a single batch,
    /// the first word of the batch on which hypothesis and system disagree is returned.
    fn find_counterexample(&mut self, hypothesis: &Hypothesis<S>) -> Result<Option<Word<S>>> {
        let start = std::time::Instant::now();
        let suite = self.test_suite(hypothesis);
        debug!(
            "{} generated {} test words for a hypothesis with {} states at depth {}",
            M::NAME,
            suite.len(),
            hypothesis.size(),
            self.depth
        );

        let batches = suite.into_iter().group_by(|word| word.len());
        for (length, batch) in &batches {
            let batch = batch.collect_vec();
            let answers = self.sul.batch_query(&batch)?;
            self.queries += batch.len();
            if let Some((counterexample, _)) = batch
                .into_iter()
                .zip(answers)
                .find(|(word, answer)| hypothesis.accepts(word) != *answer)
            {
                info!(
                    "{} found counterexample {} of length {length} in {}ms",
                    M::NAME,
                    counterexample.show(),
                    start.elapsed().as_millis()
                );
                return Ok(Some(counterexample));
            }
        }
        debug!(
            "{} found no counterexample in {}ms",
            M::NAME,
            start.elapsed().as_millis()
        );
        Ok(None)
    }

    fn query_count(&self) -> usize {
        self.queries
    }

    fn exploration_depth(&self) -> Option<usize> {
        Some(self.depth)
    }
}
