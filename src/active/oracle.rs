use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use crate::prelude::*;

/// A membership oracle answers whether a finite word is accepted by the system under learning
/// (SUL). Implementations must be deterministic, i.e. posing the same query twice always yields
/// the same answer, and apart from counting queries they must not have observable side effects.
///
/// If the SUL cannot be reached, the oracle returns [`LearningError::OracleUnavailable`]. Retrying
/// is not part of this contract, callers treat such an error as fatal for the current round.
pub trait MembershipOracle<S: Symbol> {
    /// Decides whether `word` is accepted.
    fn query(&self, word: &[S]) -> Result<bool>;

    /// Answers a batch of independent queries, the `i`-th answer belongs to the `i`-th word.
    /// The default implementation simply poses the queries one after the other.
    fn batch_query(&self, words: &[Word<S>]) -> Result<Vec<bool>> {
        words.iter().map(|word| self.query(word)).collect()
    }
}

impl<S: Symbol, O: MembershipOracle<S> + ?Sized> MembershipOracle<S> for &O {
    fn query(&self, word: &[S]) -> Result<bool> {
        O::query(self, word)
    }

    fn batch_query(&self, words: &[Word<S>]) -> Result<Vec<bool>> {
        O::batch_query(self, words)
    }
}

/// An oracle that answers membership queries by simulating a [`Dfa`]. Words containing symbols
/// outside of the alphabet of the automaton are rejected with [`LearningError::UnknownSymbol`].
#[derive(Debug, Clone)]
pub struct SimulatorOracle<S: Symbol> {
    automaton: Dfa<S>,
}

impl<S: Symbol> SimulatorOracle<S> {
    /// Creates a new [`SimulatorOracle`] from the given automaton.
    pub fn new(automaton: Dfa<S>) -> Self {
        Self { automaton }
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        self.automaton.alphabet()
    }

    pub fn automaton(&self) -> &Dfa<S> {
        &self.automaton
    }
}

impl<S: Symbol> MembershipOracle<S> for SimulatorOracle<S> {
    fn query(&self, word: &[S]) -> Result<bool> {
        self.automaton.alphabet().validate(word)?;
        Ok(self.automaton.accepts(word))
    }

    #[cfg(feature = "parallel")]
    fn batch_query(&self, words: &[Word<S>]) -> Result<Vec<bool>> {
        use rayon::prelude::*;
        words.par_iter().map(|word| self.query(word)).collect()
    }
}

/// Wraps another [`MembershipOracle`] and counts the queries that are passed through it. The
/// counter is atomic, so the wrapped oracle may answer batches in parallel. A single counter can
/// be shared between a learner and a conformance oracle by handing out references, as `&O` is an
/// oracle whenever `O` is.
#[derive(Debug)]
pub struct CounterOracle<O> {
    inner: O,
    name: String,
    queries: AtomicUsize,
    total: AtomicUsize,
    resets: AtomicUsize,
}

impl<O> CounterOracle<O> {
    /// Wraps `inner`, the `name` is used when reporting the statistics.
    pub fn new(inner: O, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
            queries: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        }
    }

    /// Number of queries since the last reset.
    pub fn count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Sets the current count back to zero, the total count is retained.
    pub fn reset(&self) {
        self.queries.store(0, Ordering::SeqCst);
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    /// Takes a snapshot of the counters.
    pub fn statistics(&self) -> QueryStatistics {
        QueryStatistics {
            name: self.name.clone(),
            resets: self.resets.load(Ordering::SeqCst),
            queries: self.queries.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    fn record(&self, amount: usize) {
        self.queries.fetch_add(amount, Ordering::SeqCst);
        self.total.fetch_add(amount, Ordering::SeqCst);
    }
}

impl<S: Symbol, O: MembershipOracle<S>> MembershipOracle<S> for CounterOracle<O> {
    fn query(&self, word: &[S]) -> Result<bool> {
        let answer = self.inner.query(word)?;
        self.record(1);
        trace!("{} answered {} with {}", self.name, word.show(), answer.show());
        Ok(answer)
    }

    fn batch_query(&self, words: &[Word<S>]) -> Result<Vec<bool>> {
        let answers = self.inner.batch_query(words)?;
        self.record(words.len());
        trace!("{} answered a batch of {} queries", self.name, words.len());
        Ok(answers)
    }
}
