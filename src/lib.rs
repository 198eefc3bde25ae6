//! Library for actively learning deterministic finite automata (DFA) from a black-box system
//! under learning (SUL).
//!
//! A learner only has access to the SUL through membership queries, i.e. it may ask whether a
//! given finite word is accepted. From the answers it builds an [`active::ObservationTable`], which
//! maps prefixes and suffixes to the outcome of querying their concatenation. Once the table is
//! closed (and consistent, for the classic variant) a [`active::Hypothesis`] can be read off of it,
//! whose states are the distinct rows of the table.
//!
//! As there is no way of asking the SUL whether a hypothesis is correct, equivalence is approximated
//! through conformance testing. The [`active::WMethodOracle`] and [`active::WpMethodOracle`] explore the
//! hypothesis systematically up to a fixed depth and report the first word on which hypothesis and
//! SUL disagree. Such a counterexample is handed back to the [`active::Learner`], which refines its
//! table, and the game starts anew. The [`active::Experiment`] drives this loop until no
//! counterexample is found anymore.
//!
//! The learner comes in two flavours that share table and hypothesis construction but differ in how
//! counterexamples are processed:
//! - [`active::ClassicLStar`] adds all prefixes and suffixes of a counterexample and keeps the table
//!   consistent,
//! - [`active::RivestSchapire`] finds a single distinguishing suffix through binary search and never
//!   needs to check for consistency.
//!
//! # Example
//! ```
//! use lstar::prelude::*;
//!
//! let alphabet = CharAlphabet::characters('a', 'b').unwrap();
//! // accepts exactly the words with an even number of `a`s
//! let target = Dfa::builder(alphabet.clone())
//!     .with_state_colors([true, false])
//!     .with_edges([(0, 'a', 1), (0, 'b', 0), (1, 'a', 0), (1, 'b', 1)])
//!     .into_dfa(0)
//!     .unwrap();
//!
//! let sul = CounterOracle::new(SimulatorOracle::new(target), "membership queries");
//! let learner = Learner::rivest_schapire(alphabet, &sul);
//! let conformance = WpMethodOracle::new(&sul, 2);
//! let result = Experiment::new(learner, conformance).run().unwrap();
//!
//! assert!(result.is_converged());
//! assert_eq!(result.hypothesis.size(), 2);
//! ```

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use lstar::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        active::{
            ClassicLStar, Closedness, ConformanceOracle, CounterOracle, CounterexampleHandler,
            EquivalenceOracle, Experiment, ExperimentConfig, ExperimentResult, ExperimentState,
            Hypothesis, Inconsistency, Learner, LearnerState, MembershipOracle, ObservationTable,
            Outcome, QueryStatistics, RivestSchapire, SimulatorOracle, Statistics, SuffixSelection,
            WMethod, WMethodOracle, WpMethod, WpMethodOracle,
        },
        alphabet::{Alphabet, CharAlphabet, Symbol},
        automaton::{Dfa, DfaBuilder, DfaExport, StateIndex},
        error::{LearningError, Result},
        math,
        word::Word,
        Show,
    };
}

/// This module contains some type aliases for collections which are used throughout the crate.
pub mod math;

/// Defines the error type that is shared by all fallible operations.
pub mod error;
pub use error::{LearningError, Result};

/// Module that contains definitions for dealing with alphabets.
pub mod alphabet;
pub use alphabet::{Alphabet, CharAlphabet, Symbol};

/// Module that contains definitions for dealing with finite words.
pub mod word;
pub use word::Word;

/// Defines deterministic finite automata, which serve as simulated systems under learning as well
/// as the carrier of hypotheses.
pub mod automaton;
pub use automaton::Dfa;

/// Deals with active learning, that is observation tables, the learners operating on them,
/// conformance testing and the experiment loop.
pub mod active;

/// Implements the generation of random DFAs.
#[cfg(feature = "random")]
pub mod random;

use itertools::Itertools;

/// Helper trait which can be used to display symbols, words, states and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state index that should be
    /// for example q0, q1, q2, ... and for a word it is simply the concatenation of its symbols.
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of symbols this should be "abc", for other
    /// things it could be {q0, q1, q2, ...}.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("{{{}}}", iter.into_iter().map(|x| x.show()).join(", "))
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }

    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
    {
        iter.into_iter().collect()
    }
}

impl Show for u8 {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for u32 {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+",
            false => "-",
        }
        .to_string()
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}
