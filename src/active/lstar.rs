use std::fmt::Debug;

use tracing::{debug, info, trace};

use crate::prelude::*;

/// Strategy for incorporating a counterexample into an [`ObservationTable`]. The two learning
/// algorithms share the table and the extraction of hypotheses and only differ in this step.
pub trait CounterexampleHandler<S: Symbol>: Debug {
    /// Name of the algorithm, used for logging.
    const NAME: &'static str;

    /// Whether the table has to be made consistent before a hypothesis is extracted.
    fn requires_consistency(&self) -> bool;

    /// Grows `table` such that the next hypothesis no longer misclassifies `counterexample`. The
    /// `hypothesis` is the one that was extracted from `table` and on which the counterexample
    /// was found.
    fn incorporate<O: MembershipOracle<S>>(
        &self,
        table: &mut ObservationTable<S>,
        hypothesis: &Hypothesis<S>,
        counterexample: &Word<S>,
        oracle: &O,
    ) -> Result<()>;
}

/// Angluin's classic L*. All prefixes of a counterexample become short prefixes and all of its
/// proper non-empty suffixes become columns, afterwards the table is kept closed and consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassicLStar;

impl<S: Symbol> CounterexampleHandler<S> for ClassicLStar {
    const NAME: &'static str = "L*";

    fn requires_consistency(&self) -> bool {
        true
    }

    fn incorporate<O: MembershipOracle<S>>(
        &self,
        table: &mut ObservationTable<S>,
        _hypothesis: &Hypothesis<S>,
        counterexample: &Word<S>,
        oracle: &O,
    ) -> Result<()> {
        for length in 1..=counterexample.len() {
            table.add_short_prefix(&counterexample.prefix(length), oracle)?;
        }
        for offset in 1..counterexample.len() {
            table.add_suffix(&counterexample.skip(offset), oracle)?;
        }
        Ok(())
    }
}

/// The variant of Rivest and Schapire, which adds a single distinguishing suffix per
/// counterexample, see [`ObservationTable::add_counterexample`]. Short prefixes are only added
/// when closing the table, hence their rows are always distinct and consistency holds trivially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RivestSchapire;

impl<S: Symbol> CounterexampleHandler<S> for RivestSchapire {
    const NAME: &'static str = "Rivest-Schapire";

    fn requires_consistency(&self) -> bool {
        false
    }

    fn incorporate<O: MembershipOracle<S>>(
        &self,
        table: &mut ObservationTable<S>,
        hypothesis: &Hypothesis<S>,
        counterexample: &Word<S>,
        oracle: &O,
    ) -> Result<()> {
        let suffix = table.add_counterexample(counterexample, hypothesis, oracle)?;
        trace!("added distinguishing suffix {}", suffix.show());
        Ok(())
    }
}

/// Lifecycle of a [`Learner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnerState {
    /// [`Learner::start`] has not been called yet.
    Uninitialized,
    /// A hypothesis is available and the learner waits for a counterexample.
    Ready,
    /// A counterexample is being incorporated.
    Refining,
}

impl std::fmt::Display for LearnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LearnerState::Uninitialized => "uninitialized",
            LearnerState::Ready => "ready",
            LearnerState::Refining => "refining",
        };
        write!(f, "{name}")
    }
}

/// An L*-style learner for DFAs. It owns the [`ObservationTable`] and poses membership queries
/// through the oracle `O`, counterexamples are processed by the strategy `H`.
///
/// Every call to [`Learner::start`] and [`Learner::refine`] is atomic: if it fails, for example
/// because the oracle became unavailable, the table is restored to the state after the last
/// completed round and the learner can be used again.
#[derive(Debug)]
pub struct Learner<S: Symbol, O: MembershipOracle<S>, H: CounterexampleHandler<S>> {
    table: ObservationTable<S>,
    oracle: O,
    handler: H,
    state: LearnerState,
    hypothesis: Option<Hypothesis<S>>,
}

impl<S: Symbol, O: MembershipOracle<S>> Learner<S, O, ClassicLStar> {
    /// Creates a learner that runs Angluin's L*.
    pub fn classic(alphabet: Alphabet<S>, oracle: O) -> Self {
        Self::new(alphabet, oracle, ClassicLStar)
    }
}

impl<S: Symbol, O: MembershipOracle<S>> Learner<S, O, RivestSchapire> {
    /// Creates a learner that processes counterexamples like Rivest and Schapire.
    pub fn rivest_schapire(alphabet: Alphabet<S>, oracle: O) -> Self {
        Self::new(alphabet, oracle, RivestSchapire)
    }
}

impl<S: Symbol, O: MembershipOracle<S>, H: CounterexampleHandler<S>> Learner<S, O, H> {
    pub fn new(alphabet: Alphabet<S>, oracle: O, handler: H) -> Self {
        Self {
            table: ObservationTable::new(alphabet),
            oracle,
            handler,
            state: LearnerState::Uninitialized,
            hypothesis: None,
        }
    }

    pub fn state(&self) -> LearnerState {
        self.state
    }

    /// The most recent hypothesis, if the learner has been started.
    pub fn hypothesis(&self) -> Option<&Hypothesis<S>> {
        self.hypothesis.as_ref()
    }

    pub fn observation_table(&self) -> &ObservationTable<S> {
        &self.table
    }

    /// The number of distinct membership queries posed so far.
    pub fn query_count(&self) -> usize {
        self.table.query_count()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        self.table.alphabet()
    }

    /// Repairs the table until it is closed (and consistent if the handler asks for it), then
    /// extracts the hypothesis.
    fn close(&mut self) -> Result<Hypothesis<S>> {
        loop {
            if let Closedness::Promoted(prefix) = self.table.make_closed(&self.oracle)? {
                trace!("closed row of {}", prefix.show());
                continue;
            }
            if self.handler.requires_consistency() {
                if let Some(inconsistency) = self.table.find_inconsistency() {
                    trace!(
                        "{} and {} disagree after {}, adding {}",
                        inconsistency.left.show(),
                        inconsistency.right.show(),
                        inconsistency.symbol.show(),
                        inconsistency.suffix.show()
                    );
                    self.table.add_suffix(&inconsistency.suffix, &self.oracle)?;
                    continue;
                }
            }
            break;
        }
        Hypothesis::extract(&self.table)
    }

    fn invalid(&self, operation: &'static str) -> LearningError {
        LearningError::InvalidState {
            operation,
            state: self.state.to_string(),
        }
    }

    /// Initializes the table, closes it and returns the first hypothesis.
    pub fn start(&mut self) -> Result<Hypothesis<S>> {
        if self.state != LearnerState::Uninitialized {
            return Err(self.invalid("start"));
        }
        let snapshot = self.table.clone();
        let outcome = self
            .table
            .initialize(&self.oracle)
            .and_then(|_| self.close());
        match outcome {
            Ok(hypothesis) => {
                info!(
                    "{} produced initial hypothesis with {} states",
                    H::NAME,
                    hypothesis.size()
                );
                self.hypothesis = Some(hypothesis.clone());
                self.state = LearnerState::Ready;
                Ok(hypothesis)
            }
            Err(e) => {
                self.table = snapshot;
                Err(e)
            }
        }
    }

    /// Incorporates `counterexample`, on which the current hypothesis and the system under
    /// learning disagree, and returns the next hypothesis. Passing a word that the hypothesis
    /// classifies correctly yields [`LearningError::NotACounterexample`].
    pub fn refine(&mut self, counterexample: &Word<S>) -> Result<Hypothesis<S>> {
        if self.state != LearnerState::Ready {
            return Err(self.invalid("refine"));
        }
        self.table.alphabet().validate(counterexample)?;
        let hypothesis = self
            .hypothesis
            .clone()
            .expect("a ready learner has a hypothesis");

        let snapshot = self.table.clone();
        self.state = LearnerState::Refining;
        let outcome = self.refine_with(&hypothesis, counterexample);
        self.state = LearnerState::Ready;
        match outcome {
            Ok(next) => {
                debug!(
                    "refined with {}, hypothesis grew from {} to {} states",
                    counterexample.show(),
                    hypothesis.size(),
                    next.size()
                );
                self.hypothesis = Some(next.clone());
                Ok(next)
            }
            Err(e) => {
                self.table = snapshot;
                Err(e)
            }
        }
    }

    fn refine_with(
        &mut self,
        hypothesis: &Hypothesis<S>,
        counterexample: &Word<S>,
    ) -> Result<Hypothesis<S>> {
        let expected = self.table.membership(counterexample, &self.oracle)?;
        if hypothesis.accepts(counterexample) == expected {
            return Err(LearningError::NotACounterexample(counterexample.show()));
        }
        self.handler
            .incorporate(&mut self.table, hypothesis, counterexample, &self.oracle)?;
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use crate::active::oracle::tests::FlakyOracle;
    use crate::prelude::*;
    use crate::tests::{angluin_dfa, contains_aba_dfa, even_even_dfa, length_mod_three_dfa};

    /// Runs the learner against a perfect equivalence check.
    fn learn_exactly<O, H>(mut learner: Learner<char, O, H>, target: &Dfa<char>) -> Hypothesis<char>
    where
        O: MembershipOracle<char>,
        H: CounterexampleHandler<char>,
    {
        let mut hypothesis = learner.start().unwrap();
        while let Some(cex) = hypothesis.dfa().find_difference(target) {
            hypothesis = learner.refine(&cex).unwrap();
            let table = learner.observation_table();
            assert!(table.is_closed());
            if learner.handler().requires_consistency() {
                assert!(table.is_consistent());
            }
        }
        hypothesis
    }

    #[test_log::test]
    fn learns_targets_exactly() {
        for target in [
            angluin_dfa(),
            even_even_dfa(),
            length_mod_three_dfa(),
            contains_aba_dfa(),
        ] {
            let oracle = SimulatorOracle::new(target.clone());
            let alphabet = target.alphabet().clone();
            let classic = learn_exactly(Learner::classic(alphabet.clone(), &oracle), &target);
            let rs = learn_exactly(Learner::rivest_schapire(alphabet, &oracle), &target);
            for hypothesis in [classic, rs] {
                assert!(hypothesis.dfa().equivalent(&target));
                assert_eq!(hypothesis.size(), target.minimize().size());
            }
        }
    }

    #[test_log::test]
    fn first_hypothesis() {
        let oracle = SimulatorOracle::new(angluin_dfa());
        let mut learner = Learner::classic(oracle.alphabet().clone(), &oracle);
        assert_eq!(learner.state(), LearnerState::Uninitialized);
        assert!(learner.hypothesis().is_none());

        let hypothesis = learner.start().unwrap();
        assert_eq!(learner.state(), LearnerState::Ready);
        assert_eq!(hypothesis.size(), 2);
        assert_eq!(learner.query_count(), 5);
        assert_eq!(learner.hypothesis(), Some(&hypothesis));
    }

    #[test]
    fn lifecycle_is_enforced() {
        let oracle = SimulatorOracle::new(angluin_dfa());
        let mut learner = Learner::rivest_schapire(oracle.alphabet().clone(), &oracle);
        assert_eq!(
            learner.refine(&Word::from("ba")),
            Err(LearningError::InvalidState {
                operation: "refine",
                state: "uninitialized".into()
            })
        );
        learner.start().unwrap();
        assert!(matches!(
            learner.start(),
            Err(LearningError::InvalidState {
                operation: "start",
                ..
            })
        ));
    }

    #[test_log::test]
    fn rejects_words_that_are_no_counterexamples() {
        let oracle = SimulatorOracle::new(angluin_dfa());
        let mut learner = Learner::classic(oracle.alphabet().clone(), &oracle);
        learner.start().unwrap();
        let queries = learner.query_count();
        // the initial hypothesis and the target both reject `bab`
        assert_eq!(
            learner.refine(&Word::from("bab")),
            Err(LearningError::NotACounterexample("bab".into()))
        );
        assert_eq!(learner.query_count(), queries);
        assert_eq!(learner.state(), LearnerState::Ready);
        assert!(matches!(
            learner.refine(&Word::from("bx")),
            Err(LearningError::UnknownSymbol(_))
        ));
    }

    #[test_log::test]
    fn rivest_schapire_adds_one_suffix() {
        let target = angluin_dfa();
        let oracle = SimulatorOracle::new(target.clone());
        let mut learner = Learner::rivest_schapire(oracle.alphabet().clone(), &oracle);
        let mut hypothesis = learner.start().unwrap();
        while let Some(cex) = hypothesis.dfa().find_difference(&target) {
            let columns = learner.observation_table().suffixes().len();
            let size = hypothesis.size();
            hypothesis = learner.refine(&cex).unwrap();
            assert_eq!(learner.observation_table().suffixes().len(), columns + 1);
            assert!(hypothesis.size() > size);
        }
    }

    fn rolls_back<H: CounterexampleHandler<char>>(handler: H) {
        // five answers for the initial hypothesis and one for checking the counterexample
        let oracle = FlakyOracle::new(angluin_dfa(), 6);
        let mut learner = Learner::new(
            CharAlphabet::characters('a', 'b').unwrap(),
            &oracle,
            handler,
        );
        let hypothesis = learner.start().unwrap();
        let table = learner.observation_table().to_string();
        let queries = learner.query_count();

        let cex = Word::from("ba");
        assert!(matches!(
            learner.refine(&cex),
            Err(LearningError::OracleUnavailable(_))
        ));
        assert_eq!(learner.state(), LearnerState::Ready);
        assert_eq!(learner.observation_table().to_string(), table);
        assert_eq!(learner.query_count(), queries);
        assert_eq!(learner.hypothesis(), Some(&hypothesis));

        oracle.recover(usize::MAX);
        assert!(learner.refine(&cex).unwrap().size() > hypothesis.size());
    }

    #[test_log::test]
    fn failed_rounds_are_rolled_back() {
        rolls_back(ClassicLStar);
        rolls_back(RivestSchapire);
    }
}
