use std::time::Instant;

use tracing::{debug, info};

use crate::prelude::*;

/// The phases of an [`Experiment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentState {
    /// Nothing has happened so far.
    Start,
    /// A hypothesis has been learned and awaits testing.
    Learning,
    /// Testing produced a counterexample that awaits incorporation by the learner.
    Testing,
    /// Testing did not find a counterexample, the last hypothesis is final.
    Converged,
    /// A configured budget was used up before testing succeeded.
    BudgetExhausted,
}

impl ExperimentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExperimentState::Converged | ExperimentState::BudgetExhausted
        )
    }
}

impl std::fmt::Display for ExperimentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExperimentState::Start => "start",
            ExperimentState::Learning => "learning",
            ExperimentState::Testing => "testing",
            ExperimentState::Converged => "converged",
            ExperimentState::BudgetExhausted => "budget exhausted",
        };
        write!(f, "{name}")
    }
}

/// Settings of an [`Experiment`]. By default there are no budgets, so an experiment runs until
/// testing no longer finds a counterexample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExperimentConfig {
    /// Maximal number of hypotheses to construct.
    pub max_rounds: Option<usize>,
    /// Maximal number of queries, counting those of the learner and those of testing.
    pub max_queries: Option<usize>,
    /// Whether every hypothesis is logged.
    pub log_models: bool,
}

impl ExperimentConfig {
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn with_max_queries(mut self, queries: usize) -> Self {
        self.max_queries = Some(queries);
        self
    }

    pub fn with_log_models(mut self, log_models: bool) -> Self {
        self.log_models = log_models;
        self
    }
}

/// How an experiment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No counterexample was found. The hypothesis agrees with the system under learning on all
    /// tested words, which for a depth-bounded oracle is no proof of equivalence.
    Converged { depth: Option<usize> },
    BudgetExhausted,
}

/// The final hypothesis of an [`Experiment`] together with the way it ended and its statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentResult<S: Symbol> {
    pub hypothesis: Hypothesis<S>,
    pub outcome: Outcome,
    pub statistics: Statistics,
}

impl<S: Symbol> ExperimentResult<S> {
    pub fn is_converged(&self) -> bool {
        matches!(self.outcome, Outcome::Converged { .. })
    }
}

/// Drives the interplay of a [`Learner`] and an [`EquivalenceOracle`]: hypotheses are tested and
/// counterexamples are handed back to the learner until testing succeeds or a budget runs out.
/// The experiment can be run to the end with [`Experiment::run`] or advanced one transition at a
/// time with [`Experiment::step`].
pub struct Experiment<S, O, H, E>
where
    S: Symbol,
    O: MembershipOracle<S>,
    H: CounterexampleHandler<S>,
    E: EquivalenceOracle<S>,
{
    learner: Learner<S, O, H>,
    oracle: E,
    config: ExperimentConfig,
    state: ExperimentState,
    hypothesis: Option<Hypothesis<S>>,
    pending: Option<Word<S>>,
    statistics: Statistics,
}

impl<S, O, H, E> Experiment<S, O, H, E>
where
    S: Symbol,
    O: MembershipOracle<S>,
    H: CounterexampleHandler<S>,
    E: EquivalenceOracle<S>,
{
    pub fn new(learner: Learner<S, O, H>, oracle: E) -> Self {
        Self {
            learner,
            oracle,
            config: ExperimentConfig::default(),
            state: ExperimentState::Start,
            hypothesis: None,
            pending: None,
            statistics: Statistics::default(),
        }
    }

    pub fn with_config(mut self, config: ExperimentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn learner(&self) -> &Learner<S, O, H> {
        &self.learner
    }

    pub fn equivalence_oracle(&self) -> &E {
        &self.oracle
    }

    /// The most recent hypothesis, regardless of whether the experiment has ended.
    pub fn hypothesis(&self) -> Option<&Hypothesis<S>> {
        self.hypothesis.as_ref()
    }

    /// The hypothesis the experiment ended with, `None` while it is still running.
    pub fn final_hypothesis(&self) -> Option<&Hypothesis<S>> {
        self.hypothesis
            .as_ref()
            .filter(|_| self.state.is_terminal())
    }

    fn record(&mut self, hypothesis: Hypothesis<S>) {
        self.statistics.rounds += 1;
        self.statistics.learning_queries = self.learner.query_count();
        if self.config.log_models {
            info!(
                "hypothesis of round {} has {} states\n{hypothesis}",
                self.statistics.rounds,
                hypothesis.size()
            );
            debug!(
                "observation table of round {}\n{}",
                self.statistics.rounds,
                self.learner.observation_table()
            );
        } else {
            info!(
                "round {} produced a hypothesis with {} states",
                self.statistics.rounds,
                hypothesis.size()
            );
        }
        self.hypothesis = Some(hypothesis);
    }

    fn budget_exhausted(&self) -> bool {
        let rounds = self
            .config
            .max_rounds
            .is_some_and(|max| self.statistics.rounds >= max);
        let queries = self
            .config
            .max_queries
            .is_some_and(|max| self.statistics.total_queries() >= max);
        rounds || queries
    }

    /// Performs a single transition and returns the state that was reached. If the transition
    /// fails, the experiment stays in its current state and the step may be retried. Stepping a
    /// finished experiment is an error.
    pub fn step(&mut self) -> Result<ExperimentState> {
        match self.state {
            ExperimentState::Start => {
                let start = Instant::now();
                let hypothesis = self.learner.start()?;
                self.statistics.learning_time += start.elapsed();
                self.record(hypothesis);
                self.state = ExperimentState::Learning;
            }
            ExperimentState::Learning => {
                let hypothesis = self
                    .hypothesis
                    .as_ref()
                    .expect("a hypothesis exists once learning started");
                let start = Instant::now();
                let outcome = self.oracle.find_counterexample(hypothesis);
                self.statistics.testing_time += start.elapsed();
                self.statistics.conformance_queries = self.oracle.query_count();
                match outcome? {
                    Some(counterexample) => {
                        debug!("testing produced counterexample {}", counterexample.show());
                        self.pending = Some(counterexample);
                        self.state = ExperimentState::Testing;
                    }
                    None => {
                        info!(
                            "converged after {} rounds with {} states",
                            self.statistics.rounds,
                            hypothesis.size()
                        );
                        self.state = ExperimentState::Converged;
                    }
                }
            }
            ExperimentState::Testing => {
                if self.budget_exhausted() {
                    info!(
                        "budget exhausted after {} rounds and {} queries",
                        self.statistics.rounds,
                        self.statistics.total_queries()
                    );
                    self.state = ExperimentState::BudgetExhausted;
                    return Ok(self.state);
                }
                let counterexample = self
                    .pending
                    .as_ref()
                    .expect("testing ends with a counterexample");
                let start = Instant::now();
                let refined = self.learner.refine(counterexample);
                self.statistics.learning_time += start.elapsed();
                let hypothesis = refined?;
                self.pending = None;
                self.record(hypothesis);
                self.state = ExperimentState::Learning;
            }
            ExperimentState::Converged | ExperimentState::BudgetExhausted => {
                return Err(LearningError::InvalidState {
                    operation: "step",
                    state: self.state.to_string(),
                })
            }
        }
        Ok(self.state)
    }

    /// Steps until the experiment ends and returns its result. Calling this on a finished
    /// experiment returns the same result again.
    pub fn run(&mut self) -> Result<ExperimentResult<S>> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        let outcome = match self.state {
            ExperimentState::Converged => Outcome::Converged {
                depth: self.oracle.exploration_depth(),
            },
            _ => Outcome::BudgetExhausted,
        };
        Ok(ExperimentResult {
            hypothesis: self
                .hypothesis
                .clone()
                .expect("a finished experiment has a hypothesis"),
            outcome,
            statistics: self.statistics.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::active::oracle::tests::FlakyOracle;
    use crate::prelude::*;
    use crate::tests::{angluin_dfa, contains_aba_dfa, even_even_dfa, length_mod_three_dfa};

    fn agrees_up_to(hypothesis: &Hypothesis<char>, target: &Dfa<char>, length: usize) -> bool {
        target
            .alphabet()
            .words_up_to(length)
            .iter()
            .all(|word| hypothesis.accepts(word) == target.accepts(word))
    }

    fn run<H: CounterexampleHandler<char>, M: SuffixSelection<char> + Default>(
        target: &Dfa<char>,
        handler: H,
        depth: usize,
    ) -> ExperimentResult<char> {
        let sul = CounterOracle::new(SimulatorOracle::new(target.clone()), "membership queries");
        let learner = Learner::new(target.alphabet().clone(), &sul, handler);
        let conformance: ConformanceOracle<char, _, M> = ConformanceOracle::new(&sul, depth);
        let result = Experiment::new(learner, conformance)
            .with_config(ExperimentConfig::default().with_log_models(true))
            .run()
            .unwrap();
        // learner and testing share the counter
        assert_eq!(sul.statistics().total, result.statistics.total_queries());
        result
    }

    #[test_log::test]
    fn learns_angluins_example() {
        let target = angluin_dfa();
        for result in [
            run::<_, WMethod>(&target, ClassicLStar, 4),
            run::<_, WpMethod>(&target, ClassicLStar, 4),
            run::<_, WMethod>(&target, RivestSchapire, 4),
            run::<_, WpMethod>(&target, RivestSchapire, 4),
        ] {
            assert_eq!(result.outcome, Outcome::Converged { depth: Some(4) });
            assert_eq!(result.hypothesis.size(), 5);
            assert_eq!(result.hypothesis.alphabet().size(), 2);
            assert!(agrees_up_to(&result.hypothesis, &target, 8));
            assert!(result.statistics.rounds >= 2);
        }
    }

    #[test_log::test]
    fn rivest_schapire_needs_no_more_queries() {
        for target in [
            angluin_dfa(),
            even_even_dfa(),
            length_mod_three_dfa(),
            contains_aba_dfa(),
        ] {
            let classic = run::<_, WMethod>(&target, ClassicLStar, 4);
            let rs = run::<_, WMethod>(&target, RivestSchapire, 4);
            assert!(rs.statistics.learning_queries <= classic.statistics.learning_queries);

            let classic = run::<_, WpMethod>(&target, ClassicLStar, 4);
            let rs = run::<_, WpMethod>(&target, RivestSchapire, 4);
            assert!(rs.statistics.learning_queries <= classic.statistics.learning_queries);
        }
    }

    #[test_log::test]
    fn wp_tests_with_fewer_queries() {
        let target = angluin_dfa();
        let w = run::<_, WMethod>(&target, RivestSchapire, 4);
        let wp = run::<_, WpMethod>(&target, RivestSchapire, 4);
        assert!(wp.statistics.conformance_queries <= w.statistics.conformance_queries);
    }

    #[test_log::test]
    fn stepping_through_states() {
        let target = angluin_dfa();
        let sul = SimulatorOracle::new(target.clone());
        let learner = Learner::rivest_schapire(target.alphabet().clone(), &sul);
        let mut experiment = Experiment::new(learner, WpMethodOracle::new(&sul, 4));
        assert_eq!(experiment.state(), ExperimentState::Start);
        assert!(experiment.final_hypothesis().is_none());

        assert_eq!(experiment.step(), Ok(ExperimentState::Learning));
        assert_eq!(experiment.statistics().rounds, 1);
        assert_eq!(experiment.step(), Ok(ExperimentState::Testing));
        assert_eq!(experiment.step(), Ok(ExperimentState::Learning));
        assert_eq!(experiment.statistics().rounds, 2);

        let result = experiment.run().unwrap();
        assert_eq!(experiment.state(), ExperimentState::Converged);
        assert_eq!(experiment.final_hypothesis(), Some(&result.hypothesis));
        assert_eq!(
            experiment.step(),
            Err(LearningError::InvalidState {
                operation: "step",
                state: "converged".into()
            })
        );
        // running again yields the same result
        assert_eq!(experiment.run().unwrap(), result);
    }

    #[test_log::test]
    fn round_budget() {
        let target = angluin_dfa();
        let sul = SimulatorOracle::new(target.clone());
        let learner = Learner::classic(target.alphabet().clone(), &sul);
        let result = Experiment::new(learner, WMethodOracle::new(&sul, 4))
            .with_config(ExperimentConfig::default().with_max_rounds(1))
            .run()
            .unwrap();
        assert_eq!(result.outcome, Outcome::BudgetExhausted);
        assert!(!result.is_converged());
        assert_eq!(result.statistics.rounds, 1);
        assert!(result.hypothesis.size() < 5);
    }

    #[test_log::test]
    fn query_budget() {
        let target = angluin_dfa();
        let sul = SimulatorOracle::new(target.clone());
        let learner = Learner::classic(target.alphabet().clone(), &sul);
        let result = Experiment::new(learner, WMethodOracle::new(&sul, 4))
            .with_config(ExperimentConfig::default().with_max_queries(10))
            .run()
            .unwrap();
        assert_eq!(result.outcome, Outcome::BudgetExhausted);
        assert!(result.statistics.total_queries() >= 10);
    }

    #[test_log::test]
    fn failures_keep_the_state() {
        let target = angluin_dfa();
        // enough for the first hypothesis but not for testing it
        let sul = FlakyOracle::new(target.clone(), 5);
        let learner = Learner::classic(target.alphabet().clone(), &sul);
        let mut experiment = Experiment::new(learner, WpMethodOracle::new(&sul, 4));

        assert_eq!(experiment.step(), Ok(ExperimentState::Learning));
        let table = experiment.learner().observation_table().to_string();
        assert!(matches!(
            experiment.step(),
            Err(LearningError::OracleUnavailable(_))
        ));
        assert_eq!(experiment.state(), ExperimentState::Learning);
        assert_eq!(experiment.learner().observation_table().to_string(), table);

        sul.recover(usize::MAX);
        let result = experiment.run().unwrap();
        assert!(result.is_converged());
        assert_eq!(result.hypothesis.size(), 5);
    }

    #[cfg(feature = "random")]
    #[test_log::test]
    fn learns_random_targets() {
        use crate::random::generate_random_dfa;

        for seed in 0..30 {
            let size = 1 + (seed as usize % 6);
            let target = generate_random_dfa(2, size, seed).unwrap();
            let minimal = target.minimize().size();
            for classic in [true, false] {
                let sul = SimulatorOracle::new(target.clone());
                let conformance = WpMethodOracle::new(&sul, 5);
                let result = if classic {
                    Experiment::new(Learner::classic(target.alphabet().clone(), &sul), conformance)
                        .run()
                } else {
                    Experiment::new(
                        Learner::rivest_schapire(target.alphabet().clone(), &sul),
                        conformance,
                    )
                    .run()
                }
                .unwrap();
                assert!(result.is_converged());
                assert_eq!(result.hypothesis.size(), minimal);
                assert!(result.hypothesis.dfa().equivalent(&target));
            }
        }
    }
}
