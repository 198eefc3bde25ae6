mod oracle;
pub use oracle::{CounterOracle, MembershipOracle, SimulatorOracle};

mod statistics;
pub use statistics::{QueryStatistics, Statistics};

mod observationtable;
pub use observationtable::{Closedness, Inconsistency, ObservationTable, Row};

mod hypothesis;
pub use hypothesis::Hypothesis;

mod lstar;
pub use lstar::{ClassicLStar, CounterexampleHandler, Learner, LearnerState, RivestSchapire};

mod conformance;
pub use conformance::{
    ConformanceOracle, EquivalenceOracle, SuffixSelection, WMethod, WMethodOracle, WpMethod,
    WpMethodOracle,
};

mod experiment;
pub use experiment::{Experiment, ExperimentConfig, ExperimentResult, ExperimentState, Outcome};
