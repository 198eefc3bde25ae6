mod dfa;
pub use dfa::{Dfa, DfaExport, StateIndex};

mod builder;
pub use builder::DfaBuilder;

mod reachable;
pub use reachable::MinimalRepresentatives;

mod minimization;
