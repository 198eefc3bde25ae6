use std::time::Duration;

/// Statistics about a learning experiment. This is an explicit context object that is owned by
/// an [`super::Experiment`] and handed out with its result, so several experiments can run side
/// by side without sharing any counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Number of hypotheses that have been constructed.
    pub rounds: usize,
    /// Distinct membership queries posed by the learner.
    pub learning_queries: usize,
    /// Queries posed to the SUL during conformance testing.
    pub conformance_queries: usize,
    pub learning_time: Duration,
    pub testing_time: Duration,
}

impl Statistics {
    pub fn total_queries(&self) -> usize {
        self.learning_queries + self.conformance_queries
    }

    /// Human readable report, one counter per line.
    pub fn summary(&self) -> String {
        format!(
            "rounds [#]: {}\nlearning queries [#]: {}\nconformance queries [#]: {}\nlearning [ms]: {}\ntesting [ms]: {}",
            self.rounds,
            self.learning_queries,
            self.conformance_queries,
            self.learning_time.as_millis(),
            self.testing_time.as_millis()
        )
    }
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Snapshot of the counters of a [`super::CounterOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatistics {
    pub name: String,
    /// How often the counter has been reset.
    pub resets: usize,
    /// Queries since the last reset.
    pub queries: usize,
    /// Queries since the counter was created.
    pub total: usize,
}

impl std::fmt::Display for QueryStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: reset={}, queries={}, counter value={}",
            self.name, self.resets, self.queries, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;

    #[test]
    fn summary_lists_counters() {
        let stats = Statistics {
            rounds: 3,
            learning_queries: 23,
            conformance_queries: 300,
            ..Default::default()
        };
        assert_eq!(stats.total_queries(), 323);
        let summary = stats.summary();
        assert!(summary.starts_with("rounds [#]: 3\n"));
        assert!(summary.contains("conformance queries [#]: 300"));
    }
}
