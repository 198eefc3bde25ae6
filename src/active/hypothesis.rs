use itertools::Itertools;
use owo_colors::OwoColorize;
use tabled::{builder::Builder, settings::Style};
use tracing::debug;

use crate::{
    math::{Bijection, Map, Set},
    prelude::*,
};

use super::observationtable::Row;

/// A conjecture of the learner, read off of a closed [`ObservationTable`]. Its states are the
/// distinct rows of the short prefixes, each represented by the first short prefix that has the
/// row. A hypothesis is immutable, every round of learning produces a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct Hypothesis<S: Symbol> {
    dfa: Dfa<S>,
    representatives: Bijection<StateIndex, Word<S>>,
    rows: Vec<Row>,
    suffixes: Vec<Word<S>>,
}

impl<S: Symbol> Hypothesis<S> {
    /// Extracts the hypothesis of a closed table. States are numbered in the order in which their
    /// rows first occur among the short prefixes, so ε always belongs to the initial state `0`
    /// and extracting twice from the same table gives the same result.
    pub fn extract(table: &ObservationTable<S>) -> Result<Self> {
        let start = std::time::Instant::now();
        if !table.is_initialized() {
            return Err(LearningError::InvalidState {
                operation: "extract a hypothesis",
                state: "uninitialized".into(),
            });
        }
        if let Some(unclosed) = table.find_unclosed_row() {
            return Err(LearningError::NotClosed(unclosed.show()));
        }

        let mut states: Map<&Row, StateIndex> = Map::default();
        let mut representatives = Bijection::new();
        let mut rows = vec![];
        for prefix in table.short_prefixes() {
            let row = table
                .row(prefix)
                .expect("short prefixes of an initialized table have rows");
            if !states.contains_key(row) {
                states.insert(row, rows.len());
                representatives.insert(rows.len(), prefix.clone());
                rows.push(row.clone());
            }
        }

        let transitions = representatives
            .iter()
            .map(|(_, rep)| {
                table
                    .alphabet()
                    .universe()
                    .map(|sym| {
                        let row = table
                            .row(&rep.append(sym))
                            .expect("extensions of short prefixes have rows");
                        states[row]
                    })
                    .collect_vec()
            })
            .collect_vec();
        let accepting = rows.iter().map(|row| row[0]).collect_vec();

        let dfa = Dfa::from_parts(table.alphabet().clone(), 0, accepting, transitions)?;
        debug!(
            "extracted hypothesis with {} states in {}μs",
            dfa.size(),
            start.elapsed().as_micros()
        );
        Ok(Self {
            dfa,
            representatives,
            rows,
            suffixes: table.suffixes().to_vec(),
        })
    }

    pub fn size(&self) -> usize {
        self.dfa.size()
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        self.dfa.alphabet()
    }

    /// The underlying automaton.
    pub fn dfa(&self) -> &Dfa<S> {
        &self.dfa
    }

    pub fn into_dfa(self) -> Dfa<S> {
        self.dfa
    }

    /// Decides whether the hypothesis accepts `word`.
    pub fn accepts(&self, word: &[S]) -> bool {
        self.dfa.accepts(word)
    }

    /// Gives the state reached by `word`, or `None` if it contains an unknown symbol.
    pub fn state_of(&self, word: &[S]) -> Option<StateIndex> {
        self.dfa.reached_state(word)
    }

    /// The short prefix that represents `state` in the table the hypothesis was extracted from.
    pub fn representative(&self, state: StateIndex) -> Option<&Word<S>> {
        self.representatives.get_by_left(&state)
    }

    /// Gives the state that is represented by the short prefix `word`, if there is one.
    pub fn represented_state(&self, word: &Word<S>) -> Option<StateIndex> {
        self.representatives.get_by_right(word).copied()
    }

    /// The state cover: for every state the length-lexicographically minimal word reaching it,
    /// in breadth-first order.
    pub fn access_words(&self) -> Vec<(Word<S>, StateIndex)> {
        self.dfa.minimal_representatives().collect()
    }

    /// The one-symbol extensions of the access words that are not themselves access words.
    /// Together with [`Hypothesis::access_words`] these exercise every transition.
    pub fn transition_cover(&self) -> Vec<Word<S>> {
        let access = self.access_words();
        let cover: Set<&Word<S>> = access.iter().map(|(word, _)| word).collect();
        access
            .iter()
            .flat_map(|(word, _)| self.alphabet().universe().map(move |sym| word.append(sym)))
            .filter(|word| !cover.contains(word))
            .collect()
    }

    /// The suffixes of the table, they distinguish every pair of states.
    pub fn characterizing_set(&self) -> &[Word<S>] {
        &self.suffixes
    }

    /// Selects the suffixes of the characterizing set that are needed to tell `state` apart from
    /// every other state. Suffixes are considered in order and one is taken if it separates
    /// `state` from some state that no previously taken suffix separated. Falls back to ε if
    /// nothing needs to be separated.
    pub fn local_suffixes(&self, state: StateIndex) -> Vec<Word<S>> {
        let Some(own) = self.rows.get(state) else {
            return vec![];
        };
        let mut unseparated = self.dfa.state_indices().filter(|q| *q != state).collect_vec();
        let mut out = vec![];
        for (k, suffix) in self.suffixes.iter().enumerate() {
            if unseparated.is_empty() {
                break;
            }
            let before = unseparated.len();
            unseparated.retain(|q| self.rows[*q][k] == own[k]);
            if unseparated.len() < before {
                out.push(suffix.clone());
            }
        }
        if out.is_empty() {
            out.push(Word::epsilon());
        }
        out
    }

    /// Gives a plain view on the automaton for printing or visualization.
    pub fn export(&self) -> DfaExport<S> {
        self.dfa.export()
    }
}

impl<S: Symbol> std::fmt::Display for Hypothesis<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(
            ["state".to_string(), "rep".to_string(), "acc".to_string()]
                .into_iter()
                .chain(self.alphabet().universe().map(|sym| sym.show())),
        );
        for (q, rep) in self.representatives.iter() {
            let name = if *q == self.dfa.initial() {
                format!("→q{q}").bold().to_string()
            } else {
                format!("q{q}")
            };
            builder.push_record(
                [name, rep.show(), self.dfa.is_accepting(*q).show()]
                    .into_iter()
                    .chain(self.alphabet().universe().map(|sym| {
                        self.dfa
                            .successor(*q, sym)
                            .map(|p| format!("q{p}"))
                            .unwrap_or_default()
                    })),
            );
        }
        let mut table = builder.build();
        table.with(Style::modern());
        write!(f, "{table}")
    }
}

impl<S: Symbol> std::fmt::Debug for Hypothesis<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hypothesis with {} states, representatives {}",
            self.size(),
            Word::show_collection(self.representatives.right_values())
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::math::Set;
    use crate::prelude::*;
    use crate::tests::{angluin_dfa, contains_aba_dfa};

    fn closed_table(target: Dfa<char>, suffixes: &[&str]) -> ObservationTable<char> {
        let oracle = SimulatorOracle::new(target);
        let mut table = ObservationTable::new(oracle.alphabet().clone());
        table.initialize(&oracle).unwrap();
        for suffix in suffixes {
            table.add_suffix(&Word::from(*suffix), &oracle).unwrap();
        }
        while let Closedness::Promoted(_) = table.make_closed(&oracle).unwrap() {}
        table
    }

    #[test_log::test]
    fn size_equals_distinct_rows() {
        for suffixes in [vec![], vec!["a"], vec!["a", "ba"], vec!["b", "ab", "aa"]] {
            let table = closed_table(angluin_dfa(), &suffixes);
            let hypothesis = Hypothesis::extract(&table).unwrap();
            let distinct: Set<_> = table.prefixes().map(|p| table.row(p).unwrap()).collect();
            assert_eq!(hypothesis.size(), distinct.len());
            assert_eq!(hypothesis.dfa().initial(), 0);
            assert_eq!(hypothesis.representative(0), Some(&Word::epsilon()));
        }
    }

    #[test_log::test]
    fn extraction_is_idempotent() {
        let table = closed_table(contains_aba_dfa(), &["a", "ba"]);
        let first = Hypothesis::extract(&table).unwrap();
        let second = Hypothesis::extract(&table).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.export(), second.export());
    }

    #[test]
    fn unclosed_tables_are_rejected() {
        let oracle = SimulatorOracle::new(angluin_dfa());
        let mut table = ObservationTable::new(oracle.alphabet().clone());
        assert!(matches!(
            Hypothesis::extract(&table),
            Err(LearningError::InvalidState { .. })
        ));
        table.initialize(&oracle).unwrap();
        assert_eq!(
            Hypothesis::extract(&table),
            Err(LearningError::NotClosed("a".into()))
        );
    }

    #[test]
    fn rows_determine_states() {
        let table = closed_table(angluin_dfa(), &["a", "ba", "b"]);
        let hypothesis = Hypothesis::extract(&table).unwrap();
        for prefix in table.prefixes() {
            let state = hypothesis.state_of(prefix).unwrap();
            let rep = hypothesis.representative(state).unwrap();
            assert_eq!(table.row(prefix), table.row(rep));
            assert_eq!(hypothesis.represented_state(rep), Some(state));
        }
    }

    #[test_log::test]
    fn covers_and_local_suffixes() {
        let table = closed_table(angluin_dfa(), &["a", "ba", "b"]);
        let hypothesis = Hypothesis::extract(&table).unwrap();
        let access = hypothesis.access_words();
        assert_eq!(access.len(), hypothesis.size());
        assert_eq!(access[0], (Word::epsilon(), 0));

        let cover = hypothesis.transition_cover();
        assert_eq!(
            access.len() + cover.len(),
            hypothesis.size() * hypothesis.alphabet().size() + 1
        );

        for q in hypothesis.dfa().state_indices() {
            let local = hypothesis.local_suffixes(q);
            assert!(!local.is_empty());
            assert!(local.len() <= hypothesis.characterizing_set().len());
            // the local suffixes must still tell the row of q apart from every other row
            let rep = hypothesis.representative(q).unwrap();
            for p in hypothesis.dfa().state_indices().filter(|p| *p != q) {
                let other = hypothesis.representative(p).unwrap();
                assert!(local.iter().any(|suffix| {
                    let k = table.suffixes().iter().position(|e| e == suffix).unwrap();
                    table.cell(rep, k) != table.cell(other, k)
                }));
            }
        }
    }

    #[test]
    fn display_lists_states() {
        let table = closed_table(angluin_dfa(), &[]);
        let hypothesis = Hypothesis::extract(&table).unwrap();
        let shown = hypothesis.to_string();
        assert!(shown.contains("q1"));
        assert!(shown.contains("rep"));
    }
}
