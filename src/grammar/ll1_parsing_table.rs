use crowbook_text_processing::escape::tex as escape_tex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::Grammar;

use super::{
    first_follow::{FirstSets, FollowSets},
    grammar::{NonTerminal, Production},
    GrammarError, EPSILON,
};

/// What to do when two productions of a nonterminal claim the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// The production written last keeps the cell. Conflicts are still
    /// recorded on the table.
    #[default]
    Overwrite,
    /// Fail the build with [`GrammarError::NotLl1`].
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TableEntry {
    Production(Production),
    Error,
}

static ERROR_ENTRY: TableEntry = TableEntry::Error;

impl TableEntry {
    pub fn production(&self) -> Option<&Production> {
        match self {
            TableEntry::Production(p) => Some(p),
            TableEntry::Error => None,
        }
    }
}

/// A cell written by two different productions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub non_terminal: NonTerminal,
    pub terminal: char,
    pub kept: Production,
    pub discarded: Production,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M[{}, {}] = {}->{} | {}->{}",
            self.non_terminal,
            self.terminal,
            self.non_terminal,
            self.kept,
            self.non_terminal,
            self.discarded
        )
    }
}

/// The predictive parse table. Every (nonterminal, terminal) pair of the
/// grammar it was built from has an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LL1ParsingTable {
    terminals: Vec<char>,
    rows: BTreeMap<NonTerminal, BTreeMap<char, TableEntry>>,
    conflicts: Vec<Conflict>,
}

impl LL1ParsingTable {
    pub fn terminals(&self) -> &[char] {
        &self.terminals
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        self.rows.keys().copied()
    }

    /// The cell for `(nt, terminal)`; pairs outside the grammar read as errors.
    pub fn entry(&self, nt: NonTerminal, terminal: char) -> &TableEntry {
        self.rows
            .get(&nt)
            .and_then(|row| row.get(&terminal))
            .unwrap_or(&ERROR_ENTRY)
    }

    pub fn lookup(&self, nt: NonTerminal, terminal: char) -> Option<&Production> {
        self.entry(nt, terminal).production()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(row.values().map(|entry| match entry {
                TableEntry::Production(p) => format!("{}->{}", left, p),
                TableEntry::Error => String::new(),
            }));
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|line| line[j].chars().count()).max().unwrap_or(0))
            .collect();
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|t| format!("\\text{{{}}}", escape_tex(t.to_string()))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        for (left, row) in &self.rows {
            let left = escape_tex(left.to_string()).to_string();
            let mut line: Vec<String> = vec![left.clone()];
            line.extend(row.values().map(|entry| match entry {
                TableEntry::Production(p) => format!(
                    "{} \\rightarrow {}",
                    left,
                    escape_tex(p.to_string()).replace(EPSILON, "\\epsilon")
                ),
                TableEntry::Error => String::new(),
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

impl Grammar {
    /// Builds the LL(1) table from this grammar's FIRST and FOLLOW sets.
    ///
    /// `A -> α` goes into every `M[A, a]` with `a` in FIRST(α), and into every
    /// `M[A, b]` with `b` in FOLLOW(A) when α is nullable. The alternatives of
    /// each nonterminal are written in `Production` order, epsilon last.
    pub fn generate_ll1_parsing_table(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
        policy: ConflictPolicy,
    ) -> Result<LL1ParsingTable, GrammarError> {
        let terminals: Vec<char> = self.terminals().collect();
        let mut rows: BTreeMap<NonTerminal, BTreeMap<char, TableEntry>> = BTreeMap::new();
        let mut conflicts: Vec<Conflict> = Vec::new();

        for nt in self.non_terminals() {
            let mut written: BTreeMap<char, &Production> = BTreeMap::new();
            for production in self.productions(nt) {
                let production_first = first.of_sequence(production.symbols());
                let lookaheads = production_first.terminals.iter().chain(
                    follow
                        .get(nt)
                        .filter(|_| production_first.nullable)
                        .into_iter()
                        .flatten(),
                );

                for &a in lookaheads {
                    match written.insert(a, production) {
                        Some(previous) if previous != production => {
                            let conflict = Conflict {
                                non_terminal: nt,
                                terminal: a,
                                kept: production.clone(),
                                discarded: previous.clone(),
                            };
                            log::warn!("LL(1) conflict at {}", conflict);
                            conflicts.push(conflict);
                        }
                        _ => {}
                    }
                }
            }

            let row = terminals
                .iter()
                .map(|&t| {
                    let entry = written
                        .get(&t)
                        .map_or(TableEntry::Error, |p| TableEntry::Production((*p).clone()));
                    (t, entry)
                })
                .collect();
            rows.insert(nt, row);
        }

        if policy == ConflictPolicy::Reject && !conflicts.is_empty() {
            return Err(GrammarError::NotLl1 { conflicts });
        }

        Ok(LL1ParsingTable {
            terminals,
            rows,
            conflicts,
        })
    }
}
