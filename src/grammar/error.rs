use thiserror::Error;

use super::{ll1_parsing_table::Conflict, NonTerminal};

/// Everything that can stop the grammar pipeline before a table exists.
///
/// A rejected input string is not an error: the predictive parser reports
/// it through [`Verdict`](super::Verdict).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The grammar text contained no usable `LHS->RHS` rule.
    #[error("grammar contains no rules")]
    EmptyGrammar,

    /// The left side of a rule is not a single uppercase letter.
    #[error("rule {rule:?}: left side must be a single uppercase letter")]
    InvalidLeftHandSide { rule: String },

    /// The letter naming scheme ran out of fresh letters while removing
    /// direct left recursion from `non_terminal`.
    #[error("no unused letter left to eliminate left recursion of {non_terminal}")]
    NonTerminalsExhausted { non_terminal: NonTerminal },

    /// The strict table build found cells claimed by more than one production.
    #[error("grammar is not LL(1): {}", describe_conflicts(.conflicts))]
    NotLl1 { conflicts: Vec<Conflict> },
}

fn describe_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
