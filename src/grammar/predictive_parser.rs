use crowbook_text_processing::escape::tex as escape_tex;
use serde::Serialize;
use std::fmt;

use super::{
    grammar::{NonTerminal, Production, Symbol},
    ll1_parsing_table::LL1ParsingTable,
    END_MARK, EPSILON,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Nothing to recognize, not even the end marker.
    EmptyInput,
    /// The stack reached `#` with input left over.
    StackExhausted,
    TerminalMismatch { expected: char, found: char },
    /// The table has the error sentinel at `M[non_terminal, lookahead]`.
    NoProduction { non_terminal: NonTerminal, lookahead: char },
    StepLimitExceeded { limit: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyInput => write!(f, "empty input"),
            RejectReason::StackExhausted => write!(f, "stack exhausted before the input"),
            RejectReason::TerminalMismatch { expected, found } => {
                write!(f, "expected {} but found {}", expected, found)
            }
            RejectReason::NoProduction {
                non_terminal,
                lookahead,
            } => write!(f, "no production for {} on {}", non_terminal, lookahead),
            RejectReason::StepLimitExceeded { limit } => {
                write!(f, "gave up after {} steps", limit)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseAction {
    Match { terminal: char },
    Expand { non_terminal: NonTerminal, production: Production },
    Accept,
    Reject { reason: RejectReason },
}

impl fmt::Display for ParseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAction::Match { terminal } => write!(f, "match {}", terminal),
            ParseAction::Expand {
                non_terminal,
                production,
            } => write!(f, "{}->{}", non_terminal, production),
            ParseAction::Accept => write!(f, "accept"),
            ParseAction::Reject { reason } => write!(f, "error: {}", reason),
        }
    }
}

/// One row of the trace: the configuration before the action ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseStep {
    /// Bottom to top.
    pub stack: Vec<Symbol>,
    /// Unread input, end marker included.
    pub input: String,
    pub action: ParseAction,
}

impl ParseStep {
    pub fn stack_string(&self) -> String {
        self.stack.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    /// `step` counts from 1; 0 means the input was refused before parsing.
    Rejected { step: usize, reason: RejectReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTrace {
    pub steps: Vec<ParseStep>,
    pub verdict: Verdict,
}

impl ParseTrace {
    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }

    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<[String; 3]> = vec![[
            "stack".to_string(),
            "input".to_string(),
            "action".to_string(),
        ]];
        output.extend(
            self.steps
                .iter()
                .map(|s| [s.stack_string(), s.input.clone(), s.action.to_string()]),
        );

        let width: Vec<usize> = (0..3)
            .map(|j| output.iter().map(|row| row[j].chars().count()).max().unwrap_or(0))
            .collect();
        let mut lines: Vec<String> = output
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:<width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
                    .trim_end()
                    .to_string()
            })
            .collect();
        lines.push(match &self.verdict {
            Verdict::Accepted => "accepted".to_string(),
            Verdict::Rejected { step, reason } => {
                format!("rejected at step {}: {}", step, reason)
            }
        });
        lines.join("\n")
    }

    pub fn to_latex(&self) -> String {
        let rows = self
            .steps
            .iter()
            .map(|s| {
                let action = match &s.action {
                    ParseAction::Expand {
                        non_terminal,
                        production,
                    } => format!(
                        "${} \\rightarrow {}$",
                        escape_tex(non_terminal.to_string()),
                        escape_tex(production.to_string()).replace(EPSILON, "\\epsilon")
                    ),
                    other => escape_tex(other.to_string()).to_string(),
                };
                format!(
                    "{} & {} & {}",
                    escape_tex(s.stack_string()),
                    escape_tex(s.input.clone()),
                    action
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        "\\begin{tabular}{l|r|l}\n".to_string()
            + "Stack & Input & Action\\\\\\hline\n"
            + &rows
            + "\\\\\n\\end{tabular}"
    }
}

/// Table-driven LL(1) recognizer.
pub struct PredictiveParser<'a> {
    table: &'a LL1ParsingTable,
    start_symbol: NonTerminal,
    step_limit: Option<usize>,
}

impl<'a> PredictiveParser<'a> {
    pub fn new(table: &'a LL1ParsingTable, start_symbol: NonTerminal) -> Self {
        Self {
            table,
            start_symbol,
            step_limit: None,
        }
    }

    /// Rejects inputs that take more than `limit` steps. A grammar whose
    /// table loops on epsilon productions never terminates otherwise.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Recognizes `input`. Whitespace is ignored and a trailing `#` is
    /// supplied when missing.
    pub fn parse(&self, input: &str) -> ParseTrace {
        let mut tokens: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
        if tokens.is_empty() {
            log::debug!("refusing empty input");
            return ParseTrace {
                steps: Vec::new(),
                verdict: Verdict::Rejected {
                    step: 0,
                    reason: RejectReason::EmptyInput,
                },
            };
        }
        if tokens.last() == Some(&END_MARK) {
            tokens.pop();
        }

        let mut stack: Vec<Symbol> = vec![
            Symbol::Terminal(END_MARK),
            Symbol::NonTerminal(self.start_symbol),
        ];
        let mut pos = 0;
        let mut steps: Vec<ParseStep> = Vec::new();

        loop {
            let lookahead = tokens.get(pos).copied().unwrap_or(END_MARK);
            let remaining: String = tokens[pos..].iter().chain([END_MARK].iter()).collect();
            let snapshot = stack.clone();

            let action = match self.step_limit {
                Some(limit) if steps.len() >= limit => ParseAction::Reject {
                    reason: RejectReason::StepLimitExceeded { limit },
                },
                _ => self.step(&mut stack, &mut pos, &tokens, lookahead),
            };

            log::trace!(
                "{:<20} {:<20} {}",
                snapshot.iter().map(|s| s.to_string()).collect::<String>(),
                remaining,
                action
            );
            steps.push(ParseStep {
                stack: snapshot,
                input: remaining,
                action: action.clone(),
            });

            match action {
                ParseAction::Accept => {
                    return ParseTrace {
                        steps,
                        verdict: Verdict::Accepted,
                    }
                }
                ParseAction::Reject { reason } => {
                    return ParseTrace {
                        verdict: Verdict::Rejected {
                            step: steps.len(),
                            reason,
                        },
                        steps,
                    }
                }
                ParseAction::Match { .. } | ParseAction::Expand { .. } => {}
            }
        }
    }

    fn step(
        &self,
        stack: &mut Vec<Symbol>,
        pos: &mut usize,
        tokens: &[char],
        lookahead: char,
    ) -> ParseAction {
        let reject = |reason| ParseAction::Reject { reason };

        let top = match stack.pop() {
            Some(top) => top,
            None => return reject(RejectReason::StackExhausted),
        };

        match top {
            Symbol::Terminal(END_MARK) => {
                if lookahead == END_MARK && *pos >= tokens.len() {
                    ParseAction::Accept
                } else {
                    reject(RejectReason::StackExhausted)
                }
            }
            Symbol::Terminal(terminal) if terminal == lookahead => {
                *pos += 1;
                ParseAction::Match { terminal }
            }
            Symbol::Terminal(expected) => reject(RejectReason::TerminalMismatch {
                expected,
                found: lookahead,
            }),
            Symbol::NonTerminal(non_terminal) => {
                match self.table.lookup(non_terminal, lookahead) {
                    Some(production) => {
                        stack.extend(production.symbols().iter().rev().copied());
                        ParseAction::Expand {
                            non_terminal,
                            production: production.clone(),
                        }
                    }
                    None => reject(RejectReason::NoProduction {
                        non_terminal,
                        lookahead,
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{ConflictPolicy, Grammar, NamingScheme};

    fn table_for(text: &str) -> (LL1ParsingTable, NonTerminal) {
        let g = Grammar::parse(text)
            .unwrap()
            .eliminate_left_recursion(NamingScheme::Primed)
            .unwrap();
        let first = g.first_sets();
        let follow = g.follow_sets(&first);
        let table = g
            .generate_ll1_parsing_table(&first, &follow, ConflictPolicy::Overwrite)
            .unwrap();
        (table, g.start_symbol())
    }

    const EXPR: &str = "E->E+T|T; T->T*F|F; F->(E)|i;";

    #[test]
    fn accepts_expression() {
        let (table, start) = table_for(EXPR);
        let parser = PredictiveParser::new(&table, start);
        assert!(parser.parse("i+i*i#").is_accepted());
        assert!(parser.parse("(i+i)*i").is_accepted());
        assert!(parser.parse(" i * ( i ) # ").is_accepted());
    }

    #[test]
    fn rejects_dangling_operator() {
        let (table, start) = table_for(EXPR);
        let trace = PredictiveParser::new(&table, start).parse("i+#");
        assert!(!trace.is_accepted());
        match trace.verdict {
            Verdict::Rejected { step, reason } => {
                assert_eq!(step, trace.steps.len());
                assert_eq!(
                    reason,
                    RejectReason::NoProduction {
                        non_terminal: NonTerminal::new('T'),
                        lookahead: '#'
                    }
                );
            }
            Verdict::Accepted => unreachable!(),
        }
    }

    #[test]
    fn rejects_terminal_mismatch() {
        let (table, start) = table_for(EXPR);
        let trace = PredictiveParser::new(&table, start).parse("(i#");
        assert_eq!(
            trace.verdict,
            Verdict::Rejected {
                step: trace.steps.len(),
                reason: RejectReason::TerminalMismatch {
                    expected: ')',
                    found: '#'
                }
            }
        );
    }

    #[test]
    fn rejects_leftover_input() {
        let (table, start) = table_for("S->a;");
        let parser = PredictiveParser::new(&table, start);
        let trace = parser.parse("a#a");
        assert!(matches!(
            trace.verdict,
            Verdict::Rejected {
                reason: RejectReason::StackExhausted,
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_input() {
        let (table, start) = table_for(EXPR);
        let trace = PredictiveParser::new(&table, start).parse("  ");
        assert!(trace.steps.is_empty());
        assert_eq!(
            trace.verdict,
            Verdict::Rejected {
                step: 0,
                reason: RejectReason::EmptyInput
            }
        );
    }

    #[test]
    fn nullable_start() {
        let (table, start) = table_for("S->a|@;");
        let parser = PredictiveParser::new(&table, start);
        assert!(parser.parse("#").is_accepted());
        assert!(parser.parse("a#").is_accepted());
        assert!(parser.parse("a").is_accepted());
        assert!(!parser.parse("aa#").is_accepted());
    }

    #[test]
    fn indirect_recursion_accepts_minimal_string() {
        let (table, start) = table_for("A->Bc; B->Ad|@;");
        let parser = PredictiveParser::new(&table, start);
        assert!(parser.parse("c#").is_accepted());
    }

    #[test]
    fn trace_records_every_configuration() {
        let (table, start) = table_for("S->a|@;");
        let trace = PredictiveParser::new(&table, start).parse("a#");
        let rows: Vec<(String, String, String)> = trace
            .steps
            .iter()
            .map(|s| (s.stack_string(), s.input.clone(), s.action.to_string()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("#S".to_string(), "a#".to_string(), "S->a".to_string()),
                ("#a".to_string(), "a#".to_string(), "match a".to_string()),
                ("#".to_string(), "#".to_string(), "accept".to_string()),
            ]
        );
        assert!(trace.to_plaintext().ends_with("accepted"));
    }

    #[test]
    fn step_limit_stops_epsilon_loops() {
        // M[A, e] = CAa after the conflict with Bd, and C only derives epsilon.
        let (table, start) = table_for("A->CAa|Bd; B->e; C->@;");
        let parser = PredictiveParser::new(&table, start).with_step_limit(50);
        let trace = parser.parse("e#");
        assert_eq!(
            trace.verdict,
            Verdict::Rejected {
                step: 51,
                reason: RejectReason::StepLimitExceeded { limit: 50 }
            }
        );
    }
}
