pub mod analysis;
pub mod eliminate_left_recursion;
pub mod error;
pub mod first_follow;
pub mod grammar;
pub mod ll1_parsing_table;
pub mod parse;
pub mod predictive_parser;
pub mod pretty_print;

pub use analysis::{AnalysisOptions, Ll1Analysis};
pub use eliminate_left_recursion::NamingScheme;
pub use error::GrammarError;
pub use first_follow::{FirstSet, FirstSets, FollowSets};
pub use grammar::{Grammar, NonTerminal, Production, Symbol};
pub use ll1_parsing_table::{Conflict, ConflictPolicy, LL1ParsingTable, TableEntry};
pub use predictive_parser::{ParseAction, ParseStep, ParseTrace, PredictiveParser, RejectReason, Verdict};

pub const EPSILON: char = '@';
pub const END_MARK: char = '#';
