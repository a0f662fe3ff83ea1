use crowbook_text_processing::escape;
use serde::Serialize;

use super::{
    first_follow::{FirstSets, FollowSets},
    Grammar, EPSILON,
};

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput {
    pub left: String,
    pub rights: Vec<String>,
}

impl ProductionOutput {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left.as_str()))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left.as_str()))
        };
        let right = self
            .rights
            .iter()
            .map(|right| escape::tex(right.as_str()).to_string())
            .collect::<Vec<_>>()
            .join(" \\mid ");

        (left + &right).replace(EPSILON, "\\epsilon")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProductionOutputVec {
    productions: Vec<ProductionOutput>,
}

impl ProductionOutputVec {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .filter(|p| !p.rights.is_empty())
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(
                self.productions
                    .iter()
                    .filter(|p| !p.rights.is_empty())
                    .map(|s| s.to_latex(true)),
            )
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }
}

/// Vn, Vt, the start symbol and the productions of a grammar.
#[derive(Debug, Clone, Serialize)]
pub struct GrammarOutput {
    non_terminals: Vec<String>,
    terminals: Vec<String>,
    start_symbol: String,
    productions: ProductionOutputVec,
}

impl GrammarOutput {
    pub fn to_plaintext(&self) -> String {
        format!(
            "Vn: {}\nVt: {}\nS: {}\n{}",
            self.non_terminals.join(" "),
            self.terminals.join(" "),
            self.start_symbol,
            self.productions.to_plaintext()
        )
    }

    pub fn to_latex(&self) -> String {
        fn f(a: &[String]) -> String {
            a.iter()
                .map(|s| escape::tex(s.as_str()).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        format!(
            "$V_N = \\{{{}\\}}$\\\\\n$V_T = \\{{{}\\}}$\\\\\n$S = {}$\\\\\n{}",
            f(&self.non_terminals),
            f(&self.terminals),
            escape::tex(self.start_symbol.as_str()),
            self.productions.to_latex()
        )
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .non_terminals()
            .map(|nt| ProductionOutput {
                left: nt.to_string(),
                rights: self.productions(nt).map(|p| p.to_string()).collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }

    pub fn to_grammar_output(&self) -> GrammarOutput {
        GrammarOutput {
            non_terminals: self.non_terminals().map(|nt| nt.to_string()).collect(),
            terminals: self.terminals().map(|t| t.to_string()).collect(),
            start_symbol: self.start_symbol().to_string(),
            productions: self.to_production_output_vec(),
        }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput {
    name: String,
    nullable: bool,
    first: Vec<String>,
    follow: Vec<String>,
}

impl NonTerminalOutput {
    fn to_plaintext(&self, name_width: usize) -> String {
        format!(
            "{:>width$} | {:>5} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", "),
            width = name_width
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[String]) -> String {
            a.iter()
                .map(|s| escape::tex(s.as_str()).to_string())
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name.as_str()),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct NonTerminalOutputVec {
    data: Vec<NonTerminalOutput>,
}

impl NonTerminalOutputVec {
    pub fn to_plaintext(&self) -> String {
        let name_width = self
            .data
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0);
        self.data
            .iter()
            .map(|s| s.to_plaintext(name_width))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    /// FIRST and FOLLOW per nonterminal. FIRST lists `@` last when the
    /// nonterminal is nullable.
    pub fn to_non_terminal_output_vec(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
    ) -> NonTerminalOutputVec {
        let data = self
            .non_terminals()
            .map(|nt| {
                let nt_first = first.get(nt).cloned().unwrap_or_default();
                let mut t = NonTerminalOutput {
                    name: nt.to_string(),
                    nullable: nt_first.nullable,
                    first: nt_first.terminals.iter().map(|c| c.to_string()).collect(),
                    follow: follow
                        .get(nt)
                        .into_iter()
                        .flatten()
                        .map(|c| c.to_string())
                        .collect(),
                };
                if nt_first.nullable {
                    t.first.push(EPSILON.to_string());
                }
                t
            })
            .collect();
        NonTerminalOutputVec { data }
    }
}
