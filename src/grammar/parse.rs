use std::collections::BTreeSet;

use crate::Grammar;

use super::{
    grammar::{is_non_terminal, NonTerminal, Production},
    GrammarError,
};

impl Grammar {
    /// Loads grammar text of the form `E->E+T|T; T->i;`.
    ///
    /// Whitespace is ignored everywhere. Rules without `->`, or with an
    /// empty side, are skipped. The first rule names the start symbol.
    pub fn parse(grammar: &str) -> Result<Self, GrammarError> {
        let mut loaded: Option<Self> = None;
        let mut defined: BTreeSet<NonTerminal> = BTreeSet::new();

        for rule in grammar.split(';') {
            let rule: String = rule.chars().filter(|c| !c.is_whitespace()).collect();
            if rule.is_empty() {
                continue;
            }
            let (left, rights) = match rule.split_once("->") {
                Some(parts) => parts,
                None => {
                    log::debug!("skipping rule without \"->\": {:?}", rule);
                    continue;
                }
            };
            if left.is_empty() || rights.is_empty() {
                log::debug!("skipping rule with an empty side: {:?}", rule);
                continue;
            }

            let mut chars = left.chars();
            let left = match (chars.next(), chars.next()) {
                (Some(c), None) if is_non_terminal(c) => NonTerminal::new(c),
                _ => {
                    return Err(GrammarError::InvalidLeftHandSide {
                        rule: rule.clone(),
                    })
                }
            };
            defined.insert(left);

            let g = loaded.get_or_insert_with(|| Grammar::new(left));
            for right in rights.split('|').filter(|r| !r.is_empty()) {
                g.add_production(left, Production::from(right));
            }
        }

        let g = loaded.ok_or(GrammarError::EmptyGrammar)?;

        for nt in g.non_terminals().filter(|nt| !defined.contains(nt)) {
            log::warn!("nonterminal {} is used but has no productions", nt);
        }
        log::debug!(
            "loaded grammar: {} nonterminals, {} terminals, start {}",
            g.non_terminals().count(),
            g.terminals().count(),
            g.start_symbol()
        );

        Ok(g)
    }
}
