use std::collections::BTreeSet;

use super::{
    grammar::{NonTerminal, Production, Symbol},
    Grammar, GrammarError,
};

/// How fresh nonterminals are named when direct left recursion is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingScheme {
    /// `A'`, `A''`, ... for a recursive `A`. Never runs out.
    #[default]
    Primed,
    /// The first unused uppercase letter, then a lowercase letter that is
    /// neither a nonterminal nor a terminal yet. Limited to 52 letters.
    Letter,
}

impl Grammar {
    /// Returns a copy of the grammar with left recursion removed.
    ///
    /// Nonterminals are taken in ascending order. Every production of `A_i`
    /// starting with an earlier `A_j` is expanded with the current
    /// productions of `A_j`, then the direct left recursion of `A_i` is
    /// replaced by a fresh nonterminal. Nonterminals synthesized on the way
    /// are not revisited.
    ///
    /// The expansion is only correct when the earlier nonterminals have no
    /// cycle of leftmost derivations (e.g. `A->B; B->A`). This is not checked.
    pub fn eliminate_left_recursion(&self, naming: NamingScheme) -> Result<Grammar, GrammarError> {
        let mut g = self.clone();
        let order: Vec<NonTerminal> = g.non_terminals().collect();

        for (i, &ai) in order.iter().enumerate() {
            for &aj in &order[..i] {
                g.substitute_leading(ai, aj);
            }
            g.eliminate_direct_left_recursion(ai, naming)?;
        }

        Ok(g)
    }

    /// Rewrites every `ai -> aj γ` into `β γ` for each `aj -> β`.
    fn substitute_leading(&mut self, ai: NonTerminal, aj: NonTerminal) {
        let lead = Symbol::NonTerminal(aj);
        if !self.productions(ai).any(|p| p.first() == Some(&lead)) {
            return;
        }

        let mut rewritten: BTreeSet<Production> = BTreeSet::new();
        for production in self.productions(ai) {
            if production.first() == Some(&lead) {
                let gamma = &production.symbols()[1..];
                rewritten.extend(self.productions(aj).map(|beta| beta.concat(gamma)));
            } else {
                rewritten.insert(production.clone());
            }
        }

        log::trace!("substituted {} into {}", aj, ai);
        self.replace_productions(ai, rewritten);
    }

    fn eliminate_direct_left_recursion(
        &mut self,
        a: NonTerminal,
        naming: NamingScheme,
    ) -> Result<(), GrammarError> {
        let lead = Symbol::NonTerminal(a);
        let (pump, base): (Vec<&Production>, Vec<&Production>) =
            self.productions(a).partition(|p| p.first() == Some(&lead));
        if pump.is_empty() {
            return Ok(());
        }

        let fresh = self.fresh_non_terminal(a, naming)?;
        let tail = [Symbol::NonTerminal(fresh)];

        // A -> β A'
        let base: BTreeSet<Production> = base.iter().map(|beta| beta.concat(&tail)).collect();
        // A' -> α A' | @
        let mut pump: BTreeSet<Production> = pump
            .iter()
            .map(|p| Production::new(p.symbols()[1..].iter().chain(tail.iter()).copied()))
            .collect();
        pump.insert(Production::epsilon());

        log::debug!("introduced {} to remove direct left recursion of {}", fresh, a);
        self.insert_non_terminal(fresh);
        self.replace_productions(a, base);
        self.replace_productions(fresh, pump);
        Ok(())
    }

    /// Picks a nonterminal not yet in Vn to stand for the recursive tail of `base`.
    pub fn fresh_non_terminal(
        &self,
        base: NonTerminal,
        naming: NamingScheme,
    ) -> Result<NonTerminal, GrammarError> {
        match naming {
            NamingScheme::Primed => {
                let mut nt = base.primed();
                while self.contains_non_terminal(nt) {
                    nt = nt.primed();
                }
                Ok(nt)
            }
            NamingScheme::Letter => ('A'..='Z')
                .map(NonTerminal::new)
                .find(|nt| *nt != base && !self.contains_non_terminal(*nt))
                .or_else(|| {
                    ('a'..='z')
                        .filter(|c| !self.contains_terminal(*c))
                        .map(NonTerminal::new)
                        .find(|nt| !self.contains_non_terminal(*nt))
                })
                .ok_or(GrammarError::NonTerminalsExhausted { non_terminal: base }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt(c: char) -> NonTerminal {
        NonTerminal::new(c)
    }

    fn rights(g: &Grammar, nt: NonTerminal) -> Vec<String> {
        g.productions(nt).map(|p| p.to_string()).collect()
    }

    fn is_directly_left_recursive(g: &Grammar, nt: NonTerminal) -> bool {
        g.productions(nt)
            .any(|p| p.first() == Some(&Symbol::NonTerminal(nt)))
    }

    #[test]
    fn expression_grammar() {
        let g = Grammar::parse("E->E+T|T; T->T*F|F; F->(E)|i;").unwrap();
        let e = g.eliminate_left_recursion(NamingScheme::Primed).unwrap();

        assert_eq!(rights(&e, nt('E')), vec!["TE'"]);
        assert_eq!(rights(&e, nt('E').primed()), vec!["+TE'", "@"]);
        assert_eq!(rights(&e, nt('F')), vec!["(E)", "i"]);
        assert_eq!(rights(&e, nt('T')), vec!["(E)T'", "iT'"]);
        assert_eq!(rights(&e, nt('T').primed()), vec!["*FT'", "@"]);
        for a in e.non_terminals() {
            assert!(!is_directly_left_recursive(&e, a), "{} is left recursive", a);
        }
        assert_eq!(e.start_symbol(), nt('E'));
    }

    #[test]
    fn original_grammar_is_untouched() {
        let g = Grammar::parse("E->E+T|T; T->i;").unwrap();
        let before = g.clone();
        let e = g.eliminate_left_recursion(NamingScheme::Primed).unwrap();
        assert_eq!(g, before);
        assert_ne!(e, before);
    }

    #[test]
    fn letter_naming_takes_first_unused_uppercase() {
        let g = Grammar::parse("E->E+T|T; T->T*F|F; F->(E)|i;").unwrap();
        let e = g.eliminate_left_recursion(NamingScheme::Letter).unwrap();

        assert_eq!(rights(&e, nt('E')), vec!["TA"]);
        assert_eq!(rights(&e, nt('A')), vec!["+TA", "@"]);
        assert_eq!(rights(&e, nt('T')), vec!["(E)B", "iB"]);
        assert_eq!(rights(&e, nt('B')), vec!["*FB", "@"]);
    }

    #[test]
    fn indirect_recursion_through_epsilon() {
        let g = Grammar::parse("A->Bc; B->Ad|@;").unwrap();
        let e = g.eliminate_left_recursion(NamingScheme::Primed).unwrap();
        let b1 = nt('B').primed();

        assert_eq!(rights(&e, nt('A')), vec!["Bc"]);
        assert_eq!(rights(&e, nt('B')), vec!["B'"]);
        assert_eq!(rights(&e, b1), vec!["cdB'", "@"]);
        for a in e.non_terminals() {
            assert!(!is_directly_left_recursive(&e, a));
        }
    }

    #[test]
    fn grammar_without_left_recursion_is_unchanged() {
        let g = Grammar::parse("S->aA|b; A->cS|@;").unwrap();
        let e = g.eliminate_left_recursion(NamingScheme::Primed).unwrap();
        assert_eq!(e, g);
    }

    #[test]
    fn recursive_alternative_with_empty_remainder() {
        let g = Grammar::parse("A->A|b;").unwrap();
        let e = g.eliminate_left_recursion(NamingScheme::Primed).unwrap();
        assert_eq!(rights(&e, nt('A')), vec!["bA'"]);
        assert_eq!(rights(&e, nt('A').primed()), vec!["A'", "@"]);
    }

    #[test]
    fn primed_names_skip_taken_ones() {
        let mut g = Grammar::parse("A->Aa|b;").unwrap();
        g.insert_non_terminal(nt('A').primed());
        assert_eq!(
            g.fresh_non_terminal(nt('A'), NamingScheme::Primed).unwrap(),
            nt('A').primed().primed()
        );
    }

    #[test]
    fn letter_naming_falls_back_to_unused_lowercase() {
        let uppercase: String = ('A'..='Z').collect();
        let g = Grammar::parse(&format!("S->{}|Sa;", uppercase)).unwrap();
        assert_eq!(
            g.fresh_non_terminal(nt('S'), NamingScheme::Letter).unwrap(),
            nt('b')
        );
    }

    #[test]
    fn letter_naming_exhaustion_is_an_error() {
        let everything: String = ('A'..='Z').chain('a'..='z').collect();
        let g = Grammar::parse(&format!("S->S{}|x;", everything)).unwrap();
        let err = g.eliminate_left_recursion(NamingScheme::Letter).unwrap_err();
        assert_eq!(
            err,
            GrammarError::NonTerminalsExhausted {
                non_terminal: nt('S')
            }
        );
        assert!(g.eliminate_left_recursion(NamingScheme::Primed).is_ok());
    }
}
