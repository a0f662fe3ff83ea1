use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{
    grammar::{NonTerminal, Symbol},
    Grammar, END_MARK,
};

/// FIRST of a nonterminal or a symbol sequence: the terminals that can
/// begin it, and whether it can derive the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirstSet {
    pub terminals: BTreeSet<char>,
    pub nullable: bool,
}

impl FirstSet {
    pub fn epsilon() -> Self {
        Self {
            terminals: BTreeSet::new(),
            nullable: true,
        }
    }

    fn len(&self) -> usize {
        self.terminals.len() + self.nullable as usize
    }

    /// Adds everything from `other`, returns whether `self` grew.
    fn merge(&mut self, other: &FirstSet) -> bool {
        let before = self.len();
        self.terminals.extend(other.terminals.iter().copied());
        self.nullable |= other.nullable;
        self.len() != before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FirstSets(BTreeMap<NonTerminal, FirstSet>);

impl FirstSets {
    pub fn get(&self, nt: NonTerminal) -> Option<&FirstSet> {
        self.0.get(&nt)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonTerminal, &FirstSet)> + '_ {
        self.0.iter().map(|(nt, first)| (*nt, first))
    }

    /// FIRST of `symbols`, scanning left to right while the prefix is
    /// nullable. The empty sequence yields epsilon.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> FirstSet {
        let mut first = FirstSet::default();
        for symbol in symbols {
            match symbol {
                Symbol::Terminal(c) => {
                    first.terminals.insert(*c);
                    return first;
                }
                Symbol::NonTerminal(nt) => {
                    let Some(nt_first) = self.0.get(nt) else {
                        return first;
                    };
                    first.terminals.extend(nt_first.terminals.iter().copied());
                    if !nt_first.nullable {
                        return first;
                    }
                }
            }
        }
        first.nullable = true;
        first
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FollowSets(BTreeMap<NonTerminal, BTreeSet<char>>);

impl FollowSets {
    pub fn get(&self, nt: NonTerminal) -> Option<&BTreeSet<char>> {
        self.0.get(&nt)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonTerminal, &BTreeSet<char>)> + '_ {
        self.0.iter().map(|(nt, follow)| (*nt, follow))
    }
}

impl Grammar {
    /// Computes FIRST for every nonterminal by iterating to a fixpoint.
    pub fn first_sets(&self) -> FirstSets {
        let mut first = FirstSets(
            self.non_terminals()
                .map(|nt| (nt, FirstSet::default()))
                .collect(),
        );

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for (left, production) in self.production_iter() {
                let production_first = first.of_sequence(production.symbols());
                if let Some(left_first) = first.0.get_mut(&left) {
                    changed |= left_first.merge(&production_first);
                }
            }
        }

        log::debug!("FIRST sets converged after {} rounds", rounds);
        first
    }

    /// Computes FOLLOW for every nonterminal by iterating to a fixpoint.
    /// The start symbol is followed by the end marker.
    pub fn follow_sets(&self, first: &FirstSets) -> FollowSets {
        let mut follow: BTreeMap<NonTerminal, BTreeSet<char>> = self
            .non_terminals()
            .map(|nt| (nt, BTreeSet::new()))
            .collect();
        follow
            .entry(self.start_symbol())
            .or_default()
            .insert(END_MARK);

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for (left, production) in self.production_iter() {
                let symbols = production.symbols();
                for (i, symbol) in symbols.iter().enumerate() {
                    let Symbol::NonTerminal(b) = symbol else {
                        continue;
                    };

                    let beta_first = first.of_sequence(&symbols[i + 1..]);
                    let mut additions = beta_first.terminals;
                    if beta_first.nullable {
                        additions.extend(follow.get(&left).into_iter().flatten().copied());
                    }

                    let b_follow = follow.entry(*b).or_default();
                    let before = b_follow.len();
                    b_follow.extend(additions);
                    changed |= b_follow.len() != before;
                }
            }
        }

        log::debug!("FOLLOW sets converged after {} rounds", rounds);
        FollowSets(follow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::NamingScheme;

    fn nt(c: char) -> NonTerminal {
        NonTerminal::new(c)
    }

    fn set(s: &str) -> BTreeSet<char> {
        s.chars().collect()
    }

    fn eliminated(text: &str) -> Grammar {
        Grammar::parse(text)
            .unwrap()
            .eliminate_left_recursion(NamingScheme::Primed)
            .unwrap()
    }

    #[test]
    fn expression_grammar_first() {
        let g = eliminated("E->E+T|T; T->T*F|F; F->(E)|i;");
        let first = g.first_sets();

        let e = first.get(nt('E')).unwrap();
        assert_eq!(e.terminals, set("(i"));
        assert!(!e.nullable);

        let e1 = first.get(nt('E').primed()).unwrap();
        assert_eq!(e1.terminals, set("+"));
        assert!(e1.nullable);

        let t1 = first.get(nt('T').primed()).unwrap();
        assert_eq!(t1.terminals, set("*"));
        assert!(t1.nullable);
    }

    #[test]
    fn expression_grammar_follow() {
        let g = eliminated("E->E+T|T; T->T*F|F; F->(E)|i;");
        let first = g.first_sets();
        let follow = g.follow_sets(&first);

        assert_eq!(follow.get(nt('E')).unwrap(), &set("#)"));
        assert_eq!(follow.get(nt('E').primed()).unwrap(), &set("#)"));
        assert_eq!(follow.get(nt('T')).unwrap(), &set("#)+"));
        assert_eq!(follow.get(nt('T').primed()).unwrap(), &set("#)+"));
        assert_eq!(follow.get(nt('F')).unwrap(), &set("#)*+"));
    }

    #[test]
    fn nullable_start() {
        let g = eliminated("S->a|@;");
        let first = g.first_sets();
        let follow = g.follow_sets(&first);

        assert_eq!(
            first.get(nt('S')).unwrap(),
            &FirstSet {
                terminals: set("a"),
                nullable: true
            }
        );
        assert_eq!(follow.get(nt('S')).unwrap(), &set("#"));
    }

    #[test]
    fn nullable_chain() {
        let g = Grammar::parse("S->ABc; A->a|@; B->b|@;").unwrap();
        let first = g.first_sets();

        assert_eq!(first.get(nt('S')).unwrap().terminals, set("abc"));
        assert!(!first.get(nt('S')).unwrap().nullable);
        assert_eq!(first.of_sequence(&[]), FirstSet::epsilon());
        assert_eq!(
            first.of_sequence(&[Symbol::NonTerminal(nt('A')), Symbol::NonTerminal(nt('B'))]),
            FirstSet {
                terminals: set("ab"),
                nullable: true
            }
        );

        let follow = g.follow_sets(&first);
        assert_eq!(follow.get(nt('A')).unwrap(), &set("bc"));
        assert_eq!(follow.get(nt('B')).unwrap(), &set("c"));
    }

    #[test]
    fn first_is_bounded_by_terminals_and_follow_has_no_epsilon() {
        let g = eliminated("A->Bc; B->Ad|@;");
        let first = g.first_sets();
        let follow = g.follow_sets(&first);
        let vt: BTreeSet<char> = g.terminals().collect();

        for (a, f) in first.iter() {
            assert!(f.terminals.is_subset(&vt), "FIRST({}) escapes Vt", a);
            let has_nullable_alternative = g
                .productions(a)
                .any(|p| first.of_sequence(p.symbols()).nullable);
            assert_eq!(f.nullable, has_nullable_alternative);
        }
        for (_, f) in follow.iter() {
            assert!(f.is_subset(&vt));
            assert!(!f.contains(&crate::grammar::EPSILON));
        }
        assert!(follow.get(g.start_symbol()).unwrap().contains(&END_MARK));
    }
}
