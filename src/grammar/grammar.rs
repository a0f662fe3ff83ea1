use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};

use super::{END_MARK, EPSILON};

/// A nonterminal: a letter plus the number of primes added while it was
/// synthesized (`E`, `E'`, `E''`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonTerminal {
    letter: char,
    primes: usize,
}

impl NonTerminal {
    pub fn new(letter: char) -> Self {
        Self { letter, primes: 0 }
    }

    pub fn primed(self) -> Self {
        Self {
            letter: self.letter,
            primes: self.primes + 1,
        }
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter)?;
        for _ in 0..self.primes {
            f.write_str("'")?;
        }
        Ok(())
    }
}

impl Serialize for NonTerminal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(char),
}

impl Symbol {
    /// Classifies a grammar-text character. Uppercase letters are
    /// nonterminals, the epsilon marker is no symbol at all.
    pub fn from_char(c: char) -> Option<Self> {
        if c == EPSILON {
            None
        } else if is_non_terminal(c) {
            Some(Symbol::NonTerminal(NonTerminal::new(c)))
        } else {
            Some(Symbol::Terminal(c))
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::NonTerminal(nt) => nt.fmt(f),
            Symbol::Terminal(c) => write!(f, "{}", c),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whether a raw grammar-text character names a nonterminal.
pub fn is_non_terminal(c: char) -> bool {
    c.is_ascii_uppercase()
}

/// One alternative of a nonterminal. The empty sequence is epsilon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Production(Vec<Symbol>);

impl Production {
    /// Builds a production, dropping any stray epsilon markers.
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self(
            symbols
                .into_iter()
                .filter(|s| *s != Symbol::Terminal(EPSILON))
                .collect(),
        )
    }

    pub fn epsilon() -> Self {
        Self(Vec::new())
    }

    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn first(&self) -> Option<&Symbol> {
        self.0.first()
    }

    /// `self` followed by `rest`.
    pub fn concat(&self, rest: &[Symbol]) -> Self {
        Self(self.0.iter().chain(rest.iter()).copied().collect())
    }
}

impl From<&str> for Production {
    fn from(s: &str) -> Self {
        Self::new(s.chars().filter_map(Symbol::from_char))
    }
}

// Epsilon sorts after every other alternative.
impl Ord for Production {
    fn cmp(&self, other: &Self) -> Ordering {
        self.is_epsilon()
            .cmp(&other.is_epsilon())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Production {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_epsilon() {
            return write!(f, "{}", EPSILON);
        }
        for s in &self.0 {
            s.fmt(f)?;
        }
        Ok(())
    }
}

impl Serialize for Production {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    non_terminals: BTreeSet<NonTerminal>,
    terminals: BTreeSet<char>,
    start_symbol: NonTerminal,
    productions: BTreeMap<NonTerminal, BTreeSet<Production>>,
}

impl Grammar {
    pub fn new(start_symbol: NonTerminal) -> Self {
        let mut g = Self {
            non_terminals: BTreeSet::new(),
            terminals: BTreeSet::new(),
            start_symbol,
            productions: BTreeMap::new(),
        };
        g.insert_non_terminal(start_symbol);
        g.terminals.insert(END_MARK);
        g
    }

    pub fn start_symbol(&self) -> NonTerminal {
        self.start_symbol
    }

    pub fn set_start_symbol(&mut self, start_symbol: NonTerminal) {
        self.insert_non_terminal(start_symbol);
        self.start_symbol = start_symbol;
    }

    /// Vn in ascending order.
    pub fn non_terminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        self.non_terminals.iter().copied()
    }

    /// Vt in ascending order, always including the end marker.
    pub fn terminals(&self) -> impl Iterator<Item = char> + '_ {
        self.terminals.iter().copied()
    }

    pub fn contains_non_terminal(&self, nt: NonTerminal) -> bool {
        self.non_terminals.contains(&nt)
    }

    pub fn contains_terminal(&self, c: char) -> bool {
        self.terminals.contains(&c)
    }

    pub fn is_non_terminal(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::NonTerminal(nt) => self.non_terminals.contains(nt),
            Symbol::Terminal(_) => false,
        }
    }

    /// The alternatives of `nt`, epsilon last. Empty for unknown nonterminals.
    pub fn productions(&self, nt: NonTerminal) -> impl Iterator<Item = &Production> + '_ {
        self.productions.get(&nt).into_iter().flatten()
    }

    /// Every `(lhs, production)` pair, grouped by nonterminal in Vn order.
    pub fn production_iter(&self) -> impl Iterator<Item = (NonTerminal, &Production)> + '_ {
        self.productions
            .iter()
            .flat_map(|(nt, prods)| prods.iter().map(move |p| (*nt, p)))
    }

    pub fn insert_non_terminal(&mut self, nt: NonTerminal) -> bool {
        self.productions.entry(nt).or_default();
        self.non_terminals.insert(nt)
    }

    fn register(&mut self, symbol: &Symbol) {
        match symbol {
            Symbol::NonTerminal(nt) => {
                self.insert_non_terminal(*nt);
            }
            Symbol::Terminal(c) => {
                self.terminals.insert(*c);
            }
        }
    }

    pub fn add_production(&mut self, left: NonTerminal, right: Production) {
        self.insert_non_terminal(left);
        for symbol in right.symbols() {
            self.register(symbol);
        }
        self.productions.entry(left).or_default().insert(right);
    }

    pub fn replace_productions(&mut self, left: NonTerminal, rights: BTreeSet<Production>) {
        self.insert_non_terminal(left);
        for symbol in rights.iter().flat_map(|p| p.symbols()) {
            self.register(symbol);
        }
        self.productions.insert(left, rights);
    }
}
