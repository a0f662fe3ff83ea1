use super::{
    eliminate_left_recursion::NamingScheme,
    first_follow::{FirstSets, FollowSets},
    ll1_parsing_table::{ConflictPolicy, LL1ParsingTable},
    predictive_parser::{ParseTrace, PredictiveParser},
    Grammar, GrammarError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub naming: NamingScheme,
    pub conflicts: ConflictPolicy,
    pub step_limit: Option<usize>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            naming: NamingScheme::default(),
            conflicts: ConflictPolicy::default(),
            step_limit: Some(10_000),
        }
    }
}

/// Every stage of the LL(1) construction for one grammar.
///
/// `original` is the grammar as loaded; everything else is derived from the
/// left-recursion-free copy in `grammar`.
#[derive(Debug, Clone)]
pub struct Ll1Analysis {
    pub original: Grammar,
    pub grammar: Grammar,
    pub first: FirstSets,
    pub follow: FollowSets,
    pub table: LL1ParsingTable,
    step_limit: Option<usize>,
}

impl Ll1Analysis {
    pub fn new(original: &Grammar, options: &AnalysisOptions) -> Result<Self, GrammarError> {
        let grammar = original.eliminate_left_recursion(options.naming)?;
        let first = grammar.first_sets();
        let follow = grammar.follow_sets(&first);
        let table = grammar.generate_ll1_parsing_table(&first, &follow, options.conflicts)?;

        Ok(Self {
            original: original.clone(),
            grammar,
            first,
            follow,
            table,
            step_limit: options.step_limit,
        })
    }

    pub fn parser(&self) -> PredictiveParser<'_> {
        let parser = PredictiveParser::new(&self.table, self.grammar.start_symbol());
        match self.step_limit {
            Some(limit) => parser.with_step_limit(limit),
            None => parser,
        }
    }

    pub fn analyze(&self, input: &str) -> ParseTrace {
        self.parser().parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_grammar_end_to_end() {
        let g = Grammar::parse("E->E+T|T; T->T*F|F; F->(E)|i;").unwrap();
        let analysis = Ll1Analysis::new(&g, &AnalysisOptions::default()).unwrap();

        assert_eq!(analysis.original, g);
        assert!(analysis.table.is_ll1());
        assert!(analysis.analyze("i+i*i#").is_accepted());
        assert!(!analysis.analyze("i+#").is_accepted());
    }

    #[test]
    fn strict_options_surface_conflicts() {
        let g = Grammar::parse("A->Bc; B->Ad|@;").unwrap();
        let strict = AnalysisOptions {
            conflicts: ConflictPolicy::Reject,
            ..AnalysisOptions::default()
        };
        assert!(matches!(
            Ll1Analysis::new(&g, &strict),
            Err(GrammarError::NotLl1 { .. })
        ));

        let lenient = Ll1Analysis::new(&g, &AnalysisOptions::default()).unwrap();
        assert_eq!(lenient.table.conflicts().len(), 1);
        assert!(lenient.analyze("c").is_accepted());
    }
}
