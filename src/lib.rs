extern crate wasm_bindgen;

use serde_json::json;
use wasm_bindgen::prelude::*;

pub mod grammar;
pub use grammar::{AnalysisOptions, Grammar, GrammarError, Ll1Analysis};

fn error_json(e: impl std::fmt::Display) -> String {
    json!({ "error": e.to_string() }).to_string()
}

fn analysis_json(analysis: &Ll1Analysis) -> serde_json::Value {
    json!({
        "original": analysis.original.to_grammar_output(),
        "grammar": analysis.grammar.to_grammar_output(),
        "first_follow": analysis
            .grammar
            .to_non_terminal_output_vec(&analysis.first, &analysis.follow),
        "table": &analysis.table,
    })
}

/// Runs the whole LL(1) construction and returns every stage as JSON.
#[wasm_bindgen]
pub fn ll1_analysis_to_json(grammar: &str) -> String {
    let analysis = crate::Grammar::parse(grammar)
        .and_then(|g| Ll1Analysis::new(&g, &AnalysisOptions::default()));
    match analysis {
        Ok(analysis) => analysis_json(&analysis).to_string(),
        Err(e) => error_json(e),
    }
}

/// Builds the table for `grammar` and returns the trace of recognizing `input`.
#[wasm_bindgen]
pub fn predictive_parse_to_json(grammar: &str, input: &str) -> String {
    let analysis = crate::Grammar::parse(grammar)
        .and_then(|g| Ll1Analysis::new(&g, &AnalysisOptions::default()));
    match analysis {
        Ok(analysis) => match serde_json::to_string(&analysis.analyze(input)) {
            Ok(s) => s,
            Err(e) => error_json(e),
        },
        Err(e) => error_json(e),
    }
}
