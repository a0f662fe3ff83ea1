use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::{fs, io::Read, path::PathBuf};

use ll1_course_helper::grammar::{ConflictPolicy, NamingScheme};
use ll1_course_helper::{AnalysisOptions, Grammar, Ll1Analysis};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Vn, Vt, start symbol and productions of the loaded grammar
    Grammar,
    /// Productions after eliminating left recursion
    Elf,
    /// Nullable, FIRST and FOLLOW sets
    Ff,
    /// LL(1) parsing table
    Ll1,
    /// Step-by-step recognition of every --input
    Trace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Latex,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Naming {
    /// E', E'', ...
    Primed,
    /// First unused letter
    Letter,
}

#[derive(Parser, Debug)]
#[command(version, about = "Build an LL(1) predictive parser from a grammar")]
struct Args {
    /// Grammar file such as `E->E+T|T; T->i;`. Read from stdin when omitted.
    grammar: Option<PathBuf>,

    /// What to print. Everything when omitted.
    #[arg(short, long, value_enum)]
    output: Vec<Output>,

    /// String to recognize; the trailing `#` is optional.
    #[arg(short, long)]
    input: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// How to name nonterminals introduced by left-recursion elimination.
    #[arg(long, value_enum, default_value_t = Naming::Primed)]
    naming: Naming,

    /// Fail when the table has conflicting entries instead of keeping the last one.
    #[arg(long)]
    strict: bool,

    /// Reject an input after this many parser steps.
    #[arg(long, default_value_t = 10_000)]
    step_limit: usize,
}

impl Args {
    fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            naming: match self.naming {
                Naming::Primed => NamingScheme::Primed,
                Naming::Letter => NamingScheme::Letter,
            },
            conflicts: if self.strict {
                ConflictPolicy::Reject
            } else {
                ConflictPolicy::Overwrite
            },
            step_limit: Some(self.step_limit),
        }
    }
}

fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    plain: impl FnOnce(&T) -> String,
    latex: impl FnOnce(&T) -> String,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Plain => plain(value),
        OutputFormat::Latex => latex(value),
        OutputFormat::Json => serde_json::to_string(value)?,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = match &args.grammar {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read grammar from stdin")?;
            text
        }
    };

    let grammar = Grammar::parse(&text).context("failed to load grammar")?;
    let analysis = Ll1Analysis::new(&grammar, &args.options())?;
    for conflict in analysis.table.conflicts() {
        eprintln!("warning: conflict {}", conflict);
    }

    let outputs = if args.output.is_empty() {
        vec![
            Output::Grammar,
            Output::Elf,
            Output::Ff,
            Output::Ll1,
            Output::Trace,
        ]
    } else {
        args.output.clone()
    };

    for output in outputs {
        let rendered = match output {
            Output::Grammar => render(
                args.format,
                &analysis.original.to_grammar_output(),
                |t| t.to_plaintext(),
                |t| t.to_latex(),
            )?,
            Output::Elf => render(
                args.format,
                &analysis.grammar.to_production_output_vec(),
                |t| t.to_plaintext(),
                |t| t.to_latex(),
            )?,
            Output::Ff => render(
                args.format,
                &analysis
                    .grammar
                    .to_non_terminal_output_vec(&analysis.first, &analysis.follow),
                |t| t.to_plaintext(),
                |t| t.to_latex(),
            )?,
            Output::Ll1 => render(
                args.format,
                &analysis.table,
                |t| t.to_plaintext(),
                |t| t.to_latex(),
            )?,
            Output::Trace => {
                let mut traces = Vec::new();
                for input in &args.input {
                    traces.push(render(
                        args.format,
                        &analysis.analyze(input),
                        |t| t.to_plaintext(),
                        |t| t.to_latex(),
                    )?);
                }
                traces.join("\n\n")
            }
        };
        if !rendered.is_empty() {
            println!("{}\n", rendered);
        }
    }

    Ok(())
}
