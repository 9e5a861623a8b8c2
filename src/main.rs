use std::{fs, path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use consat::{Heuristic, Result, Solver};

/// Decide satisfiability of a DIMACS CNF formula.
#[derive(Debug, Parser)]
#[command(name = "consat", version)]
struct Args {
    /// Path to the DIMACS CNF input file.
    input: PathBuf,

    /// Decision heuristic, case insensitive: first (alias: without), yesno,
    /// random, dlis, rdlis, dlcs, rdlcs, jw, rjw, moms, rmoms, lucky.
    heuristic: Option<String>,
}

fn main() {
    // Diagnostics and logs go to stderr; stdout carries only the verdict.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CONSAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    process::exit(exit_code);
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let heuristic = match &args.heuristic {
        Some(name) => name.parse::<Heuristic>()?,
        None => Heuristic::First,
    };

    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read `{}`", args.input.display()))?;

    let mut solver = Solver::from_dimacs_with(&input, heuristic)
        .with_context(|| format!("cannot parse `{}`", args.input.display()))?;

    match solver.solve() {
        Result::Sat(model) => {
            println!("s SATISFIABLE");
            let mut line = String::from("v");
            for lit in model.as_vec() {
                line.push(' ');
                line.push_str(&lit.to_string());
            }
            line.push_str(" 0");
            println!("{line}");
        }
        Result::Unsat(_) => {
            println!("s UNSATISFIABLE");
        }
    }

    Ok(())
}
