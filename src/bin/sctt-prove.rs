//! A minimal driver for `sctt_proof_engine`: reads a proof script as
//! newline-delimited JSON `Tactic` values, applies them one at a time
//! against a single-hole starting goal, and prints the rendered proof
//! state (and any tactic diagnostics) after each step.
//!
//! ```text
//! sctt-prove <goal.json> <script.jsonl>
//! ```
//!
//! `goal.json` is a single serialized `Term` (the theorem statement);
//! `script.jsonl` is one `Tactic` per line. Declarations the script's
//! `Induction`/`PrepFill`/etc. tactics need must already be registered
//! in the in-process `SimpleContext` this binary builds — it carries no
//! persistent context store, matching the engine's own scope (`spec.md`
//! Non-goals: no parser, no persistent global context).

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use sctt_proof_engine::{
    init_tracing, process_tactic, Name, ProofState, SimpleContext, StructuralChecker, StructuralEvaluator,
    StructuralUnifier, Tactic,
};

fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args_os().skip(1);
    let goal_path: PathBuf = args.next().map(PathBuf::from).context("usage: sctt-prove <goal.json> <script.jsonl>")?;
    let script_path: PathBuf = args.next().map(PathBuf::from).context("usage: sctt-prove <goal.json> <script.jsonl>")?;

    let goal_json = fs::read_to_string(&goal_path).with_context(|| format!("reading {}", goal_path.display()))?;
    let goal: sctt_proof_engine::Term = serde_json::from_str(&goal_json).context("parsing goal term")?;

    let script = fs::read_to_string(&script_path).with_context(|| format!("reading {}", script_path.display()))?;
    let tactics: Vec<Tactic> = script
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).with_context(|| format!("parsing tactic line: {}", l)))
        .collect::<Result<_>>()?;

    let context: Rc<dyn sctt_proof_engine::Context> = Rc::new(SimpleContext::new());
    let checker = StructuralChecker::new();
    let evaluator = StructuralEvaluator::new();
    let unifier = StructuralUnifier::new();

    let mut state = ProofState::new_proof(Name::user("goal"), context, Rc::new(goal));
    println!("{}", state.render());

    for tactic in &tactics {
        let (next, log) = process_tactic(tactic, &state, &checker, &evaluator, &unifier)
            .with_context(|| format!("applying {:?}", tactic))?;
        state = next;
        for line in &log {
            println!("-- {}", line);
        }
        println!("{}", state.render());
        if state.done {
            println!("QED");
            break;
        }
    }

    Ok(())
}
