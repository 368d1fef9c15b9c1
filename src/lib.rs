//! An interactive proof-state engine for a dependently-typed core
//! language: a hole-indexed proof term, a catalogue of tactics that
//! transform it one step at a time, and the unification bridge that
//! keeps deferred equations and hole solutions in sync.
//!
//! The engine itself never typechecks, evaluates or unifies terms —
//! [`checker`], [`evaluator`] and [`unifier`] are external
//! collaborators, each behind a trait so a real elaborator can swap in
//! its own implementation. The structural reference implementations
//! shipped here exist to exercise the engine end to end.

pub mod bridge;
pub mod checker;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod name;
pub mod navigator;
pub mod proofstate;
pub mod solve;
pub mod tactic;
pub mod term;
pub mod unifier;

pub use checker::{StructuralChecker, TypeChecker};
pub use context::{Context, MetaInformation, SimpleContext};
pub use error::EngineError;
pub use evaluator::{Evaluator, StructuralEvaluator};
pub use name::Name;
pub use proofstate::ProofState;
pub use tactic::{process_tactic, Tactic};
pub use term::{Binder, Env, Level, Term};
pub use unifier::{Problem, ProblemMode, StructuralUnifier, Unifier};

/// Initialise the engine's `tracing` subscriber from `RUST_LOG` (falling
/// back to `info`). Intended for the `sctt-prove` binary and for tests
/// that want readable `tracing::info!`/`#[instrument]` output; library
/// consumers embedding the engine in a larger elaborator are expected to
/// install their own subscriber instead.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// End-to-end smoke test: prove `(A : Type) -> A -> A` by two
    /// `Intro`s, `Exact`, then `QED` (`spec.md` §8 scenario 1).
    #[test]
    fn identity_function_end_to_end() {
        let ctxt: Rc<dyn Context> = Rc::new(SimpleContext::new());
        let checker = StructuralChecker::new();
        let evaluator = StructuralEvaluator::new();
        let unifier = StructuralUnifier::new();

        let type0 = Term::universe(Level::ZERO);
        let a = Name::user("A");
        let goal = Term::bind(
            a.clone(),
            Binder::Pi(type0.clone()),
            Term::bind(
                Name::machine(0, "arg"),
                Binder::Pi(Term::var(a.clone(), type0.clone())),
                Term::var(a.clone(), type0),
            ),
        );

        let mut state = ProofState::new_proof(Name::user("identity"), ctxt, goal);

        for tactic in [Tactic::Intro(None), Tactic::Intro(None)] {
            let (next, _log) = process_tactic(&tactic, &state, &checker, &evaluator, &unifier).expect("intro");
            state = next;
        }

        let focus = state.focus().cloned().expect("one hole left");
        let env = state.env_at_focus(Some(&focus)).unwrap();
        let (last_name, _) = env.iter().next().expect("the innermost bound arg");
        let exact_term = Term::var(last_name.clone(), env.front().unwrap().1.ty().clone());

        let (next, _log) = process_tactic(&Tactic::Exact(exact_term), &state, &checker, &evaluator, &unifier)
            .expect("exact");
        state = next;

        let (next, _log) = process_tactic(&Tactic::Solve, &state, &checker, &evaluator, &unifier).expect("solve");
        state = next;

        assert!(state.holes.is_empty());
        let (next, _log) = process_tactic(&Tactic::Qed, &state, &checker, &evaluator, &unifier).expect("qed");
        assert!(next.done);
    }

    /// `Undo` is strictly one step (`spec.md` §5) and fails once there is
    /// nothing left to step back to.
    #[test]
    fn undo_fails_on_fresh_proof() {
        let ctxt: Rc<dyn Context> = Rc::new(SimpleContext::new());
        let state = ProofState::new_proof(Name::user("t"), ctxt, Term::universe(Level::ZERO));
        assert!(matches!(state.undo(), Err(EngineError::NothingToUndo)));
    }
}
