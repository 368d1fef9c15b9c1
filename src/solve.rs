//! Hole/solution bookkeeping (`spec.md` §4.3 `Solve`/`EndUnify`, §6
//! `dropGiven`/`keepGiven`).

use crate::bridge::{match_unify_prime, update_notunified, update_problems, update_solved};
use crate::error::EngineError;
use crate::name::Name;
use crate::navigator;
use crate::proofstate::ProofState;
use crate::term::Binder;
use crate::unifier::{Subst, Unifier};

/// Solutions for names the user supplied (`dontunify`) — never
/// substituted into the term automatically.
pub fn keep_given(dontunify: &im::HashSet<Name>, sub: &Subst) -> Subst {
    sub.iter().filter(|(n, _)| dontunify.contains(n)).cloned().collect()
}

/// Solutions for machine-generated holes — safe to substitute into the
/// proof term.
pub fn drop_given(dontunify: &im::HashSet<Name>, sub: &Subst) -> Subst {
    sub.iter().filter(|(n, _)| !dontunify.contains(n)).cloned().collect()
}

/// `Solve` — promote a `Guess` to a real solution.
pub fn solve(state: &mut ProofState, unifier: &dyn Unifier, hole: &Name) -> Result<(), EngineError> {
    let (env, binder) = navigator::goal(&state.pterm, hole).ok_or_else(|| EngineError::CantFindHole(hole.clone()))?;
    let v = match binder {
        Binder::Guess(_, v) => v,
        _ => return Err(EngineError::CantTacticHere("Solve")),
    };

    if let Some((_, recorded)) = state.notunified.iter().find(|(n, _)| n == hole).cloned() {
        match_unify_prime(state, unifier, &env, &v, &recorded)?;
    }

    state.pterm = navigator::at_h(&state.pterm, hole, |_, _, _, scope| Ok(scope.subst(hole, &v)))?;
    state.solved = Some((hole.clone(), v));
    state.holes.retain(|h| h != hole);
    state.notunified.retain(|(n, _)| n != hole);
    state.instances.retain(|n| n != hole);
    update_problems(state, unifier)
}

/// `EndUnify` — commit the journal accumulated since `StartUnify`.
pub fn end_unify(state: &mut ProofState, unifier: &dyn Unifier) -> Result<(), EngineError> {
    let journal = std::mem::take(&mut state.unified.1);
    let applied = drop_given(&state.dontunify, &journal);

    state.pterm = update_solved(&applied, &state.pterm);
    update_notunified(&applied, &mut state.notunified);
    update_problems(state, unifier)?;

    let solved_names: std::collections::HashSet<&Name> = applied.iter().map(|(n, _)| n).collect();
    state.holes.retain(|h| !solved_names.contains(h) || navigator::goal(&state.pterm, h).is_some());
    state.unified = (None, Vec::new());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimpleContext;
    use crate::proofstate::ProofState;
    use crate::term::{Level, Term};
    use crate::unifier::StructuralUnifier;

    #[test]
    fn keep_and_drop_given_partition_the_substitution() {
        let kept = Name::user("user_supplied");
        let dropped = Name::user("machine_made");
        let mut dontunify = im::HashSet::new();
        dontunify.insert(kept.clone());
        let sub = vec![
            (kept.clone(), Term::universe(Level::ZERO)),
            (dropped.clone(), Term::universe(Level::ZERO)),
        ];
        assert_eq!(keep_given(&dontunify, &sub).len(), 1);
        assert_eq!(keep_given(&dontunify, &sub)[0].0, kept);
        assert_eq!(drop_given(&dontunify, &sub).len(), 1);
        assert_eq!(drop_given(&dontunify, &sub)[0].0, dropped);
    }

    #[test]
    fn solve_promotes_a_guess_and_removes_its_hole() {
        let ctxt: std::rc::Rc<dyn crate::context::Context> = std::rc::Rc::new(SimpleContext::new());
        let goal_ty = Term::universe(Level::ZERO);
        let mut state = ProofState::new_proof(Name::user("t"), ctxt, goal_ty.clone());
        let h = state.holes.front().cloned().unwrap();

        // Turn the starting `Hole` into a `Guess` directly (bypassing
        // `Exact`/`Fill`, which this module does not depend on).
        state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
            Ok(Term::bind(n.clone(), Binder::Guess(goal_ty.clone(), goal_ty.clone()), scope.clone()))
        })
        .unwrap();

        let unifier = StructuralUnifier::new();
        solve(&mut state, &unifier, &h).unwrap();
        assert!(!state.holes.contains(&h));
        assert_eq!(state.solved, Some((h, goal_ty)));
    }
}
