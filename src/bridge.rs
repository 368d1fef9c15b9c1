//! The unification bridge (`spec.md` §4.2) and solution propagation
//! (§4.4): the two calls into the external unifier, the deferred
//! problem queue, and `updateSolved`/`updateNotunified`.

use crate::name::Name;
use crate::proofstate::ProofState;
use crate::term::{Binder, Env, Term};
use crate::unifier::{Problem, ProblemMode, Subst, Unifier};
use crate::error::EngineError;
use std::rc::Rc;

/// `unify'(env, a, b)` — full unification, steps 1–5 of §4.2.
pub fn unify_prime(
    state: &mut ProofState,
    unifier: &dyn Unifier,
    env: &Env,
    a: &Rc<Term>,
    b: &Rc<Term>,
) -> Result<(), EngineError> {
    let (sub, new_problems) =
        unifier.unify(state.context.as_ref(), env, a, b, &state.injective, &state.holes)?;
    propagate_injective(&mut state.injective, &sub);
    state.problems.extend(new_problems);
    partition_and_record(state, sub);
    update_problems(state, unifier)?;
    let journal = state.unified.1.clone();
    update_notunified(&journal, &mut state.notunified);
    Ok(())
}

/// `match_unify'(env, a, b)` — one-sided matching; failure defers
/// rather than raising.
pub fn match_unify_prime(
    state: &mut ProofState,
    unifier: &dyn Unifier,
    env: &Env,
    a: &Rc<Term>,
    b: &Rc<Term>,
) -> Result<(), EngineError> {
    match unifier.match_unify(state.context.as_ref(), env, a, b, &state.injective, &state.holes) {
        Ok(sub) => {
            propagate_injective(&mut state.injective, &sub);
            partition_and_record(state, sub);
            update_problems(state, unifier)?;
            let journal = state.unified.1.clone();
            update_notunified(&journal, &mut state.notunified);
        }
        Err(e) => state.problems.push(Problem {
            env: env.clone(),
            lhs: a.clone(),
            rhs: b.clone(),
            mode: ProblemMode::Match,
            error: e,
        }),
    }
    Ok(())
}

/// Step 4 of §4.2: names the user supplied (`dontunify`) never get
/// unilaterally overwritten — their solutions go to `notunified`
/// instead of the journal unless the solution is itself a plain
/// variable reference.
pub(crate) fn partition_and_record(state: &mut ProofState, sub: Subst) {
    for (n, t) in sub {
        let is_plain_var = matches!(t.as_ref(), Term::V(_, _));
        if state.dontunify.contains(&n) && !is_plain_var {
            state.notunified.push((n, t));
        } else {
            state.unified.1.push((n, t));
        }
    }
}

/// Step 5 of §4.2: propagate injectivity between a solved hole and the
/// head constant of its solution.
pub(crate) fn propagate_injective(injective: &mut im::HashSet<Name>, sub: &Subst) {
    for (n, t) in sub {
        let (head, _) = Term::un_apply(t);
        if let Term::V(c, _) = head.as_ref() {
            if injective.contains(n) || injective.contains(c) {
                injective.insert(n.clone());
                injective.insert(c.clone());
            }
        }
    }
}

/// `updateProblems` — retry deferred equations under the current
/// substitution to a fixed point. Each successful retry strictly
/// shrinks the queue, so a pass that fails to shrink it is the fixed
/// point (`spec.md` §4.4, §8 "Termination").
pub fn update_problems(state: &mut ProofState, unifier: &dyn Unifier) -> Result<(), EngineError> {
    loop {
        let pending = std::mem::take(&mut state.problems);
        if pending.is_empty() {
            return Ok(());
        }
        let before = pending.len();
        let journal = state.unified.1.clone();
        let mut remaining = Vec::new();
        for p in pending {
            let lhs = p.lhs.psubst(&journal);
            let rhs = p.rhs.psubst(&journal);
            let outcome: Result<(Subst, Vec<Problem>), EngineError> = match p.mode {
                ProblemMode::Unify => unifier.unify(
                    state.context.as_ref(),
                    &p.env,
                    &lhs,
                    &rhs,
                    &state.injective,
                    &state.holes,
                ),
                ProblemMode::Match => unifier
                    .match_unify(state.context.as_ref(), &p.env, &lhs, &rhs, &state.injective, &state.holes)
                    .map(|sub| (sub, Vec::new())),
            };
            match outcome {
                Ok((sub, new_problems)) => {
                    propagate_injective(&mut state.injective, &sub);
                    partition_and_record(state, sub);
                    remaining.extend(new_problems);
                }
                Err(e) => remaining.push(Problem { env: p.env, lhs, rhs, mode: p.mode, error: e }),
            }
        }
        let made_progress = remaining.len() < before;
        state.problems = remaining;
        if !made_progress {
            return Ok(());
        }
    }
}

/// `updateSolved σ term` — eliminate every binder named by a key of
/// `σ` (invariant: it is currently a `Hole`), substituting its solution
/// into the scope, and rewrite any remaining reference to that name.
pub fn update_solved(sub: &[(Name, Rc<Term>)], term: &Rc<Term>) -> Rc<Term> {
    if sub.is_empty() {
        return term.clone();
    }
    match term.as_ref() {
        Term::V(n, ty) => {
            if let Some((_, v)) = sub.iter().find(|(k, _)| k == n) {
                update_solved(sub, v)
            } else {
                let new_ty = update_solved(sub, ty);
                if Rc::ptr_eq(&new_ty, ty) {
                    term.clone()
                } else {
                    Term::var(n.clone(), new_ty)
                }
            }
        }
        Term::App(f, a) => Term::app(update_solved(sub, f), update_solved(sub, a)),
        Term::Bind(n, binder, scope) => {
            if let Some((_, v)) = sub.iter().find(|(k, _)| k == n) {
                let substituted_scope = scope.subst(n, v);
                update_solved(sub, &substituted_scope)
            } else {
                let new_binder = match binder {
                    Binder::Lam(t) => Binder::Lam(update_solved(sub, t)),
                    Binder::Pi(t) => Binder::Pi(update_solved(sub, t)),
                    Binder::Let(t, v) => Binder::Let(update_solved(sub, t), update_solved(sub, v)),
                    Binder::PVar(t) => Binder::PVar(update_solved(sub, t)),
                    Binder::PVTy(t) => Binder::PVTy(update_solved(sub, t)),
                    Binder::Hole(t) => Binder::Hole(update_solved(sub, t)),
                    Binder::Guess(t, v) => Binder::Guess(update_solved(sub, t), update_solved(sub, v)),
                    Binder::GHole(k, t) => Binder::GHole(*k, update_solved(sub, t)),
                };
                Term::bind(n.clone(), new_binder, update_solved(sub, scope))
            }
        }
        Term::TType(_) | Term::Erased => term.clone(),
    }
}

/// Shared implementation of the `MatchProblems`/`UnifyProblems` tactics
/// (`spec.md` §4.3): retry every queued problem `should_retry` selects,
/// via `match_unify` (`use_match`) or full `unify`, then run
/// `updateProblems` to a fixed point over whatever remains.
pub fn retry_problems(
    state: &mut ProofState,
    unifier: &dyn Unifier,
    mut should_retry: impl FnMut(&Problem) -> bool,
    use_match: bool,
) -> Result<(), EngineError> {
    let pending = std::mem::take(&mut state.problems);
    let (to_retry, mut keep): (Vec<Problem>, Vec<Problem>) =
        pending.into_iter().partition(|p| should_retry(p));
    for p in to_retry {
        let outcome: Result<(Subst, Vec<Problem>), EngineError> = if use_match {
            unifier
                .match_unify(state.context.as_ref(), &p.env, &p.lhs, &p.rhs, &state.injective, &state.holes)
                .map(|sub| (sub, Vec::new()))
        } else {
            unifier.unify(state.context.as_ref(), &p.env, &p.lhs, &p.rhs, &state.injective, &state.holes)
        };
        match outcome {
            Ok((sub, new_problems)) => {
                propagate_injective(&mut state.injective, &sub);
                partition_and_record(state, sub);
                keep.extend(new_problems);
            }
            Err(e) => keep.push(Problem { error: e, ..p }),
        }
    }
    state.problems = keep;
    update_problems(state, unifier)
}

/// `updateNotunified` — rewrite the RHS of every pending `notunified`
/// entry through the substitution accumulated so far.
pub fn update_notunified(sub: &[(Name, Rc<Term>)], notunified: &mut Vec<(Name, Rc<Term>)>) {
    if sub.is_empty() {
        return;
    }
    for (_, rhs) in notunified.iter_mut() {
        *rhs = update_solved(sub, rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimpleContext;
    use crate::unifier::StructuralUnifier;
    use proptest::prelude::*;

    fn fresh(i: u64) -> Name {
        Name::machine(i, "h")
    }

    #[test]
    fn update_solved_eliminates_bound_holes() {
        let h = Name::user("h");
        let nat = Term::var(Name::user("Nat"), Rc::new(Term::Erased));
        let zero = Term::var(Name::user("Z"), nat.clone());
        let term = Term::bind(h.clone(), Binder::Hole(nat), Term::var(h.clone(), Term::universe(crate::term::Level::ZERO)));
        let sub = vec![(h, zero.clone())];
        let result = update_solved(&sub, &term);
        assert_eq!(result, zero);
    }

    #[test]
    fn update_solved_is_idempotent_on_an_already_closed_term() {
        let term = Term::var(Name::user("x"), Rc::new(Term::Erased));
        let sub: Vec<(Name, Rc<Term>)> = vec![(Name::user("unrelated"), Term::universe(crate::term::Level::ZERO))];
        let once = update_solved(&sub, &term);
        let twice = update_solved(&sub, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn update_problems_reaches_a_fixed_point_over_independent_equations() {
        use crate::proofstate::ProofState;
        use crate::unifier::{Problem, ProblemMode};

        let ctxt: Rc<dyn crate::context::Context> = Rc::new(SimpleContext::new());
        let mut state = ProofState::new_proof(Name::user("t"), ctxt, Term::universe(crate::term::Level::ZERO));
        let nat = Term::var(Name::user("Nat"), Rc::new(Term::Erased));
        let zero = Term::var(Name::user("Z"), nat.clone());

        let mut holes = im::Vector::new();
        for i in 0..5 {
            holes.push_back(fresh(i));
        }
        state.holes = holes.clone();
        state.problems = holes
            .iter()
            .map(|h| Problem {
                env: im::Vector::new(),
                lhs: Term::var(h.clone(), nat.clone()),
                rhs: zero.clone(),
                mode: ProblemMode::Unify,
                error: EngineError::StillHolesToFill,
            })
            .collect();

        let unifier = StructuralUnifier::new();
        update_problems(&mut state, &unifier).unwrap();
        assert!(state.problems.is_empty());
        assert_eq!(state.unified.1.len(), 5);
    }

    proptest! {
        #[test]
        fn update_solved_idempotence_holds_for_any_closed_substitution(n in 0u64..20) {
            let sub: Vec<(Name, Rc<Term>)> = (0..n)
                .map(|i| (fresh(i), Term::universe(crate::term::Level(i as u32))))
                .collect();
            let term = Term::var(Name::user("root"), Rc::new(Term::Erased));
            let once = update_solved(&sub, &term);
            let twice = update_solved(&sub, &once);
            prop_assert_eq!(once, twice);
        }
    }
}
