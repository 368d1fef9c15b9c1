//! The tactic catalogue and `processTactic` dispatch (`spec.md` §4.3).
//! One interpreter per `Tactic` variant, each transforming the
//! sub-term focused by the [`navigator`].

use std::rc::Rc;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::bridge::{match_unify_prime, retry_problems, unify_prime};
use crate::checker::TypeChecker;
use crate::context::MetaInformation;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::name::Name;
use crate::navigator;
use crate::proofstate::ProofState;
use crate::solve;
use crate::term::{Binder, Env, Term};
use crate::unifier::{ProblemMode, Unifier};

/// The canonical name under which the equality type is recognised
/// (`spec.md` §6: "arity 4 (lt rt l r)").
pub const EQ_NAME: &str = "=";

/// The canonical name of the `replace` combinator (`spec.md` §6:
/// `{a}{x}{y}(P: a→Type) → P x → x=y → P y`).
pub const REPLACE_NAME: &str = "replace";

/// The tactic language (`spec.md` §4.3). Each variant names its own
/// precondition on the focused binder in the doc comment next to its
/// interpreter in [`apply`], not here — this enum is pure data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tactic {
    Attack,
    Claim(Name, Rc<Term>),
    Reorder(Vec<Name>),
    Exact(Rc<Term>),
    Fill(Rc<Term>),
    MatchFill(Rc<Term>),
    PrepFill(Name, Vec<Name>),
    CompleteFill,
    Regret,
    Solve,
    StartUnify(Name),
    EndUnify,
    Compute,
    HnfCompute,
    Simplify,
    ComputeLet(Name),
    EvalIn(Rc<Term>),
    CheckIn(Rc<Term>),
    Intro(Option<Name>),
    IntroTy(Rc<Term>, Option<Name>),
    Forall(Name, Rc<Term>),
    LetBind(Name, Rc<Term>, Rc<Term>),
    ExpandLet(Name, Rc<Term>),
    Rewrite(Rc<Term>),
    Induction(Name),
    Equiv(Rc<Term>),
    PatVar(Name),
    PatBind(Name),
    Focus(Name),
    MoveLast(Name),
    Defer(Name),
    DeferType(Name, Rc<Term>, Vec<Name>),
    Instance(Name),
    SetInjective(Name),
    MatchProblems(bool),
    UnifyProblems,
    ProofState,
    Undo,
    Qed,
}

/// `processTactic(tactic, state) → (state', log)` (`spec.md` §6). Pure:
/// on success returns a fresh state (with `previous` set to a snapshot
/// of the input, per §5's one-step undo chain) and whatever diagnostic
/// lines this call appended to `plog`; on failure the input `state` is
/// never consumed.
#[instrument(skip(state, checker, evaluator, unifier), fields(tactic = ?tactic))]
pub fn process_tactic(
    tactic: &Tactic,
    state: &ProofState,
    checker: &dyn TypeChecker,
    evaluator: &dyn Evaluator,
    unifier: &dyn Unifier,
) -> Result<(ProofState, Vec<String>), EngineError> {
    // `Undo` does not snapshot forward — it steps backward one link in
    // the chain (§5: "the engine keeps exactly one predecessor").
    if matches!(tactic, Tactic::Undo) {
        let restored = state.undo()?;
        return Ok((restored, vec!["Undo".to_string()]));
    }

    let mut next = state.clone();
    next.previous = Some(Rc::new(state.snapshot()));
    let log_start = next.plog.len();

    apply(tactic, &mut next, checker, evaluator, unifier)?;

    // `QED` is a terminal state (scenario 5: "Undo after QED fails with
    // 'Nothing to undo.'") — it does not leave a predecessor to step back to.
    if matches!(tactic, Tactic::Qed) {
        next.previous = None;
    }

    let log = next.plog[log_start..].to_vec();
    Ok((next, log))
}

/// A hole whose binder must currently be a plain `Hole` (not `Guess`).
/// Most tactics share this precondition; `Binder`-specific ones (Solve,
/// CompleteFill) ask for `Guess` instead.
fn require_hole(pterm: &Rc<Term>, h: &Name, tactic: &'static str) -> Result<(Env, Rc<Term>), EngineError> {
    let (env, binder) = navigator::goal(pterm, h).ok_or_else(|| EngineError::CantFindHole(h.clone()))?;
    match binder {
        Binder::Hole(ty) => Ok((env, ty)),
        _ => Err(EngineError::CantTacticHere(tactic)),
    }
}

fn require_guess(pterm: &Rc<Term>, h: &Name, tactic: &'static str) -> Result<(Env, Rc<Term>, Rc<Term>), EngineError> {
    let (env, binder) = navigator::goal(pterm, h).ok_or_else(|| EngineError::CantFindHole(h.clone()))?;
    match binder {
        Binder::Guess(ty, v) => Ok((env, ty, v)),
        _ => Err(EngineError::CantTacticHere(tactic)),
    }
}

/// Replace `h`'s occurrence in the `holes` list with `h2`, preserving
/// its position — used by tactics (`Intro`, `Forall`, `LetBind`, ...)
/// that re-expose the focused hole under a new name.
fn replace_hole(holes: &im::Vector<Name>, h: &Name, h2: Name) -> im::Vector<Name> {
    holes.iter().cloned().map(|x| if &x == h { h2.clone() } else { x }).collect()
}

fn rotate_to(holes: &im::Vector<Name>, n: &Name, to_front: bool) -> im::Vector<Name> {
    match holes.iter().position(|x| x == n) {
        Some(idx) => {
            let mut v: Vec<Name> = holes.iter().cloned().collect();
            let item = v.remove(idx);
            if to_front {
                v.insert(0, item);
            } else {
                v.push(item);
            }
            v.into_iter().collect()
        }
        None => holes.clone(),
    }
}

/// Literal structural replacement of every occurrence of `from` by `to`
/// inside `term` (not name-directed substitution — used by `Rewrite` to
/// generalise syntactic occurrences of the rewritten side of an
/// equation). Safe without capture-avoidance bookkeeping because names
/// are globally unique (invariant 4, `spec.md` §3).
fn replace_subterm(term: &Rc<Term>, from: &Rc<Term>, to: &Rc<Term>) -> Rc<Term> {
    if term == from {
        return to.clone();
    }
    match term.as_ref() {
        Term::App(f, a) => Term::app(replace_subterm(f, from, to), replace_subterm(a, from, to)),
        Term::Bind(n, binder, scope) => {
            let new_binder = match binder {
                Binder::Lam(t) => Binder::Lam(replace_subterm(t, from, to)),
                Binder::Pi(t) => Binder::Pi(replace_subterm(t, from, to)),
                Binder::Let(t, v) => Binder::Let(replace_subterm(t, from, to), replace_subterm(v, from, to)),
                Binder::PVar(t) => Binder::PVar(replace_subterm(t, from, to)),
                Binder::PVTy(t) => Binder::PVTy(replace_subterm(t, from, to)),
                Binder::Hole(t) => Binder::Hole(replace_subterm(t, from, to)),
                Binder::Guess(t, v) => Binder::Guess(replace_subterm(t, from, to), replace_subterm(v, from, to)),
                Binder::GHole(k, t) => Binder::GHole(*k, replace_subterm(t, from, to)),
            };
            Term::bind(n.clone(), new_binder, replace_subterm(scope, from, to))
        }
        _ => term.clone(),
    }
}

/// Recognise the equality type by its canonical name (`spec.md` §6):
/// `= lt rt l r`.
fn as_equality(ty: &Rc<Term>) -> Option<(Rc<Term>, Rc<Term>, Rc<Term>, Rc<Term>)> {
    let (head, args) = Term::un_apply(ty);
    if let (Term::V(n, _), [lt, rt, l, r]) = (head.as_ref(), args.as_slice()) {
        if n.root() == EQ_NAME {
            return Some((lt.clone(), rt.clone(), l.clone(), r.clone()));
        }
    }
    None
}

fn apply(
    tactic: &Tactic,
    state: &mut ProofState,
    checker: &dyn TypeChecker,
    evaluator: &dyn Evaluator,
    unifier: &dyn Unifier,
) -> Result<(), EngineError> {
    match tactic {
        Tactic::Attack => attack(state),
        Tactic::Claim(n, ty) => claim(state, checker, n, ty),
        Tactic::Reorder(_) => reorder_claims(state),
        Tactic::Exact(e) => exact(state, checker, e),
        Tactic::Fill(e) => fill(state, checker, unifier, e),
        Tactic::MatchFill(e) => match_fill(state, checker, unifier, e),
        Tactic::PrepFill(f, args) => prep_fill(state, f, args),
        Tactic::CompleteFill => complete_fill(state, checker, unifier),
        Tactic::Regret => regret(state),
        Tactic::Solve => {
            let h = state.resolve_focus(None)?;
            solve::solve(state, unifier, &h)
        }
        Tactic::StartUnify(n) => {
            state.unified = (Some(n.clone()), Vec::new());
            Ok(())
        }
        Tactic::EndUnify => solve::end_unify(state, unifier),
        Tactic::Compute => {
            let ctxt = state.context.clone();
            update_goal_ty(state, |env, ty| evaluator.normalise(ctxt.as_ref(), env, ty))
        }
        Tactic::HnfCompute => {
            let ctxt = state.context.clone();
            update_goal_ty(state, |env, ty| evaluator.hnf(ctxt.as_ref(), env, ty))
        }
        Tactic::Simplify => {
            let ctxt = state.context.clone();
            update_goal_ty(state, |env, ty| evaluator.specialise(ctxt.as_ref(), env, ty))
        }
        Tactic::ComputeLet(n) => compute_let(state, evaluator, n),
        Tactic::EvalIn(e) => eval_in(state, evaluator, e),
        Tactic::CheckIn(e) => check_in(state, checker, e),
        Tactic::Intro(m_name) => intro(state, checker, None, m_name.as_ref()),
        Tactic::IntroTy(ty, m_name) => intro(state, checker, Some((ty, unifier)), m_name.as_ref()),
        Tactic::Forall(n, ty) => forall(state, checker, evaluator, n, ty),
        Tactic::LetBind(n, ty, v) => let_bind(state, checker, n, ty, v),
        Tactic::ExpandLet(n, v) => expand_let(state, n, v),
        Tactic::Rewrite(e) => rewrite(state, checker, e),
        Tactic::Induction(x) => induction(state, checker, x),
        Tactic::Equiv(ty) => equiv(state, checker, ty),
        Tactic::PatVar(n) => pat_var(state, n),
        Tactic::PatBind(n) => pat_bind(state, n),
        Tactic::Focus(n) => {
            state.holes = rotate_to(&state.holes, n, true);
            Ok(())
        }
        Tactic::MoveLast(n) => {
            state.holes = rotate_to(&state.holes, n, false);
            Ok(())
        }
        Tactic::Defer(n) => defer(state, n),
        Tactic::DeferType(n, ty, args) => defer_type(state, checker, n, ty, args),
        Tactic::Instance(n) => {
            state.instances.push(n.clone());
            state.holes = rotate_to(&state.holes, n, false);
            Ok(())
        }
        Tactic::SetInjective(n) => {
            state.injective.insert(n.clone());
            Ok(())
        }
        Tactic::MatchProblems(all) => {
            let all = *all;
            retry_problems(state, unifier, |p| all || p.mode == ProblemMode::Match, true)
        }
        Tactic::UnifyProblems => retry_problems(state, unifier, |_| true, false),
        Tactic::ProofState => {
            let rendering = state.render();
            tracing::info!(target: "sctt_proof_engine::tactic", "{}", rendering);
            state.plog.push(rendering);
            Ok(())
        }
        Tactic::Undo => unreachable!("Undo is handled in process_tactic"),
        Tactic::Qed => state.qed(checker),
    }
}

/// `Attack` — focus `Hole t` ⇒ `Guess t (Bind h' (Hole t) (V h' t))`,
/// pushing the fresh `h'` as the new focus to begin a nested elaboration.
fn attack(state: &mut ProofState) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (_, ty) = match navigator::goal(&state.pterm, &h) {
        Some((env, Binder::Hole(ty))) => (env, ty),
        Some(_) => return Err(EngineError::NotAttackableHole(h)),
        None => return Err(EngineError::CantFindHole(h)),
    };
    let h2 = state.fresh_name("attack");
    let inner = Term::bind(h2.clone(), Binder::Hole(ty.clone()), Term::var(h2.clone(), ty.clone()));
    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Guess(ty.clone(), inner.clone()), scope.clone()))
    })?;
    state.holes.push_front(h2);
    Ok(())
}

/// `Claim n ty` — check `ty : Type`, then wrap the whole proof term with
/// a fresh ancestor hole `n : ty` (so it is visible in every
/// descendant's environment), inserted immediately after the current
/// focus in the `holes` list.
fn claim(state: &mut ProofState, checker: &dyn TypeChecker, n: &Name, ty: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let env = state.env_at_focus(Some(&h))?;
    checker.is_type(state.context.as_ref(), &env, ty)?;
    state.usedns.insert(n.clone());
    state.pterm = Term::bind(n.clone(), Binder::Hole(ty.clone()), state.pterm.clone());
    let idx = state.holes.iter().position(|x| x == &h).unwrap_or(0);
    let mut v: Vec<Name> = state.holes.iter().cloned().collect();
    v.insert(idx + 1, n.clone());
    state.holes = v.into_iter().collect();
    Ok(())
}

fn peel_hole_chain(term: &Rc<Term>) -> (Vec<(Name, Rc<Term>)>, Rc<Term>) {
    let mut chain = Vec::new();
    let mut cur = term.clone();
    while let Term::Bind(n, Binder::Hole(ty), inner) = cur.clone().as_ref() {
        chain.push((n.clone(), ty.clone()));
        cur = inner.clone();
    }
    (chain, cur)
}

fn rebuild_hole_chain(chain: &[(Name, Rc<Term>)], base: &Rc<Term>) -> Rc<Term> {
    chain.iter().rev().fold(base.clone(), |acc, (n, ty)| Term::bind(n.clone(), Binder::Hole(ty.clone()), acc))
}

/// `Reorder` — stable insertion sort of the outermost run of `Claim`ed
/// `Hole` binders so a binder referenced by another's goal type comes
/// first (Design Notes §9: "the insertion sort is by occurrence —
/// strictly fewer inversions per step"). `petgraph` detects a circular
/// dependency (which would make no ordering valid) before the sort runs.
fn reorder_claims(state: &mut ProofState) -> Result<(), EngineError> {
    let (chain, base) = peel_hole_chain(&state.pterm);
    if chain.len() < 2 {
        return Ok(());
    }

    let mut graph = DiGraph::<Name, ()>::new();
    let mut idx = std::collections::HashMap::new();
    for (n, _) in &chain {
        idx.insert(n.clone(), graph.add_node(n.clone()));
    }
    for (n, ty) in &chain {
        for (m, _) in &chain {
            if m != n && !ty.no_occurrence(m) {
                graph.add_edge(idx[m], idx[n], ());
            }
        }
    }
    if toposort(&graph, None).is_err() {
        return Err(EngineError::InvariantViolation(format!(
            "circular dependency reordering claims {:?}",
            chain.iter().map(|(n, _)| n.to_string()).collect::<Vec<_>>()
        )));
    }

    let mut order = chain.clone();
    for i in 1..order.len() {
        let mut j = i;
        while j > 0 {
            let (name_j, _) = order[j].clone();
            let prev_ty = order[j - 1].1.clone();
            if !prev_ty.no_occurrence(&name_j) {
                order.swap(j, j - 1);
                j -= 1;
            } else {
                break;
            }
        }
    }

    state.pterm = rebuild_hole_chain(&order, &base);
    let name_set: std::collections::HashSet<&Name> = order.iter().map(|(n, _)| n).collect();
    let mut reordered = order.iter().map(|(n, _)| n.clone());
    state.holes = state
        .holes
        .iter()
        .cloned()
        .map(|h| if name_set.contains(&h) { reordered.next().unwrap() } else { h })
        .collect();
    Ok(())
}

/// `Exact e` — `e : τ`, require `τ ≡ goal` (`converts`, no unification
/// side-effects), replace `Hole` with `Guess ty e`.
fn exact(state: &mut ProofState, checker: &dyn TypeChecker, e: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Exact")?;
    let (checked, ty) = checker.check(state.context.as_ref(), &env, e)?;
    checker.converts(state.context.as_ref(), &env, &ty, &goal_ty)?;
    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Guess(goal_ty.clone(), checked.clone()), scope.clone()))
    })?;
    Ok(())
}

/// `Fill e` — as `Exact`, but `τ` and goal only need to *unify*.
fn fill(state: &mut ProofState, checker: &dyn TypeChecker, unifier: &dyn Unifier, e: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Fill")?;
    let (checked, ty) = checker.check(state.context.as_ref(), &env, e)?;
    unify_prime(state, unifier, &env, &ty, &goal_ty)?;
    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Guess(goal_ty.clone(), checked.clone()), scope.clone()))
    })?;
    Ok(())
}

/// `MatchFill e` — as `Fill`, but via `match_unify'`.
fn match_fill(state: &mut ProofState, checker: &dyn TypeChecker, unifier: &dyn Unifier, e: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "MatchFill")?;
    let (checked, ty) = checker.check(state.context.as_ref(), &env, e)?;
    match_unify_prime(state, unifier, &env, &ty, &goal_ty)?;
    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Guess(goal_ty.clone(), checked.clone()), scope.clone()))
    })?;
    Ok(())
}

/// `PrepFill f [a1..ak]` — replace the hole with `Guess ty (f a1 .. ak)`
/// where every argument is a bare reference; no typechecking yet (left
/// to a later `CompleteFill`).
fn prep_fill(state: &mut ProofState, f: &Name, args: &[Name]) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "PrepFill")?;
    let lookup = |n: &Name| -> Result<Rc<Term>, EngineError> {
        env.iter()
            .find(|(m, _)| m == n)
            .map(|(_, b)| b.ty().clone())
            .or_else(|| state.context.lookup_ty(n))
            .map(|ty| Term::var(n.clone(), ty))
            .ok_or_else(|| EngineError::UnboundName(n.clone()))
    };
    let f_term = lookup(f)?;
    let arg_terms = args.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
    let value = Term::mk_app(f_term, arg_terms);
    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Guess(goal_ty.clone(), value.clone()), scope.clone()))
    })?;
    Ok(())
}

/// `CompleteFill` — on `Guess ty v`, re-check `v` and unify its type
/// with `ty`, leaving a `Guess` (still awaiting `Solve`).
fn complete_fill(state: &mut ProofState, checker: &dyn TypeChecker, unifier: &dyn Unifier) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, ty, v) = require_guess(&state.pterm, &h, "CompleteFill")?;
    let (_, v_ty) = checker.recheck(state.context.as_ref(), &env, &v)?;
    unify_prime(state, unifier, &env, &v_ty, &ty)
}

/// `Regret` — on a `Hole` not free in its own scope, drop the binder
/// and its hole entry. Also handles the self-referential stub `Attack`
/// opens (`Bind h' (Hole t) (V h' t)`): since names are globally unique
/// (invariant 4), that shape's "occurs in scope" is trivially true for
/// *any* such hole, so the usual check can never pass for it — but it
/// is only ever the entire value of an ancestor `Guess`, and regretting
/// it means undoing the `Attack` that built it, i.e. collapsing that
/// `Guess` back into a plain `Hole` (scenario 6).
fn regret(state: &mut ProofState) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    require_hole(&state.pterm, &h, "Regret")?;

    if let Some(new_pterm) = collapse_attacked_guess(&state.pterm, &h) {
        state.pterm = new_pterm;
        state.holes.retain(|x| x != &h);
        return Ok(());
    }

    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        if !scope.no_occurrence(n) {
            return Err(EngineError::InvariantViolation(format!("{} occurs free in its own scope", n)));
        }
        Ok(scope.clone())
    })?;
    state.holes.retain(|x| x != &h);
    Ok(())
}

/// True if `term` is exactly `Attack`'s fresh-hole stub: `Bind target
/// (Hole _) (V target _)`.
fn is_attack_stub(term: &Rc<Term>, target: &Name) -> bool {
    matches!(
        term.as_ref(),
        Term::Bind(n, Binder::Hole(_), scope)
            if n == target && matches!(scope.as_ref(), Term::V(m, _) if m == target)
    )
}

/// If `target` names an `Attack`-stub hole that is the entire value of
/// some ancestor `Guess`, replace that `Guess` with a plain `Hole` of
/// the same type. Returns `None` if no such ancestor is found.
fn collapse_attacked_guess(term: &Rc<Term>, target: &Name) -> Option<Rc<Term>> {
    match term.as_ref() {
        Term::App(f, a) => {
            if let Some(nf) = collapse_attacked_guess(f, target) {
                return Some(Term::app(nf, a.clone()));
            }
            collapse_attacked_guess(a, target).map(|na| Term::app(f.clone(), na))
        }
        Term::Bind(n, Binder::Guess(gty, gv), gscope) if is_attack_stub(gv, target) => {
            Some(Term::bind(n.clone(), Binder::Hole(gty.clone()), gscope.clone()))
        }
        Term::Bind(n, binder, scope) => {
            let nested = match binder {
                Binder::Lam(t) => collapse_attacked_guess(t, target).map(Binder::Lam),
                Binder::Pi(t) => collapse_attacked_guess(t, target).map(Binder::Pi),
                Binder::PVar(t) => collapse_attacked_guess(t, target).map(Binder::PVar),
                Binder::PVTy(t) => collapse_attacked_guess(t, target).map(Binder::PVTy),
                Binder::Hole(t) => collapse_attacked_guess(t, target).map(Binder::Hole),
                Binder::GHole(k, t) => collapse_attacked_guess(t, target).map(|nt| Binder::GHole(*k, nt)),
                Binder::Let(t, v) => collapse_attacked_guess(v, target)
                    .map(|nv| Binder::Let(t.clone(), nv))
                    .or_else(|| collapse_attacked_guess(t, target).map(|nt| Binder::Let(nt, v.clone()))),
                Binder::Guess(t, v) => collapse_attacked_guess(v, target)
                    .map(|nv| Binder::Guess(t.clone(), nv))
                    .or_else(|| collapse_attacked_guess(t, target).map(|nt| Binder::Guess(nt, v.clone()))),
            };
            if let Some(nb) = nested {
                return Some(Term::bind(n.clone(), nb, scope.clone()));
            }
            collapse_attacked_guess(scope, target).map(|ns| Term::bind(n.clone(), binder.clone(), ns))
        }
        _ => None,
    }
}

fn update_goal_ty(state: &mut ProofState, f: impl Fn(&Env, &Rc<Term>) -> Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    state.pterm = navigator::at_h(&state.pterm, &h, |env, n, binder, scope| {
        let new_ty = f(env, binder.ty());
        Ok(Term::bind(n.clone(), binder.with_ty(new_ty), scope.clone()))
    })?;
    Ok(())
}

/// `ComputeLet n` — normalise only the RHS of the `Let`-binding named
/// `n`, wherever it sits in `pterm` (not necessarily at the focus, and
/// not an open binder `atH` would visit).
fn compute_let(state: &mut ProofState, evaluator: &dyn Evaluator, n: &Name) -> Result<(), EngineError> {
    let ctxt = state.context.clone();
    let env = Env::new();
    let new_term = navigator::replace_named(&state.pterm, n, &mut |nm, binder, scope| match binder {
        Binder::Let(ty, v) => {
            let nv = evaluator.normalise(ctxt.as_ref(), &env, v);
            Term::bind(nm.clone(), Binder::Let(ty.clone(), nv), scope.clone())
        }
        other => Term::bind(nm.clone(), other.clone(), scope.clone()),
    })
    .ok_or_else(|| EngineError::CantFindHole(n.clone()))?;
    state.pterm = new_term;
    Ok(())
}

/// `ExpandLet n v` — substitute `v` for every bound occurrence of `n`
/// in the `Let` named `n`'s own scope. `Term::subst`'s shadow-stop
/// (triggered when recursing into a `Bind` named `n`) is exactly wrong
/// here: since names are globally unique (invariant 4), the binder
/// reached by that check *is* `n`'s own `Let`, not a shadowing re-bind,
/// so substituting into `state.pterm` directly no-ops. Locate the `Let`
/// with `replace_named` instead and substitute into its scope, which
/// `Term::subst` does not shadow-stop on.
fn expand_let(state: &mut ProofState, n: &Name, v: &Rc<Term>) -> Result<(), EngineError> {
    state.pterm = navigator::replace_named(&state.pterm, n, &mut |nm, binder, scope| match binder {
        Binder::Let(ty, orig_v) => Term::bind(nm.clone(), Binder::Let(ty.clone(), orig_v.clone()), scope.subst(n, v)),
        other => Term::bind(nm.clone(), other.clone(), scope.clone()),
    })
    .ok_or_else(|| EngineError::CantFindHole(n.clone()))?;
    Ok(())
}

fn eval_in(state: &mut ProofState, evaluator: &dyn Evaluator, e: &Rc<Term>) -> Result<(), EngineError> {
    let env = state.env_at_focus(None)?;
    let normalised = evaluator.normalise(state.context.as_ref(), &env, e);
    let msg = format!("{} ==> {}", e, normalised);
    tracing::info!(target: "sctt_proof_engine::tactic", "{}", msg);
    state.plog.push(msg);
    Ok(())
}

fn check_in(state: &mut ProofState, checker: &dyn TypeChecker, e: &Rc<Term>) -> Result<(), EngineError> {
    let env = state.env_at_focus(None)?;
    let (_, ty) = checker.check(state.context.as_ref(), &env, e)?;
    let msg = format!("{} : {}", e, ty);
    tracing::info!(target: "sctt_proof_engine::tactic", "{}", msg);
    state.plog.push(msg);
    Ok(())
}

/// `Intro`/`IntroTy` shared implementation. `user_ty` is `Some((ty,
/// unifier))` for `IntroTy`, which additionally unifies the
/// user-supplied domain annotation with the Π's actual domain.
fn intro(
    state: &mut ProofState,
    checker: &dyn TypeChecker,
    user_ty: Option<(&Rc<Term>, &dyn Unifier)>,
    m_name: Option<&Name>,
) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Intro")?;
    let (y, s, t) = checker
        .as_pi(state.context.as_ref(), &env, &goal_ty)
        .ok_or_else(|| EngineError::CantIntroduce(format!("{}", goal_ty)))?;

    let domain = match user_ty {
        Some((ty, unifier)) => {
            checker.is_type(state.context.as_ref(), &env, ty)?;
            unify_prime(state, unifier, &env, ty, &s)?;
            ty.clone()
        }
        None => s,
    };

    let n = match m_name {
        Some(n) => {
            state.usedns.insert(n.clone());
            n.clone()
        }
        None => state.fresh_name(h.root()),
    };
    let h2 = state.fresh_name("intro");
    let t2 = t.subst(&y, &Term::var(n.clone(), domain.clone()));
    let new_inner = Term::bind(h2.clone(), Binder::Hole(t2.clone()), Term::var(h2.clone(), t2));

    state.pterm = navigator::at_h(&state.pterm, &h, |_, _, _, _| {
        Ok(Term::bind(n.clone(), Binder::Lam(domain.clone()), new_inner.clone()))
    })?;
    state.holes = replace_hole(&state.holes, &h, h2);
    Ok(())
}

/// `Forall n ty` — on a hole whose goal is itself a type universe, bind
/// `n : ty` with Π; `ty` must be a type and the goal must be a universe.
fn forall(state: &mut ProofState, checker: &dyn TypeChecker, evaluator: &dyn Evaluator, n: &Name, ty: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Forall")?;
    checker.is_type(state.context.as_ref(), &env, ty)?;
    match evaluator.hnf(state.context.as_ref(), &env, &goal_ty).as_ref() {
        Term::TType(_) => {}
        other => return Err(EngineError::NotAUniverse(format!("{}", other))),
    }
    state.usedns.insert(n.clone());
    let h2 = state.fresh_name("forall");
    let new_inner = Term::bind(h2.clone(), Binder::Hole(goal_ty.clone()), Term::var(h2.clone(), goal_ty.clone()));
    state.pterm = navigator::at_h(&state.pterm, &h, |_, _, _, _| {
        Ok(Term::bind(n.clone(), Binder::Pi(ty.clone()), new_inner.clone()))
    })?;
    state.holes = replace_hole(&state.holes, &h, h2);
    Ok(())
}

/// `LetBind n ty v` — check `ty : Type`, `v : ty`, insert `Let ty v`
/// around the (re-exposed) hole.
fn let_bind(state: &mut ProofState, checker: &dyn TypeChecker, n: &Name, ty: &Rc<Term>, v: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "LetBind")?;
    checker.is_type(state.context.as_ref(), &env, ty)?;
    let (checked_v, v_ty) = checker.check(state.context.as_ref(), &env, v)?;
    checker.converts(state.context.as_ref(), &env, &v_ty, ty)?;
    state.usedns.insert(n.clone());
    let h2 = state.fresh_name("let");
    let new_inner = Term::bind(h2.clone(), Binder::Hole(goal_ty.clone()), Term::var(h2.clone(), goal_ty.clone()));
    state.pterm = navigator::at_h(&state.pterm, &h, |_, _, _, _| {
        Ok(Term::bind(n.clone(), Binder::Let(ty.clone(), checked_v.clone()), new_inner.clone()))
    })?;
    state.holes = replace_hole(&state.holes, &h, h2);
    Ok(())
}

/// `Rewrite e` — `e : l = r`; generalise syntactic occurrences of `l`
/// in the goal into a motive `λx. goal[l:=x]`, open a new hole of type
/// `goal[l:=r]`, and discharge the original goal via `replace`.
///
/// The `replace` combinator's signature (`spec.md` §6) is
/// `{a}{x}{y}(P: a→Type) → P x → x=y → P y`; instantiating `x:=r`,
/// `y:=l` makes the conclusion `P l`, i.e. the *original* goal, from a
/// proof of `P r` (the new hole) and `e`. A full elaborator would
/// supply `sym e` here rather than `e` itself (`x=y` needs `r=l`); this
/// engine passes `e` directly and leaves the symmetry insertion to the
/// external checker/elaborator, consistent with `replace` being an
/// external collaborator whose own type governs what `recheck` accepts.
fn rewrite(state: &mut ProofState, checker: &dyn TypeChecker, e: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Rewrite")?;
    let (_, e_ty) = checker.check(state.context.as_ref(), &env, e)?;
    let (lt, _rt, l, r) = as_equality(&e_ty).ok_or_else(|| EngineError::NotEquality(format!("{}", e_ty)))?;

    let x = state.fresh_name("rewx");
    let motive_body = replace_subterm(&goal_ty, &l, &Term::var(x.clone(), lt.clone()));
    let motive = Term::bind(x.clone(), Binder::Lam(lt.clone()), motive_body);
    let new_goal = replace_subterm(&goal_ty, &l, &r);

    // The new hole is nested inside the `Guess`'s value, exactly as
    // `Attack` nests its fresh hole — `replace_app` references it, so it
    // must be in scope there, not a sibling.
    let h2 = state.fresh_name("rewrite");
    let replace_head = Term::var(Name::user(REPLACE_NAME), Rc::new(Term::Erased));
    let replace_app = Term::mk_app(
        replace_head,
        vec![lt, r, l, motive, Term::var(h2.clone(), new_goal.clone()), e.clone()],
    );
    let guess_value = Term::bind(h2.clone(), Binder::Hole(new_goal), replace_app);

    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Guess(goal_ty.clone(), guess_value.clone()), scope.clone()))
    })?;
    // `h` is still open (now a `Guess`, per Attack's convention) — only
    // the fresh sub-goal `h2` is new to the hole list.
    state.holes.push_front(h2);
    Ok(())
}

/// `Induction x` — `x : T a1..an`: look up `ElimN T`, split parameters
/// from indices via `DataMI`, abstract the goal into a motive, and
/// build `ElimN params motive methods indices x`. Opens one new hole
/// per method and removes the original (the eliminator application is
/// known-correct by construction, so no intervening `Solve` is needed —
/// scenario 3: "creates exactly two new holes ... plus removes the
/// original"). The motive's index binders and each method hole get
/// their real type, peeled off `ElimN`'s own registered signature
/// (`context.lookup_ty`), instantiated at these `params`/this `motive`
/// — not a stand-in, so the result survives `QED`'s `recheck`.
fn induction(state: &mut ProofState, checker: &dyn TypeChecker, x: &Name) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Induction")?;
    let x_ty = env
        .iter()
        .find(|(n, _)| n == x)
        .map(|(_, b)| b.ty().clone())
        .ok_or_else(|| EngineError::UnboundName(x.clone()))?;
    let (head, args) = Term::un_apply(&x_ty);
    let family = match head.as_ref() {
        Term::V(n, _) => n.clone(),
        _ => return Err(EngineError::CantIntroduce(format!("{}", x_ty))),
    };
    let elim_name = match state.context.eliminators_for(&family).as_slice() {
        [one] => one.clone(),
        [] => return Err(EngineError::NoEliminator(family)),
        _ => return Err(EngineError::AmbiguousEliminator(family)),
    };
    let MetaInformation::DataMI { param_positions, constructors } = state
        .context
        .lookup_metainformation(&family)
        .ok_or_else(|| EngineError::NoMetaInformation(family.clone()))?;

    let mut params = Vec::new();
    let mut indices = Vec::new();
    for (i, a) in args.iter().enumerate() {
        if param_positions.contains(&i) {
            params.push(a.clone());
        } else {
            indices.push(a.clone());
        }
    }

    // Motive: abstract the goal over the indices, at their real types
    // (checked in the focus's own environment), and the scrutinee.
    let mut motive_body = goal_ty.clone();
    let mut index_binders = Vec::new();
    for idx_term in &indices {
        let (_, idx_ty) = checker.check(state.context.as_ref(), &env, idx_term)?;
        let iv = state.fresh_name("idx");
        motive_body = replace_subterm(&motive_body, idx_term, &Term::var(iv.clone(), idx_ty.clone()));
        index_binders.push((iv, idx_ty));
    }
    let xv = state.fresh_name(x.root());
    motive_body = replace_subterm(&motive_body, &Term::var(x.clone(), x_ty.clone()), &Term::var(xv.clone(), x_ty.clone()));
    let mut motive = Term::bind(xv, Binder::Lam(x_ty.clone()), motive_body);
    for (iv, ity) in index_binders.iter().rev() {
        motive = Term::bind(iv.clone(), Binder::Lam(ity.clone()), motive);
    }

    // Peel `ElimN`'s own signature — params, then the motive slot
    // (instantiated with the `motive` just built), then one Pi per
    // constructor — to recover each method hole's real type.
    let elim_sig = state.context.lookup_ty(&elim_name).ok_or_else(|| EngineError::UnboundName(elim_name.clone()))?;
    let mut cur_ty = elim_sig.clone();
    for p in &params {
        let (pn, _, cod) = checker
            .as_pi(state.context.as_ref(), &env, &cur_ty)
            .ok_or_else(|| EngineError::CantIntroduce(format!("{}", cur_ty)))?;
        cur_ty = cod.subst(&pn, p);
    }
    let (motive_name, _, after_motive) = checker
        .as_pi(state.context.as_ref(), &env, &cur_ty)
        .ok_or_else(|| EngineError::CantIntroduce(format!("{}", cur_ty)))?;
    cur_ty = after_motive.subst(&motive_name, &motive);

    let mut method_names = Vec::new();
    let mut method_terms = Vec::new();
    let mut method_tys = Vec::new();
    for i in 0..constructors {
        let (mn, dom, cod) = checker
            .as_pi(state.context.as_ref(), &env, &cur_ty)
            .ok_or_else(|| EngineError::CantIntroduce(format!("{}", cur_ty)))?;
        let fresh = state.fresh_name(&format!("method{}", i));
        let placeholder = Term::var(fresh.clone(), dom.clone());
        cur_ty = cod.subst(&mn, &placeholder);
        method_names.push(fresh);
        method_terms.push(placeholder);
        method_tys.push(dom);
    }

    let elim_head = Term::var(elim_name, elim_sig);
    let mut elim_args = params;
    elim_args.push(motive);
    elim_args.extend(method_terms);
    elim_args.extend(indices);
    elim_args.push(Term::var(x.clone(), x_ty));
    let elim_app = Term::mk_app(elim_head, elim_args);

    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| Ok(scope.subst(n, &elim_app)))?;
    for (mn, mty) in method_names.iter().zip(method_tys.iter()).rev() {
        state.pterm = Term::bind(mn.clone(), Binder::Hole(mty.clone()), state.pterm.clone());
    }
    state.holes.retain(|hh| hh != &h);
    let mut new_holes: im::Vector<Name> = method_names.into_iter().collect();
    new_holes.extend(state.holes.iter().cloned());
    state.holes = new_holes;
    state.solved = Some((h, elim_app));
    Ok(())
}

/// `Equiv ty` — check `ty : Type` and `ty ≡ goal`, then replace the
/// hole's goal with `ty` (a judgmental-equality coercion; no value
/// change, just a different but convertible presentation of the type).
fn equiv(state: &mut ProofState, checker: &dyn TypeChecker, ty: &Rc<Term>) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Equiv")?;
    checker.is_type(state.context.as_ref(), &env, ty)?;
    checker.converts(state.context.as_ref(), &env, ty, &goal_ty)?;
    state.pterm = navigator::at_h(&state.pterm, &h, |_, n, _, scope| {
        Ok(Term::bind(n.clone(), Binder::Hole(ty.clone()), scope.clone()))
    })?;
    Ok(())
}

/// `PatVar n` — convert a `Hole` into a `PVar`, substituting its
/// reference for the hole throughout the scope; records `(h ↦ n)` in
/// `notunified` and propagates injectivity.
fn pat_var(state: &mut ProofState, n: &Name) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (_, ty) = require_hole(&state.pterm, &h, "PatVar")?;
    let was_injective = state.injective.contains(&h);
    state.usedns.insert(n.clone());
    state.pterm = navigator::at_h(&state.pterm, &h, |_, _, _, scope| {
        Ok(Term::bind(n.clone(), Binder::PVar(ty.clone()), scope.subst(&h, &Term::var(n.clone(), ty.clone()))))
    })?;
    state.holes.retain(|x| x != &h);
    state.notunified.push((h.clone(), Term::var(n.clone(), ty)));
    if was_injective {
        state.injective.insert(n.clone());
    }
    Ok(())
}

/// `PatBind n` — dual of `Intro` for `PVTy`: binds a `PVar` out of a
/// `PVTy` binder (not an open `Hole`/`Guess`, so `atH` cannot reach it —
/// uses `replace_named` instead).
fn pat_bind(state: &mut ProofState, n: &Name) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let mut found = false;
    let new_pterm = navigator::replace_named(&state.pterm, &h, &mut |nm, binder, scope| match binder {
        Binder::PVTy(ty) => {
            found = true;
            Term::bind(n.clone(), Binder::PVar(ty.clone()), scope.subst(nm, &Term::var(n.clone(), ty.clone())))
        }
        other => Term::bind(nm.clone(), other.clone(), scope.clone()),
    })
    .ok_or_else(|| EngineError::CantFindHole(h.clone()))?;
    if !found {
        return Err(EngineError::CantTacticHere("PatBind"));
    }
    state.usedns.insert(n.clone());
    state.pterm = new_pterm;
    Ok(())
}

/// `Defer n` — the focused hole must be a raw self-reference (untouched
/// since creation). Abstracts the enclosing environment into a Π-type,
/// replaces the hole with an application of a new top-level `GHole n`
/// to every environment variable, and drops the hole.
fn defer(state: &mut ProofState, n: &Name) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, goal_ty) = require_hole(&state.pterm, &h, "Defer")?;

    let mut sig = goal_ty;
    for (en, eb) in env.iter() {
        sig = Term::bind(en.clone(), Binder::Pi(eb.ty().clone()), sig);
    }
    let args: Vec<Rc<Term>> = env.iter().rev().map(|(en, eb)| Term::var(en.clone(), eb.ty().clone())).collect();

    state.usedns.insert(n.clone());
    let applied = Term::mk_app(Term::var(n.clone(), sig.clone()), args);
    state.pterm = navigator::at_h(&state.pterm, &h, |_, nm, _, scope| match scope.as_ref() {
        Term::V(sn, _) if sn == nm => Ok(scope.subst(nm, &applied)),
        _ => Err(EngineError::CantTacticHere("Defer")),
    })?;
    state.holes.retain(|x| x != &h);
    state.deferred.push(n.clone());
    let gh_id = state.deferred.len();
    state.pterm = Term::bind(n.clone(), Binder::GHole(gh_id, sig), state.pterm.clone());
    Ok(())
}

/// `DeferType n ty [args]` — like `Defer`, but the user supplies the
/// full top-level signature and the application arguments explicitly.
fn defer_type(state: &mut ProofState, checker: &dyn TypeChecker, n: &Name, ty: &Rc<Term>, args: &[Name]) -> Result<(), EngineError> {
    let h = state.resolve_focus(None)?;
    let (env, _goal_ty) = require_hole(&state.pterm, &h, "DeferType")?;
    checker.is_type(state.context.as_ref(), &env, ty)?;
    let arg_terms = args
        .iter()
        .map(|a| {
            env.iter()
                .find(|(en, _)| en == a)
                .map(|(_, eb)| Term::var(a.clone(), eb.ty().clone()))
                .ok_or_else(|| EngineError::InvariantViolation(format!("deferType: {} not in environment", a)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    state.usedns.insert(n.clone());
    let applied = Term::mk_app(Term::var(n.clone(), ty.clone()), arg_terms);
    state.pterm = navigator::at_h(&state.pterm, &h, |_, nm, _, scope| Ok(scope.subst(nm, &applied)))?;
    state.holes.retain(|x| x != &h);
    state.deferred.push(n.clone());
    let gh_id = state.deferred.len();
    state.pterm = Term::bind(n.clone(), Binder::GHole(gh_id, ty.clone()), state.pterm.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::StructuralChecker;
    use crate::context::{Context, SimpleContext};
    use crate::evaluator::StructuralEvaluator;
    use crate::term::Level;
    use crate::unifier::StructuralUnifier;

    #[test]
    fn expand_let_substitutes_into_the_lets_own_scope() {
        let ctxt: Rc<dyn Context> = Rc::new(SimpleContext::new());
        let checker = StructuralChecker::new();
        let evaluator = StructuralEvaluator::new();
        let unifier = StructuralUnifier::new();

        let ty = Term::universe(Level::ZERO);
        let n = Name::user("n");
        let orig_value = Term::universe(Level(1));
        let v = Term::var(Name::user("replacement"), ty.clone());

        let mut state = ProofState::new_proof(Name::user("t"), ctxt, ty.clone());
        state.pterm = Term::bind(n.clone(), Binder::Let(ty.clone(), orig_value), Term::var(n.clone(), ty.clone()));

        let (next, _) =
            process_tactic(&Tactic::ExpandLet(n.clone(), v.clone()), &state, &checker, &evaluator, &unifier).unwrap();

        match next.pterm.as_ref() {
            Term::Bind(bn, Binder::Let(_, _), scope) => {
                assert_eq!(bn, &n);
                assert_eq!(scope, &v, "bound occurrence of n in the Let's scope was not substituted");
            }
            other => panic!("expected the Let to survive with its scope substituted, got {:?}", other),
        }
    }

    #[test]
    fn attack_then_regret_restores_the_pre_attack_state() {
        let ctxt: Rc<dyn Context> = Rc::new(SimpleContext::new());
        let checker = StructuralChecker::new();
        let evaluator = StructuralEvaluator::new();
        let unifier = StructuralUnifier::new();

        let state = ProofState::new_proof(Name::user("t"), ctxt, Term::universe(Level::ZERO));
        let before_pterm = state.pterm.clone();
        let before_holes = state.holes.clone();

        let (attacked, _) = process_tactic(&Tactic::Attack, &state, &checker, &evaluator, &unifier).unwrap();
        assert_eq!(attacked.holes.len(), 2);

        let (regretted, _) = process_tactic(&Tactic::Regret, &attacked, &checker, &evaluator, &unifier).unwrap();
        // `nextname`/`usedns` are monotonic bookkeeping and never roll back
        // (Design Notes §9); the proof content itself is what must match.
        assert_eq!(regretted.pterm, before_pterm);
        assert_eq!(regretted.holes, before_holes);
    }

    #[test]
    fn induction_derives_real_types_for_the_method_holes() {
        let mut ctxt = SimpleContext::new();
        let type0 = Term::universe(Level::ZERO);
        let nat = Name::user("Nat");
        let nat_ty = Term::var(nat.clone(), type0.clone());

        let z = Name::user("Z");
        ctxt.declare_ty(z.clone(), nat_ty.clone());
        let s = Name::user("S");
        ctxt.declare_ty(s.clone(), Term::bind(Name::user("k"), Binder::Pi(nat_ty.clone()), nat_ty.clone()));

        let p = Name::user("P");
        let motive_domain = Term::bind(Name::user("_"), Binder::Pi(nat_ty.clone()), type0.clone());
        let p_ref = |arg: Rc<Term>| Term::app(Term::var(p.clone(), motive_domain.clone()), arg);

        let method1_ty = p_ref(Term::var(z.clone(), nat_ty.clone()));
        let k = Name::user("k");
        let method2_ty = Term::bind(
            k.clone(),
            Binder::Pi(nat_ty.clone()),
            Term::bind(
                Name::user("ih"),
                Binder::Pi(p_ref(Term::var(k.clone(), nat_ty.clone()))),
                p_ref(Term::app(Term::var(s.clone(), Rc::new(Term::Erased)), Term::var(k.clone(), nat_ty.clone()))),
            ),
        );
        let n = Name::user("n");
        let elim_sig = Term::bind(
            p.clone(),
            Binder::Pi(motive_domain),
            Term::bind(
                Name::user("m1"),
                Binder::Pi(method1_ty),
                Term::bind(
                    Name::user("m2"),
                    Binder::Pi(method2_ty),
                    Term::bind(n.clone(), Binder::Pi(nat_ty.clone()), p_ref(Term::var(n, nat_ty.clone()))),
                ),
            ),
        );
        ctxt.declare_ty(Name::user("elimNat"), elim_sig);
        ctxt.declare_data(nat.clone(), vec![], 2);
        ctxt.declare_eliminator(nat, Name::user("elimNat"));

        let ctxt: Rc<dyn Context> = Rc::new(ctxt);
        let checker = StructuralChecker::new();
        let evaluator = StructuralEvaluator::new();
        let unifier = StructuralUnifier::new();

        let x = Name::user("x");
        let goal_ty = Term::universe(Level::ZERO);
        let h = Name::user("goal");
        let mut state = ProofState::new_proof(Name::user("t"), ctxt, goal_ty.clone());
        state.pterm = Term::bind(
            x.clone(),
            Binder::Pi(nat_ty.clone()),
            Term::bind(h.clone(), Binder::Hole(goal_ty.clone()), Term::var(h.clone(), goal_ty)),
        );
        state.holes = im::Vector::unit(h);

        let (next, _) = process_tactic(&Tactic::Induction(x), &state, &checker, &evaluator, &unifier).unwrap();

        assert_eq!(next.holes.len(), 2);
        for method_hole in next.holes.iter() {
            let ty = next.goal_at_focus(Some(method_hole)).unwrap();
            assert!(!matches!(ty.as_ref(), Term::Erased), "method hole {} kept an Erased type", method_hole);
        }
    }
}
