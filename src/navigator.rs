//! The term navigator (`spec.md` §4.1): descend the proof term to the
//! focused hole, run a tactic interpreter there, and rebuild the spine.

use crate::error::EngineError;
use crate::name::Name;
use crate::term::{Binder, Env, Term};
use std::rc::Rc;

type RunFn<'a> = dyn FnMut(&Env, &Name, &Binder, &Rc<Term>) -> Result<Rc<Term>, EngineError> + 'a;

fn walk(t: &Rc<Term>, focus: &Name, env: Env, f: &mut RunFn<'_>) -> Result<Option<Rc<Term>>, EngineError> {
    match t.as_ref() {
        Term::V(_, _) | Term::TType(_) | Term::Erased => Ok(None),
        Term::App(g, a) => {
            if let Some(ng) = walk(g, focus, env.clone(), f)? {
                return Ok(Some(Term::app(ng, a.clone())));
            }
            if let Some(na) = walk(a, focus, env, f)? {
                return Ok(Some(Term::app(g.clone(), na)));
            }
            Ok(None)
        }
        Term::Bind(n, binder, scope) => {
            if n == focus && binder.is_open() {
                let replacement = f(&env, n, binder, scope)?;
                return Ok(Some(replacement));
            }
            let mut extended = env.clone();
            extended.push_front((n.clone(), binder.clone()));

            match binder {
                Binder::Guess(ty, v) => {
                    if let Some(nv) = walk(v, focus, env.clone(), f)? {
                        return Ok(Some(Term::bind(n.clone(), Binder::Guess(ty.clone(), nv), scope.clone())));
                    }
                    if let Some(nty) = walk(ty, focus, env.clone(), f)? {
                        return Ok(Some(Term::bind(n.clone(), Binder::Guess(nty, v.clone()), scope.clone())));
                    }
                    if let Some(ns) = walk(scope, focus, extended, f)? {
                        return Ok(Some(Term::bind(n.clone(), binder.clone(), ns)));
                    }
                    Ok(None)
                }
                Binder::Let(ty, v) => {
                    if let Some(ns) = walk(scope, focus, extended, f)? {
                        return Ok(Some(Term::bind(n.clone(), binder.clone(), ns)));
                    }
                    if let Some(nv) = walk(v, focus, env.clone(), f)? {
                        return Ok(Some(Term::bind(n.clone(), Binder::Let(ty.clone(), nv), scope.clone())));
                    }
                    if let Some(nty) = walk(ty, focus, env.clone(), f)? {
                        return Ok(Some(Term::bind(n.clone(), Binder::Let(nty, v.clone()), scope.clone())));
                    }
                    Ok(None)
                }
                _ => {
                    if let Some(ns) = walk(scope, focus, extended, f)? {
                        return Ok(Some(Term::bind(n.clone(), binder.clone(), ns)));
                    }
                    if let Some(nty) = walk(binder.ty(), focus, env.clone(), f)? {
                        return Ok(Some(Term::bind(n.clone(), binder.with_ty(nty), scope.clone())));
                    }
                    Ok(None)
                }
            }
        }
    }
}

/// `atH` — find the binder named `focus` (must be a `Hole`/`Guess`),
/// invoke `f` there, and splice its result back into the term.
pub fn at_h(
    pterm: &Rc<Term>,
    focus: &Name,
    mut f: impl FnMut(&Env, &Name, &Binder, &Rc<Term>) -> Result<Rc<Term>, EngineError>,
) -> Result<Rc<Term>, EngineError> {
    match walk(pterm, focus, Env::new(), &mut f)? {
        Some(new_term) => Ok(new_term),
        None => Err(EngineError::CantFindHole(focus.clone())),
    }
}

/// `goal(h, tm)` — read-only query: the environment and binder at `h`.
pub fn goal(pterm: &Rc<Term>, focus: &Name) -> Option<(Env, Binder)> {
    let mut found: Option<(Env, Binder)> = None;
    let _ = at_h(pterm, focus, |env, _, binder, scope| {
        found = Some((env.clone(), binder.clone()));
        // Return the subtree unchanged — this traversal never mutates.
        Ok(Term::bind(focus.clone(), binder.clone(), scope.clone()))
    });
    found
}

/// Like `at_h`, but matches a binder named `target` of *any* kind, not
/// just an open `Hole`/`Guess`. Used by tactics that target a `Let`
/// (`ComputeLet`) or a `PVTy` (`PatBind`) binder, which `atH` itself
/// never visits (`spec.md` §4.1 only ever focuses holes).
pub fn replace_named(
    term: &Rc<Term>,
    target: &Name,
    f: &mut dyn FnMut(&Name, &Binder, &Rc<Term>) -> Rc<Term>,
) -> Option<Rc<Term>> {
    match term.as_ref() {
        Term::V(_, _) | Term::TType(_) | Term::Erased => None,
        Term::App(g, a) => {
            if let Some(ng) = replace_named(g, target, f) {
                return Some(Term::app(ng, a.clone()));
            }
            replace_named(a, target, f).map(|na| Term::app(g.clone(), na))
        }
        Term::Bind(n, binder, scope) => {
            if n == target {
                return Some(f(n, binder, scope));
            }
            let nested = match binder {
                Binder::Guess(ty, v) => replace_named(v, target, f)
                    .map(|nv| Term::bind(n.clone(), Binder::Guess(ty.clone(), nv), scope.clone()))
                    .or_else(|| {
                        replace_named(ty, target, f)
                            .map(|nty| Term::bind(n.clone(), Binder::Guess(nty, v.clone()), scope.clone()))
                    }),
                Binder::Let(ty, v) => replace_named(v, target, f)
                    .map(|nv| Term::bind(n.clone(), Binder::Let(ty.clone(), nv), scope.clone()))
                    .or_else(|| {
                        replace_named(ty, target, f)
                            .map(|nty| Term::bind(n.clone(), Binder::Let(nty, v.clone()), scope.clone()))
                    }),
                _ => replace_named(binder.ty(), target, f)
                    .map(|nty| Term::bind(n.clone(), binder.with_ty(nty), scope.clone())),
            };
            nested.or_else(|| replace_named(scope, target, f).map(|ns| Term::bind(n.clone(), binder.clone(), ns)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole_term(h: &Name, ty: Rc<Term>) -> Rc<Term> {
        Term::bind(h.clone(), Binder::Hole(ty.clone()), Term::var(h.clone(), ty))
    }

    #[test]
    fn goal_finds_the_named_hole() {
        let ty = Term::universe(crate::term::Level::ZERO);
        let h = Name::user("h");
        let term = hole_term(&h, ty.clone());
        let (env, binder) = goal(&term, &h).expect("hole present");
        assert!(env.is_empty());
        assert_eq!(binder.ty(), &ty);
    }

    #[test]
    fn goal_is_none_for_missing_hole() {
        let ty = Term::universe(crate::term::Level::ZERO);
        let h = Name::user("h");
        let term = hole_term(&h, ty);
        assert!(goal(&term, &Name::user("missing")).is_none());
    }

    #[test]
    fn at_h_splices_the_replacement_back_into_the_spine() {
        let ty = Term::universe(crate::term::Level::ZERO);
        let h = Name::user("h");
        let outer = Term::bind(
            Name::user("k"),
            Binder::Hole(ty.clone()),
            Term::app(Term::var(Name::user("f"), Rc::new(Term::Erased)), hole_term(&h, ty.clone())),
        );
        let replaced = at_h(&outer, &h, |_, n, _, scope| {
            Ok(Term::bind(n.clone(), Binder::Guess(ty.clone(), scope.clone()), scope.clone()))
        })
        .unwrap();
        let (_, binder) = goal(&replaced, &h).unwrap();
        assert!(binder.is_guess());
    }

    #[test]
    fn replace_named_reaches_non_open_binders() {
        let ty = Term::universe(crate::term::Level::ZERO);
        let let_name = Name::user("x");
        let v = Term::var(Name::user("v"), ty.clone());
        let term = Term::bind(
            let_name.clone(),
            Binder::Let(ty.clone(), v.clone()),
            Term::var(let_name.clone(), ty.clone()),
        );
        // `atH` never visits a `Let` — it is not an open binder.
        assert!(goal(&term, &let_name).is_none());

        let touched = replace_named(&term, &let_name, &mut |n, binder, scope| match binder {
            Binder::Let(t, _) => Term::bind(n.clone(), Binder::Let(t.clone(), v.clone()), scope.clone()),
            other => Term::bind(n.clone(), other.clone(), scope.clone()),
        });
        assert!(touched.is_some());
    }
}
