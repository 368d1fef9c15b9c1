//! The evaluator: an external, pure collaborator (`spec.md` §1, §6).
//! `normalise`/`hnf`/`specialise` all operate over `(ctxt, env, term)`
//! with no access to the `ProofState`.

use crate::context::Context;
use crate::term::{Binder, Env, Term};
use std::rc::Rc;

pub trait Evaluator {
    /// Full normal form.
    fn normalise(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Rc<Term>;

    /// Weak head normal form — reduce only the head redex.
    fn hnf(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Rc<Term>;

    /// Let-reduction / constant folding, without a full normal-order walk.
    fn specialise(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Rc<Term>;
}

/// Reference evaluator: beta/let/delta reduction by direct substitution.
/// Adequate for the engine's own tests; a production elaborator is
/// expected to swap in a closure-based NbE evaluator instead (the
/// `checker` module's `StructuralChecker` is written against the
/// `Evaluator` trait, not this struct, for exactly that reason).
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralEvaluator;

impl StructuralEvaluator {
    pub fn new() -> Self {
        StructuralEvaluator
    }

    fn step(&self, ctxt: &dyn Context, t: &Rc<Term>) -> Option<Rc<Term>> {
        match t.as_ref() {
            Term::App(f, a) => {
                if let Some(f2) = self.step(ctxt, f) {
                    return Some(Term::app(f2, a.clone()));
                }
                if let Term::Bind(n, Binder::Lam(_), scope) = f.as_ref() {
                    return Some(scope.subst(n, a));
                }
                if let Term::V(n, _) = f.as_ref() {
                    if let Some(def) = ctxt.lookup_def(n) {
                        return Some(Term::app(def, a.clone()));
                    }
                }
                None
            }
            Term::Bind(n, Binder::Let(_, v), scope) => Some(scope.subst(n, v)),
            Term::V(n, _) => ctxt.lookup_def(n),
            _ => None,
        }
    }
}

impl Evaluator for StructuralEvaluator {
    fn hnf(&self, ctxt: &dyn Context, _env: &Env, t: &Rc<Term>) -> Rc<Term> {
        let mut cur = t.clone();
        while let Some(next) = self.step(ctxt, &cur) {
            cur = next;
        }
        cur
    }

    fn normalise(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Rc<Term> {
        let whnf = self.hnf(ctxt, env, t);
        match whnf.as_ref() {
            Term::App(f, a) => Term::app(
                self.normalise(ctxt, env, f),
                self.normalise(ctxt, env, a),
            ),
            Term::Bind(n, binder, scope) => {
                let norm_binder = match binder {
                    Binder::Lam(ty) => Binder::Lam(self.normalise(ctxt, env, ty)),
                    Binder::Pi(ty) => Binder::Pi(self.normalise(ctxt, env, ty)),
                    Binder::Let(ty, v) => {
                        Binder::Let(self.normalise(ctxt, env, ty), self.normalise(ctxt, env, v))
                    }
                    Binder::PVar(ty) => Binder::PVar(self.normalise(ctxt, env, ty)),
                    Binder::PVTy(ty) => Binder::PVTy(self.normalise(ctxt, env, ty)),
                    Binder::Hole(ty) => Binder::Hole(self.normalise(ctxt, env, ty)),
                    Binder::Guess(ty, v) => {
                        Binder::Guess(self.normalise(ctxt, env, ty), self.normalise(ctxt, env, v))
                    }
                    Binder::GHole(k, ty) => Binder::GHole(*k, self.normalise(ctxt, env, ty)),
                };
                Term::bind(n.clone(), norm_binder, self.normalise(ctxt, env, scope))
            }
            Term::V(_, _) | Term::TType(_) | Term::Erased => whnf,
        }
    }

    fn specialise(&self, ctxt: &dyn Context, _env: &Env, t: &Rc<Term>) -> Rc<Term> {
        // Unfold only `Let` redexes and already-applied lambdas; leave
        // everything else (including `Name` lookups into `ctxt`) alone.
        match t.as_ref() {
            Term::Bind(n, Binder::Let(_, v), scope) => scope.subst(n, v),
            Term::App(f, a) => {
                if let Term::Bind(n, Binder::Lam(_), scope) = f.as_ref() {
                    scope.subst(n, a)
                } else {
                    t.clone()
                }
            }
            _ => t.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimpleContext;
    use crate::name::Name;
    use crate::term::Level;

    #[test]
    fn hnf_beta_reduces_an_applied_lambda() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let ty = Term::universe(Level::ZERO);
        let x = Name::user("x");
        let lam = Term::bind(x.clone(), Binder::Lam(ty.clone()), Term::var(x, ty.clone()));
        let applied = Term::app(lam, ty.clone());
        let result = StructuralEvaluator::new().hnf(&ctxt, &env, &applied);
        assert_eq!(result, ty);
    }

    #[test]
    fn hnf_unfolds_a_delta_definition() {
        let mut ctxt = SimpleContext::new();
        let ty = Term::universe(Level::ZERO);
        let id = Name::user("one");
        ctxt.declare_def(id.clone(), ty.clone(), ty.clone());
        let env = Env::new();
        let result = StructuralEvaluator::new().hnf(&ctxt, &env, &Term::var(id, ty.clone()));
        assert_eq!(result, ty);
    }

    #[test]
    fn normalise_recurses_under_binders() {
        let env = Env::new();
        let ty = Term::universe(Level::ZERO);
        let inner_x = Name::user("x");
        let f = Name::user("f");
        let body = Term::bind(
            inner_x.clone(),
            Binder::Lam(ty.clone()),
            Term::app(Term::var(f.clone(), ty.clone()), Term::var(inner_x, ty.clone())),
        );
        let mut ctxt = SimpleContext::new();
        ctxt.declare_def(f, ty.clone(), Term::bind(Name::user("y"), Binder::Lam(ty.clone()), ty.clone()));
        let result = StructuralEvaluator::new().normalise(&ctxt, &env, &body);
        // Normalising does not get stuck under the outer Lam.
        assert!(matches!(result.as_ref(), Term::Bind(_, Binder::Lam(_), _)));
    }

    #[test]
    fn specialise_unfolds_let_but_not_delta() {
        let mut ctxt = SimpleContext::new();
        let ty = Term::universe(Level::ZERO);
        let n = Name::user("n");
        ctxt.declare_def(n.clone(), ty.clone(), ty.clone());
        let env = Env::new();

        let let_term = Term::bind(Name::user("x"), Binder::Let(ty.clone(), ty.clone()), Term::var(Name::user("x"), ty.clone()));
        assert_eq!(StructuralEvaluator::new().specialise(&ctxt, &env, &let_term), ty);

        let var_term = Term::var(n, ty.clone());
        assert_eq!(StructuralEvaluator::new().specialise(&ctxt, &env, &var_term), var_term);
    }
}
