//! The unifier: an external oracle (`spec.md` §1, §6). `unify` performs
//! full two-sided unification (and may defer sub-equations it cannot
//! yet decide); `match_unify` is one-sided pattern matching and never
//! defers — it simply fails.

use crate::context::Context;
use crate::error::EngineError;
use crate::name::Name;
use crate::term::{Binder, Env, Term};
use std::rc::Rc;

pub type Subst = Vec<(Name, Rc<Term>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemMode {
    Unify,
    Match,
}

/// A deferred equation the unifier could not immediately settle
/// (`spec.md` §3 `problems`, §4.2).
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub env: Env,
    pub lhs: Rc<Term>,
    pub rhs: Rc<Term>,
    pub mode: ProblemMode,
    pub error: EngineError,
}

pub trait Unifier {
    fn unify(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        a: &Rc<Term>,
        b: &Rc<Term>,
        injective: &im::HashSet<Name>,
        holes: &im::Vector<Name>,
    ) -> Result<(Subst, Vec<Problem>), EngineError>;

    fn match_unify(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        a: &Rc<Term>,
        b: &Rc<Term>,
        injective: &im::HashSet<Name>,
        holes: &im::Vector<Name>,
    ) -> Result<Subst, EngineError>;
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Full,
    Match,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralUnifier;

impl StructuralUnifier {
    pub fn new() -> Self {
        StructuralUnifier
    }

    fn apply(sub: &Subst, t: &Rc<Term>) -> Rc<Term> {
        t.psubst(sub)
    }

    fn head_decomposable(head: &Term, holes: &im::Vector<Name>, injective: &im::HashSet<Name>) -> bool {
        match head {
            Term::V(n, _) => {
                if holes.contains(n) {
                    injective.contains(n)
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Core recursive solver. Returns the accumulated substitution plus
    /// any flex-flex pairs postponed as problems (only ever non-empty
    /// for `Mode::Full`).
    fn go(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        a: &Rc<Term>,
        b: &Rc<Term>,
        injective: &im::HashSet<Name>,
        holes: &im::Vector<Name>,
        mode: Mode,
    ) -> Result<(Subst, Vec<Problem>), EngineError> {
        if Term::alpha_eq(a, b) {
            return Ok((Vec::new(), Vec::new()));
        }

        // A hole on the left always may bind, in either mode.
        if let Term::V(n, _) = a.as_ref() {
            if holes.contains(n) && b.no_occurrence(n) {
                return Ok((vec![(n.clone(), b.clone())], Vec::new()));
            }
        }
        // A hole on the right may only bind for full unification.
        if matches!(mode, Mode::Full) {
            if let Term::V(n, _) = b.as_ref() {
                if holes.contains(n) && a.no_occurrence(n) {
                    // Flex-flex (both sides are holes): postpone rather
                    // than commit to an arbitrary orientation.
                    if let Term::V(m, _) = a.as_ref() {
                        if holes.contains(m) {
                            let problem = Problem {
                                env: env.clone(),
                                lhs: a.clone(),
                                rhs: b.clone(),
                                mode: ProblemMode::Unify,
                                error: EngineError::CantUnify(format!("{}", a), format!("{}", b)),
                            };
                            return Ok((Vec::new(), vec![problem]));
                        }
                    }
                    return Ok((vec![(n.clone(), a.clone())], Vec::new()));
                }
            }
        }

        match (a.as_ref(), b.as_ref()) {
            (Term::TType(l1), Term::TType(l2)) if l1 == l2 => Ok((Vec::new(), Vec::new())),
            (Term::App(..), Term::App(..)) => {
                let (ha, argsa) = Term::un_apply(a);
                let (hb, argsb) = Term::un_apply(b);
                if argsa.len() != argsb.len() || !Self::head_decomposable(&ha, holes, injective) {
                    return self.fail_or_defer(a, b, env, mode);
                }
                if !Term::alpha_eq(&ha, &hb) {
                    return self.fail_or_defer(a, b, env, mode);
                }
                let mut acc: Subst = Vec::new();
                let mut problems = Vec::new();
                for (xa, xb) in argsa.iter().zip(argsb.iter()) {
                    let xa2 = Self::apply(&acc, xa);
                    let xb2 = Self::apply(&acc, xb);
                    let (sub, probs) = self.go(ctxt, env, &xa2, &xb2, injective, holes, mode)?;
                    acc.extend(sub);
                    problems.extend(probs);
                }
                Ok((acc, problems))
            }
            (Term::Bind(na, Binder::Pi(da), ca), Term::Bind(nb, Binder::Pi(db), cb)) => {
                self.go_binder(ctxt, env, na, da, ca, nb, db, cb, injective, holes, mode)
            }
            (Term::Bind(na, Binder::Lam(da), ca), Term::Bind(nb, Binder::Lam(db), cb)) => {
                self.go_binder(ctxt, env, na, da, ca, nb, db, cb, injective, holes, mode)
            }
            _ => self.fail_or_defer(a, b, env, mode),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn go_binder(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        na: &Name,
        da: &Rc<Term>,
        ca: &Rc<Term>,
        nb: &Name,
        db: &Rc<Term>,
        cb: &Rc<Term>,
        injective: &im::HashSet<Name>,
        holes: &im::Vector<Name>,
        mode: Mode,
    ) -> Result<(Subst, Vec<Problem>), EngineError> {
        let (dom_sub, mut problems) = self.go(ctxt, env, da, db, injective, holes, mode)?;
        let cb_aligned = cb.subst(nb, &Term::var(na.clone(), da.clone()));
        let ca2 = Self::apply(&dom_sub, ca);
        let cb2 = Self::apply(&dom_sub, &cb_aligned);
        let (cod_sub, cod_problems) = self.go(ctxt, env, &ca2, &cb2, injective, holes, mode)?;
        let mut acc = dom_sub;
        acc.extend(cod_sub);
        problems.extend(cod_problems);
        Ok((acc, problems))
    }

    fn fail_or_defer(
        &self,
        a: &Rc<Term>,
        b: &Rc<Term>,
        _env: &Env,
        _mode: Mode,
    ) -> Result<(Subst, Vec<Problem>), EngineError> {
        // Structural mismatches are hard failures in both modes — only
        // flex-flex pairs (handled in `go`, before dispatch gets here)
        // are ever postponed as problems.
        Err(EngineError::CantUnify(format!("{}", a), format!("{}", b)))
    }
}

impl Unifier for StructuralUnifier {
    fn unify(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        a: &Rc<Term>,
        b: &Rc<Term>,
        injective: &im::HashSet<Name>,
        holes: &im::Vector<Name>,
    ) -> Result<(Subst, Vec<Problem>), EngineError> {
        self.go(ctxt, env, a, b, injective, holes, Mode::Full)
    }

    fn match_unify(
        &self,
        ctxt: &dyn Context,
        env: &Env,
        a: &Rc<Term>,
        b: &Rc<Term>,
        injective: &im::HashSet<Name>,
        holes: &im::Vector<Name>,
    ) -> Result<Subst, EngineError> {
        let (sub, _problems) = self.go(ctxt, env, a, b, injective, holes, Mode::Match)?;
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimpleContext;
    use crate::term::Level;

    fn nat() -> Rc<Term> {
        Term::var(Name::user("Nat"), Rc::new(Term::Erased))
    }

    #[test]
    fn unify_binds_a_hole_on_either_side() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let h = Name::user("h");
        let zero = Term::var(Name::user("Z"), nat());
        let mut holes = im::Vector::new();
        holes.push_back(h.clone());
        let injective = im::HashSet::new();

        let (sub, probs) = StructuralUnifier::new()
            .unify(&ctxt, &env, &Term::var(h.clone(), nat()), &zero, &injective, &holes)
            .unwrap();
        assert!(probs.is_empty());
        assert_eq!(sub, vec![(h.clone(), zero.clone())]);

        let (sub2, probs2) = StructuralUnifier::new()
            .unify(&ctxt, &env, &zero, &Term::var(h.clone(), nat()), &injective, &holes)
            .unwrap();
        assert!(probs2.is_empty());
        assert_eq!(sub2, vec![(h, zero)]);
    }

    #[test]
    fn unify_postpones_a_flex_flex_pair() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let h1 = Name::user("h1");
        let h2 = Name::user("h2");
        let mut holes = im::Vector::new();
        holes.push_back(h1.clone());
        holes.push_back(h2.clone());
        let injective = im::HashSet::new();

        let (sub, probs) = StructuralUnifier::new()
            .unify(&ctxt, &env, &Term::var(h1, nat()), &Term::var(h2, nat()), &injective, &holes)
            .unwrap();
        assert!(sub.is_empty());
        assert_eq!(probs.len(), 1);
    }

    #[test]
    fn match_unify_never_binds_a_hole_on_the_right() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let h = Name::user("h");
        let zero = Term::var(Name::user("Z"), nat());
        let mut holes = im::Vector::new();
        holes.push_back(h.clone());
        let injective = im::HashSet::new();

        assert!(StructuralUnifier::new()
            .match_unify(&ctxt, &env, &zero, &Term::var(h, nat()), &injective, &holes)
            .is_err());
    }

    #[test]
    fn unify_decomposes_applications_with_a_rigid_head() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let succ = Term::var(Name::user("S"), Rc::new(Term::Erased));
        let h = Name::user("h");
        let zero = Term::var(Name::user("Z"), nat());
        let mut holes = im::Vector::new();
        holes.push_back(h.clone());
        let injective = im::HashSet::new();

        let lhs = Term::app(succ.clone(), Term::var(h.clone(), nat()));
        let rhs = Term::app(succ, zero.clone());
        let (sub, probs) = StructuralUnifier::new().unify(&ctxt, &env, &lhs, &rhs, &injective, &holes).unwrap();
        assert!(probs.is_empty());
        assert_eq!(sub, vec![(h, zero)]);
    }

    #[test]
    fn unify_refuses_to_decompose_a_non_injective_hole_headed_application() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let f = Name::user("f");
        let a = Term::var(Name::user("a"), Rc::new(Term::Erased));
        let b = Term::var(Name::user("b"), Rc::new(Term::Erased));
        let mut holes = im::Vector::new();
        holes.push_back(f.clone());
        let injective = im::HashSet::new();

        let lhs = Term::app(Term::var(f.clone(), Rc::new(Term::Erased)), a);
        let rhs = Term::app(Term::var(f, Rc::new(Term::Erased)), b);
        assert!(StructuralUnifier::new().unify(&ctxt, &env, &lhs, &rhs, &injective, &holes).is_err());
    }

    #[test]
    fn unify_rejects_mismatched_universes() {
        let ctxt = SimpleContext::new();
        let env = Env::new();
        let holes = im::Vector::new();
        let injective = im::HashSet::new();
        let result = StructuralUnifier::new().unify(
            &ctxt,
            &env,
            &Term::universe(Level::ZERO),
            &Term::universe(Level(1)),
            &injective,
            &holes,
        );
        assert!(result.is_err());
    }
}
