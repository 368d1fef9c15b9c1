//! The proof term: a tree of binders and applications containing typed
//! holes (`spec.md` §3).

use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Universe level. Cumulative: `Type_n : Type_{n+1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(pub u32);

impl Level {
    pub const ZERO: Level = Level(0);

    pub fn succ(self) -> Level {
        Level(self.0 + 1)
    }

    pub fn max(self, other: Level) -> Level {
        Level(self.0.max(other.0))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type{}", self.0)
    }
}

/// A tagged binder variant, carrying an annotation type and, for some
/// variants, a body (`spec.md` §3 binder table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Binder {
    Lam(Rc<Term>),
    Pi(Rc<Term>),
    Let(Rc<Term>, Rc<Term>),
    PVar(Rc<Term>),
    PVTy(Rc<Term>),
    Hole(Rc<Term>),
    Guess(Rc<Term>, Rc<Term>),
    GHole(usize, Rc<Term>),
}

impl Binder {
    /// The annotation type every binder variant carries.
    pub fn ty(&self) -> &Rc<Term> {
        match self {
            Binder::Lam(t)
            | Binder::Pi(t)
            | Binder::Let(t, _)
            | Binder::PVar(t)
            | Binder::PVTy(t)
            | Binder::Hole(t)
            | Binder::Guess(t, _)
            | Binder::GHole(_, t) => t,
        }
    }

    pub fn with_ty(&self, ty: Rc<Term>) -> Binder {
        match self {
            Binder::Lam(_) => Binder::Lam(ty),
            Binder::Pi(_) => Binder::Pi(ty),
            Binder::Let(_, v) => Binder::Let(ty, v.clone()),
            Binder::PVar(_) => Binder::PVar(ty),
            Binder::PVTy(_) => Binder::PVTy(ty),
            Binder::Hole(_) => Binder::Hole(ty),
            Binder::Guess(_, v) => Binder::Guess(ty, v.clone()),
            Binder::GHole(n, _) => Binder::GHole(*n, ty),
        }
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, Binder::Hole(_))
    }

    pub fn is_guess(&self) -> bool {
        matches!(self, Binder::Guess(_, _))
    }

    /// True for binders that occupy a slot in `ProofState.holes`
    /// (invariant 1, `spec.md` §3).
    pub fn is_open(&self) -> bool {
        self.is_hole() || self.is_guess()
    }

    fn subst(&self, n: &Name, v: &Rc<Term>) -> Binder {
        match self {
            Binder::Lam(t) => Binder::Lam(t.subst(n, v)),
            Binder::Pi(t) => Binder::Pi(t.subst(n, v)),
            Binder::Let(t, val) => Binder::Let(t.subst(n, v), val.subst(n, v)),
            Binder::PVar(t) => Binder::PVar(t.subst(n, v)),
            Binder::PVTy(t) => Binder::PVTy(t.subst(n, v)),
            Binder::Hole(t) => Binder::Hole(t.subst(n, v)),
            Binder::Guess(t, val) => Binder::Guess(t.subst(n, v), val.subst(n, v)),
            Binder::GHole(k, t) => Binder::GHole(*k, t.subst(n, v)),
        }
    }
}

/// The proof term itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A bound variable reference, carrying its type.
    V(Name, Rc<Term>),
    App(Rc<Term>, Rc<Term>),
    Bind(Name, Binder, Rc<Term>),
    TType(Level),
    Erased,
}

impl Term {
    pub fn var(n: Name, ty: Rc<Term>) -> Rc<Term> {
        Rc::new(Term::V(n, ty))
    }

    pub fn app(f: Rc<Term>, a: Rc<Term>) -> Rc<Term> {
        Rc::new(Term::App(f, a))
    }

    pub fn bind(n: Name, b: Binder, scope: Rc<Term>) -> Rc<Term> {
        Rc::new(Term::Bind(n, b, scope))
    }

    pub fn universe(l: Level) -> Rc<Term> {
        Rc::new(Term::TType(l))
    }

    /// `mkApp f [a1..ak]` — application constructor (`spec.md` §6).
    pub fn mk_app(f: Rc<Term>, args: impl IntoIterator<Item = Rc<Term>>) -> Rc<Term> {
        args.into_iter().fold(f, Term::app)
    }

    /// `unApply` — deconstruct an application spine into its head and
    /// argument list, outermost-last (`spec.md` §6).
    pub fn un_apply(t: &Rc<Term>) -> (Rc<Term>, Vec<Rc<Term>>) {
        let mut args = Vec::new();
        let mut head = t.clone();
        while let Term::App(f, a) = head.as_ref() {
            args.push(a.clone());
            head = f.clone();
        }
        args.reverse();
        (head, args)
    }

    /// Capture-avoiding substitution of `v` for every free occurrence of
    /// `n`. Names are globally fresh (invariant 4), so no renaming of
    /// binders is ever required to avoid capture.
    pub fn subst(self: &Rc<Term>, n: &Name, v: &Rc<Term>) -> Rc<Term> {
        match self.as_ref() {
            Term::V(m, ty) => {
                if m == n {
                    v.clone()
                } else {
                    let new_ty = ty.subst(n, v);
                    if Rc::ptr_eq(&new_ty, ty) {
                        self.clone()
                    } else {
                        Term::var(m.clone(), new_ty)
                    }
                }
            }
            Term::App(f, a) => Term::app(f.subst(n, v), a.subst(n, v)),
            Term::Bind(m, binder, scope) => {
                let new_binder = binder.subst(n, v);
                if m == n {
                    // `n` is shadowed from here on; its binder's own
                    // annotation/value still gets the substitution (it's
                    // in scope at that point), but the inner scope does not.
                    Term::bind(m.clone(), new_binder, scope.clone())
                } else {
                    Term::bind(m.clone(), new_binder, scope.subst(n, v))
                }
            }
            Term::TType(_) | Term::Erased => self.clone(),
        }
    }

    /// Parallel substitution of many (name, value) pairs in one pass.
    pub fn psubst(self: &Rc<Term>, sub: &[(Name, Rc<Term>)]) -> Rc<Term> {
        sub.iter().fold(self.clone(), |t, (n, v)| t.subst(n, v))
    }

    /// `noOccurrence` — true if `n` does not occur free in `self`.
    pub fn no_occurrence(self: &Rc<Term>, n: &Name) -> bool {
        match self.as_ref() {
            Term::V(m, ty) => m != n && ty.no_occurrence(n),
            Term::App(f, a) => f.no_occurrence(n) && a.no_occurrence(n),
            Term::Bind(m, binder, scope) => {
                let ty_clear = binder.ty().no_occurrence(n);
                let val_clear = match binder {
                    Binder::Let(_, v) | Binder::Guess(_, v) => v.no_occurrence(n),
                    _ => true,
                };
                let scope_clear = m == n || scope.no_occurrence(n);
                ty_clear && val_clear && scope_clear
            }
            Term::TType(_) | Term::Erased => true,
        }
    }

    /// `forget` — drop the type annotation carried by variable
    /// references, for re-submission to `recheck` (`spec.md` §6).
    pub fn forget(self: &Rc<Term>) -> Rc<Term> {
        match self.as_ref() {
            Term::V(n, _) => Term::var(n.clone(), Rc::new(Term::Erased)),
            Term::App(f, a) => Term::app(f.forget(), a.forget()),
            Term::Bind(n, binder, scope) => {
                let forgotten_binder = match binder {
                    Binder::Lam(t) => Binder::Lam(t.forget()),
                    Binder::Pi(t) => Binder::Pi(t.forget()),
                    Binder::Let(t, v) => Binder::Let(t.forget(), v.forget()),
                    Binder::PVar(t) => Binder::PVar(t.forget()),
                    Binder::PVTy(t) => Binder::PVTy(t.forget()),
                    Binder::Hole(t) => Binder::Hole(t.forget()),
                    Binder::Guess(t, v) => Binder::Guess(t.forget(), v.forget()),
                    Binder::GHole(k, t) => Binder::GHole(*k, t.forget()),
                };
                Term::bind(n.clone(), forgotten_binder, scope.forget())
            }
            Term::TType(_) | Term::Erased => self.clone(),
        }
    }

    /// Structural alpha-equivalence. Since names are globally unique,
    /// this is plain structural equality on the `PartialEq` derive, but
    /// is exposed under its conventional name for readability at call
    /// sites that care about the distinction from definitional equality.
    pub fn alpha_eq(a: &Rc<Term>, b: &Rc<Term>) -> bool {
        a == b
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::V(n, _) => write!(f, "{}", n),
            Term::App(func, arg) => write!(f, "({} {})", func, arg),
            Term::Bind(n, Binder::Lam(ty), scope) => write!(f, "\\{}:{}. {}", n, ty, scope),
            Term::Bind(n, Binder::Pi(ty), scope) => write!(f, "({}:{}) -> {}", n, ty, scope),
            Term::Bind(n, Binder::Let(ty, v), scope) => {
                write!(f, "let {}:{} = {} in {}", n, ty, v, scope)
            }
            Term::Bind(n, Binder::PVar(ty), scope) => write!(f, "pat {}:{}. {}", n, ty, scope),
            Term::Bind(n, Binder::PVTy(ty), scope) => write!(f, "patty {}:{}. {}", n, ty, scope),
            Term::Bind(n, Binder::Hole(ty), scope) => write!(f, "?{}:{}. {}", n, ty, scope),
            Term::Bind(n, Binder::Guess(ty, v), scope) => {
                write!(f, "?{}:{} := {}. {}", n, ty, v, scope)
            }
            Term::Bind(n, Binder::GHole(_, ty), scope) => write!(f, "!{}:{}. {}", n, ty, scope),
            Term::TType(l) => write!(f, "{}", l),
            Term::Erased => write!(f, "_"),
        }
    }
}

/// The environment of binders enclosing a focused hole, innermost first
/// (`spec.md` §4.1).
pub type Env = im::Vector<(Name, Binder)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subst_replaces_free_occurrences_only() {
        let x = Name::user("x");
        let y = Name::user("y");
        let ty = Term::universe(Level::ZERO);
        // \y:Type. x  -- substituting x does not touch the shadowing y.
        let term = Term::bind(y.clone(), Binder::Lam(ty.clone()), Term::var(x.clone(), ty.clone()));
        let replacement = Term::var(Name::user("z"), ty.clone());
        let substituted = term.subst(&x, &replacement);
        match substituted.as_ref() {
            Term::Bind(n, Binder::Lam(_), scope) => {
                assert_eq!(n, &y);
                assert_eq!(scope.as_ref(), &Term::V(Name::user("z"), ty));
            }
            other => panic!("expected a Lam, got {:?}", other),
        }
    }

    #[test]
    fn subst_stops_at_shadowing_binder() {
        let x = Name::user("x");
        let ty = Term::universe(Level::ZERO);
        // \x:Type. x  -- the inner x is bound, not the substitution target.
        let term = Term::bind(x.clone(), Binder::Lam(ty.clone()), Term::var(x.clone(), ty.clone()));
        let replacement = Term::var(Name::user("z"), ty.clone());
        let substituted = term.subst(&x, &replacement);
        assert_eq!(substituted, term);
    }

    #[test]
    fn un_apply_and_mk_app_round_trip() {
        let f = Term::var(Name::user("f"), Rc::new(Term::Erased));
        let a = Term::var(Name::user("a"), Rc::new(Term::Erased));
        let b = Term::var(Name::user("b"), Rc::new(Term::Erased));
        let applied = Term::mk_app(f.clone(), vec![a.clone(), b.clone()]);
        let (head, args) = Term::un_apply(&applied);
        assert_eq!(head, f);
        assert_eq!(args, vec![a, b]);
    }

    #[test]
    fn no_occurrence_respects_binder_scope() {
        let x = Name::user("x");
        let y = Name::user("y");
        let ty = Term::universe(Level::ZERO);
        // A self-contained identity binder: x only occurs bound, never free.
        let closed = Term::bind(x.clone(), Binder::Lam(ty.clone()), Term::var(x.clone(), ty.clone()));
        assert!(closed.no_occurrence(&x));

        // A Pi whose domain mentions x freely.
        let open = Term::bind(y.clone(), Binder::Pi(Term::var(x.clone(), ty.clone())), Term::var(y, ty));
        assert!(!open.no_occurrence(&x));
    }

    #[test]
    fn level_succ_and_max() {
        assert_eq!(Level::ZERO.succ(), Level(1));
        assert_eq!(Level(2).max(Level(5)), Level(5));
        assert_eq!(Level(5).max(Level(2)), Level(5));
    }
}
