//! The proof state container (`spec.md` §3) and its lifecycle:
//! `newProof`, single-step `Undo`, and `QED`.

use crate::checker::TypeChecker;
use crate::context::Context;
use crate::error::EngineError;
use crate::name::Name;
use crate::term::{Binder, Term};
use crate::unifier::Problem;
use std::rc::Rc;

/// All mutable state threaded through tactic application. Cloning a
/// `ProofState` is cheap: `holes`/`dontunify`/`injective`/`usedns` are
/// `im` persistent collections and `pterm`/`ptype` are `Rc`-shared, so
/// the snapshot `previous` keeps on every successful tactic (Design
/// Notes §9) does not deep-copy the term.
#[derive(Clone)]
pub struct ProofState {
    pub thname: Name,
    pub holes: im::Vector<Name>,
    pub usedns: im::HashSet<Name>,
    pub nextname: u64,
    pub pterm: Rc<Term>,
    pub ptype: Rc<Term>,
    pub dontunify: im::HashSet<Name>,
    /// `(h, journal)`: `h` names the current unification scope, opened
    /// by `StartUnify` and closed by `EndUnify`; `journal` accumulates
    /// `(hole, solution)` pairs discovered since the scope opened.
    pub unified: (Option<Name>, Vec<(Name, Rc<Term>)>),
    pub notunified: Vec<(Name, Rc<Term>)>,
    pub solved: Option<(Name, Rc<Term>)>,
    pub problems: Vec<Problem>,
    pub injective: im::HashSet<Name>,
    pub deferred: Vec<Name>,
    pub instances: Vec<Name>,
    pub previous: Option<Rc<ProofState>>,
    pub context: Rc<dyn Context>,
    pub plog: Vec<String>,
    pub unifylog: bool,
    pub done: bool,
}

impl ProofState {
    /// `newProof(name, context, type)` — a single hole of the goal type.
    pub fn new_proof(thname: Name, context: Rc<dyn Context>, goal: Rc<Term>) -> ProofState {
        let hole_name = thname.clone();
        let pterm = Term::bind(
            hole_name.clone(),
            Binder::Hole(goal.clone()),
            Term::var(hole_name.clone(), goal.clone()),
        );
        let mut usedns = im::HashSet::new();
        usedns.insert(hole_name.clone());
        ProofState {
            thname,
            holes: im::Vector::unit(hole_name),
            usedns,
            nextname: 0,
            pterm,
            ptype: goal,
            dontunify: im::HashSet::new(),
            unified: (None, Vec::new()),
            notunified: Vec::new(),
            solved: None,
            problems: Vec::new(),
            injective: im::HashSet::new(),
            deferred: Vec::new(),
            instances: Vec::new(),
            previous: None,
            context,
            plog: Vec::new(),
            unifylog: false,
            done: false,
        }
    }

    /// The first open hole, i.e. the implicit focus when a tactic does
    /// not name one explicitly (`spec.md` §4.1).
    pub fn focus(&self) -> Option<&Name> {
        self.holes.front()
    }

    pub fn env_at_focus(&self, focus: Option<&Name>) -> Result<crate::term::Env, EngineError> {
        let name = self.resolve_focus(focus)?;
        crate::navigator::goal(&self.pterm, &name)
            .map(|(env, _)| env)
            .ok_or_else(|| EngineError::CantFindHole(name))
    }

    pub fn goal_at_focus(&self, focus: Option<&Name>) -> Result<Rc<Term>, EngineError> {
        let name = self.resolve_focus(focus)?;
        crate::navigator::goal(&self.pterm, &name)
            .map(|(_, binder)| binder.ty().clone())
            .ok_or_else(|| EngineError::CantFindHole(name))
    }

    pub(crate) fn resolve_focus(&self, focus: Option<&Name>) -> Result<Name, EngineError> {
        match focus {
            Some(n) => Ok(n.clone()),
            None => self.focus().cloned().ok_or(EngineError::StillHolesToFill),
        }
    }

    /// Fresh name generation: kept inside the state (`nextname`), never
    /// a process-global counter (Design Notes §9).
    pub fn fresh_name(&mut self, base: &str) -> Name {
        loop {
            let candidate = Name::machine(self.nextname, base);
            self.nextname += 1;
            if !self.usedns.contains(&candidate) {
                self.usedns.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// `Undo` — restore the immediate predecessor, or fail.
    pub fn undo(&self) -> Result<ProofState, EngineError> {
        match &self.previous {
            Some(p) => Ok((**p).clone()),
            None => Err(EngineError::NothingToUndo),
        }
    }

    /// `QED` — requires an empty hole list, then re-typechecks `pterm`
    /// against `ptype` via `recheck`.
    pub fn qed(&mut self, checker: &dyn TypeChecker) -> Result<(), EngineError> {
        if !self.holes.is_empty() {
            return Err(EngineError::StillHolesToFill);
        }
        let env = im::Vector::new();
        let (_, ty) = checker.recheck(self.context.as_ref(), &env, &self.pterm)?;
        checker.converts(self.context.as_ref(), &env, &ty, &self.ptype)?;
        self.done = true;
        Ok(())
    }

    /// Snapshot used before mutating a working copy for a tactic
    /// attempt. Truncates any existing `previous` so the chain never
    /// grows past one predecessor (§5: "the engine keeps exactly one
    /// predecessor").
    pub(crate) fn snapshot(&self) -> ProofState {
        let mut s = self.clone();
        s.previous = None;
        s
    }

    /// Equality over the user-visible fields only, for the `Undo`
    /// involution property (`spec.md` §8) — excludes `plog` and
    /// `previous`, which are diagnostic/bookkeeping, not observable
    /// proof content.
    pub fn user_visible_eq(&self, other: &ProofState) -> bool {
        self.thname == other.thname
            && self.holes == other.holes
            && self.usedns == other.usedns
            && self.nextname == other.nextname
            && self.pterm == other.pterm
            && self.ptype == other.ptype
            && self.dontunify == other.dontunify
            && self.unified == other.unified
            && self.notunified == other.notunified
            && self.solved == other.solved
            && self.problems == other.problems
            && self.injective == other.injective
            && self.deferred == other.deferred
            && self.instances == other.instances
            && self.unifylog == other.unifylog
            && self.done == other.done
    }

    /// Rendering for the `ProofState` tactic: goal and context of every
    /// open hole, innermost environment first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("thname: {}\n", self.thname));
        for h in self.holes.iter() {
            out.push_str(&format!("---------- ({}) ----------\n", h));
            if let Some((env, binder)) = crate::navigator::goal(&self.pterm, h) {
                for (n, b) in env.iter() {
                    out.push_str(&format!("  {} : {}\n", n, b.ty()));
                }
                out.push_str(&format!("  ⊢ {}\n", binder.ty()));
            }
        }
        out
    }
}
