//! The global definition context: an external collaborator (`spec.md`
//! §1, §6). The engine only ever reads from it; new declarations
//! discovered by `Defer`/`DeferType` are handed back to the driver via
//! `ProofState.deferred` rather than written here.

use crate::name::Name;
use crate::term::Term;
use std::collections::HashMap;
use std::rc::Rc;

/// Metainformation about a top-level name, as looked up by
/// `lookupMetaInformation` (`spec.md` §6). Only the piece the core
/// actually consumes — the parameter/index split for `Induction` — is
/// modeled; a real elaborator's context carries much more.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaInformation {
    /// For an inductive family: the positions (by index into the
    /// family's argument list) that are uniform parameters rather than
    /// indices, plus the number of constructors (so `Induction` knows
    /// how many method holes to open).
    DataMI { param_positions: Vec<usize>, constructors: usize },
}

/// External context interface (`spec.md` §6). Implementors may back
/// this with a real elaborator's global symbol table; `SimpleContext`
/// below is an in-memory reference sufficient to exercise the engine's
/// own test suite.
pub trait Context {
    fn lookup_ty(&self, n: &Name) -> Option<Rc<Term>>;
    fn lookup_def(&self, n: &Name) -> Option<Rc<Term>>;
    fn lookup_metainformation(&self, n: &Name) -> Option<MetaInformation>;

    /// Eliminators registered for an inductive family, by the `ElimN`
    /// naming convention (`spec.md` GLOSSARY). `Induction` fails if this
    /// returns anything other than exactly one name.
    fn eliminators_for(&self, family: &Name) -> Vec<Name>;

    /// `uniqueNameCtxt ctxt base used` — smallest-counter fresh name not
    /// colliding with the context's own names or the caller-supplied
    /// `used` set.
    fn unique_name(&self, base: &str, used: &im::HashSet<Name>) -> Name {
        let mut n = 0u64;
        loop {
            let candidate = Name::machine(n, base);
            if !used.contains(&candidate) && self.lookup_ty(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// In-memory reference `Context`.
#[derive(Debug, Default, Clone)]
pub struct SimpleContext {
    types: HashMap<Name, Rc<Term>>,
    defs: HashMap<Name, Rc<Term>>,
    meta: HashMap<Name, MetaInformation>,
    eliminators: HashMap<Name, Vec<Name>>,
}

impl SimpleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_ty(&mut self, n: Name, ty: Rc<Term>) -> &mut Self {
        self.types.insert(n, ty);
        self
    }

    pub fn declare_def(&mut self, n: Name, ty: Rc<Term>, def: Rc<Term>) -> &mut Self {
        self.types.insert(n.clone(), ty);
        self.defs.insert(n, def);
        self
    }

    pub fn declare_data(&mut self, family: Name, param_positions: Vec<usize>, constructors: usize) -> &mut Self {
        self.meta.insert(family, MetaInformation::DataMI { param_positions, constructors });
        self
    }

    pub fn declare_eliminator(&mut self, family: Name, elim: Name) -> &mut Self {
        self.eliminators.entry(family).or_default().push(elim);
        self
    }
}

impl Context for SimpleContext {
    fn lookup_ty(&self, n: &Name) -> Option<Rc<Term>> {
        self.types.get(n).cloned()
    }

    fn lookup_def(&self, n: &Name) -> Option<Rc<Term>> {
        self.defs.get(n).cloned()
    }

    fn lookup_metainformation(&self, n: &Name) -> Option<MetaInformation> {
        self.meta.get(n).cloned()
    }

    fn eliminators_for(&self, family: &Name) -> Vec<Name> {
        self.eliminators.get(family).cloned().unwrap_or_default()
    }
}
