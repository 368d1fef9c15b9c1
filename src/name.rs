//! Names for bound variables, holes and top-level declarations.
//!
//! The engine never uses De Bruijn indices: every binder introduces a
//! name that is globally unique for the lifetime of the `ProofState`
//! (invariant 4, `spec.md` §3). Substitution is therefore a plain
//! structural walk with no index-shifting machinery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A name is either user-supplied (from the surface script/driver) or
/// machine-generated (`MN`), carrying a monotonically increasing counter
/// and a human-readable hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Name {
    UN(String),
    MN(u64, String),
}

impl Name {
    pub fn user(s: impl Into<String>) -> Name {
        Name::UN(s.into())
    }

    pub fn machine(n: u64, hint: impl Into<String>) -> Name {
        Name::MN(n, hint.into())
    }

    /// The hint/root used when deriving further fresh names from this one.
    pub fn root(&self) -> &str {
        match self {
            Name::UN(s) => s,
            Name::MN(_, hint) => hint,
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::UN(s) => write!(f, "{}", s),
            Name::MN(n, hint) => write!(f, "{}_{{{}}}", hint, n),
        }
    }
}
