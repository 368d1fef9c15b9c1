//! Error taxonomy (`spec.md` §7). Kinds, not concrete per-tactic types:
//! structural misuse, typing failures propagated from the checker/
//! unifier, and the two fatal logic errors (`QED`/`Undo`).

use crate::name::Name;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Can't find hole {0}")]
    CantFindHole(Name),

    #[error("Not an attackable hole: {0}")]
    NotAttackableHole(Name),

    #[error("Can't {0} here")]
    CantTacticHere(&'static str),

    #[error("{0} is not a function type")]
    CantIntroduce(String),

    #[error("goal is not a type universe: {0}")]
    NotAUniverse(String),

    #[error("{0} is not an equation (expected `a = b`)")]
    NotEquality(String),

    #[error("can't unify {0} with {1}")]
    CantUnify(String, String),

    #[error("can't convert {0} to {1}")]
    CantConvert(String, String),

    #[error("can't infer a type for {0}")]
    CantInferType(String),

    #[error("no eliminator registered for {0}")]
    NoEliminator(Name),

    #[error("multiple eliminators registered for {0}")]
    AmbiguousEliminator(Name),

    #[error("unbound name {0}")]
    UnboundName(Name),

    #[error("no metainformation for {0}")]
    NoMetaInformation(Name),

    #[error("still holes to fill")]
    StillHolesToFill,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
