//! A feature-structure pattern matcher for annotated sequences.
//!
//! Patterns are trees of constraints, groups, quantifiers, alternations and
//! anchors. A pattern is compiled once into a finite-state automaton (an NFA
//! that is then determinized) and executed against an [`AnnotationList`] in
//! either direction, producing [`PatternMatch`]es with named group captures,
//! variable bindings and the path of the sub-pattern that accepted.

#![warn(clippy::pedantic, rust_2018_idioms)]
#![allow(clippy::missing_errors_doc, clippy::too_many_lines)]

pub mod annotation;
pub mod ast;
pub mod builder;
mod engine;
pub mod feature;
pub mod fsa;
pub mod pattern;
pub mod pattern_match;

pub use self::{
    annotation::{Annotation, AnnotationList, Direction, Filter, Span},
    ast::{Acceptable, AnchorKind, Expression, PatternNode, Quantifier},
    builder::{PatternBuilder, PatternSyntax},
    feature::{FeatureStruct, FeatureValue, SymbolSet, VariableBindings},
    fsa::Automaton,
    pattern::{Matches, MatcherSettings, Pattern},
    pattern_match::PatternMatch,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The pattern was compiled or matched before being frozen.
    #[error("pattern is not frozen")]
    NotFrozen,

    /// A constraint inside the pattern holds a condition that is not frozen.
    #[error("condition {condition} is not frozen")]
    ConditionNotFrozen { condition: String },

    /// A frozen feature structure or pattern was mutated.
    #[error("cannot modify a frozen {0}")]
    Frozen(&'static str),

    /// A quantifier has an upper bound below its lower bound.
    #[error("invalid quantifier bounds ({min} > {max})")]
    InvalidQuantifier { min: usize, max: usize },

    /// An insertion would grow the sequence beyond [`MAX_ANNOTATIONS`].
    #[error("too many annotations in sequence (limit is {MAX_ANNOTATIONS})")]
    TooManyAnnotations,

    /// An annotation was inserted at an index past the end of the sequence.
    #[error("annotation index {index} out of bounds (len is {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Determinization produced more than [`MAX_DFA_STATES`] states.
    #[error("automaton exceeds {MAX_DFA_STATES} deterministic states")]
    TooManyStates,

    /// A single match attempt explored more configurations than allowed.
    #[error("match attempt exceeded {limit} steps")]
    StepLimit { limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of annotations an [`AnnotationList`] may hold.
pub const MAX_ANNOTATIONS: usize = 256;

/// Maximum number of deterministic states a single pattern may compile to.
pub const MAX_DFA_STATES: usize = 10_000;
