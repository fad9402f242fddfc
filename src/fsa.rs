//! Finite-state automata compiled from pattern trees.
//!
//! States and arcs live in flat arenas and refer to each other by index, so
//! cyclic structures (unbounded quantifiers) need no shared ownership.

pub mod dfa;
mod dot;
pub mod nfa;

use self::{dfa::Dfa, nfa::Nfa};
use crate::{AnchorKind, Direction, Expression, Result};
use indexmap::IndexMap;
use log::debug;

/// Index of a state in an NFA arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an arc in an NFA arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ArcId(pub(crate) usize);

impl ArcId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies a capture group. [`GroupId::ENTIRE`] is the overall match.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub const ENTIRE: Self = Self(0);

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A boundary marker crossed without consuming input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Tag {
    pub group: GroupId,
    /// `false` for the boundary read first, `true` for the one read last.
    pub close: bool,
}

impl Tag {
    #[must_use]
    pub const fn open(group: GroupId) -> Self {
        Self {
            group,
            close: false,
        }
    }

    #[must_use]
    pub const fn close(group: GroupId) -> Self {
        Self { group, close: true }
    }
}

/// The sequence edges a conditioned arc must be taken on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct AnchorSides {
    pub start: bool,
    pub end: bool,
}

impl AnchorSides {
    #[must_use]
    pub fn is_none(self) -> bool {
        !self.start && !self.end
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start || other.start,
            end: self.end || other.end,
        }
    }
}

impl From<AnchorKind> for AnchorSides {
    fn from(kind: AnchorKind) -> Self {
        match kind {
            AnchorKind::Start => Self {
                start: true,
                end: false,
            },
            AnchorKind::End => Self {
                start: false,
                end: true,
            },
        }
    }
}

/// A compiled pattern: the NFA built from the tree and its determinization.
#[derive(Debug)]
pub struct Automaton {
    pub(crate) nfa: Nfa,
    pub(crate) dfa: Dfa,
    pub(crate) groups: IndexMap<String, GroupId>,
    pub(crate) registers: usize,
    pub(crate) direction: Direction,
    pub(crate) has_anchors: bool,
}

impl Automaton {
    /// Builds the NFA for `root` read in `direction` and determinizes it.
    ///
    /// Every condition in the tree must be frozen.
    pub fn compile(root: &Expression, direction: Direction) -> Result<Self> {
        for child in &root.children {
            child.check_frozen()?;
            child.validate()?;
        }
        let nfa::Built {
            nfa,
            groups,
            registers,
        } = nfa::build(root, direction)?;
        let dfa = dfa::determinize(&nfa)?;
        let has_anchors = nfa.arcs.iter().any(|arc| {
            arc.condition
                .as_ref()
                .is_some_and(|cond| !cond.anchor.is_none())
        });
        debug!(
            "compiled {direction:?} pattern: {} nfa states, {} nfa arcs, {} dfa states, {} groups",
            nfa.states.len(),
            nfa.arcs.len(),
            dfa.states.len(),
            groups.len()
        );
        Ok(Self {
            nfa,
            dfa,
            groups,
            registers,
            direction,
            has_anchors,
        })
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Capture group names in declaration order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_anchors(&self) -> bool {
        self.has_anchors
    }

    #[must_use]
    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    #[must_use]
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }
}
