pub mod node;
pub mod quantifier;

pub use self::{
    node::{AnchorKind, Expression, PatternNode},
    quantifier::Quantifier,
};
use crate::{AnnotationList, Direction, Error, PatternMatch, Result};
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A predicate that must hold for a tentative match before it is accepted.
///
/// Predicates compare by identity and do not contribute to hashes.
#[derive(Clone)]
pub struct Acceptable(Arc<dyn Fn(&AnnotationList, &PatternMatch) -> bool + Send + Sync>);

impl Acceptable {
    pub fn new(f: impl Fn(&AnnotationList, &PatternMatch) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    #[must_use]
    pub fn accepts(&self, input: &AnnotationList, m: &PatternMatch) -> bool {
        (self.0)(input, m)
    }
}

impl PartialEq for Acceptable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Acceptable {}

impl Hash for Acceptable {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl fmt::Debug for Acceptable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Acceptable(..)")
    }
}

/// Pre-order walk over a node and all of its descendants.
pub struct Nodes<'a> {
    stack: Vec<&'a PatternNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a PatternNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

impl PatternNode {
    #[must_use]
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    #[must_use]
    pub fn contains_anchor(&self) -> bool {
        self.nodes().any(|node| matches!(node, PatternNode::Anchor(_)))
    }

    /// Checks the structural well-formedness of the tree.
    pub fn validate(&self) -> Result<()> {
        for node in self.nodes() {
            if let PatternNode::Quantified { quantifier, .. } = node {
                quantifier.validate()?;
            }
        }
        Ok(())
    }

    /// Checks that every condition in the tree is frozen.
    pub fn check_frozen(&self) -> Result<()> {
        for node in self.nodes() {
            if let PatternNode::Constraint(fs) = node
                && !fs.is_frozen()
            {
                return Err(Error::ConditionNotFrozen {
                    condition: fs.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Freezes every condition in the tree.
    pub fn freeze(&mut self) {
        if let PatternNode::Constraint(fs) = self {
            fs.freeze();
        }
        for child in self.children_mut() {
            child.freeze();
        }
    }
}

/// The node read first when traversing `nodes` in `dir`.
pub(crate) fn first_in(nodes: &[PatternNode], dir: Direction) -> Option<&PatternNode> {
    match dir {
        Direction::LeftToRight => nodes.first(),
        Direction::RightToLeft => nodes.last(),
    }
}

/// `nodes` in the order they are read in `dir`.
pub(crate) fn in_direction(
    nodes: &[PatternNode],
    dir: Direction,
) -> Box<dyn Iterator<Item = &PatternNode> + '_> {
    match dir {
        Direction::LeftToRight => Box::new(nodes.iter()),
        Direction::RightToLeft => Box::new(nodes.iter().rev()),
    }
}
